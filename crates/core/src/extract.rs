//! Visible-text extraction.
//!
//! [`extract_text`] walks a tree depth-first and keeps the text a sighted
//! reader would see, minus anything the [`IgnoreRules`] deny. The walk never
//! mutates the tree: ignored and hidden subtrees are skipped, not removed.
//!
//! # Example
//!
//! ```rust
//! use precis_core::{Document, IgnoreRules, extract_document};
//!
//! let doc = Document::parse(r#"
//!     <body>
//!         <nav>Home | About</nav>
//!         <h1>Title</h1><p>Body text.</p>
//!         <p style="display:none">Hidden</p>
//!     </body>
//! "#);
//!
//! let text = extract_document(&doc, &IgnoreRules::default());
//! assert_eq!(text, "Title Body text.");
//! ```

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::node::{NodeKind, TreeNode};
use crate::parse::Document;
use crate::style::ComputedStyle;
use crate::text::collapse_whitespace;

/// Tags pruned by default: scripts, styles, embedded content and page chrome.
pub const DEFAULT_IGNORE_TAGS: &[&str] = &["script", "style", "noscript", "header", "footer", "nav", "iframe", "svg"];

/// Tags whose text is padded with spaces so that adjacent blocks never merge
/// into one word.
const BLOCK_TAGS: &[&str] = &[
    "address",
    "article",
    "aside",
    "blockquote",
    "br",
    "caption",
    "dd",
    "details",
    "div",
    "dl",
    "dt",
    "fieldset",
    "figcaption",
    "figure",
    "footer",
    "form",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "header",
    "hr",
    "legend",
    "li",
    "main",
    "nav",
    "ol",
    "p",
    "pre",
    "section",
    "summary",
    "table",
    "tbody",
    "td",
    "tfoot",
    "th",
    "thead",
    "tr",
    "ul",
];

/// Tag and selector denylist for one extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnoreRules {
    tags: HashSet<String>,
    selectors: Vec<String>,
}

impl Default for IgnoreRules {
    /// [`DEFAULT_IGNORE_TAGS`] and no selectors.
    fn default() -> Self {
        Self::new(DEFAULT_IGNORE_TAGS.iter().copied(), std::iter::empty::<&str>())
    }
}

impl IgnoreRules {
    /// Builds a rule set. Tags are trimmed and lowercased; blank entries are dropped.
    pub fn new<T, S>(tags: impl IntoIterator<Item = T>, selectors: impl IntoIterator<Item = S>) -> Self
    where
        T: AsRef<str>,
        S: AsRef<str>,
    {
        let tags = tags
            .into_iter()
            .map(|tag| tag.as_ref().trim().to_ascii_lowercase())
            .filter(|tag| !tag.is_empty())
            .collect();
        let selectors = selectors
            .into_iter()
            .map(|selector| selector.as_ref().trim().to_string())
            .filter(|selector| !selector.is_empty())
            .collect();
        Self { tags, selectors }
    }

    /// A rule set that ignores nothing.
    pub fn none() -> Self {
        Self { tags: HashSet::new(), selectors: Vec::new() }
    }

    /// Adds a tag to the denylist.
    pub fn with_tag(mut self, tag: &str) -> Self {
        let tag = tag.trim().to_ascii_lowercase();
        if !tag.is_empty() {
            self.tags.insert(tag);
        }
        self
    }

    /// Adds a selector to the denylist.
    pub fn with_selector(mut self, selector: &str) -> Self {
        let selector = selector.trim();
        if !selector.is_empty() && !self.selectors.iter().any(|s| s == selector) {
            self.selectors.push(selector.to_string());
        }
        self
    }

    pub fn ignores_tag(&self, tag: &str) -> bool {
        self.tags.contains(&tag.to_ascii_lowercase())
    }

    /// Ignored tag names, sorted.
    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.tags.iter().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }

    pub fn selectors(&self) -> &[String] {
        &self.selectors
    }
}

/// Extracts the visible, non-ignored text of `root`'s subtree.
///
/// Returns an empty string when `root` is `None`. Selectors that fail to
/// compile are logged and never match; they do not stop the walk.
pub fn extract_text<N: TreeNode>(root: Option<N>, rules: &IgnoreRules) -> String {
    let Some(root) = root else {
        debug!("no root node; nothing to extract");
        return String::new();
    };

    let walker = Walker { tags: &rules.tags, selectors: compile_selectors::<N>(&rules.selectors) };
    let raw = walker.visit(root, None);

    collapse_whitespace(&raw)
}

/// Extracts the visible, non-ignored text of a document's `<body>`.
pub fn extract_document(doc: &Document, rules: &IgnoreRules) -> String {
    extract_text(doc.body(), rules)
}

fn compile_selectors<N: TreeNode>(sources: &[String]) -> Vec<N::Selector> {
    sources
        .iter()
        .filter_map(|source| match N::compile_selector(source) {
            Ok(selector) => Some(selector),
            Err(reason) => {
                warn!(selector = %source, %reason, "ignoring invalid selector");
                None
            }
        })
        .collect()
}

struct Walker<'r, N: TreeNode> {
    tags: &'r HashSet<String>,
    selectors: Vec<N::Selector>,
}

/// Pending work for [`Walker::visit`].
enum Step<N> {
    Visit(N, Option<ComputedStyle>),
    Pad,
}

impl<N: TreeNode> Walker<'_, N> {
    /// Walks `root` depth-first with an explicit stack so that nesting depth
    /// is bounded by the heap, not the thread stack.
    fn visit(&self, root: N, inherited: Option<ComputedStyle>) -> String {
        let mut out = String::new();
        let mut stack = vec![Step::Visit(root, inherited)];

        while let Some(step) = stack.pop() {
            let (node, inherited) = match step {
                Step::Pad => {
                    out.push(' ');
                    continue;
                }
                Step::Visit(node, inherited) => (node, inherited),
            };

            let tag = match node.kind() {
                NodeKind::Text(text) => {
                    out.push_str(text);
                    continue;
                }
                NodeKind::Element(tag) => tag.to_ascii_lowercase(),
                NodeKind::Other => continue,
            };

            if self.tags.contains(&tag) {
                continue;
            }
            if self.selectors.iter().any(|selector| node.matches(selector)) {
                continue;
            }

            let style = node.computed_style(inherited.as_ref());
            if !style.is_rendered() {
                continue;
            }

            if BLOCK_TAGS.contains(&tag.as_str()) {
                out.push(' ');
                stack.push(Step::Pad);
            }

            let children: Vec<N> = node.children().collect();
            stack.extend(children.into_iter().rev().map(|child| Step::Visit(child, Some(style))));
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(html: &str, rules: &IgnoreRules) -> String {
        extract_document(&Document::parse(html), rules)
    }

    #[test]
    fn test_block_tags_separate_words() {
        let text = extract("<body><p>one</p><p>two</p><li>three</li><br><div>four</div></body>", &IgnoreRules::none());
        assert_eq!(text, "one two three four");
    }

    #[test]
    fn test_inline_tags_do_not_separate_words() {
        let text = extract("<body><p>un<b>bold</b><i>ed</i></p></body>", &IgnoreRules::none());
        assert_eq!(text, "unbolded");
    }

    #[test]
    fn test_default_rules_drop_chrome() {
        let html = r#"<body>
            <header>Header</header><nav>Nav</nav>
            <p>Kept</p>
            <script>var x = 1;</script><style>p{}</style><noscript>Enable JS</noscript>
            <iframe src="x"></iframe><svg><text>Chart</text></svg>
            <footer>Footer</footer>
        </body>"#;
        assert_eq!(extract(html, &IgnoreRules::default()), "Kept");
    }

    #[test]
    fn test_script_text_dropped_even_without_rules() {
        let text = extract("<body><p>a</p><script>alert(1)</script></body>", &IgnoreRules::none());
        assert_eq!(text, "a");
    }

    #[test]
    fn test_ignore_tag_case_insensitive() {
        let rules = IgnoreRules::new(["ASIDE"], std::iter::empty::<&str>());
        let text = extract("<body><aside>Side</aside><p>Main</p></body>", &rules);
        assert_eq!(text, "Main");
        assert!(rules.ignores_tag("Aside"));
    }

    #[test]
    fn test_ignored_subtree_pruned_without_inspecting_children() {
        let rules = IgnoreRules::none().with_tag("section").with_selector(".keep");
        let text = extract("<body><section><p class='keep'>Inner</p>Loose</section><p>Out</p></body>", &rules);
        assert_eq!(text, "Out");
    }

    #[test]
    fn test_nested_hidden_element_excluded() {
        let html = r#"<body><article><p>Visible</p>
            <div class="accordion"><div style="display:none"><p>Collapsed</p></div></div>
        </article></body>"#;
        assert_eq!(extract(html, &IgnoreRules::none()), "Visible");
    }

    #[test]
    fn test_visibility_and_opacity_hide() {
        let html = r#"<body>
            <p style="visibility:hidden">Ghost</p>
            <p style="opacity:0">Faded</p>
            <p style="opacity:0.2">Dim</p>
        </body>"#;
        assert_eq!(extract(html, &IgnoreRules::none()), "Dim");
    }

    #[test]
    fn test_hidden_body_yields_empty() {
        assert_eq!(extract("<body style='display:none'><p>x</p></body>", &IgnoreRules::none()), "");
    }

    #[test]
    fn test_invalid_selector_is_skipped() {
        let rules = IgnoreRules::default().with_selector(":::bad-selector").with_selector(".ad");
        let text = extract("<body><p>Keep</p><div class='ad'>Ad</div></body>", &rules);
        assert_eq!(text, "Keep");
    }

    #[test]
    fn test_deeply_nested_page() {
        let depth = 10_000;
        let html = format!("<body>{}deep{}<p>after</p></body>", "<div>".repeat(depth), "</div>".repeat(depth));
        assert_eq!(extract(&html, &IgnoreRules::none()), "deep after");
    }

    #[test]
    fn test_none_root() {
        assert_eq!(extract_text::<crate::PageNode>(None, &IgnoreRules::default()), "");
    }

    #[test]
    fn test_rules_builder_dedupes_and_trims() {
        let rules = IgnoreRules::new([" Script ", "", "nav"], [" .ad ", ""]).with_selector(".ad").with_tag("NAV");
        assert_eq!(rules.tags(), vec!["nav", "script"]);
        assert_eq!(rules.selectors(), &[".ad".to_string()]);
    }
}
