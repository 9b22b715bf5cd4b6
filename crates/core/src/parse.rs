//! HTML parsing and the tree view the extractor walks.
//!
//! This module provides the [`Document`] type, which owns a parsed page and its
//! author stylesheet, and [`PageNode`], the borrowed [`TreeNode`] view over it.
//!
//! # Example
//!
//! ```rust
//! use precis_core::Document;
//!
//! let html = r#"
//!     <html>
//!         <head><title>Test Page</title></head>
//!         <body><p class="content">Paragraph</p></body>
//!     </html>
//! "#;
//!
//! let doc = Document::parse(html);
//! assert_eq!(doc.title(), Some("Test Page".to_string()));
//! assert!(doc.body().is_some());
//! ```

use scraper::{ElementRef, Html, Node, Selector};

use crate::node::{NodeKind, TreeNode};
use crate::style::{ComputedStyle, StyleSheet};
use crate::text::collapse_whitespace;
use crate::{PrecisError, Result};

/// A parsed HTML page together with its `<style>` rules.
///
/// The stylesheet is collected once at parse time so that every computed style
/// lookup during a walk shares it.
pub struct Document {
    html: Html,
    stylesheet: StyleSheet,
}

impl Document {
    /// Parses an HTML document.
    ///
    /// Parsing is error-tolerant: malformed markup is repaired the way a browser
    /// would, so this never fails.
    pub fn parse(html: &str) -> Self {
        let html = Html::parse_document(html);
        let stylesheet = StyleSheet::from_html(&html);
        Self { html, stylesheet }
    }

    /// Gets the underlying `scraper::Html`.
    pub fn html(&self) -> &Html {
        &self.html
    }

    /// Author rules collected from the document's `<style>` elements.
    pub fn stylesheet(&self) -> &StyleSheet {
        &self.stylesheet
    }

    /// The `<body>` element, or `None` for documents without one.
    ///
    /// The HTML parser synthesizes a body for ordinary pages; frameset
    /// documents have none.
    pub fn body(&self) -> Option<PageNode<'_>> {
        self.html
            .root_element()
            .children()
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().name() == "body")
            .map(|element| PageNode::element(element, &self.stylesheet))
    }

    /// Gets the title of the document.
    ///
    /// Returns the whitespace-collapsed content of the first `<title>`, or
    /// `None` when it is missing or blank.
    pub fn title(&self) -> Option<String> {
        let selector = Selector::parse("title").ok()?;
        let title = self.html.select(&selector).next()?;
        let title = collapse_whitespace(&title.text().collect::<String>());
        if title.is_empty() { None } else { Some(title) }
    }

    /// Selects elements using a CSS selector.
    ///
    /// # Errors
    ///
    /// Returns [`PrecisError::InvalidSelector`] if the selector does not parse.
    pub fn select(&self, selector: &str) -> Result<Vec<PageNode<'_>>> {
        let sel = Selector::parse(selector).map_err(|e| PrecisError::InvalidSelector(format!("{selector}: {e}")))?;

        Ok(self.html.select(&sel).map(|el| PageNode::element(el, &self.stylesheet)).collect())
    }
}

#[derive(Debug, Clone, Copy)]
enum Inner<'a> {
    Element(ElementRef<'a>),
    Text(&'a str),
    Other,
}

/// A node of a [`Document`], borrowed for the duration of a walk.
#[derive(Debug, Clone, Copy)]
pub struct PageNode<'a> {
    inner: Inner<'a>,
    stylesheet: &'a StyleSheet,
}

impl<'a> PageNode<'a> {
    fn element(element: ElementRef<'a>, stylesheet: &'a StyleSheet) -> Self {
        Self { inner: Inner::Element(element), stylesheet }
    }

    /// The lowercase tag name, for element nodes.
    pub fn tag_name(&self) -> Option<&'a str> {
        match self.inner {
            Inner::Element(element) => Some(element.value().name()),
            _ => None,
        }
    }

    /// Gets the value of an attribute, for element nodes.
    pub fn attr(&self, name: &str) -> Option<&'a str> {
        match self.inner {
            Inner::Element(element) => element.value().attr(name),
            _ => None,
        }
    }

    /// Concatenation of every descendant text node, hidden or not.
    pub fn raw_text(&self) -> String {
        match self.inner {
            Inner::Element(element) => element.text().collect(),
            Inner::Text(text) => text.to_string(),
            Inner::Other => String::new(),
        }
    }
}

impl<'a> TreeNode for PageNode<'a> {
    type Selector = Selector;

    fn compile_selector(source: &str) -> std::result::Result<Selector, String> {
        Selector::parse(source).map_err(|e| e.to_string())
    }

    fn kind(&self) -> NodeKind<'_> {
        match self.inner {
            Inner::Element(element) => NodeKind::Element(element.value().name()),
            Inner::Text(text) => NodeKind::Text(text),
            Inner::Other => NodeKind::Other,
        }
    }

    fn children(&self) -> impl Iterator<Item = Self> {
        let stylesheet = self.stylesheet;
        let element = match self.inner {
            Inner::Element(element) => Some(element),
            _ => None,
        };

        element.into_iter().flat_map(|element| element.children()).map(move |child| {
            let inner = match child.value() {
                Node::Element(_) => ElementRef::wrap(child).map_or(Inner::Other, Inner::Element),
                Node::Text(text) => Inner::Text(&**text),
                _ => Inner::Other,
            };
            PageNode { inner, stylesheet }
        })
    }

    fn computed_style(&self, inherited: Option<&ComputedStyle>) -> ComputedStyle {
        let Inner::Element(element) = self.inner else {
            return inherited.copied().unwrap_or_default();
        };

        if let Some(parent) = inherited {
            return self.stylesheet.computed_style(element, Some(parent));
        }

        let mut ancestors: Vec<ElementRef<'a>> = element.ancestors().filter_map(ElementRef::wrap).collect();
        ancestors.reverse();
        let parent = ancestors.into_iter().fold(None, |parent: Option<ComputedStyle>, ancestor| {
            Some(self.stylesheet.computed_style(ancestor, parent.as_ref()))
        });

        self.stylesheet.computed_style(element, parent.as_ref())
    }

    fn matches(&self, selector: &Selector) -> bool {
        match self.inner {
            Inner::Element(element) => selector.matches(&element),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_HTML: &str = r#"
        <!DOCTYPE html>
        <html lang="en">
        <head>
            <meta charset="UTF-8">
            <title>  Test
                Page </title>
            <style>.muted { opacity: 0 }</style>
        </head>
        <body>
            <h1>Heading</h1>
            <p class="content">Paragraph 1</p>
            <p class="content muted">Paragraph 2</p>
            <!-- note -->
        </body>
        </html>
    "#;

    #[test]
    fn test_parse_document() {
        let doc = Document::parse(SAMPLE_HTML);
        assert_eq!(doc.title(), Some("Test Page".to_string()));
        assert_eq!(doc.stylesheet().len(), 1);
    }

    #[test]
    fn test_blank_title_is_none() {
        let doc = Document::parse("<html><head><title>   </title></head><body></body></html>");
        assert_eq!(doc.title(), None);
    }

    #[test]
    fn test_body_is_synthesized() {
        let doc = Document::parse("<p>Loose paragraph</p>");
        let body = doc.body().unwrap();
        assert_eq!(body.tag_name(), Some("body"));
        assert!(body.raw_text().contains("Loose paragraph"));
    }

    #[test]
    fn test_frameset_has_no_body() {
        let doc = Document::parse("<html><frameset><frame src='a.html'></frameset></html>");
        assert!(doc.body().is_none());
    }

    #[test]
    fn test_children_kinds_in_order() {
        let doc = Document::parse("<body>Lead<b>bold</b><!-- c --></body>");
        let body = doc.body().unwrap();
        let kinds: Vec<_> = body.children().map(|child| format!("{:?}", child.kind())).collect();
        assert_eq!(kinds, vec![r#"Text("Lead")"#, r#"Element("b")"#, "Other"]);
    }

    #[test]
    fn test_select_and_matches() {
        let doc = Document::parse(SAMPLE_HTML);
        let elements = doc.select("p.content").unwrap();
        assert_eq!(elements.len(), 2);
        assert_eq!(elements[1].attr("class"), Some("content muted"));

        let muted = PageNode::compile_selector(".muted").unwrap();
        assert!(!elements[0].matches(&muted));
        assert!(elements[1].matches(&muted));
    }

    #[test]
    fn test_invalid_selector() {
        let doc = Document::parse(SAMPLE_HTML);
        assert!(matches!(doc.select("[[invalid"), Err(PrecisError::InvalidSelector(_))));
        assert!(PageNode::compile_selector(":::bad-selector").is_err());
    }

    #[test]
    fn test_computed_style_resolves_ancestors() {
        let doc = Document::parse("<body style='visibility:hidden'><div><p id='x'>t</p></div></body>");
        let p = doc.select("#x").unwrap()[0];
        assert!(!p.computed_style(None).is_rendered());
    }

    #[test]
    fn test_computed_style_from_sheet() {
        let doc = Document::parse(SAMPLE_HTML);
        let paragraphs = doc.select("p").unwrap();
        assert!(paragraphs[0].computed_style(None).is_rendered());
        assert!(!paragraphs[1].computed_style(None).is_rendered());
    }
}
