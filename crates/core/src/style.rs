//! Computed style resolution for the properties that decide visibility.
//!
//! Only `display`, `visibility` and `opacity` are resolved. Declarations come
//! from three origins, lowest priority first:
//!
//! 1. user-agent defaults (`display: none` for `head`, `script`, `[hidden]`, ...)
//! 2. author `<style>` sheets, in document order
//! 3. the inline `style` attribute
//!
//! Within author and inline origins the usual cascade applies: `!important`
//! first, then specificity, then source order. `visibility` inherits, the other
//! two do not unless declared `inherit`.
//!
//! # Example
//!
//! ```rust
//! use precis_core::Document;
//!
//! let doc = Document::parse(r#"
//!     <style>.collapsed { display: none }</style>
//!     <body><div class="collapsed">Panel</div><p>Shown</p></body>
//! "#);
//! assert!(!doc.stylesheet().is_empty());
//! ```

use std::iter::Peekable;
use std::str::Chars;

use scraper::{ElementRef, Html, Selector};

/// Elements the user-agent stylesheet never renders.
const UA_HIDDEN_TAGS: &[&str] = &[
    "area", "base", "datalist", "head", "link", "meta", "noembed", "noframes", "param", "rp", "script", "style",
    "template", "title",
];

/// Inline declarations outrank every selector.
const INLINE_SPECIFICITY: u32 = u32::MAX;

/// Grouping at-rules whose inner rules still apply to a screen.
const GROUPING_AT_RULES: &[&str] = &["@media", "@supports", "@layer", "@container", "@document"];

/// Computed `display`, reduced to whether the box is generated at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Display {
    #[default]
    Shown,
    None,
}

/// Computed `visibility`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Visible,
    Hidden,
    Collapse,
}

/// The resolved values of the visibility-related properties of one element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComputedStyle {
    pub display: Display,
    pub visibility: Visibility,
    /// Clamped to `[0, 1]`.
    pub opacity: f32,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self { display: Display::Shown, visibility: Visibility::Visible, opacity: 1.0 }
    }
}

impl ComputedStyle {
    /// Whether a sighted reader can see this element's content.
    ///
    /// `display: none`, `visibility: hidden|collapse` and `opacity: 0` all hide it.
    pub fn is_rendered(&self) -> bool {
        self.display != Display::None && self.visibility == Visibility::Visible && self.opacity > 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Declared<T> {
    Value(T),
    Inherit,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Property {
    Display(Declared<Display>),
    Visibility(Declared<Visibility>),
    Opacity(Declared<f32>),
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Declaration {
    property: Property,
    important: bool,
    source_order: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct CascadePriority {
    important: bool,
    specificity: u32,
    source_order: usize,
}

#[derive(Debug, Clone)]
struct StyleRule {
    selector: Selector,
    specificity: u32,
    declarations: Vec<Declaration>,
}

/// Winning declared value per property for a single element.
#[derive(Debug, Default)]
struct Cascaded {
    display: Option<(Declared<Display>, CascadePriority)>,
    visibility: Option<(Declared<Visibility>, CascadePriority)>,
    opacity: Option<(Declared<f32>, CascadePriority)>,
}

impl Cascaded {
    fn apply(&mut self, declaration: &Declaration, specificity: u32) {
        let priority =
            CascadePriority { important: declaration.important, specificity, source_order: declaration.source_order };
        match declaration.property {
            Property::Display(value) => apply_cascade_value(&mut self.display, value, priority),
            Property::Visibility(value) => apply_cascade_value(&mut self.visibility, value, priority),
            Property::Opacity(value) => apply_cascade_value(&mut self.opacity, value, priority),
        }
    }
}

fn apply_cascade_value<T>(slot: &mut Option<(T, CascadePriority)>, value: T, priority: CascadePriority) {
    match slot {
        Some((_, current)) if priority < *current => {}
        _ => *slot = Some((value, priority)),
    }
}

/// Author style rules collected from a document's `<style>` elements.
#[derive(Debug, Clone, Default)]
pub struct StyleSheet {
    rules: Vec<StyleRule>,
}

impl StyleSheet {
    /// Parses a CSS source, keeping only rules that declare a visibility property.
    ///
    /// Rules whose selector `scraper` cannot compile are dropped.
    pub fn parse(css: &str) -> Self {
        let mut sheet = Self::default();
        let source = strip_css_comments(css);
        let mut source_order = 0;
        sheet.collect_rules(&source, &mut source_order);
        sheet
    }

    /// Collects every `<style>` element of `html` that applies to a screen.
    ///
    /// Sheets inside `<noscript>` and sheets whose `media` attribute targets
    /// print only are skipped.
    pub fn from_html(html: &Html) -> Self {
        let mut css = String::new();
        for element in html.root_element().descendants().filter_map(ElementRef::wrap) {
            if element.value().name() != "style" {
                continue;
            }
            if element.value().attr("media").is_some_and(|media| !media_applies(media)) {
                continue;
            }
            let in_noscript = element
                .ancestors()
                .filter_map(ElementRef::wrap)
                .any(|ancestor| ancestor.value().name() == "noscript");
            if in_noscript {
                continue;
            }
            css.extend(element.text());
            css.push('\n');
        }
        Self::parse(&css)
    }

    /// Number of selector rules kept.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Resolves the computed style of `element`.
    ///
    /// `inherited` is the computed style of the parent element; `None` means
    /// the element is treated as a root and inherits initial values.
    pub fn computed_style(&self, element: ElementRef<'_>, inherited: Option<&ComputedStyle>) -> ComputedStyle {
        let mut cascaded = Cascaded::default();

        for rule in &self.rules {
            if rule.selector.matches(&element) {
                for declaration in &rule.declarations {
                    cascaded.apply(declaration, rule.specificity);
                }
            }
        }

        if let Some(inline) = element.value().attr("style") {
            let mut source_order = 0;
            for declaration in parse_declarations(inline, &mut source_order) {
                cascaded.apply(&declaration, INLINE_SPECIFICITY);
            }
        }

        let parent = inherited.copied().unwrap_or_default();

        let display = match cascaded.display {
            Some((Declared::Value(value), _)) => value,
            Some((Declared::Inherit, _)) => parent.display,
            None => ua_display(element),
        };
        let visibility = match cascaded.visibility {
            Some((Declared::Value(value), _)) => value,
            Some((Declared::Inherit, _)) | None => parent.visibility,
        };
        let opacity = match cascaded.opacity {
            Some((Declared::Value(value), _)) => value,
            Some((Declared::Inherit, _)) => parent.opacity,
            None => 1.0,
        };

        ComputedStyle { display, visibility, opacity }
    }

    fn collect_rules(&mut self, input: &str, source_order: &mut usize) {
        let mut cursor = 0;
        while let Some(block) = next_css_block(input, cursor) {
            cursor = block.end;
            let prelude = block.prelude.trim();

            if prelude.starts_with('@') {
                if let Some(body) = block.body
                    && grouping_rule_applies(prelude)
                {
                    self.collect_rules(body, source_order);
                }
                continue;
            }

            let Some(body) = block.body else { continue };
            let declarations = parse_declarations(body, source_order);
            if declarations.is_empty() {
                continue;
            }

            for part in split_css_top_level(prelude, ',') {
                let part = part.trim();
                if part.is_empty() {
                    continue;
                }
                if let Ok(selector) = Selector::parse(part) {
                    self.rules.push(StyleRule {
                        selector,
                        specificity: selector_specificity(part),
                        declarations: declarations.clone(),
                    });
                }
            }
        }
    }
}

fn ua_display(element: ElementRef<'_>) -> Display {
    let el = element.value();
    let closed_dialog = el.name() == "dialog" && el.attr("open").is_none();
    if closed_dialog || UA_HIDDEN_TAGS.contains(&el.name()) || el.attr("hidden").is_some() {
        Display::None
    } else {
        Display::Shown
    }
}

/// One top-level CSS construct: a rule block, or an at-rule statement without a block.
struct CssBlock<'a> {
    prelude: &'a str,
    body: Option<&'a str>,
    end: usize,
}

fn next_css_block(input: &str, from: usize) -> Option<CssBlock<'_>> {
    let bytes = input.as_bytes();
    let mut start = from;
    while start < bytes.len() && (bytes[start].is_ascii_whitespace() || bytes[start] == b';') {
        start += 1;
    }
    if start >= bytes.len() {
        return None;
    }

    let is_at_rule = bytes[start] == b'@';
    let mut quote: Option<u8> = None;
    let mut depth = 0usize;
    let mut idx = start;

    while idx < bytes.len() {
        let byte = bytes[idx];
        match quote {
            Some(q) => {
                if byte == b'\\' {
                    idx += 1;
                } else if byte == q {
                    quote = None;
                }
            }
            None => match byte {
                b'"' | b'\'' => quote = Some(byte),
                b'(' | b'[' => depth += 1,
                b')' | b']' => depth = depth.saturating_sub(1),
                b';' if is_at_rule && depth == 0 => {
                    return Some(CssBlock { prelude: &input[start..idx], body: None, end: idx + 1 });
                }
                b'{' if depth == 0 => {
                    let close = find_matching_brace(input, idx);
                    let body_end = close.unwrap_or(input.len());
                    let end = close.map_or(input.len(), |c| c + 1);
                    return Some(CssBlock { prelude: &input[start..idx], body: Some(&input[idx + 1..body_end]), end });
                }
                _ => {}
            },
        }
        idx += 1;
    }

    None
}

fn find_matching_brace(input: &str, open: usize) -> Option<usize> {
    let bytes = input.as_bytes();
    let mut quote: Option<u8> = None;
    let mut depth = 0usize;
    let mut idx = open;

    while idx < bytes.len() {
        let byte = bytes[idx];
        match quote {
            Some(q) => {
                if byte == b'\\' {
                    idx += 1;
                } else if byte == q {
                    quote = None;
                }
            }
            None => match byte {
                b'"' | b'\'' => quote = Some(byte),
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(idx);
                    }
                }
                _ => {}
            },
        }
        idx += 1;
    }

    None
}

fn grouping_rule_applies(prelude: &str) -> bool {
    let lower = prelude.to_ascii_lowercase();
    let Some(keyword) = GROUPING_AT_RULES.iter().find(|keyword| lower.starts_with(*keyword)) else {
        return false;
    };
    if *keyword == "@media" { media_applies(&lower[keyword.len()..]) } else { true }
}

/// Whether a media query list can match a screen.
///
/// Only the media type is considered; feature queries are assumed to match.
fn media_applies(query: &str) -> bool {
    let query = query.trim().to_ascii_lowercase();
    if query.is_empty() {
        return true;
    }

    query.split(',').any(|part| {
        let part = part.trim();
        let part = part.strip_prefix("only ").unwrap_or(part).trim_start();
        if let Some(negated) = part.strip_prefix("not ") {
            let negated = negated.trim_start();
            return !(negated.starts_with("screen") || negated.starts_with("all"));
        }
        !(part.starts_with("print") || part.starts_with("speech"))
    })
}

fn parse_declarations(input: &str, source_order: &mut usize) -> Vec<Declaration> {
    let mut out = Vec::new();

    for chunk in split_css_top_level(input, ';') {
        let Some((name, value)) = chunk.split_once(':') else {
            continue;
        };
        let name = name.trim().to_ascii_lowercase();
        let (value, important) = split_important(value);

        if let Some(property) = parse_property(&name, value) {
            out.push(Declaration { property, important, source_order: *source_order });
            *source_order += 1;
        }
    }

    out
}

fn parse_property(name: &str, value: &str) -> Option<Property> {
    let value = value.trim().to_ascii_lowercase();
    if value.is_empty() {
        return None;
    }

    match name {
        "display" => {
            let declared = match value.as_str() {
                "none" => Declared::Value(Display::None),
                "inherit" => Declared::Inherit,
                other if other.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == ' ') => {
                    Declared::Value(Display::Shown)
                }
                _ => return None,
            };
            Some(Property::Display(declared))
        }
        "visibility" => {
            let declared = match value.as_str() {
                "visible" | "initial" | "revert" => Declared::Value(Visibility::Visible),
                "hidden" => Declared::Value(Visibility::Hidden),
                "collapse" => Declared::Value(Visibility::Collapse),
                "inherit" | "unset" => Declared::Inherit,
                _ => return None,
            };
            Some(Property::Visibility(declared))
        }
        "opacity" => {
            let declared = match value.as_str() {
                "inherit" => Declared::Inherit,
                "initial" | "unset" | "revert" => Declared::Value(1.0),
                other => Declared::Value(parse_opacity(other)?),
            };
            Some(Property::Opacity(declared))
        }
        _ => None,
    }
}

fn parse_opacity(value: &str) -> Option<f32> {
    let parsed = match value.strip_suffix('%') {
        Some(percent) => percent.trim().parse::<f32>().ok()? / 100.0,
        None => value.parse::<f32>().ok()?,
    };
    parsed.is_finite().then(|| parsed.clamp(0.0, 1.0))
}

fn split_important(value: &str) -> (&str, bool) {
    let trimmed = value.trim();
    let Some(bang) = trimmed.rfind('!') else {
        return (trimmed, false);
    };
    if trimmed[bang + 1..].trim().eq_ignore_ascii_case("important") {
        (trimmed[..bang].trim_end(), true)
    } else {
        (trimmed, false)
    }
}

/// Splits on `delimiter` outside of quotes, parentheses and brackets.
fn split_css_top_level(input: &str, delimiter: char) -> Vec<&str> {
    let mut out = Vec::new();
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut depth = 0usize;
    let mut start = 0;

    for (idx, ch) in input.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match quote {
            Some(q) => {
                if ch == '\\' {
                    escaped = true;
                } else if ch == q {
                    quote = None;
                }
            }
            None => match ch {
                '\\' => escaped = true,
                '"' | '\'' => quote = Some(ch),
                '(' | '[' => depth += 1,
                ')' | ']' => depth = depth.saturating_sub(1),
                c if c == delimiter && depth == 0 => {
                    out.push(&input[start..idx]);
                    start = idx + c.len_utf8();
                }
                _ => {}
            },
        }
    }
    out.push(&input[start..]);

    out
}

fn strip_css_comments(css: &str) -> String {
    let mut out = String::with_capacity(css.len());
    let mut chars = css.chars().peekable();
    let mut quote: Option<char> = None;

    while let Some(ch) = chars.next() {
        if let Some(q) = quote {
            out.push(ch);
            if ch == '\\' {
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            } else if ch == q {
                quote = None;
            }
            continue;
        }

        if ch == '/' && chars.peek() == Some(&'*') {
            chars.next();
            let mut previous = '\0';
            for inner in chars.by_ref() {
                if previous == '*' && inner == '/' {
                    break;
                }
                previous = inner;
            }
            out.push(' ');
            continue;
        }

        if ch == '"' || ch == '\'' {
            quote = Some(ch);
        }
        out.push(ch);
    }

    out
}

/// Approximate selector specificity as `ids * 10000 + classes * 100 + types`.
fn selector_specificity(selector: &str) -> u32 {
    let (ids, classes, types) = specificity_parts(selector);
    ids.saturating_mul(10_000).saturating_add(classes.saturating_mul(100)).saturating_add(types)
}

/// `(ids, classes, types)` counts of one complex selector.
///
/// `:is()`, `:not()` and `:has()` count as their most specific argument;
/// `:where()` counts nothing.
fn specificity_parts(selector: &str) -> (u32, u32, u32) {
    let mut ids = 0u32;
    let mut classes = 0u32;
    let mut types = 0u32;
    let mut chars = selector.chars().peekable();
    let mut at_compound_start = true;

    while let Some(ch) = chars.next() {
        match ch {
            '#' => {
                ids += 1;
                take_ident(&mut chars);
                at_compound_start = false;
            }
            '.' => {
                classes += 1;
                take_ident(&mut chars);
                at_compound_start = false;
            }
            '[' => {
                classes += 1;
                for inner in chars.by_ref() {
                    if inner == ']' {
                        break;
                    }
                }
                at_compound_start = false;
            }
            ':' => {
                if chars.peek() == Some(&':') {
                    chars.next();
                    types += 1;
                    take_ident(&mut chars);
                } else {
                    let name = take_ident(&mut chars).to_ascii_lowercase();
                    let args = if chars.peek() == Some(&'(') { take_parenthesized(&mut chars) } else { String::new() };
                    match name.as_str() {
                        "where" => {}
                        "is" | "not" | "has" | "matches" => {
                            let (i, c, t) = split_css_top_level(&args, ',')
                                .into_iter()
                                .map(|part| specificity_parts(part.trim()))
                                .max()
                                .unwrap_or_default();
                            ids = ids.saturating_add(i);
                            classes = classes.saturating_add(c);
                            types = types.saturating_add(t);
                        }
                        _ => classes += 1,
                    }
                }
                at_compound_start = false;
            }
            ' ' | '>' | '+' | '~' => at_compound_start = true,
            '*' => at_compound_start = false,
            c if at_compound_start && (c.is_alphanumeric() || c == '-' || c == '_') => {
                types += 1;
                take_ident(&mut chars);
                at_compound_start = false;
            }
            _ => {}
        }
    }

    (ids, classes, types)
}

fn take_ident(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut ident = String::new();
    while let Some(&c) = chars.peek() {
        if c.is_alphanumeric() || c == '-' || c == '_' {
            ident.push(c);
            chars.next();
        } else {
            break;
        }
    }
    ident
}

/// Consumes a `( ... )` group and returns what is inside the outer parentheses.
fn take_parenthesized(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut inner = String::new();
    let mut depth = 0usize;
    for c in chars.by_ref() {
        match c {
            '(' => {
                depth += 1;
                if depth == 1 {
                    continue;
                }
            }
            ')' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    break;
                }
            }
            _ => {}
        }
        inner.push(c);
    }
    inner
}
