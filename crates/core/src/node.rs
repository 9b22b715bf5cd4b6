//! Read-only view of a rendered document tree.
//!
//! The extractor is written against [`TreeNode`] rather than a concrete DOM so
//! that any tree able to report node kinds, children, computed styles and
//! selector matches can be walked. [`crate::PageNode`] implements it for
//! documents parsed with `scraper`.

use crate::style::ComputedStyle;

/// What a node is, as far as text extraction cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind<'n> {
    /// An element, with its lowercase tag name.
    Element(&'n str),
    /// A text node, with its raw content.
    Text(&'n str),
    /// Comments, doctypes, processing instructions and anything else.
    Other,
}

/// A node of a document tree that the extractor can walk without mutating.
pub trait TreeNode: Sized {
    /// A compiled selector usable with [`TreeNode::matches`].
    type Selector;

    /// Compiles a selector string, reporting why it is unusable.
    fn compile_selector(source: &str) -> Result<Self::Selector, String>;

    fn kind(&self) -> NodeKind<'_>;

    /// Child nodes in document order.
    fn children(&self) -> impl Iterator<Item = Self>;

    /// Effective style of this node.
    ///
    /// `inherited` is the computed style of the parent when the caller already
    /// has it; with `None` the implementation resolves the ancestor chain itself.
    fn computed_style(&self, inherited: Option<&ComputedStyle>) -> ComputedStyle;

    /// Whether this node matches `selector`. Non-elements never match.
    fn matches(&self, selector: &Self::Selector) -> bool;
}
