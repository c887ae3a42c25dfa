// ABOUTME: DOM access for locator matching.
// ABOUTME: Flattens scraper's HTML document tree into an index arena with parent links.

//! DOM utilities for locator matching.
//!
//! Matching only needs each element's tag, id, class and parent, so documents
//! are flattened once into an [`HtmlTree`] arena. The scraper document is kept
//! alongside to resolve text, inner HTML and attribute targets.

pub mod tree;

pub use tree::{HtmlTree, Node, NodeIndex, TreeBuilder};
