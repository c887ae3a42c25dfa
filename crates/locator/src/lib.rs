// ABOUTME: Main library entry point for the web2api locator engine.
// ABOUTME: Re-exports the public API: LocatorPath, TrustModel, PathMatcher, HtmlTree, hosts and errors.

//! web2api - fuzzy locator paths for turning web pages into APIs.
//!
//! A [`LocatorPath`] records where an element sat in a page: its tag, id and
//! class and those of its ancestors. [`PathMatcher`] finds every element of a
//! (possibly changed) document whose ancestry still resembles the path, and
//! scores each with a trust value from a [`TrustModel`].
//!
//! # Example
//!
//! ```
//! use web2api_locator::{HtmlTree, LocatorPath, PathMatcher, TrustModel, TrustParams};
//!
//! let model = TrustModel::new(TrustParams {
//!     depth_decay: 1.0,
//!     id_weight: 0.6,
//!     class_weight: 0.4,
//!     rampup_span: 1.0,
//!     prefilter_threshold: 0.7,
//!     accept_threshold: 0.1,
//! })
//! .unwrap();
//!
//! let tree = HtmlTree::parse_document(
//!     r#"<div id="product" class="card"><h1 id="name">Kettle</h1></div>"#,
//! );
//! let path = LocatorPath::parse("<text><h1>name,<div>product,card");
//! let matches = PathMatcher::new(&model).find_all(&tree, &path);
//! assert_eq!(tree.resolve(matches[0].node, path.target()).as_deref(), Some("Kettle"));
//! ```
//!
//! Site definitions live in `.host.config` files; see [`HostRegistry`].

pub mod dom;
pub mod error;
pub mod group;
pub mod host;
pub mod matcher;
pub mod path;
pub mod registry;
pub mod resource;
pub mod session;
pub mod similarity;
pub mod trust;

pub use crate::dom::{HtmlTree, Node, NodeIndex, TreeBuilder};
pub use crate::error::{ErrorCode, Result, Web2ApiError};
pub use crate::group::{ElementGroup, Extraction, FieldError, FieldValue};
pub use crate::host::{DisplayListing, HostConfig, ItemRecord, QueryResult, SearchableHost};
pub use crate::matcher::{MatchResult, PathMatcher};
pub use crate::path::{LocatorPath, ParseMode, PathSegment};
pub use crate::registry::{HostRegistry, Request, DEFAULT_HOST_FILE_EXT};
pub use crate::session::{Session, SessionBuilder, SessionOptions};
pub use crate::similarity::{NormalizedLevenshtein, Similarity, SorensenDice};
pub use crate::trust::{TrustModel, TrustParams};
