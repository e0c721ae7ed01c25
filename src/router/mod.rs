//! # Router Module
//!
//! Resolves a request path to the [`Node`](crate::node::Node) that handles it,
//! along with the ids captured on the way and the routing flags.
//!
//! ## Overview
//!
//! Routing happens in three steps:
//!
//! 1. **Tokenization**: the path is split into non-empty, percent-decoded
//!    segments and grouped two at a time into `(resource_name, id)` pairs
//!    ([`tokenizer`]).
//! 2. **Navigation**: pairs are resolved against the [`ResourceTree`] with one
//!    of two strategies, fixed when the router is built:
//!    - [`Navigation::Flat`] captures every id but only looks up the *final*
//!      resource name, in the top-level table;
//!    - [`Navigation::Tree`] walks the graph, so each resource name must be a
//!      declared child of the one before it.
//! 3. **Capture**: an id equal to [`BULK_ROUTE`] sets the bulk flag instead of
//!    being recorded; any other id is stored in [`UrlParams`](crate::params::UrlParams).
//!
//! The empty path is answered by the root handler when one is configured.
//!
//! ## Example
//!
//! ```rust,ignore
//! use crudrouter::router::{GraphSpec, Navigation, ResourceTree, Routed, Router};
//!
//! let spec = GraphSpec::new().leaf("articles").leaf("authors");
//! let router = Router::new(Navigation::Flat, ResourceTree::build(&spec, &daos)?);
//!
//! if let Routed::Node(m) = router.route("/authors/5/articles")? {
//!     assert_eq!(m.node.name(), "articles");
//!     assert_eq!(m.url_params.get("authors"), Some("5"));
//! }
//! ```

mod core;
mod graph;
pub mod tokenizer;

pub use core::{reverse, Navigation, RootHandler, RouteMatch, Routed, Router, BULK_ROUTE};
pub use graph::{Branch, GraphSpec, ResourceTree, TreeEntry};
