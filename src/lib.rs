//! # crudrouter
//!
//! A transport-agnostic CRUD dispatcher. A request path is resolved against a
//! graph of named resources, handed to the per-resource [`Node`](node::Node),
//! which picks a collection, instance or bulk controller, and the controller
//! calls the data-access object bound to that resource.
//!
//! ## Architecture Overview
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Client
//!     participant Service as AppService
//!     participant Router
//!     participant Pipeline as Interceptor Pipeline
//!     participant Node
//!     participant Controller
//!     participant Dao
//!
//!     Client->>Service: CrudRequest (method, path, headers, body)
//!     Service->>Router: route(path)
//!     alt Unknown resource / empty path
//!         Router-->>Client: 404 Not Found
//!     end
//!     Router-->>Service: Node + url_params + flags
//!     Service->>Pipeline: session → authentication → authorization → caching
//!     Pipeline->>Node: call(request, url_params, flags)
//!     Node->>Controller: resource | instance | bulk
//!     alt Verb not supported
//!         Controller-->>Client: 405 Method Not Allowed + Allow
//!     end
//!     Controller->>Dao: create / query / get / update / patch / delete / bulk_*
//!     Dao-->>Controller: Outcome
//!     Controller-->>Node: Outcome
//!     Node-->>Pipeline: normalized Response
//!     Pipeline-->>Service: Response (post-processing in reverse order)
//!     Service-->>Client: Response
//! ```
//!
//! ## Path Navigation
//!
//! Paths are read as `(resource, id)` pairs: `/authors/5/articles/7` is
//! `(authors, 5)` then `(articles, 7)`. The final pair names the target
//! resource; every earlier pair lands in [`UrlParams`]. A final resource named
//! `_bulk` is a sentinel that turns on bulk mode for the preceding resource.
//!
//! - [`Navigation::Flat`] only checks the final resource name against the graph
//! - [`Navigation::Tree`] walks the graph from a root and rejects any step that
//!   is not a child of the previous one
//!
//! ## Quick Start
//!
//! ```no_run
//! use crudrouter::daos::MemoryDao;
//! use crudrouter::{AppService, CrudRequest, DaoRegistry, GraphSpec, Navigation, ResourceTree, Router};
//!
//! let graph = GraphSpec::new()
//!     .child("authors", GraphSpec::new().leaf("articles"))
//!     .leaf("articles");
//! let daos = DaoRegistry::new()
//!     .bind("authors", MemoryDao::new("authors"))
//!     .bind("articles", MemoryDao::new("articles"));
//!
//! let tree = ResourceTree::build(&graph, &daos).expect("valid graph");
//! let service = AppService::new(Router::new(Navigation::Tree, tree));
//!
//! let res = service.handle(CrudRequest::get("/authors/5/articles"));
//! assert_eq!(res.status, 200);
//! ```
//!
//! ## Modules
//!
//! - [`router`] - tokenizer, resource graph and the two navigation strategies
//! - [`node`] - controller selection and response normalization
//! - [`controllers`] - verb tables for resource, instance and bulk controllers
//! - [`dao`] - the data-access contract and the resource → DAO registry
//! - [`daos`] - bundled in-memory and echo DAOs
//! - [`middleware`] - the fixed four-layer interceptor pipeline
//! - [`negotiation`] - codec registry and `Accept`/`Content-Type` handling
//! - [`server`] - request/response values and the [`AppService`] entry point
//! - [`config`] - YAML application configuration
//! - [`logging`] - structured logging setup
//! - [`cli`] - the `crudrouter` command-line tool

pub mod cli;
pub mod config;
pub mod controllers;
pub mod dao;
pub mod daos;
pub mod error;
pub mod logging;
pub mod middleware;
pub mod negotiation;
pub mod node;
pub mod params;
pub mod router;
pub mod server;

pub use config::AppConfig;
pub use dao::{Dao, DaoRegistry, Outcome};
pub use error::{ConfigError, DispatchError, DispatchResult};
pub use middleware::{Interceptor, Pipeline, RequestContext};
pub use negotiation::{Codec, Serialization};
pub use node::Node;
pub use params::{Flags, QueryParams, UrlParams};
pub use router::{GraphSpec, Navigation, ResourceTree, Routed, Router};
pub use server::{AppService, CrudRequest, Response};
