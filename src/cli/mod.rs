//! # CLI Module
//!
//! Command-line access to a configuration without any transport in front of
//! it. Every resource is bound to an [`EchoDao`](crate::daos::EchoDao), so the
//! output shows exactly what routing and dispatch decided.
//!
//! ## Commands
//!
//! ### `check`
//!
//! Load the configuration, build the resource graph and report it:
//!
//! ```bash
//! crudrouter check --config config.yaml
//! ```
//!
//! ### `route`
//!
//! Dispatch one request and print the node, captured ids, bulk flag,
//! controller, and the final response:
//!
//! ```bash
//! crudrouter route --config config.yaml GET /authors/5/articles
//! crudrouter route --config config.yaml POST /articles/_bulk --body '[{"id": 1}]'
//! ```

mod commands;


pub use commands::{run, run_cli, Cli, Commands};
