//! # Middleware Module
//!
//! Interceptors wrapped around every Node call, in a fixed order:
//!
//! ```text
//! session → authentication → authorization → caching → Node
//! ```
//!
//! Each layer implements [`Interceptor`] and receives a [`Next`] continuation.
//! A layer either calls `next.run(ctx)` once, optionally post-processing the
//! result, or returns its own response without descending (a cache hit, a
//! rejected credential). Post-logic therefore unwinds in reverse order: the
//! caching layer stores first and the session layer writes cookies last.
//!
//! The default [`Pipeline`] is pass-through in every slot.

mod auth;
mod authorization;
mod caching;
mod core;
mod session;

pub use auth::{BasicAuthentication, PassthroughAuthentication};
pub use authorization::PassthroughAuthorization;
pub use caching::{EtagCache, NoCaching};
pub use core::{Endpoint, Interceptor, Next, Pipeline, RequestContext};
pub use session::{CookieSession, NoSession};
