//! Error taxonomy for routing and dispatch.
//!
//! Two families live here:
//!
//! - [`DispatchError`] - per-request failures. Every variant maps onto one
//!   transport status code and is converted into a response at the outermost
//!   request boundary ([`crate::server::AppService::handle`]). Interceptors may
//!   return these to short-circuit the pipeline.
//! - [`ConfigError`] - startup failures raised while building the router or the
//!   resource graph. These are fatal and never surface per request.

use std::fmt;

/// Result alias used throughout the dispatch path.
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Per-request error kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// Unknown resource, empty path without a root handler, or a bulk
    /// sentinel applied to a resource instance.
    RoutingNotFound {
        /// Human readable explanation
        detail: String,
    },
    /// The verb is in the global whitelist but the selected controller does
    /// not support it.
    MethodNotAllowed {
        /// The rejected verb
        method: String,
        /// Verbs the controller does support, sorted
        allowed: Vec<&'static str>,
    },
    /// Verb outside the global whitelist, or a DAO operation the resource does
    /// not implement.
    NotImplemented {
        /// What was not implemented
        detail: String,
    },
    /// The request body could not be decoded.
    BadRequest {
        /// Decoder message
        detail: String,
    },
    /// No registered serializer matches the negotiated output.
    NotAcceptable {
        /// The `Accept` header as received
        accept: String,
    },
    /// Input content type is not registered, or output serialization failed.
    UnsupportedMediaType {
        /// Offending content type or encoder message
        detail: String,
    },
}

impl DispatchError {
    /// Shorthand for [`DispatchError::RoutingNotFound`].
    pub fn not_found(detail: impl Into<String>) -> Self {
        DispatchError::RoutingNotFound {
            detail: detail.into(),
        }
    }

    /// Shorthand for [`DispatchError::NotImplemented`].
    pub fn not_implemented(detail: impl Into<String>) -> Self {
        DispatchError::NotImplemented {
            detail: detail.into(),
        }
    }

    /// Shorthand for [`DispatchError::BadRequest`].
    pub fn bad_request(detail: impl Into<String>) -> Self {
        DispatchError::BadRequest {
            detail: detail.into(),
        }
    }

    /// Shorthand for [`DispatchError::UnsupportedMediaType`].
    pub fn unsupported_media_type(detail: impl Into<String>) -> Self {
        DispatchError::UnsupportedMediaType {
            detail: detail.into(),
        }
    }

    /// Transport status code for this error kind.
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            DispatchError::RoutingNotFound { .. } => 404,
            DispatchError::MethodNotAllowed { .. } => 405,
            DispatchError::NotImplemented { .. } => 501,
            DispatchError::BadRequest { .. } => 400,
            DispatchError::NotAcceptable { .. } => 406,
            DispatchError::UnsupportedMediaType { .. } => 415,
        }
    }

    /// Stable machine-readable name of the error kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            DispatchError::RoutingNotFound { .. } => "routing_not_found",
            DispatchError::MethodNotAllowed { .. } => "method_not_allowed",
            DispatchError::NotImplemented { .. } => "not_implemented",
            DispatchError::BadRequest { .. } => "bad_request",
            DispatchError::NotAcceptable { .. } => "not_acceptable",
            DispatchError::UnsupportedMediaType { .. } => "unsupported_media_type",
        }
    }
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::RoutingNotFound { detail } => write!(f, "not found: {detail}"),
            DispatchError::MethodNotAllowed { method, allowed } => write!(
                f,
                "method {method} not allowed (allowed: {})",
                allowed.join(", ")
            ),
            DispatchError::NotImplemented { detail } => write!(f, "not implemented: {detail}"),
            DispatchError::BadRequest { detail } => write!(f, "bad request: {detail}"),
            DispatchError::NotAcceptable { accept } => {
                write!(f, "no serializer acceptable for '{accept}'")
            }
            DispatchError::UnsupportedMediaType { detail } => {
                write!(f, "unsupported media type: {detail}")
            }
        }
    }
}

impl std::error::Error for DispatchError {}

/// Startup configuration errors.
///
/// Returned while building the router, the resource graph or the application
/// from configuration. None of these can occur once the application is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The navigation strategy name is neither `flat` nor `tree`.
    UnknownNavigation {
        /// The configured name
        name: String,
    },
    /// The graph references a resource that has no DAO bound to it.
    UnboundResource {
        /// Resource name without a DAO
        resource: String,
    },
    /// A link points at a resource that is not a top-level graph entry.
    UnknownLink {
        /// Link target
        target: String,
    },
    /// A resource was declared with an empty name.
    EmptyResourceName,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::UnknownNavigation { name } => write!(
                f,
                "configuration error: invalid navigation method '{name}' (expected 'flat' or 'tree')"
            ),
            ConfigError::UnboundResource { resource } => write!(
                f,
                "configuration error: resource '{resource}' has no DAO bound to it"
            ),
            ConfigError::UnknownLink { target } => write!(
                f,
                "configuration error: link to '{target}' does not name a top-level resource"
            ),
            ConfigError::EmptyResourceName => {
                write!(f, "configuration error: resource names must not be empty")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
