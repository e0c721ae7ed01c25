use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::{NoCaching, NoSession, PassthroughAuthentication, PassthroughAuthorization};
use crate::error::DispatchResult;
use crate::params::{Flags, UrlParams};
use crate::server::{CrudRequest, Response};

/// Per-request state threaded through the interceptor chain.
///
/// Layers may enrich it on the way in (the session layer fills `session`, the
/// authentication layer sets `user`) for layers further in to consult.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request: CrudRequest,
    pub url_params: UrlParams,
    pub flags: Flags,
    /// Name of the node the request routed to
    pub resource: String,
    pub session: BTreeMap<String, String>,
    /// Authenticated principal, `None` when anonymous
    pub user: Option<String>,
}

impl RequestContext {
    pub fn new(
        request: CrudRequest,
        url_params: UrlParams,
        flags: Flags,
        resource: impl Into<String>,
    ) -> Self {
        Self {
            request,
            url_params,
            flags,
            resource: resource.into(),
            session: BTreeMap::new(),
            user: None,
        }
    }

    /// The request addresses one instance of its resource.
    #[must_use]
    pub fn is_instance(&self) -> bool {
        self.url_params.contains(&self.resource)
    }
}

/// Innermost step of the chain: the Node call.
pub type Endpoint<'a> = &'a dyn Fn(&mut RequestContext) -> DispatchResult<Response>;

/// Continuation handed to an interceptor.
///
/// `run` consumes it, so a layer descends at most once. Not calling it at all
/// short-circuits everything further in.
pub struct Next<'a> {
    rest: &'a [Arc<dyn Interceptor>],
    endpoint: Endpoint<'a>,
}

impl<'a> Next<'a> {
    pub fn new(layers: &'a [Arc<dyn Interceptor>], endpoint: Endpoint<'a>) -> Self {
        Self {
            rest: layers,
            endpoint,
        }
    }

    /// Descend into the next layer, or the endpoint when none remain.
    pub fn run(self, ctx: &mut RequestContext) -> DispatchResult<Response> {
        match self.rest.split_first() {
            Some((layer, rest)) => layer.intercept(
                Next {
                    rest,
                    endpoint: self.endpoint,
                },
                ctx,
            ),
            None => (self.endpoint)(ctx),
        }
    }
}

/// One cross-cutting layer around the Node call.
///
/// Pre-logic runs before `next.run`, post-logic after it returns, which gives
/// LIFO unwinding across the pipeline.
pub trait Interceptor: Send + Sync {
    fn intercept(&self, next: Next<'_>, ctx: &mut RequestContext) -> DispatchResult<Response>;
}

impl<T: Interceptor + ?Sized> Interceptor for Arc<T> {
    fn intercept(&self, next: Next<'_>, ctx: &mut RequestContext) -> DispatchResult<Response> {
        (**self).intercept(next, ctx)
    }
}

const SESSION: usize = 0;
const AUTHENTICATION: usize = 1;
const AUTHORIZATION: usize = 2;
const CACHING: usize = 3;

/// Fixed-order chain: session → authentication → authorization → caching → Node.
///
/// Only the implementation in each slot is configurable, never the order.
#[derive(Clone)]
pub struct Pipeline {
    layers: [Arc<dyn Interceptor>; 4],
}

impl Default for Pipeline {
    fn default() -> Self {
        Self {
            layers: [
                Arc::new(NoSession),
                Arc::new(PassthroughAuthentication),
                Arc::new(PassthroughAuthorization),
                Arc::new(NoCaching),
            ],
        }
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline").finish_non_exhaustive()
    }
}

impl Pipeline {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_session(mut self, layer: impl Interceptor + 'static) -> Self {
        self.layers[SESSION] = Arc::new(layer);
        self
    }

    #[must_use]
    pub fn with_authentication(mut self, layer: impl Interceptor + 'static) -> Self {
        self.layers[AUTHENTICATION] = Arc::new(layer);
        self
    }

    #[must_use]
    pub fn with_authorization(mut self, layer: impl Interceptor + 'static) -> Self {
        self.layers[AUTHORIZATION] = Arc::new(layer);
        self
    }

    #[must_use]
    pub fn with_caching(mut self, layer: impl Interceptor + 'static) -> Self {
        self.layers[CACHING] = Arc::new(layer);
        self
    }

    /// Run `ctx` through every layer and finally `endpoint`.
    pub fn run(
        &self,
        ctx: &mut RequestContext,
        endpoint: &dyn Fn(&mut RequestContext) -> DispatchResult<Response>,
    ) -> DispatchResult<Response> {
        Next::new(&self.layers, endpoint).run(ctx)
    }
}
