use super::{Interceptor, Next, RequestContext};
use crate::error::DispatchResult;
use crate::server::Response;

/// Allows everything and filters nothing.
///
/// A policy layer would inspect `ctx.user`, `ctx.session` and the routing
/// information before calling `next`, and filter the response after it.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughAuthorization;

impl Interceptor for PassthroughAuthorization {
    fn intercept(&self, next: Next<'_>, ctx: &mut RequestContext) -> DispatchResult<Response> {
        next.run(ctx)
    }
}
