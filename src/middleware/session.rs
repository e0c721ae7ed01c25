use super::{Interceptor, Next, RequestContext};
use crate::error::DispatchResult;
use crate::server::Response;

/// Leaves the session empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSession;

impl Interceptor for NoSession {
    fn intercept(&self, next: Next<'_>, ctx: &mut RequestContext) -> DispatchResult<Response> {
        ctx.session.clear();
        next.run(ctx)
    }
}

/// Session stored client-side in cookies.
///
/// Loads every request cookie into the session on the way in and writes each
/// session entry back as a `Set-Cookie` on the way out, so entries added by
/// inner layers reach the client.
#[derive(Debug, Clone, Copy, Default)]
pub struct CookieSession;

impl Interceptor for CookieSession {
    fn intercept(&self, next: Next<'_>, ctx: &mut RequestContext) -> DispatchResult<Response> {
        ctx.session = ctx.request.cookies().into_iter().collect();
        let mut res = next.run(ctx)?;
        for (name, value) in &ctx.session {
            res.set_cookie(name, value);
        }
        Ok(res)
    }
}
