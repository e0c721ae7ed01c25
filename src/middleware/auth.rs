use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::json;
use std::collections::BTreeMap;
use tracing::{debug, warn};

use super::{Interceptor, Next, RequestContext};
use crate::error::DispatchResult;
use crate::server::Response;

/// Treats every caller as anonymous.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughAuthentication;

impl Interceptor for PassthroughAuthentication {
    fn intercept(&self, next: Next<'_>, ctx: &mut RequestContext) -> DispatchResult<Response> {
        ctx.user = None;
        next.run(ctx)
    }
}

/// HTTP Basic authentication against a fixed credential table.
///
/// - no `Authorization` header: anonymous, the request continues
/// - valid credentials: `ctx.user` is set to the user name
/// - anything else: 401 with a `WWW-Authenticate` challenge
#[derive(Debug, Clone, Default)]
pub struct BasicAuthentication {
    realm: String,
    users: BTreeMap<String, String>,
}

impl BasicAuthentication {
    pub fn new(realm: impl Into<String>) -> Self {
        Self {
            realm: realm.into(),
            users: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_user(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.users.insert(user.into(), password.into());
        self
    }

    /// User name for a valid `Authorization` value.
    fn identify(&self, header: &str) -> Option<String> {
        let (scheme, encoded) = header.trim().split_once(' ')?;
        if !scheme.eq_ignore_ascii_case("basic") {
            return None;
        }
        let decoded = STANDARD.decode(encoded.trim()).ok()?;
        let decoded = String::from_utf8(decoded).ok()?;
        let (user, password) = decoded.split_once(':')?;
        match self.users.get(user) {
            Some(expected) if expected == password => Some(user.to_string()),
            _ => None,
        }
    }

    fn challenge(&self) -> Response {
        Response::new(
            401,
            Default::default(),
            json!({ "error": "unauthorized" }).to_string().into_bytes(),
        )
        .with_header("Content-Type", "application/json; charset=utf-8")
        .with_header("WWW-Authenticate", format!("Basic realm=\"{}\"", self.realm))
    }
}

impl Interceptor for BasicAuthentication {
    fn intercept(&self, next: Next<'_>, ctx: &mut RequestContext) -> DispatchResult<Response> {
        ctx.user = None;
        let Some(header) = ctx.request.get_header("authorization") else {
            debug!(request_id = %ctx.request.request_id, "Anonymous request");
            return next.run(ctx);
        };
        match self.identify(header) {
            Some(user) => {
                debug!(request_id = %ctx.request.request_id, user = %user, "Authenticated");
                ctx.user = Some(user);
                next.run(ctx)
            }
            None => {
                warn!(request_id = %ctx.request.request_id, "Rejected credentials");
                Ok(self.challenge())
            }
        }
    }
}
