use dashmap::DashMap;
use http::Method;
use sha2::{Digest, Sha512};
use tracing::debug;

use super::{Interceptor, Next, RequestContext};
use crate::error::DispatchResult;
use crate::params::UrlParams;
use crate::server::Response;

/// Never caches.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCaching;

impl Interceptor for NoCaching {
    fn intercept(&self, next: Next<'_>, ctx: &mut RequestContext) -> DispatchResult<Response> {
        next.run(ctx)
    }
}

/// ETag validation cache for instance reads.
///
/// Entries are keyed by the routed request rather than its raw path:
/// `<prefix>:<resource>/<id>?<parent ids>`, so `/articles/1` and
/// `/articles/1/` share one entry while reads under different parents stay
/// apart. Only `GET` on an instance participates:
///
/// - **lookup**: a stored ETag listed in `If-None-Match` answers 304 without
///   descending further;
/// - **store**: a 2xx body is hashed (SHA-512, hex) and the hash is stored and
///   returned in the `ETag` header.
///
/// A write to an instance evicts every entry for that instance, whatever
/// parents it was read under. A bulk write evicts the whole resource.
#[derive(Debug, Default)]
pub struct EtagCache {
    prefix: String,
    etags: DashMap<String, String>,
}

impl EtagCache {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            etags: DashMap::new(),
        }
    }

    fn resource_prefix(&self, resource: &str) -> String {
        format!("{}:{resource}/", self.prefix)
    }

    fn instance_prefix(&self, resource: &str, id: &str) -> String {
        format!("{}:{resource}/{id}?", self.prefix)
    }

    fn key(&self, resource: &str, url_params: &UrlParams) -> Option<String> {
        let id = url_params.get(resource)?;
        let scope = url_params
            .iter()
            .filter(|(name, _)| *name != resource)
            .map(|(name, id)| format!("{name}={id}"))
            .collect::<Vec<_>>()
            .join("&");
        Some(format!("{}{scope}", self.instance_prefix(resource, id)))
    }

    /// Stored ETag for an unscoped read of `resource` instance `id`.
    #[must_use]
    pub fn etag(&self, resource: &str, id: &str) -> Option<String> {
        self.etags
            .get(&self.instance_prefix(resource, id))
            .map(|e| e.value().clone())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.etags.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.etags.is_empty()
    }

    fn evict_prefix(&self, prefix: &str) {
        let before = self.etags.len();
        self.etags.retain(|key, _| !key.starts_with(prefix));
        let evicted = before.saturating_sub(self.etags.len());
        if evicted > 0 {
            debug!(prefix = %prefix, evicted, "ETags evicted");
        }
    }

    fn generate_hash(body: &[u8]) -> String {
        let mut hasher = Sha512::new();
        hasher.update(body);
        format!("{:x}", hasher.finalize())
    }
}

fn if_none_match_contains(header: &str, etag: &str) -> bool {
    header.split(',').any(|candidate| {
        let candidate = candidate.trim();
        let candidate = candidate.strip_prefix("W/").unwrap_or(candidate);
        candidate == "*" || candidate.trim_matches('"') == etag
    })
}

fn is_write(method: &Method) -> bool {
    [Method::POST, Method::PUT, Method::PATCH, Method::DELETE].contains(method)
}

impl Interceptor for EtagCache {
    fn intercept(&self, next: Next<'_>, ctx: &mut RequestContext) -> DispatchResult<Response> {
        let resource = ctx.resource.clone();
        let Some(key) = self.key(&resource, &ctx.url_params) else {
            let bulk_write = ctx.flags.bulk && is_write(&ctx.request.method);
            let res = next.run(ctx)?;
            if bulk_write && res.is_success() {
                self.evict_prefix(&self.resource_prefix(&resource));
            }
            return Ok(res);
        };

        if ctx.request.method != Method::GET {
            let res = next.run(ctx)?;
            if is_write(&ctx.request.method) {
                if let Some(id) = ctx.url_params.get(&resource) {
                    self.evict_prefix(&self.instance_prefix(&resource, id));
                }
            }
            return Ok(res);
        }

        if let Some(stored) = self.etags.get(&key).map(|e| e.value().clone()) {
            let matches = ctx
                .request
                .get_header("if-none-match")
                .is_some_and(|h| if_none_match_contains(h, &stored));
            if matches {
                debug!(key = %key, "ETag hit");
                return Ok(Response::empty(304).with_header("ETag", format!("\"{stored}\"")));
            }
        }

        let mut res = next.run(ctx)?;
        if res.is_success() {
            let etag = Self::generate_hash(&res.body);
            res.set_header("ETag", format!("\"{etag}\""));
            self.etags.insert(key, etag);
        }
        Ok(res)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::Pipeline;
    use crate::params::{Flags, UrlParams};
    use crate::server::CrudRequest;
    use std::sync::Arc;

    fn instance(req: CrudRequest) -> RequestContext {
        let params: UrlParams = [("articles", "1")].into_iter().collect();
        RequestContext::new(req, params, Flags::default(), "articles")
    }

    fn body(_: &mut RequestContext) -> DispatchResult<Response> {
        Ok(Response::new(200, Default::default(), b"{\"id\":1}".to_vec()))
    }

    #[test]
    fn test_store_then_not_modified() {
        let cache = Arc::new(EtagCache::new("crud"));
        let pipeline = Pipeline::new().with_caching(Arc::clone(&cache));

        let res = pipeline.run(&mut instance(CrudRequest::get("/articles/1")), &body).unwrap();
        let etag = res.get_header("ETag").unwrap().to_string();
        assert_eq!(cache.etag("articles", "1").map(|e| format!("\"{e}\"")), Some(etag.clone()));

        let req = CrudRequest::get("/articles/1").with_header("If-None-Match", etag);
        let res = pipeline.run(&mut instance(req), &body).unwrap();
        assert_eq!(res.status, 304);
        assert!(res.body.is_empty());
    }

    #[test]
    fn test_writes_evict() {
        let cache = Arc::new(EtagCache::new("crud"));
        let pipeline = Pipeline::new().with_caching(Arc::clone(&cache));
        pipeline.run(&mut instance(CrudRequest::get("/articles/1")), &body).unwrap();
        assert_eq!(cache.len(), 1);
        pipeline.run(&mut instance(CrudRequest::put("/articles/1")), &body).unwrap();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_collections_are_not_cached() {
        let cache = Arc::new(EtagCache::new("crud"));
        let pipeline = Pipeline::new().with_caching(Arc::clone(&cache));
        let mut ctx = RequestContext::new(
            CrudRequest::get("/articles"),
            UrlParams::new(),
            Flags::default(),
            "articles",
        );
        let res = pipeline.run(&mut ctx, &body).unwrap();
        assert!(res.get_header("ETag").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_key_ignores_path_spelling_but_keeps_parents() {
        let cache = EtagCache::new("crud");
        let own: UrlParams = [("articles", "1")].into_iter().collect();
        let nested: UrlParams = [("authors", "5"), ("articles", "1")].into_iter().collect();
        assert_eq!(cache.key("articles", &own).as_deref(), Some("crud:articles/1?"));
        assert_eq!(cache.key("articles", &nested).as_deref(), Some("crud:articles/1?authors=5"));
        assert_eq!(cache.key("articles", &UrlParams::new()), None);
    }

    #[test]
    fn test_instance_write_evicts_every_scope() {
        let cache = Arc::new(EtagCache::new("crud"));
        let pipeline = Pipeline::new().with_caching(Arc::clone(&cache));
        let nested: UrlParams = [("authors", "5"), ("articles", "1")].into_iter().collect();
        let mut scoped = RequestContext::new(
            CrudRequest::get("/authors/5/articles/1"),
            nested,
            Flags::default(),
            "articles",
        );
        pipeline.run(&mut scoped, &body).unwrap();
        pipeline.run(&mut instance(CrudRequest::get("/articles/1")), &body).unwrap();
        assert_eq!(cache.len(), 2);

        pipeline.run(&mut instance(CrudRequest::delete("/articles/1/")), &body).unwrap();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_bulk_write_evicts_resource() {
        let cache = Arc::new(EtagCache::new("crud"));
        let pipeline = Pipeline::new().with_caching(Arc::clone(&cache));
        pipeline.run(&mut instance(CrudRequest::get("/articles/1")), &body).unwrap();

        let mut bulk = RequestContext::new(
            CrudRequest::put("/articles/_bulk"),
            UrlParams::new(),
            Flags { bulk: true },
            "articles",
        );
        pipeline.run(&mut bulk, &body).unwrap();
        assert!(cache.etag("articles", "1").is_none());
    }
}
