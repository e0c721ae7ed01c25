use std::sync::Arc;
use tracing::{error, info, info_span, warn};

use super::request::CrudRequest;
use super::response::Response;
use crate::config::AppConfig;
use crate::dao::DaoRegistry;
use crate::error::{ConfigError, DispatchResult};
use crate::middleware::{Pipeline, RequestContext};
use crate::negotiation::Serialization;
use crate::router::{ResourceTree, Routed, Router};

/// The application: router, interceptor pipeline and codec registry.
///
/// Built once at startup and shared read-only; cloning is cheap.
#[derive(Clone, Debug)]
pub struct AppService {
    router: Arc<Router>,
    pipeline: Pipeline,
    serialization: Arc<Serialization>,
}

impl AppService {
    #[must_use]
    pub fn new(router: Router) -> Self {
        Self {
            router: Arc::new(router),
            pipeline: Pipeline::default(),
            serialization: Arc::new(Serialization::default()),
        }
    }

    #[must_use]
    pub fn with_pipeline(mut self, pipeline: Pipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    #[must_use]
    pub fn with_serialization(mut self, serialization: Serialization) -> Self {
        self.serialization = Arc::new(serialization);
        self
    }

    /// Build everything `config` describes, binding DAOs from `daos`.
    pub fn from_config(config: &AppConfig, daos: &DaoRegistry) -> Result<Self, ConfigError> {
        let navigation = config.navigation()?;
        let graph = ResourceTree::build(&config.resources, daos)?;
        Ok(Self::new(Router::new(navigation, graph))
            .with_pipeline(config.pipeline())
            .with_serialization(config.serialization()))
    }

    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Dispatch one request, turning any error into its status response.
    pub fn handle(&self, mut req: CrudRequest) -> Response {
        req.attach_serialization(Arc::clone(&self.serialization));
        let span = info_span!(
            "request",
            request_id = %req.request_id,
            method = %req.method,
            path = %req.path,
        );
        let _entered = span.enter();

        match self.dispatch(req) {
            Ok(res) => {
                info!(status = res.status, "Request complete");
                res
            }
            Err(err) => {
                let status = err.status();
                if status >= 500 {
                    error!(status, kind = err.kind(), error = %err, "Request failed");
                } else {
                    warn!(status, kind = err.kind(), error = %err, "Request rejected");
                }
                Response::from_error(&err)
            }
        }
    }

    /// Route and run the pipeline around the Node call.
    ///
    /// The root handler answers the empty path directly, outside the pipeline.
    pub fn dispatch(&self, req: CrudRequest) -> DispatchResult<Response> {
        let matched = match self.router.route(&req.path)? {
            Routed::Root(handler) => return Ok(handler(&req)),
            Routed::Node(matched) => matched,
        };

        let node = Arc::clone(&matched.node);
        let mut ctx = RequestContext::new(req, matched.url_params, matched.flags, node.name());
        self.pipeline.run(&mut ctx, &|ctx: &mut RequestContext| {
            node.call(&ctx.request, &ctx.url_params, ctx.flags)
        })
    }
}

impl From<Router> for AppService {
    fn from(router: Router) -> Self {
        Self::new(router)
    }
}

