//! Router core: token pairs → `(Node, UrlParams, Flags)`.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info};

use super::graph::{ResourceTree, TreeEntry};
use super::tokenizer::{pairwise, split_path, TokenPair};
use crate::error::{ConfigError, DispatchError, DispatchResult};
use crate::node::Node;
use crate::params::{Flags, UrlParams};
use crate::server::{CrudRequest, Response};

/// Reserved id segment marking a batch operation.
pub const BULK_ROUTE: &str = "_bulk";

/// How token pairs are resolved against the resource graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    /// Only the final resource name is looked up, in the top-level table.
    Flat,
    /// Every resource name must be a declared child of the previous one.
    Tree,
}

impl Navigation {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Navigation::Flat => "flat",
            Navigation::Tree => "tree",
        }
    }
}

impl FromStr for Navigation {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "flat" => Ok(Navigation::Flat),
            "tree" => Ok(Navigation::Tree),
            other => Err(ConfigError::UnknownNavigation {
                name: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for Navigation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Handler answering the empty path.
pub type RootHandler = Arc<dyn Fn(&CrudRequest) -> Response + Send + Sync>;

/// Successful resolution of a non-empty path.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    /// Node selected for the final resource name
    pub node: Arc<Node>,
    /// Ids captured along the way, in traversal order
    pub url_params: UrlParams,
    pub flags: Flags,
}

/// What a path routes to.
#[derive(Clone)]
pub enum Routed {
    /// Empty path with a root handler configured
    Root(RootHandler),
    Node(RouteMatch),
}

impl fmt::Debug for Routed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Routed::Root(_) => f.write_str("Root"),
            Routed::Node(m) => f.debug_tuple("Node").field(m).finish(),
        }
    }
}

/// Entry point of dispatch: owns the navigation strategy, the graph and the
/// optional root handler. Immutable once built.
pub struct Router {
    navigation: Navigation,
    graph: ResourceTree,
    root: Option<RootHandler>,
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("navigation", &self.navigation)
            .field("resources", &self.graph.resources().collect::<Vec<_>>())
            .field("root", &self.root.is_some())
            .finish()
    }
}

impl Router {
    #[must_use]
    pub fn new(navigation: Navigation, graph: ResourceTree) -> Self {
        info!(
            navigation = %navigation,
            resources = ?graph.resources().collect::<Vec<_>>(),
            "Router ready"
        );
        Self {
            navigation,
            graph,
            root: None,
        }
    }

    /// Router for a navigation strategy given by name (`flat` or `tree`).
    pub fn from_name(navigation: &str, graph: ResourceTree) -> Result<Self, ConfigError> {
        Ok(Self::new(navigation.parse()?, graph))
    }

    /// Answer the empty path with `handler`.
    #[must_use]
    pub fn with_root<F>(mut self, handler: F) -> Self
    where
        F: Fn(&CrudRequest) -> Response + Send + Sync + 'static,
    {
        self.root = Some(Arc::new(handler));
        self
    }

    #[must_use]
    pub fn navigation(&self) -> Navigation {
        self.navigation
    }

    #[must_use]
    pub fn graph(&self) -> &ResourceTree {
        &self.graph
    }

    /// Resolve `path_info` (no query string).
    ///
    /// # Errors
    ///
    /// `RoutingNotFound` for an empty path without a root handler or an
    /// unknown resource; `BadRequest` for a segment that does not decode.
    pub fn route(&self, path_info: &str) -> DispatchResult<Routed> {
        let segments = split_path(path_info)?;
        if segments.is_empty() {
            return match &self.root {
                Some(handler) => Ok(Routed::Root(Arc::clone(handler))),
                None => Err(DispatchError::not_found("no root handler configured")),
            };
        }

        let pairs = pairwise(&segments);
        let matched = match self.navigation {
            Navigation::Flat => self.route_flat(pairs),
            Navigation::Tree => self.route_tree(pairs),
        }?;

        debug!(
            path = %path_info,
            navigation = %self.navigation,
            resource = %matched.node.name(),
            url_params = ?matched.url_params,
            bulk = matched.flags.bulk,
            "Route resolved"
        );
        Ok(Routed::Node(matched))
    }

    /// Intermediate names are captured but never validated.
    fn route_flat<'a>(&self, pairs: impl Iterator<Item = TokenPair<'a>>) -> DispatchResult<RouteMatch> {
        let mut url_params = UrlParams::new();
        let mut flags = Flags::default();
        let mut last = None;
        for pair in pairs {
            debug!(resource = pair.resource, id = ?pair.id, "Token pair");
            record(pair, &mut url_params, &mut flags);
            last = Some(pair.resource);
        }

        let name = last.unwrap_or_default();
        let node = self
            .graph
            .node(name)
            .ok_or_else(|| unknown_resource(name))?;
        Ok(RouteMatch {
            node: Arc::clone(node),
            url_params,
            flags,
        })
    }

    fn route_tree<'a>(&self, pairs: impl Iterator<Item = TokenPair<'a>>) -> DispatchResult<RouteMatch> {
        let mut url_params = UrlParams::new();
        let mut flags = Flags::default();
        let mut current: Option<&TreeEntry> = None;
        for pair in pairs {
            debug!(resource = pair.resource, id = ?pair.id, "Token pair");
            let next = match current {
                None => self.graph.root(pair.resource),
                Some(entry) => self.graph.child(entry, pair.resource),
            };
            current = Some(next.ok_or_else(|| unknown_resource(pair.resource))?);
            record(pair, &mut url_params, &mut flags);
        }

        let entry = current.ok_or_else(|| DispatchError::not_found("empty path"))?;
        Ok(RouteMatch {
            node: Arc::clone(entry.node()),
            url_params,
            flags,
        })
    }
}

fn record(pair: TokenPair<'_>, url_params: &mut UrlParams, flags: &mut Flags) {
    match pair.id {
        Some(BULK_ROUTE) => flags.bulk = true,
        Some(id) => url_params.insert(pair.resource, id),
        None => {}
    }
}

fn unknown_resource(name: &str) -> DispatchError {
    DispatchError::not_found(format!("unknown resource '{name}'"))
}

/// URL of a created resource: `path_info` joined with its primary key.
#[must_use]
pub fn reverse(path_info: &str, pk: Option<&str>) -> String {
    match pk {
        None => path_info.to_string(),
        Some(pk) => format!("{}/{pk}", path_info.trim_end_matches('/')),
    }
}
