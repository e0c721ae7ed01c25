//! Per-resource dispatcher.
//!
//! A [`Node`] owns the three controllers of one resource and picks between
//! them from two facts about the request:
//!
//! | own id captured | bulk flag | controller                       |
//! |-----------------|-----------|----------------------------------|
//! | no              | false     | resource (collection)            |
//! | no              | true      | bulk                             |
//! | yes             | false     | instance                         |
//! | yes             | true      | rejected with `RoutingNotFound`  |
//!
//! The controller's [`Outcome`] is then normalized into a [`Response`].

use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::controllers::{Controller, ControllerKind};
use crate::dao::{Dao, Outcome};
use crate::error::{DispatchError, DispatchResult};
use crate::params::{Flags, UrlParams};
use crate::server::{CrudRequest, Response};

pub struct Node {
    name: String,
    dao: Arc<dyn Dao>,
    resource: Controller,
    instance: Controller,
    bulk: Controller,
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl Node {
    pub fn new(name: impl Into<String>, dao: Arc<dyn Dao>) -> Self {
        Self {
            name: name.into(),
            resource: Controller::new(ControllerKind::Resource, Arc::clone(&dao)),
            instance: Controller::new(ControllerKind::Instance, Arc::clone(&dao)),
            bulk: Controller::new(ControllerKind::Bulk, Arc::clone(&dao)),
            dao,
        }
    }

    /// Resource name; also the key of this node's id in [`UrlParams`].
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn dao(&self) -> &Arc<dyn Dao> {
        &self.dao
    }

    /// Choose the controller for this request.
    pub fn select(&self, url_params: &UrlParams, flags: Flags) -> DispatchResult<&Controller> {
        match (url_params.contains(&self.name), flags.bulk) {
            (false, false) => Ok(&self.resource),
            (false, true) => Ok(&self.bulk),
            (true, false) => Ok(&self.instance),
            (true, true) => Err(DispatchError::not_found(
                "cannot bulk-operate on a resource instance",
            )),
        }
    }

    /// Dispatch to the selected controller and normalize its outcome.
    pub fn call(
        &self,
        req: &CrudRequest,
        url_params: &UrlParams,
        flags: Flags,
    ) -> DispatchResult<Response> {
        debug!(
            resource = %self.name,
            method = %req.method,
            url_params = ?url_params,
            bulk = flags.bulk,
            "Node dispatch"
        );
        let controller = self.select(url_params, flags)?;
        let outcome = controller.call(req, url_params)?;
        normalize(req, outcome)
    }
}

/// Turn a controller outcome into a response.
///
/// Finished responses pass through; text is tagged with the negotiated mime
/// type and charset; anything else goes through the negotiated codec.
pub fn normalize(req: &CrudRequest, outcome: Outcome) -> DispatchResult<Response> {
    match outcome {
        Outcome::Response(res) => Ok(res),
        Outcome::Text(text) => Ok(Response::text(
            200,
            req.serialized_mime_type()?,
            req.serialized_charset()?,
            text,
        )),
        Outcome::Data(value) => req.serialized_response(&value),
    }
}
