//! # Controllers
//!
//! A [`Controller`] is a fixed verb table for one of the three ways a resource
//! can be addressed:
//!
//! | kind       | path shape            | verbs                          |
//! |------------|-----------------------|--------------------------------|
//! | `Resource` | `/{resource}`         | GET, POST, OPTIONS             |
//! | `Instance` | `/{resource}/{id}`    | GET, PUT, PATCH, DELETE, OPTIONS |
//! | `Bulk`     | `/{resource}/_bulk`   | POST, PUT, PATCH, DELETE, OPTIONS |
//!
//! Dispatch rules:
//!
//! - a method outside [`Verb`] fails with `NotImplemented`;
//! - a [`Verb`] missing from the table fails with `MethodNotAllowed`, carrying
//!   the verbs the controller does support;
//! - `OPTIONS` answers with the sorted verb list and never reaches the DAO.
//!
//! Actions are plain function pointers over `&dyn Dao`; the controller owns the
//! DAO handle and lends it to whichever action the verb selects.

mod bulk;
mod instance;
mod resource;

use http::Method;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::info;

use crate::dao::{Dao, Outcome};
use crate::error::{DispatchError, DispatchResult};
use crate::params::UrlParams;
use crate::server::{CrudRequest, Response};

/// Closed whitelist of dispatchable methods.
///
/// Variants are declared in alphabetical order so the derived `Ord` yields the
/// order used in `Allow` headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Verb {
    Delete,
    Get,
    Options,
    Patch,
    Post,
    Put,
}

impl Verb {
    /// Map a request method onto the whitelist.
    pub fn from_method(method: &Method) -> DispatchResult<Self> {
        match *method {
            Method::DELETE => Ok(Verb::Delete),
            Method::GET => Ok(Verb::Get),
            Method::OPTIONS => Ok(Verb::Options),
            Method::PATCH => Ok(Verb::Patch),
            Method::POST => Ok(Verb::Post),
            Method::PUT => Ok(Verb::Put),
            _ => Err(DispatchError::not_implemented(format!(
                "method {method} is not supported"
            ))),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Delete => "DELETE",
            Verb::Get => "GET",
            Verb::Options => "OPTIONS",
            Verb::Patch => "PATCH",
            Verb::Post => "POST",
            Verb::Put => "PUT",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which of a Node's three controllers this is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerKind {
    Resource,
    Instance,
    Bulk,
}

impl ControllerKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ControllerKind::Resource => "resource",
            ControllerKind::Instance => "instance",
            ControllerKind::Bulk => "bulk",
        }
    }
}

impl fmt::Display for ControllerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

type ActionFn = fn(&dyn Dao, &CrudRequest, &UrlParams) -> DispatchResult<Outcome>;

/// A named entry in a verb table.
#[derive(Clone, Copy)]
pub struct Action {
    /// Operation name used in logs (`create`, `bulk_patch`, ...)
    pub name: &'static str,
    run: ActionFn,
}

impl Action {
    const fn new(name: &'static str, run: ActionFn) -> Self {
        Self { name, run }
    }
}

/// Verb table bound to one resource's DAO.
#[derive(Clone)]
pub struct Controller {
    kind: ControllerKind,
    dao: Arc<dyn Dao>,
    actions: BTreeMap<Verb, Action>,
}

impl fmt::Debug for Controller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Controller")
            .field("kind", &self.kind)
            .field("allowed", &self.allowed())
            .finish_non_exhaustive()
    }
}

impl Controller {
    /// Controller of `kind` with its standard verb table.
    pub fn new(kind: ControllerKind, dao: Arc<dyn Dao>) -> Self {
        let actions: &[(Verb, Action)] = match kind {
            ControllerKind::Resource => &resource::ACTIONS,
            ControllerKind::Instance => &instance::ACTIONS,
            ControllerKind::Bulk => &bulk::ACTIONS,
        };
        Self {
            kind,
            dao,
            actions: actions.iter().copied().collect(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> ControllerKind {
        self.kind
    }

    /// Supported verbs, sorted, `OPTIONS` included.
    #[must_use]
    pub fn allowed(&self) -> Vec<&'static str> {
        let mut verbs: Vec<Verb> = self.actions.keys().copied().collect();
        verbs.push(Verb::Options);
        verbs.sort();
        verbs.dedup();
        verbs.into_iter().map(|v| v.as_str()).collect()
    }

    #[must_use]
    pub fn supports(&self, verb: Verb) -> bool {
        verb == Verb::Options || self.actions.contains_key(&verb)
    }

    /// Run the action registered for the request's method.
    pub fn call(&self, req: &CrudRequest, url_params: &UrlParams) -> DispatchResult<Outcome> {
        let verb = Verb::from_method(&req.method)?;

        if verb == Verb::Options {
            info!(controller = %self.kind, action = "options", "Listing allowed verbs");
            return Ok(Outcome::Response(Response::allow(&self.allowed())));
        }

        let Some(action) = self.actions.get(&verb) else {
            let allowed = self.allowed();
            info!(
                controller = %self.kind,
                method = %verb,
                allowed = ?allowed,
                "Method not allowed"
            );
            return Err(DispatchError::MethodNotAllowed {
                method: verb.as_str().to_string(),
                allowed,
            });
        };

        info!(
            controller = %self.kind,
            action = action.name,
            url_params = ?url_params,
            "Running controller action"
        );
        (action.run)(self.dao.as_ref(), req, url_params)
    }
}

/// Decoded request body, which must be a JSON-style array.
fn body_items(req: &CrudRequest) -> DispatchResult<Vec<serde_json::Value>> {
    match req.deserialize_body()? {
        serde_json::Value::Array(items) => Ok(items),
        _ => Err(DispatchError::bad_request("bulk body must be an array")),
    }
}
