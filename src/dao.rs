//! # DAO Contract
//!
//! A [`Dao`] backs exactly one resource. Controllers call it with the
//! [`UrlParams`] captured while routing; the id of the addressed instance is
//! `url_params.get(<resource name>)` and parent ids are the other entries.
//!
//! Every operation has a default body that fails with
//! [`DispatchError::NotImplemented`], so a read-only resource only implements
//! `query`/`get` and the rest answers 501.
//!
//! Collection and bulk operations return an [`Outcome`], which lets a DAO
//! choose between handing back a finished [`Response`], plain text, or a
//! structured value that the dispatcher serializes in the negotiated format.

use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{DispatchError, DispatchResult};
use crate::params::{QueryParams, UrlParams};
use crate::server::Response;

/// Raw result of a controller action, normalized into a [`Response`] by the
/// Node.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Already fully formed; passed through untouched
    Response(Response),
    /// Plain text, tagged with the negotiated mime type and charset
    Text(String),
    /// Structured payload, encoded by the negotiated codec
    Data(Value),
}

impl From<Response> for Outcome {
    fn from(res: Response) -> Self {
        Outcome::Response(res)
    }
}

impl From<String> for Outcome {
    fn from(text: String) -> Self {
        Outcome::Text(text)
    }
}

impl From<&str> for Outcome {
    fn from(text: &str) -> Self {
        Outcome::Text(text.to_string())
    }
}

impl From<Value> for Outcome {
    fn from(value: Value) -> Self {
        Outcome::Data(value)
    }
}

fn unimplemented(operation: &str) -> DispatchError {
    DispatchError::not_implemented(format!("operation '{operation}' is not supported"))
}

/// Persistence/business-logic contract for one resource.
///
/// Implementations are shared by every request hitting the resource and must
/// handle their own synchronization.
pub trait Dao: Send + Sync {
    /// Create a resource from a decoded body and return the stored form.
    fn create(&self, _url_params: &UrlParams, _body: Value) -> DispatchResult<Value> {
        Err(unimplemented("create"))
    }

    /// List the collection. `query.window()` yields the ordering and paging
    /// defaults.
    fn query(&self, _url_params: &UrlParams, _query: &QueryParams) -> DispatchResult<Outcome> {
        Err(unimplemented("query"))
    }

    fn get(&self, _url_params: &UrlParams) -> DispatchResult<Value> {
        Err(unimplemented("get"))
    }

    fn update(&self, _url_params: &UrlParams, _body: Value) -> DispatchResult<Value> {
        Err(unimplemented("update"))
    }

    fn patch(&self, _url_params: &UrlParams, _body: Value) -> DispatchResult<Value> {
        Err(unimplemented("patch"))
    }

    fn delete(&self, _url_params: &UrlParams) -> DispatchResult<()> {
        Err(unimplemented("delete"))
    }

    /// Items must be applied in input order.
    fn bulk_create(&self, _url_params: &UrlParams, _items: Vec<Value>) -> DispatchResult<Outcome> {
        Err(unimplemented("bulk_create"))
    }

    fn bulk_update(&self, _url_params: &UrlParams, _items: Vec<Value>) -> DispatchResult<Outcome> {
        Err(unimplemented("bulk_update"))
    }

    fn bulk_patch(&self, _url_params: &UrlParams, _items: Vec<Value>) -> DispatchResult<Outcome> {
        Err(unimplemented("bulk_patch"))
    }

    fn bulk_delete(&self, _url_params: &UrlParams, _items: Vec<Value>) -> DispatchResult<Outcome> {
        Err(unimplemented("bulk_delete"))
    }

    /// Primary key of a stored resource, used for the `Location` header.
    fn get_pk(&self, _resource: &Value) -> DispatchResult<String> {
        Err(unimplemented("get_pk"))
    }
}

/// Resource name → DAO bindings used when building the resource graph.
#[derive(Clone, Default)]
pub struct DaoRegistry {
    daos: BTreeMap<String, Arc<dyn Dao>>,
}

impl DaoRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `dao` to `resource`, replacing any earlier binding.
    #[must_use]
    pub fn bind(mut self, resource: impl Into<String>, dao: impl Dao + 'static) -> Self {
        self.insert(resource, Arc::new(dao));
        self
    }

    pub fn insert(&mut self, resource: impl Into<String>, dao: Arc<dyn Dao>) {
        self.daos.insert(resource.into(), dao);
    }

    /// Bind a DAO produced by `factory` to each of `resources`.
    pub fn from_factory<'a, F, D>(resources: impl IntoIterator<Item = &'a str>, factory: F) -> Self
    where
        F: Fn(&str) -> D,
        D: Dao + 'static,
    {
        let mut registry = Self::new();
        for name in resources {
            registry.insert(name, Arc::new(factory(name)));
        }
        registry
    }

    #[must_use]
    pub fn get(&self, resource: &str) -> Option<&Arc<dyn Dao>> {
        self.daos.get(resource)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.daos.keys().map(String::as_str)
    }
}

impl std::fmt::Debug for DaoRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct ReadOnly;

    impl Dao for ReadOnly {
        fn get(&self, url_params: &UrlParams) -> DispatchResult<Value> {
            Ok(json!({ "id": url_params.get("things") }))
        }
    }

    #[test]
    fn test_defaults_are_not_implemented() {
        let dao = ReadOnly;
        let params = UrlParams::new();
        assert_eq!(dao.create(&params, json!({})).unwrap_err().status(), 501);
        assert_eq!(dao.delete(&params).unwrap_err().status(), 501);
        assert_eq!(dao.bulk_patch(&params, vec![]).unwrap_err().status(), 501);
        assert_eq!(dao.get_pk(&json!({})).unwrap_err().status(), 501);
    }

    #[test]
    fn test_overridden_operation_runs() {
        let params: UrlParams = [("things", "3")].into_iter().collect();
        assert_eq!(ReadOnly.get(&params).unwrap(), json!({ "id": "3" }));
    }

    #[test]
    fn test_registry_binding_replaces() {
        let registry = DaoRegistry::new().bind("things", ReadOnly).bind("things", ReadOnly);
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["things"]);
        assert!(registry.get("other").is_none());
    }

    #[test]
    fn test_outcome_conversions() {
        assert_eq!(Outcome::from("hi"), Outcome::Text("hi".into()));
        assert_eq!(Outcome::from(json!([1])), Outcome::Data(json!([1])));
        assert!(matches!(
            Outcome::from(Response::empty(204)),
            Outcome::Response(_)
        ));
    }
}
