#![allow(dead_code)]

use crudrouter::dao::{Dao, DaoRegistry, Outcome};
use crudrouter::error::DispatchResult;
use crudrouter::params::{QueryParams, UrlParams};
use crudrouter::router::{GraphSpec, Navigation, ResourceTree, Router};
use crudrouter::server::AppService;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

/// DAO that records every call it receives and answers with canned data.
#[derive(Default)]
pub struct RecordingDao {
    calls: Mutex<Vec<String>>,
}

impl RecordingDao {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// This DAO as a trait object sharing the same call log.
    pub fn as_dao(self: &Arc<Self>) -> Arc<dyn Dao> {
        let dao: Arc<Self> = Arc::clone(self);
        dao
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn record(&self, op: &str) {
        self.calls.lock().unwrap().push(op.to_string());
    }
}

impl Dao for RecordingDao {
    fn create(&self, _: &UrlParams, body: Value) -> DispatchResult<Value> {
        self.record("create");
        let mut doc = json!({ "id": 7 });
        if let (Some(doc), Value::Object(fields)) = (doc.as_object_mut(), body) {
            doc.extend(fields);
        }
        Ok(doc)
    }

    fn query(&self, url_params: &UrlParams, _: &QueryParams) -> DispatchResult<Outcome> {
        self.record("query");
        Ok(Outcome::Data(json!({ "url_params": url_params })))
    }

    fn get(&self, url_params: &UrlParams) -> DispatchResult<Value> {
        self.record("get");
        Ok(json!({ "url_params": url_params }))
    }

    fn update(&self, _: &UrlParams, body: Value) -> DispatchResult<Value> {
        self.record("update");
        Ok(body)
    }

    fn patch(&self, _: &UrlParams, body: Value) -> DispatchResult<Value> {
        self.record("patch");
        Ok(body)
    }

    fn delete(&self, _: &UrlParams) -> DispatchResult<()> {
        self.record("delete");
        Ok(())
    }

    fn bulk_create(&self, _: &UrlParams, items: Vec<Value>) -> DispatchResult<Outcome> {
        self.record("bulk_create");
        Ok(Outcome::Data(Value::Array(items)))
    }

    fn bulk_update(&self, _: &UrlParams, items: Vec<Value>) -> DispatchResult<Outcome> {
        self.record("bulk_update");
        Ok(Outcome::Data(Value::Array(items)))
    }

    fn bulk_patch(&self, _: &UrlParams, items: Vec<Value>) -> DispatchResult<Outcome> {
        self.record("bulk_patch");
        Ok(Outcome::Data(Value::Array(items)))
    }

    fn bulk_delete(&self, _: &UrlParams, items: Vec<Value>) -> DispatchResult<Outcome> {
        self.record("bulk_delete");
        Ok(Outcome::Text(format!("deleted {}", items.len())))
    }

    fn get_pk(&self, resource: &Value) -> DispatchResult<String> {
        Ok(resource["id"].to_string())
    }
}

/// `authors ⇄ articles` through links, plus a childless top-level `tags`.
pub fn blog_graph() -> GraphSpec {
    GraphSpec::new()
        .child("authors", GraphSpec::new().link("articles"))
        .child("articles", GraphSpec::new().link("authors"))
        .leaf("tags")
}

/// One recording DAO per resource of [`blog_graph`].
pub struct Blog {
    pub authors: Arc<RecordingDao>,
    pub articles: Arc<RecordingDao>,
    pub tags: Arc<RecordingDao>,
}

impl Blog {
    pub fn new() -> Self {
        Self {
            authors: RecordingDao::new(),
            articles: RecordingDao::new(),
            tags: RecordingDao::new(),
        }
    }

    pub fn registry(&self) -> DaoRegistry {
        let mut daos = DaoRegistry::new();
        daos.insert("authors", self.authors.as_dao());
        daos.insert("articles", self.articles.as_dao());
        daos.insert("tags", self.tags.as_dao());
        daos
    }

    pub fn total_calls(&self) -> usize {
        self.authors.call_count() + self.articles.call_count() + self.tags.call_count()
    }

    pub fn router(&self, navigation: Navigation) -> Router {
        let tree = ResourceTree::build(&blog_graph(), &self.registry()).unwrap();
        Router::new(navigation, tree)
    }

    pub fn service(&self, navigation: Navigation) -> AppService {
        AppService::new(self.router(navigation))
    }
}

pub fn body_json(res: &crudrouter::Response) -> Value {
    serde_json::from_slice(&res.body).unwrap()
}
