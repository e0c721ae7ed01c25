use serde_json::{json, Value};

use crate::dao::{Dao, Outcome};
use crate::error::DispatchResult;
use crate::params::{QueryParams, UrlParams};

/// Echoes each call back as data: operation, resource, captured ids and input.
#[derive(Debug, Clone)]
pub struct EchoDao {
    resource: String,
}

impl EchoDao {
    pub fn new(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
        }
    }

    fn echo(&self, operation: &str, url_params: &UrlParams, input: Value) -> Value {
        json!({
            "operation": operation,
            "resource": self.resource,
            "url_params": url_params,
            "input": input,
        })
    }
}

impl Dao for EchoDao {
    fn create(&self, url_params: &UrlParams, body: Value) -> DispatchResult<Value> {
        Ok(self.echo("create", url_params, body))
    }

    fn query(&self, url_params: &UrlParams, query: &QueryParams) -> DispatchResult<Outcome> {
        let window = query.window()?;
        let input = json!({
            "order": window.order.as_str(),
            "offset": window.offset,
            "limit": window.limit,
        });
        Ok(Outcome::Data(self.echo("query", url_params, input)))
    }

    fn get(&self, url_params: &UrlParams) -> DispatchResult<Value> {
        Ok(self.echo("get", url_params, Value::Null))
    }

    fn update(&self, url_params: &UrlParams, body: Value) -> DispatchResult<Value> {
        Ok(self.echo("update", url_params, body))
    }

    fn patch(&self, url_params: &UrlParams, body: Value) -> DispatchResult<Value> {
        Ok(self.echo("patch", url_params, body))
    }

    fn delete(&self, _url_params: &UrlParams) -> DispatchResult<()> {
        Ok(())
    }

    fn bulk_create(&self, url_params: &UrlParams, items: Vec<Value>) -> DispatchResult<Outcome> {
        Ok(Outcome::Data(self.echo("bulk_create", url_params, Value::Array(items))))
    }

    fn bulk_update(&self, url_params: &UrlParams, items: Vec<Value>) -> DispatchResult<Outcome> {
        Ok(Outcome::Data(self.echo("bulk_update", url_params, Value::Array(items))))
    }

    fn bulk_patch(&self, url_params: &UrlParams, items: Vec<Value>) -> DispatchResult<Outcome> {
        Ok(Outcome::Data(self.echo("bulk_patch", url_params, Value::Array(items))))
    }

    fn bulk_delete(&self, url_params: &UrlParams, items: Vec<Value>) -> DispatchResult<Outcome> {
        Ok(Outcome::Data(self.echo("bulk_delete", url_params, Value::Array(items))))
    }

    /// `input.id` of an echoed create, or `echo` when the body carried none.
    fn get_pk(&self, resource: &Value) -> DispatchResult<String> {
        Ok(match &resource["input"]["id"] {
            Value::String(s) => s.clone(),
            Value::Null => "echo".to_string(),
            other => other.to_string(),
        })
    }
}
