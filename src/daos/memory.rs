use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

use crate::dao::{Dao, Outcome};
use crate::error::{DispatchError, DispatchResult};
use crate::params::{QueryParams, SortOrder, UrlParams};
use crate::server::Response;

const PK_FIELD: &str = "id";

/// In-memory document store for one resource.
///
/// Documents are JSON objects keyed by their `id` field (assigned from a
/// counter when a create omits it, skipping ids already taken). Parent ids
/// captured in the path act as filters: `/authors/5/articles` lists only
/// documents whose `authors` field is `"5"`, and a create under that path
/// stamps `authors: "5"` onto the document. A full replacement keeps the
/// stamped parent fields.
///
/// Bulk operations validate the whole batch, then apply it in input order under
/// a single write lock, so a batch either fully applies or leaves the store
/// untouched.
#[derive(Debug)]
pub struct MemoryDao {
    resource: String,
    store: RwLock<Store>,
}

#[derive(Debug)]
struct Store {
    docs: BTreeMap<String, Value>,
    /// Field names ever stamped from a parent path segment.
    scope_fields: BTreeSet<String>,
    next_id: u64,
}

impl Store {
    /// Next counter id not present in the store or in `reserved`.
    fn allocate(&mut self, reserved: &BTreeSet<String>) -> String {
        loop {
            let key = self.next_id.to_string();
            self.next_id += 1;
            if !self.docs.contains_key(&key) && !reserved.contains(&key) {
                return key;
            }
        }
    }

    /// Carry scope fields from the stored document onto its replacement.
    fn keep_scope(&self, key: &str, doc: &mut Map<String, Value>) {
        let Some(Value::Object(stored)) = self.docs.get(key) else {
            return;
        };
        for field in &self.scope_fields {
            if let Some(value) = stored.get(field) {
                doc.entry(field.clone()).or_insert_with(|| value.clone());
            }
        }
    }
}

impl MemoryDao {
    pub fn new(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            store: RwLock::new(Store {
                docs: BTreeMap::new(),
                scope_fields: BTreeSet::new(),
                next_id: 1,
            }),
        }
    }

    /// Store seeded with `docs`; each must carry an `id`.
    pub fn with_docs(resource: impl Into<String>, docs: impl IntoIterator<Item = Value>) -> DispatchResult<Self> {
        let dao = Self::new(resource);
        dao.bulk_create(&UrlParams::new(), docs.into_iter().collect())?;
        Ok(dao)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.read().docs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().docs.is_empty()
    }

    fn read(&self) -> RwLockReadGuard<'_, Store> {
        self.store.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Store> {
        self.store.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn own_id<'a>(&self, url_params: &'a UrlParams) -> DispatchResult<&'a str> {
        url_params
            .get(&self.resource)
            .ok_or_else(|| DispatchError::bad_request(format!("no {} id in path", self.resource)))
    }

    /// Parent ids captured in the path (every entry except this resource's own).
    fn parents<'a>(&'a self, url_params: &'a UrlParams) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        url_params.iter().filter(move |(k, _)| *k != self.resource)
    }

    fn visible(&self, doc: &Value, url_params: &UrlParams) -> bool {
        self.parents(url_params).all(|(field, id)| match doc.get(field) {
            None => true,
            Some(value) => key_of(value).as_deref() == Some(id),
        })
    }

    fn not_found(&self, id: &str) -> DispatchError {
        DispatchError::not_found(format!("{} '{id}' does not exist", self.resource))
    }

    fn already_exists(&self, key: &str) -> DispatchError {
        DispatchError::bad_request(format!("{} '{key}' already exists", self.resource))
    }

    /// Stamp the path's parent ids onto `doc`, recording them as scope fields.
    fn stamp(&self, store: &mut Store, url_params: &UrlParams, doc: &mut Map<String, Value>) {
        for (field, id) in self.parents(url_params) {
            doc.entry(field.to_string())
                .or_insert_with(|| Value::String(id.to_string()));
            if !store.scope_fields.contains(field) {
                store.scope_fields.insert(field.to_string());
            }
        }
    }

    /// Object body with parent ids stamped on and its explicit key, if any.
    fn prepare_new(
        &self,
        store: &mut Store,
        url_params: &UrlParams,
        body: Value,
    ) -> DispatchResult<(Option<String>, Map<String, Value>)> {
        let mut doc = into_object(body)?;
        self.stamp(store, url_params, &mut doc);
        let key = match doc.get(PK_FIELD) {
            Some(value) => Some(
                key_of(value).ok_or_else(|| DispatchError::bad_request("id must be a string or a number"))?,
            ),
            None => None,
        };
        Ok((key, doc))
    }

    /// Replacement document for `key`: `body` with the id and scope restored.
    fn replacement(
        &self,
        store: &mut Store,
        url_params: &UrlParams,
        key: &str,
        mut doc: Map<String, Value>,
    ) -> Value {
        doc.insert(PK_FIELD.to_string(), Value::String(key.to_string()));
        self.stamp(store, url_params, &mut doc);
        store.keep_scope(key, &mut doc);
        Value::Object(doc)
    }

    fn lookup<'a>(
        &self,
        docs: &'a BTreeMap<String, Value>,
        id: &str,
        url_params: &UrlParams,
    ) -> DispatchResult<&'a Value> {
        docs.get(id)
            .filter(|doc| self.visible(doc, url_params))
            .ok_or_else(|| self.not_found(id))
    }
}

/// String form of a primary key value.
fn key_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn into_object(value: Value) -> DispatchResult<Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(DispatchError::bad_request("expected an object")),
    }
}

/// Numeric keys sort numerically, everything else lexically.
fn compare_keys(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        _ => a.cmp(b),
    }
}

fn merge(target: &mut Value, patch: Map<String, Value>) {
    if let Value::Object(existing) = target {
        for (field, value) in patch {
            existing.insert(field, value);
        }
    }
}

/// Key of a bulk item: the item itself when it is a scalar id, else its `id`.
fn item_key(item: &Value) -> DispatchResult<String> {
    key_of(item)
        .or_else(|| item.get(PK_FIELD).and_then(key_of))
        .ok_or_else(|| DispatchError::bad_request("bulk item has no id"))
}

impl Dao for MemoryDao {
    fn create(&self, url_params: &UrlParams, body: Value) -> DispatchResult<Value> {
        let mut store = self.write();
        let (key, mut doc) = self.prepare_new(&mut store, url_params, body)?;
        let key = match key {
            Some(key) if store.docs.contains_key(&key) => return Err(self.already_exists(&key)),
            Some(key) => key,
            None => {
                let key = store.allocate(&BTreeSet::new());
                doc.insert(PK_FIELD.to_string(), Value::String(key.clone()));
                key
            }
        };
        let doc = Value::Object(doc);
        store.docs.insert(key.clone(), doc.clone());
        debug!(resource = %self.resource, id = %key, "Document created");
        Ok(doc)
    }

    fn query(&self, url_params: &UrlParams, query: &QueryParams) -> DispatchResult<Outcome> {
        let window = query.window()?;
        let store = self.read();
        let mut matching: Vec<(&String, &Value)> = store
            .docs
            .iter()
            .filter(|(_, doc)| self.visible(doc, url_params))
            .collect();
        matching.sort_by(|(a, _), (b, _)| compare_keys(a, b));
        if window.order == SortOrder::Desc {
            matching.reverse();
        }
        let page: Vec<Value> = matching
            .into_iter()
            .skip(window.offset)
            .take(window.limit.unwrap_or(usize::MAX))
            .map(|(_, doc)| doc.clone())
            .collect();
        Ok(Outcome::Data(Value::Array(page)))
    }

    fn get(&self, url_params: &UrlParams) -> DispatchResult<Value> {
        let id = self.own_id(url_params)?;
        let store = self.read();
        self.lookup(&store.docs, id, url_params).cloned()
    }

    fn update(&self, url_params: &UrlParams, body: Value) -> DispatchResult<Value> {
        let id = self.own_id(url_params)?;
        let body = into_object(body)?;
        let mut store = self.write();
        self.lookup(&store.docs, id, url_params)?;
        let doc = self.replacement(&mut store, url_params, id, body);
        store.docs.insert(id.to_string(), doc.clone());
        Ok(doc)
    }

    fn patch(&self, url_params: &UrlParams, body: Value) -> DispatchResult<Value> {
        let id = self.own_id(url_params)?;
        let mut changes = into_object(body)?;
        changes.remove(PK_FIELD);
        let mut store = self.write();
        self.lookup(&store.docs, id, url_params)?;
        let doc = store.docs.get_mut(id).ok_or_else(|| self.not_found(id))?;
        merge(doc, changes);
        Ok(doc.clone())
    }

    fn delete(&self, url_params: &UrlParams) -> DispatchResult<()> {
        let id = self.own_id(url_params)?;
        let mut store = self.write();
        self.lookup(&store.docs, id, url_params)?;
        store.docs.remove(id);
        Ok(())
    }

    fn bulk_create(&self, url_params: &UrlParams, items: Vec<Value>) -> DispatchResult<Outcome> {
        let mut store = self.write();
        let prepared = items
            .into_iter()
            .map(|item| self.prepare_new(&mut store, url_params, item))
            .collect::<DispatchResult<Vec<_>>>()?;

        let mut explicit = BTreeSet::new();
        for key in prepared.iter().filter_map(|(key, _)| key.as_ref()) {
            if store.docs.contains_key(key) || !explicit.insert(key.clone()) {
                return Err(self.already_exists(key));
            }
        }

        let mut created = Vec::with_capacity(prepared.len());
        for (key, mut doc) in prepared {
            let key = match key {
                Some(key) => key,
                None => {
                    let key = store.allocate(&explicit);
                    doc.insert(PK_FIELD.to_string(), Value::String(key.clone()));
                    key
                }
            };
            let doc = Value::Object(doc);
            store.docs.insert(key, doc.clone());
            created.push(doc);
        }
        Ok(Outcome::Data(Value::Array(created)))
    }

    fn bulk_update(&self, url_params: &UrlParams, items: Vec<Value>) -> DispatchResult<Outcome> {
        let mut store = self.write();
        let mut batch = Vec::with_capacity(items.len());
        for item in items {
            let key = item_key(&item)?;
            self.lookup(&store.docs, &key, url_params)?;
            batch.push((key, into_object(item)?));
        }
        let mut updated = Vec::with_capacity(batch.len());
        for (key, body) in batch {
            let doc = self.replacement(&mut store, url_params, &key, body);
            store.docs.insert(key, doc.clone());
            updated.push(doc);
        }
        Ok(Outcome::Data(Value::Array(updated)))
    }

    fn bulk_patch(&self, url_params: &UrlParams, items: Vec<Value>) -> DispatchResult<Outcome> {
        let mut store = self.write();
        let mut batch = Vec::with_capacity(items.len());
        for item in items {
            let key = item_key(&item)?;
            self.lookup(&store.docs, &key, url_params)?;
            let mut changes = into_object(item)?;
            changes.remove(PK_FIELD);
            batch.push((key, changes));
        }
        let mut patched = Vec::with_capacity(batch.len());
        for (key, changes) in batch {
            if let Some(doc) = store.docs.get_mut(&key) {
                merge(doc, changes);
                patched.push(doc.clone());
            }
        }
        Ok(Outcome::Data(Value::Array(patched)))
    }

    fn bulk_delete(&self, url_params: &UrlParams, items: Vec<Value>) -> DispatchResult<Outcome> {
        let mut store = self.write();
        let mut keys = Vec::with_capacity(items.len());
        for item in &items {
            let key = item_key(item)?;
            self.lookup(&store.docs, &key, url_params)?;
            keys.push(key);
        }
        for key in &keys {
            store.docs.remove(key);
        }
        debug!(resource = %self.resource, count = keys.len(), "Documents deleted");
        Ok(Outcome::Response(Response::empty(204)))
    }

    fn get_pk(&self, resource: &Value) -> DispatchResult<String> {
        resource
            .get(PK_FIELD)
            .and_then(key_of)
            .ok_or_else(|| DispatchError::bad_request("stored document has no id"))
    }
}
