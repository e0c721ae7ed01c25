//! Per-request parameter containers.
//!
//! - [`UrlParams`] - ordered `resource name → id` pairs captured while walking
//!   the path. Insertion order is traversal order.
//! - [`Flags`] - booleans produced by routing and carried into the Node call.
//! - [`QueryParams`] - decoded query string, plus [`QueryWindow`] for the
//!   `order`/`offset`/`limit` defaults DAOs interpret.

use serde::ser::{Serialize, SerializeMap, Serializer};
use smallvec::SmallVec;
use std::fmt;

use crate::error::{DispatchError, DispatchResult};

/// Maximum number of captured ids before heap allocation.
/// Resource paths rarely nest deeper than four levels.
pub const MAX_INLINE_PARAMS: usize = 8;

type PairVec = SmallVec<[(String, String); MAX_INLINE_PARAMS]>;

/// Ordered mapping from resource name to the id captured for it.
///
/// Keys are unique: a second insert for the same resource replaces the value
/// in place and keeps the original position.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct UrlParams {
    pairs: PairVec,
}

impl UrlParams {
    /// Empty parameter set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `resource → id`.
    pub fn insert(&mut self, resource: impl Into<String>, id: impl Into<String>) {
        let resource = resource.into();
        let id = id.into();
        match self.pairs.iter_mut().find(|(k, _)| *k == resource) {
            Some((_, existing)) => *existing = id,
            None => self.pairs.push((resource, id)),
        }
    }

    /// The id captured for `resource`, if any.
    #[inline]
    #[must_use]
    pub fn get(&self, resource: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == resource)
            .map(|(_, v)| v.as_str())
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, resource: &str) -> bool {
        self.get(resource).is_some()
    }

    /// Pairs in traversal order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl fmt::Debug for UrlParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for UrlParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = UrlParams::new();
        for (k, v) in iter {
            params.insert(k, v);
        }
        params
    }
}

impl Serialize for UrlParams {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.pairs.len()))?;
        for (k, v) in self.iter() {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Per-request routing flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Flags {
    /// The path carried the bulk sentinel in an id position.
    pub bulk: bool,
}

/// Decoded query string parameters.
///
/// Duplicate keys are kept; [`QueryParams::get`] returns the last occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a raw query string (without the leading `?`).
    #[must_use]
    pub fn parse(query: &str) -> Self {
        let pairs = url::form_urlencoded::parse(query.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        Self { pairs }
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((key.into(), value.into()));
    }

    /// Last value recorded for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .rfind(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Interpret `order`, `offset` and `limit` with their defaults
    /// (`asc`, `0`, unbounded). Empty values count as absent.
    pub fn window(&self) -> DispatchResult<QueryWindow> {
        let order = match self.get("order").filter(|v| !v.is_empty()) {
            None => SortOrder::Asc,
            Some(raw) => raw.parse()?,
        };
        let offset = match self.get("offset").filter(|v| !v.is_empty()) {
            None => 0,
            Some(raw) => raw
                .parse::<usize>()
                .map_err(|_| DispatchError::bad_request(format!("invalid offset '{raw}'")))?,
        };
        let limit = match self.get("limit").filter(|v| !v.is_empty()) {
            None => None,
            Some(raw) => Some(
                raw.parse::<usize>()
                    .map_err(|_| DispatchError::bad_request(format!("invalid limit '{raw}'")))?,
            ),
        };
        Ok(QueryWindow {
            order,
            offset,
            limit,
        })
    }
}

/// Sort direction for collection queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

impl std::str::FromStr for SortOrder {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(DispatchError::bad_request(format!(
                "invalid order '{other}' (expected asc or desc)"
            ))),
        }
    }
}

/// Paging and ordering requested for a collection query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryWindow {
    pub order: SortOrder,
    pub offset: usize,
    /// `None` means unbounded
    pub limit: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_params_keep_traversal_order() {
        let mut params = UrlParams::new();
        params.insert("authors", "5");
        params.insert("tags", "x");
        params.insert("articles", "9");
        let keys: Vec<_> = params.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["authors", "tags", "articles"]);
    }

    #[test]
    fn test_url_params_replace_in_place() {
        let mut params = UrlParams::new();
        params.insert("authors", "5");
        params.insert("tags", "x");
        params.insert("authors", "6");
        assert_eq!(params.len(), 2);
        assert_eq!(params.get("authors"), Some("6"));
        assert_eq!(params.iter().next(), Some(("authors", "6")));
    }

    #[test]
    fn test_url_params_serialize_as_ordered_map() {
        let params: UrlParams = [("b", "2"), ("a", "1")].into_iter().collect();
        let json = serde_json::to_string(&params).unwrap();
        assert_eq!(json, r#"{"b":"2","a":"1"}"#);
    }

    #[test]
    fn test_query_defaults() {
        let window = QueryParams::new().window().unwrap();
        assert_eq!(window.order, SortOrder::Asc);
        assert_eq!(window.offset, 0);
        assert_eq!(window.limit, None);
    }

    #[test]
    fn test_query_window_parsing() {
        let q = QueryParams::parse("order=desc&offset=10&limit=5");
        let window = q.window().unwrap();
        assert_eq!(window.order, SortOrder::Desc);
        assert_eq!(window.offset, 10);
        assert_eq!(window.limit, Some(5));
    }

    #[test]
    fn test_query_last_value_wins_and_empty_is_default() {
        let q = QueryParams::parse("limit=1&limit=3&offset=");
        let window = q.window().unwrap();
        assert_eq!(window.limit, Some(3));
        assert_eq!(window.offset, 0);
    }

    #[test]
    fn test_query_window_rejects_garbage() {
        let err = QueryParams::parse("order=sideways").window().unwrap_err();
        assert_eq!(err.status(), 400);
        let err = QueryParams::parse("limit=-1").window().unwrap_err();
        assert_eq!(err.status(), 400);
    }

    #[test]
    fn test_query_percent_decoding() {
        let q = QueryParams::parse("name=John+Doe&city=New%20York");
        assert_eq!(q.get("name"), Some("John Doe"));
        assert_eq!(q.get("city"), Some("New York"));
    }
}
