use http::Method;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

use super::response::{HeaderVec, Response};
use crate::error::{DispatchError, DispatchResult};
use crate::negotiation::{essence, Serialization};
use crate::params::QueryParams;

/// Strongly typed request identifier backed by ULID.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
pub struct RequestId(pub ulid::Ulid);

impl RequestId {
    #[must_use]
    pub fn new() -> Self {
        Self(ulid::Ulid::new())
    }

    /// Reuse a caller supplied id when it parses, otherwise mint one.
    #[must_use]
    pub fn from_header_or_new(header_value: Option<&str>) -> Self {
        header_value
            .and_then(|s| s.parse::<RequestId>().ok())
            .unwrap_or_default()
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for RequestId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RequestId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ulid::Ulid::from_string(s).map(RequestId)
    }
}

impl Serialize for RequestId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for RequestId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse::<RequestId>()
            .map_err(|_| serde::de::Error::custom("invalid request id"))
    }
}

/// Parse a `Cookie` header into `(name, value)` pairs.
#[must_use]
pub fn parse_cookies(header: &str) -> Vec<(String, String)> {
    header
        .split(';')
        .filter_map(|pair| {
            let mut parts = pair.trim().splitn(2, '=');
            let name = parts.next()?.trim();
            if name.is_empty() {
                return None;
            }
            let value = parts.next().unwrap_or("").trim();
            Some((name.to_string(), value.to_string()))
        })
        .collect()
}

/// An incoming request as seen by the dispatcher.
///
/// Transport adapters build one of these per request; the application attaches
/// its [`Serialization`] registry before routing so controllers can decode the
/// body and encode results in the negotiated format.
#[derive(Debug, Clone)]
pub struct CrudRequest {
    /// Correlation id for logs
    pub request_id: RequestId,
    /// HTTP method as received (not restricted to the controller whitelist)
    pub method: Method,
    /// Path without the query string
    pub path: String,
    /// Decoded query parameters
    pub query: QueryParams,
    /// Request headers
    pub headers: HeaderVec,
    /// Raw body bytes
    pub body: Vec<u8>,
    serialization: Arc<Serialization>,
}

impl CrudRequest {
    /// Build a request for `target`, which may carry a `?query` suffix.
    pub fn new(method: Method, target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, QueryParams::parse(query)),
            None => (target, QueryParams::new()),
        };
        Self {
            request_id: RequestId::new(),
            method,
            path: path.to_string(),
            query,
            headers: HeaderVec::new(),
            body: Vec::new(),
            serialization: Arc::new(Serialization::default()),
        }
    }

    pub fn get(target: &str) -> Self {
        Self::new(Method::GET, target)
    }

    pub fn post(target: &str) -> Self {
        Self::new(Method::POST, target)
    }

    pub fn put(target: &str) -> Self {
        Self::new(Method::PUT, target)
    }

    pub fn patch(target: &str) -> Self {
        Self::new(Method::PATCH, target)
    }

    pub fn delete(target: &str) -> Self {
        Self::new(Method::DELETE, target)
    }

    /// Add a header. `X-Request-Id` also replaces the generated request id
    /// when it holds a valid ULID.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        let value = value.into();
        if name.eq_ignore_ascii_case("x-request-id") {
            self.request_id = RequestId::from_header_or_new(Some(&value));
        }
        self.headers.push((Arc::from(name), value));
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// JSON body plus matching `Content-Type`.
    #[must_use]
    pub fn with_json(self, value: &Value) -> Self {
        self.with_header("Content-Type", "application/json")
            .with_body(value.to_string())
    }

    /// Attach the application's codec registry.
    pub fn attach_serialization(&mut self, serialization: Arc<Serialization>) {
        self.serialization = serialization;
    }

    #[must_use]
    pub fn serialization(&self) -> &Serialization {
        &self.serialization
    }

    /// Get a header by name (case-insensitive per RFC 7230)
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Cookies from every `Cookie` header, in order
    #[must_use]
    pub fn cookies(&self) -> Vec<(String, String)> {
        self.headers
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case("cookie"))
            .flat_map(|(_, v)| parse_cookies(v))
            .collect()
    }

    /// Media type of the body without parameters, lowercased
    #[must_use]
    pub fn content_type(&self) -> Option<String> {
        self.get_header("content-type")
            .map(|ct| essence(ct).to_ascii_lowercase())
            .filter(|ct| !ct.is_empty())
    }

    /// Mime type chosen for the response.
    pub fn serialized_mime_type(&self) -> DispatchResult<&str> {
        self.serialization
            .negotiate(self.get_header("accept"))
            .map(|(mime, _)| mime)
    }

    /// Charset of the codec chosen for the response.
    pub fn serialized_charset(&self) -> DispatchResult<&str> {
        self.serialization
            .negotiate(self.get_header("accept"))
            .map(|(_, codec)| codec.charset())
    }

    /// Decode the body with the codec registered for its content type.
    ///
    /// An empty body decodes the codec's empty literal. A missing
    /// `Content-Type` falls back to the first registered codec.
    pub fn deserialize_body(&self) -> DispatchResult<Value> {
        let codec = match self.content_type() {
            Some(ct) => self
                .serialization
                .codec(&ct)
                .ok_or_else(|| DispatchError::unsupported_media_type(ct.clone()))?,
            None => self
                .serialization
                .negotiate(None)
                .map_err(|_| DispatchError::unsupported_media_type("no codecs registered"))?
                .1,
        };
        let body: &[u8] = if self.body.is_empty() {
            codec.empty_body()
        } else {
            &self.body
        };
        codec.decode(body).map_err(|e| {
            debug!(request_id = %self.request_id, error = %e, "Body decode failed");
            DispatchError::bad_request(format!("could not deserialize body: {e}"))
        })
    }

    /// Encode `payload` in the negotiated format as a 200 response.
    pub fn serialized_response(&self, payload: &Value) -> DispatchResult<Response> {
        let (mime, codec) = self.serialization.negotiate(self.get_header("accept"))?;
        let body = codec
            .encode(payload)
            .map_err(DispatchError::unsupported_media_type)?;
        let mut res = Response::new(200, HeaderVec::new(), body);
        res.set_header("Content-Type", format!("{mime}; charset={}", codec.charset()));
        Ok(res)
    }
}
