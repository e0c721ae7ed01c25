use serde_json::json;
use smallvec::SmallVec;
use std::sync::Arc;

use crate::error::DispatchError;

/// Maximum inline headers before heap allocation
pub const MAX_INLINE_HEADERS: usize = 16;

/// Stack-allocated header storage.
///
/// Header names use `Arc<str>`; most are static strings repeated on every
/// request (`Content-Type`, `Location`, `Allow`).
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

pub(crate) fn status_reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        304 => "Not Modified",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        406 => "Not Acceptable",
        415 => "Unsupported Media Type",
        500 => "Internal Server Error",
        501 => "Not Implemented",
        _ => "Unknown",
    }
}

/// A fully formed response: status, headers and encoded body bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// HTTP status code
    pub status: u16,
    /// Response headers, in insertion order
    pub headers: HeaderVec,
    /// Encoded body
    pub body: Vec<u8>,
}

impl Default for Response {
    fn default() -> Self {
        Self::empty(200)
    }
}

impl Response {
    #[must_use]
    pub fn new(status: u16, headers: HeaderVec, body: Vec<u8>) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Response with no headers and no body
    #[must_use]
    pub fn empty(status: u16) -> Self {
        Self::new(status, HeaderVec::new(), Vec::new())
    }

    /// Text body tagged with the given mime type and charset.
    #[must_use]
    pub fn text(status: u16, mime: &str, charset: &str, text: impl Into<String>) -> Self {
        let mut res = Self::new(status, HeaderVec::new(), text.into().into_bytes());
        res.set_header("Content-Type", format!("{mime}; charset={charset}"));
        res
    }

    /// `OPTIONS` answer: empty body, `Allow` listing `verbs` in the order given.
    #[must_use]
    pub fn allow(verbs: &[&str]) -> Self {
        let mut res = Self::empty(200);
        res.set_header("Allow", verbs.join(", "));
        res
    }

    /// Map an error kind onto its status with a small JSON body.
    #[must_use]
    pub fn from_error(err: &DispatchError) -> Self {
        let body = json!({ "error": err.kind(), "detail": err.to_string() });
        let mut res = Self::new(err.status(), HeaderVec::new(), body.to_string().into_bytes());
        res.set_header("Content-Type", "application/json; charset=utf-8".to_string());
        if let DispatchError::MethodNotAllowed { allowed, .. } = err {
            res.set_header("Allow", allowed.join(", "));
        }
        res
    }

    /// Reason phrase for the status code
    #[must_use]
    pub fn reason(&self) -> &'static str {
        status_reason(self.status)
    }

    /// Get a header by name (case-insensitive)
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// All values recorded for a header (e.g. several `Set-Cookie`)
    pub fn header_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.headers
            .iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Add or replace a header
    pub fn set_header(&mut self, name: &str, value: String) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::from(name), value));
    }

    /// Add a header without removing existing values of the same name
    pub fn append_header(&mut self, name: &str, value: String) {
        self.headers.push((Arc::from(name), value));
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_header(name, value.into());
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Append a `Set-Cookie` header for `name=value`
    pub fn set_cookie(&mut self, name: &str, value: &str) {
        self.append_header("Set-Cookie", format!("{name}={value}; Path=/"));
    }

    /// Body as UTF-8, when it is valid UTF-8
    #[must_use]
    pub fn body_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.body).ok()
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
