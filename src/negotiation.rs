//! # Content Negotiation
//!
//! The dispatcher never picks a wire format itself. Each request carries a
//! [`Serialization`] registry mapping mime types onto [`Codec`]s, and the
//! request resolves:
//!
//! - the **output** codec from its `Accept` header ([`Serialization::negotiate`]),
//! - the **input** codec from its `Content-Type` ([`Serialization::codec`]).
//!
//! Two codecs ship with the crate: [`JsonCodec`] (`application/json`) and
//! [`YamlCodec`] (`application/x-yaml`). Registration order matters: it breaks
//! ties between equally acceptable codecs and the first codec answers requests
//! that send no `Accept` header at all.

use serde_json::Value;
use std::sync::Arc;

use crate::error::{DispatchError, DispatchResult};

/// Body decoder/encoder for one mime type.
pub trait Codec: Send + Sync {
    /// Charset advertised in `Content-Type`
    fn charset(&self) -> &str;

    /// Body decoded in place of an empty request body
    fn empty_body(&self) -> &[u8] {
        b"{}"
    }

    fn decode(&self, body: &[u8]) -> Result<Value, String>;

    fn encode(&self, value: &Value) -> Result<Vec<u8>, String>;
}

/// `application/json` via `serde_json`.
#[derive(Debug, Clone)]
pub struct JsonCodec {
    charset: String,
}

impl JsonCodec {
    pub fn new(charset: impl Into<String>) -> Self {
        Self {
            charset: charset.into(),
        }
    }
}

impl Default for JsonCodec {
    fn default() -> Self {
        Self::new("utf-8")
    }
}

impl Codec for JsonCodec {
    fn charset(&self) -> &str {
        &self.charset
    }

    fn decode(&self, body: &[u8]) -> Result<Value, String> {
        serde_json::from_slice(body).map_err(|e| e.to_string())
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>, String> {
        serde_json::to_vec(value).map_err(|e| e.to_string())
    }
}

/// `application/x-yaml` via `serde_yaml`.
#[derive(Debug, Clone)]
pub struct YamlCodec {
    charset: String,
}

impl YamlCodec {
    pub fn new(charset: impl Into<String>) -> Self {
        Self {
            charset: charset.into(),
        }
    }
}

impl Default for YamlCodec {
    fn default() -> Self {
        Self::new("utf-8")
    }
}

impl Codec for YamlCodec {
    fn charset(&self) -> &str {
        &self.charset
    }

    fn decode(&self, body: &[u8]) -> Result<Value, String> {
        serde_yaml::from_slice(body).map_err(|e| e.to_string())
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>, String> {
        serde_yaml::to_string(value)
            .map(String::into_bytes)
            .map_err(|e| e.to_string())
    }
}

/// Ordered mime → codec registry.
#[derive(Clone)]
pub struct Serialization {
    codecs: Vec<(String, Arc<dyn Codec>)>,
}

impl Default for Serialization {
    /// JSON first, then YAML, both `utf-8`.
    fn default() -> Self {
        Self::with_charset("utf-8")
    }
}

impl std::fmt::Debug for Serialization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.mimes()).finish()
    }
}

impl Serialization {
    /// Registry with no codecs; every negotiation fails until one is added.
    #[must_use]
    pub fn empty() -> Self {
        Self { codecs: Vec::new() }
    }

    /// The built-in JSON and YAML codecs using `charset`.
    #[must_use]
    pub fn with_charset(charset: &str) -> Self {
        Self::empty()
            .register("application/json", JsonCodec::new(charset))
            .register("application/x-yaml", YamlCodec::new(charset))
    }

    /// Register `codec` for `mime`, replacing an earlier registration in place.
    #[must_use]
    pub fn register(mut self, mime: &str, codec: impl Codec + 'static) -> Self {
        let mime = mime.to_ascii_lowercase();
        let codec: Arc<dyn Codec> = Arc::new(codec);
        match self.codecs.iter_mut().find(|(m, _)| *m == mime) {
            Some((_, existing)) => *existing = codec,
            None => self.codecs.push((mime, codec)),
        }
        self
    }

    /// Registered mime types in registration order
    pub fn mimes(&self) -> impl Iterator<Item = &str> {
        self.codecs.iter().map(|(m, _)| m.as_str())
    }

    /// Codec registered for exactly `mime` (parameters stripped, case-insensitive).
    #[must_use]
    pub fn codec(&self, mime: &str) -> Option<&dyn Codec> {
        let mime = essence(mime);
        self.codecs
            .iter()
            .find(|(m, _)| m.eq_ignore_ascii_case(mime))
            .map(|(_, c)| c.as_ref())
    }

    /// Pick the output codec for an `Accept` header.
    pub fn negotiate(&self, accept: Option<&str>) -> DispatchResult<(&str, &dyn Codec)> {
        let not_acceptable = || DispatchError::NotAcceptable {
            accept: accept.unwrap_or_default().to_string(),
        };

        let ranges = match accept.map(str::trim).filter(|a| !a.is_empty()) {
            Some(header) => parse_accept(header),
            None => {
                return self
                    .codecs
                    .first()
                    .map(|(m, c)| (m.as_str(), c.as_ref()))
                    .ok_or_else(not_acceptable)
            }
        };

        let mut best: Option<(f32, &str, &dyn Codec)> = None;
        for (mime, codec) in &self.codecs {
            let Some(q) = quality_for(mime, &ranges) else {
                continue;
            };
            if q <= 0.0 {
                continue;
            }
            if best.map_or(true, |(best_q, _, _)| q > best_q) {
                best = Some((q, mime.as_str(), codec.as_ref()));
            }
        }
        best.map(|(_, m, c)| (m, c)).ok_or_else(not_acceptable)
    }
}

/// Media type without parameters
pub(crate) fn essence(mime: &str) -> &str {
    mime.split(';').next().unwrap_or_default().trim()
}

#[derive(Debug, PartialEq)]
struct MediaRange {
    kind: String,
    subtype: String,
    q: f32,
}

impl MediaRange {
    /// 0 = `*/*`, 1 = `type/*`, 2 = exact
    fn specificity(&self) -> u8 {
        match (self.kind.as_str(), self.subtype.as_str()) {
            ("*", _) => 0,
            (_, "*") => 1,
            _ => 2,
        }
    }

    fn matches(&self, kind: &str, subtype: &str) -> bool {
        (self.kind == "*" || self.kind == kind) && (self.subtype == "*" || self.subtype == subtype)
    }
}

fn parse_accept(header: &str) -> Vec<MediaRange> {
    header
        .split(',')
        .filter_map(|item| {
            let mut parts = item.split(';');
            let range = parts.next()?.trim().to_ascii_lowercase();
            let (kind, subtype) = range.split_once('/')?;
            let q = parts
                .filter_map(|p| p.trim().strip_prefix("q="))
                .find_map(|v| v.trim().parse::<f32>().ok())
                .unwrap_or(1.0);
            Some(MediaRange {
                kind: kind.trim().to_string(),
                subtype: subtype.trim().to_string(),
                q,
            })
        })
        .collect()
}

/// q-value of the most specific range matching `mime`.
fn quality_for(mime: &str, ranges: &[MediaRange]) -> Option<f32> {
    let (kind, subtype) = mime.split_once('/')?;
    ranges
        .iter()
        .filter(|r| r.matches(kind, subtype))
        .max_by_key(|r| r.specificity())
        .map(|r| r.q)
}
