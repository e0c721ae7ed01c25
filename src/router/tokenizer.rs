//! Path tokenization.
//!
//! A request path is split into non-empty, percent-decoded segments and then
//! grouped two at a time into `(resource_name, id)` pairs by [`Pairwise`].
//! Grouping is pull-based: a pair is produced as soon as its second segment is
//! consumed, so a caller that fails on an early pair never looks at the rest.

use std::borrow::Cow;

use crate::error::{DispatchError, DispatchResult};

/// One `(resource_name, id)` step of a path. `id` is `None` for a dangling
/// final segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenPair<'a> {
    pub resource: &'a str,
    pub id: Option<&'a str>,
}

/// Split `path_info` into its non-empty segments, percent-decoding each one.
///
/// The leading empty segment of an absolute path is dropped, as are the empty
/// segments produced by trailing or doubled slashes.
pub fn split_path(path_info: &str) -> DispatchResult<Vec<Cow<'_, str>>> {
    path_info
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            urlencoding::decode(segment).map_err(|_| {
                DispatchError::bad_request(format!("path segment '{segment}' is not valid UTF-8"))
            })
        })
        .collect()
}

/// Lazy pairing adapter over any segment iterator.
pub struct Pairwise<I> {
    inner: I,
}

impl<I> Pairwise<I> {
    pub fn new(inner: I) -> Self {
        Self { inner }
    }
}

impl<I, T> Iterator for Pairwise<I>
where
    I: Iterator<Item = T>,
{
    type Item = (T, Option<T>);

    fn next(&mut self) -> Option<Self::Item> {
        let first = self.inner.next()?;
        Some((first, self.inner.next()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let (lo, hi) = self.inner.size_hint();
        (lo.div_ceil(2), hi.map(|h| h.div_ceil(2)))
    }
}

/// Pair up `segments` as `(resource_name, id)` token pairs.
pub fn pairwise<'a, S>(segments: &'a [S]) -> impl Iterator<Item = TokenPair<'a>> + 'a
where
    S: AsRef<str>,
{
    Pairwise::new(segments.iter().map(AsRef::as_ref)).map(|(resource, id)| TokenPair { resource, id })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_drops_empty_segments() {
        let segments = split_path("/articles//42/").unwrap();
        assert_eq!(segments, vec!["articles", "42"]);
        assert!(split_path("/").unwrap().is_empty());
        assert!(split_path("").unwrap().is_empty());
    }

    #[test]
    fn test_split_percent_decodes() {
        let segments = split_path("/tags/rust%20lang").unwrap();
        assert_eq!(segments[1], "rust lang");
    }

    #[test]
    fn test_split_rejects_invalid_utf8() {
        let err = split_path("/tags/%FF").unwrap_err();
        assert_eq!(err.status(), 400);
    }

    #[test]
    fn test_pairwise_stops_early() {
        let mut pulled = 0;
        let segments = ["a", "1", "b", "2", "c"];
        let mut pairs = Pairwise::new(segments.iter().inspect(|_| pulled += 1));
        assert_eq!(pairs.next(), Some((&"a", Some(&"1"))));
        drop(pairs);
        assert_eq!(pulled, 2);
    }
}
