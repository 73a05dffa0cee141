//! Pagination utilities for controller list responses.
//!
//! List endpoints wrap their results in an envelope:
//!
//! ```json
//! {"count": 4, "next": "...", "previous": null, "results": [...]}
//! ```
//!
//! Only `count` and `results` are used. Callers ask for more results by
//! raising the limit, not by following `next`.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{DryccError, Result};

/// Default number of results requested by list operations.
pub const DEFAULT_LIMIT: u32 = 100;

/// A list envelope with its results still as JSON text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPage {
    /// The `results` array, re-serialized on its own.
    pub results: String,
    /// Total number of results on the server.
    pub count: u64,
}

/// A page of typed results.
#[derive(Debug, Clone, Serialize)]
#[serde(bound = "T: Serialize")]
pub struct Page<T> {
    /// The items returned.
    pub items: Vec<T>,
    /// Total number of items on the server.
    pub total: u64,
}

impl<T> Page<T> {
    /// Create a page from items and the server-side total.
    #[must_use]
    pub fn new(items: Vec<T>, total: u64) -> Self {
        Self { items, total }
    }

    /// Decode the results of a raw page.
    ///
    /// # Errors
    ///
    /// Returns an error if the results do not decode as `T`.
    pub fn from_raw(raw: &RawPage) -> Result<Self>
    where
        T: DeserializeOwned,
    {
        let items = serde_json::from_str(&raw.results)?;
        Ok(Self::new(items, raw.count))
    }

    /// Whether the server holds more items than were returned.
    pub fn has_more(&self) -> bool {
        (self.items.len() as u64) < self.total
    }

    /// Map the items to a different type.
    #[must_use]
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
        }
    }

    /// Returns true if this page has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the number of items on this page.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns an iterator over the items in this page.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }
}

impl<T> IntoIterator for Page<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a Page<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Append a `limit` query parameter to a relative path.
pub fn with_limit(path: &str, limit: u32) -> String {
    match path.split_once('?') {
        Some((_, "")) => format!("{path}limit={limit}"),
        Some(_) => format!("{path}&limit={limit}"),
        None => format!("{path}?limit={limit}"),
    }
}

/// Extract `count` and `results` from a list envelope.
///
/// # Errors
///
/// Returns [`DryccError::ParseError`] for malformed JSON and
/// [`DryccError::InvalidEnvelope`] when `count` or `results` is missing or
/// has the wrong type.
pub fn parse_envelope(body: &[u8]) -> Result<RawPage> {
    let envelope: Value = serde_json::from_slice(body)?;
    let envelope = envelope
        .as_object()
        .ok_or_else(|| DryccError::InvalidEnvelope("expected a JSON object".to_string()))?;

    let count = match envelope.get("count") {
        Some(count) => count.as_u64().ok_or_else(|| {
            DryccError::InvalidEnvelope(format!("`count` is not a non-negative integer: {count}"))
        })?,
        None => return Err(DryccError::InvalidEnvelope("missing `count`".to_string())),
    };

    let results = match envelope.get("results") {
        Some(Value::Array(results)) => results,
        Some(other) => {
            return Err(DryccError::InvalidEnvelope(format!(
                "`results` is not an array: {other}"
            )))
        }
        None => return Err(DryccError::InvalidEnvelope("missing `results`".to_string())),
    };

    Ok(RawPage {
        results: serde_json::to_string(results)?,
        count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_limit() {
        assert_eq!(with_limit("/v2/apps/", 2), "/v2/apps/?limit=2");
        assert_eq!(with_limit("/v2/apps/?owner=me", 2), "/v2/apps/?owner=me&limit=2");
        assert_eq!(with_limit("/v2/apps/?", 2), "/v2/apps/?limit=2");
    }

    #[test]
    fn test_parse_envelope() {
        let body = br#"
        {
            "count": 4,
            "next": "http://replaced.com/limited2/",
            "previous": null,
            "results": [
                {"test": "foo", "a": 1},
                {"test": "bar", "a": 2}
            ]
        }"#;

        let page = parse_envelope(body).unwrap();
        assert_eq!(page.count, 4);
        assert_eq!(
            page.results,
            r#"[{"test":"foo","a":1},{"test":"bar","a":2}]"#
        );
    }

    #[test]
    fn test_parse_envelope_rejects_bad_shapes() {
        assert!(matches!(
            parse_envelope(b"{not json"),
            Err(DryccError::ParseError(_))
        ));
        assert!(matches!(
            parse_envelope(b"[]"),
            Err(DryccError::InvalidEnvelope(_))
        ));
        assert!(matches!(
            parse_envelope(br#"{"results": []}"#),
            Err(DryccError::InvalidEnvelope(_))
        ));
        assert!(matches!(
            parse_envelope(br#"{"count": 1}"#),
            Err(DryccError::InvalidEnvelope(_))
        ));
        assert!(matches!(
            parse_envelope(br#"{"count": "1", "results": []}"#),
            Err(DryccError::InvalidEnvelope(_))
        ));
        assert!(matches!(
            parse_envelope(br#"{"count": 1, "results": {}}"#),
            Err(DryccError::InvalidEnvelope(_))
        ));
    }

    #[test]
    fn test_page_from_raw() {
        #[derive(serde::Deserialize)]
        struct Item {
            test: String,
        }

        let raw = RawPage {
            results: r#"[{"test":"foo"},{"test":"bar"}]"#.to_string(),
            count: 4,
        };
        let page: Page<Item> = Page::from_raw(&raw).unwrap();
        assert_eq!(page.len(), 2);
        assert!(page.has_more());
        let names: Vec<String> = page.map(|i| i.test).into_iter().collect();
        assert_eq!(names, vec!["foo", "bar"]);
    }

    #[test]
    fn test_page_without_more() {
        let page = Page::new(vec![1, 2], 2);
        assert!(!page.has_more());
        assert_eq!(page.iter().sum::<i32>(), 3);
    }
}
