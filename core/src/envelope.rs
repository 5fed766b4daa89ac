//! OData envelope decoding and the shape resolver for endpoints whose payload
//! is not statically known.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DecodeError;
use crate::fields::{list, text};

#[derive(Debug, Deserialize)]
struct Envelope {
    d: Value,
}

/// Nested `{ "results": [...] }` collection inside an expanded entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Collection<T> {
    #[serde(default, deserialize_with = "list")]
    pub results: Vec<T>,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self {
            results: Vec::new(),
        }
    }
}

/// `d` of a search endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct SearchResults<T> {
    #[serde(default, deserialize_with = "list")]
    pub results: Vec<T>,
    #[serde(default)]
    pub summary: SearchSummary,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchSummary {
    #[serde(default, deserialize_with = "text")]
    pub total_hits: String,
    #[serde(default, deserialize_with = "text")]
    pub total_time: String,
}

/// One page of a listing plus the counters needed to continue it.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub has_more: bool,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            has_more: false,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct PageWrapper<T> {
    results: Vec<T>,
    #[serde(default)]
    summary: Option<PageSummary>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageSummary {
    #[serde(default, deserialize_with = "text")]
    total: String,
}

/// Extracts `d` from a raw response body. A body that is not JSON or lacks
/// `d` is fatal and keeps the body for diagnostics.
pub fn decode_payload(body: &[u8]) -> Result<Value, DecodeError> {
    serde_json::from_slice::<Envelope>(body)
        .map(|envelope| envelope.d)
        .map_err(|source| DecodeError::Envelope {
            source,
            body: String::from_utf8_lossy(body).into_owned(),
        })
}

/// Decodes `d` into a known entity shape.
pub fn decode_entity<T: DeserializeOwned>(entity: &'static str, body: &[u8]) -> Result<T, DecodeError> {
    let payload = decode_payload(body)?;
    serde_json::from_value(payload).map_err(|source| DecodeError::Payload { entity, source })
}

/// Resolves a listing that may arrive as `{results, summary}` or as a bare
/// array. Anything else degrades to an empty page.
///
/// `limit == 0` means no page size was requested and `has_more` stays false.
pub fn resolve_page<T: DeserializeOwned>(payload: Value, limit: u64, offset: u64) -> Page<T> {
    if let Ok(wrapper) = PageWrapper::<T>::deserialize(&payload) {
        let returned = wrapper.results.len() as u64;
        let seen = offset.saturating_add(returned);
        let total = wrapper
            .summary
            .and_then(|summary| summary.total.trim().parse::<u64>().ok())
            .unwrap_or(seen);
        let has_more = limit > 0 && seen < total;
        return Page {
            items: wrapper.results,
            total,
            has_more,
        };
    }

    if let Ok(items) = Vec::<T>::deserialize(&payload) {
        let total = items.len() as u64;
        return Page {
            items,
            total,
            has_more: false,
        };
    }

    Page::empty()
}
