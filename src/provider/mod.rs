// Provider trait and normalized data models shared by every backend

pub mod address;
pub mod http;
pub mod localities;
pub mod places;
pub mod store;

pub use address::AddressProvider;
pub use localities::LocalitiesProvider;
pub use places::PlacesProvider;
pub use store::StoreProvider;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::config::{ProviderConfig, ProviderKind};
use crate::error::SearchError;

/// Normalized output of a provider's autocomplete call.
#[derive(Debug, Clone, Serialize)]
pub struct Candidate {
    /// Item identifier. For the address backend this is an internal
    /// identifier of the library, not a backend id.
    pub id: String,
    /// Human-readable name of the suggestion; the field scoring operates on.
    pub description: String,
    /// Description with the matched portions wrapped in `<mark>` tags.
    pub highlight: String,
    /// Types that apply to this item.
    pub result_types: Vec<String>,
    /// Offset/length pairs locating the entered term in the description.
    pub matched_substrings: Option<Value>,
    /// Raw backend payload.
    pub raw: Value,
}

/// Geographic point from a detail response.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Geometry {
    pub lat: f64,
    pub lng: f64,
}

/// Normalized output of a provider's detail call.
#[derive(Debug, Clone, Serialize)]
pub struct DetailItem {
    pub id: String,
    pub name: Option<String>,
    pub formatted_address: Option<String>,
    pub types: Vec<String>,
    pub geometry: Option<Geometry>,
    pub provider: ProviderKind,
    /// Raw backend payload.
    pub raw: Value,
}

/// One backend's search/detail capability.
///
/// Implementations own all transport concerns: request shaping from the
/// config's [`crate::config::QueryParams`], HTTP calls, and normalizing the
/// response into [`Candidate`]s. A payload that cannot be parsed must fail
/// with [`SearchError::Provider`], never silently produce zero items.
#[async_trait]
pub trait Provider: Send + Sync {
    fn config(&self) -> &ProviderConfig;

    async fn search(&self, query: &str) -> Result<Vec<Candidate>, SearchError>;

    async fn details(&self, id: &str) -> Result<DetailItem, SearchError>;
}

/// Wrap the matched portions of `description` in `<mark>` tags.
///
/// `matched_substrings` is the backend's array of `{offset, length}` pairs,
/// measured in characters.
pub(crate) fn build_highlight(description: &str, matched_substrings: Option<&Value>) -> String {
    let Some(matches) = matched_substrings.and_then(Value::as_array) else {
        return description.to_string();
    };
    let mut spans: Vec<(usize, usize)> = matches
        .iter()
        .filter_map(|m| {
            let offset = m.get("offset")?.as_u64()? as usize;
            let length = m.get("length")?.as_u64()? as usize;
            Some((offset, offset + length))
        })
        .collect();
    if spans.is_empty() {
        return description.to_string();
    }
    spans.sort_unstable();

    let chars: Vec<char> = description.chars().collect();
    let mut highlight = String::with_capacity(description.len() + spans.len() * 13);
    let mut cursor = 0;
    for (start, end) in spans {
        let start = start.min(chars.len());
        let end = end.min(chars.len());
        if start < cursor || start >= end {
            continue;
        }
        highlight.extend(&chars[cursor..start]);
        highlight.push_str("<mark>");
        highlight.extend(&chars[start..end]);
        highlight.push_str("</mark>");
        cursor = end;
    }
    highlight.extend(&chars[cursor..]);
    highlight
}

/// Types array of a detail payload; tolerates a single `type` string.
pub(crate) fn parse_types(item: &Value) -> Vec<String> {
    if let Some(types) = item.get("types").and_then(Value::as_array) {
        return types
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect();
    }
    item.get("type")
        .and_then(Value::as_str)
        .map(|t| vec![t.to_string()])
        .unwrap_or_default()
}

/// `geometry.location.{lat,lng}` of a detail payload.
pub(crate) fn parse_location(item: &Value) -> Option<Geometry> {
    let location = item.get("geometry")?.get("location")?;
    Some(Geometry {
        lat: location.get("lat")?.as_f64()?,
        lng: location.get("lng")?.as_f64()?,
    })
}

/// Pull a backend error message out of an error payload.
///
/// The Woosmap backends report `detail` or `value`; the places backend uses
/// `error_message`, with `status` as a fallback.
pub(crate) fn backend_error_message(body: &Value) -> Option<String> {
    for field in ["detail", "value", "error_message"] {
        if let Some(message) = body.get(field).and_then(Value::as_str) {
            return Some(message.to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn highlight_wraps_matched_spans() {
        let matches = json!([{ "offset": 0, "length": 5 }]);
        assert_eq!(
            build_highlight("Montpellier, Hérault, France", Some(&matches)),
            "<mark>Montp</mark>ellier, Hérault, France"
        );
    }

    #[test]
    fn highlight_handles_multiple_and_out_of_order_spans() {
        let matches = json!([{ "offset": 6, "length": 2 }, { "offset": 0, "length": 2 }]);
        assert_eq!(
            build_highlight("Paris, France", Some(&matches)),
            "<mark>Pa</mark>ris, <mark>Fr</mark>ance"
        );
    }

    #[test]
    fn highlight_without_matches_is_the_description() {
        assert_eq!(build_highlight("Pantin", None), "Pantin");
        assert_eq!(build_highlight("Pantin", Some(&json!([]))), "Pantin");
        assert_eq!(build_highlight("Pantin", Some(&json!("bogus"))), "Pantin");
    }

    #[test]
    fn highlight_clamps_spans_past_the_end() {
        let matches = json!([{ "offset": 3, "length": 40 }]);
        assert_eq!(
            build_highlight("Lyon", Some(&matches)),
            "Lyo<mark>n</mark>"
        );
    }

    #[test]
    fn backend_error_message_checks_known_fields() {
        assert_eq!(
            backend_error_message(&json!({"detail": "bad key"})),
            Some("bad key".to_string())
        );
        assert_eq!(
            backend_error_message(&json!({"error_message": "denied"})),
            Some("denied".to_string())
        );
        assert_eq!(backend_error_message(&json!({"predictions": []})), None);
    }
}
