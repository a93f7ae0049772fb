// Shared HTTP plumbing for the concrete providers

use std::sync::Mutex;

use reqwest::{Client, Url};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::ProviderKind;
use crate::error::SearchError;

use super::{backend_error_message, Candidate};

pub(crate) const WOOSMAP_BASE_URL: &str = "https://api.woosmap.com";
pub(crate) const GOOGLE_BASE_URL: &str = "https://maps.googleapis.com/maps/api/place";

/// Remembers the last request URL and its parsed candidates.
///
/// Successive keystrokes can resolve to the identical request (e.g. after a
/// trim); returning the memoized answer avoids a redundant network call.
#[derive(Default)]
pub(crate) struct RequestMemo {
    inner: Mutex<Option<(String, Vec<Candidate>)>>,
}

impl RequestMemo {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn get(&self, url: &str) -> Option<Vec<Candidate>> {
        let guard = self.inner.lock().ok()?;
        match guard.as_ref() {
            Some((cached_url, candidates)) if cached_url == url => Some(candidates.clone()),
            _ => None,
        }
    }

    pub(crate) fn put(&self, url: String, candidates: &[Candidate]) {
        if let Ok(mut guard) = self.inner.lock() {
            *guard = Some((url, candidates.to_vec()));
        }
    }
}

/// Build the full request URL from an endpoint and its query pairs.
pub(crate) fn build_url(
    kind: ProviderKind,
    endpoint: &str,
    pairs: &[(String, String)],
) -> Result<Url, SearchError> {
    Url::parse_with_params(endpoint, pairs)
        .map_err(|e| SearchError::provider(kind, format!("invalid request URL: {e}")))
}

/// Execute a GET and parse the JSON body.
///
/// Non-success statuses and error payloads embedded in success bodies both
/// surface as [`SearchError::Provider`], with the backend's own message
/// (`detail`, `value` or `error_message`) when one is present.
pub(crate) async fn get_json(
    client: &Client,
    kind: ProviderKind,
    url: Url,
) -> Result<Value, SearchError> {
    debug!(provider = %kind, path = url.path(), "calling backend");

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| SearchError::provider(kind, format!("request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let body: Value = response.json().await.unwrap_or(Value::Null);
        let message = backend_error_message(&body)
            .unwrap_or_else(|| "internal error, please try again later".to_string());
        warn!(provider = %kind, %status, "backend returned error");
        return Err(SearchError::provider(kind, format!("{status}: {message}")));
    }

    let body: Value = response
        .json()
        .await
        .map_err(|e| SearchError::provider(kind, format!("invalid response payload: {e}")))?;

    if let Some(message) = backend_error_message(&body) {
        return Err(SearchError::provider(kind, message));
    }
    Ok(body)
}

/// Required string field of a backend item; missing fields are provider
/// errors, never silently dropped items.
pub(crate) fn required_str<'a>(
    kind: ProviderKind,
    item: &'a Value,
    field: &str,
) -> Result<&'a str, SearchError> {
    item.get(field).and_then(Value::as_str).ok_or_else(|| {
        SearchError::provider(kind, format!("malformed payload: missing `{field}`"))
    })
}

/// Required array field of a backend response body.
pub(crate) fn required_array<'a>(
    kind: ProviderKind,
    body: &'a Value,
    field: &str,
) -> Result<&'a Vec<Value>, SearchError> {
    body.get(field).and_then(Value::as_array).ok_or_else(|| {
        SearchError::provider(kind, format!("malformed payload: missing `{field}`"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn candidate(id: &str) -> Candidate {
        Candidate {
            id: id.to_string(),
            description: id.to_string(),
            highlight: id.to_string(),
            result_types: Vec::new(),
            matched_substrings: None,
            raw: json!({}),
        }
    }

    #[test]
    fn memo_returns_only_exact_url_matches() {
        let memo = RequestMemo::new();
        assert!(memo.get("https://a/x?input=Mo").is_none());

        memo.put("https://a/x?input=Mo".to_string(), &[candidate("1")]);
        assert_eq!(memo.get("https://a/x?input=Mo").unwrap().len(), 1);
        assert!(memo.get("https://a/x?input=Mont").is_none());

        memo.put("https://a/x?input=Mont".to_string(), &[]);
        assert!(memo.get("https://a/x?input=Mo").is_none());
        assert!(memo.get("https://a/x?input=Mont").unwrap().is_empty());
    }

    #[test]
    fn build_url_encodes_query_pairs() {
        let url = build_url(
            ProviderKind::Store,
            "https://api.example.com/stores/autocomplete",
            &[("query".to_string(), "localized:\"Mo nt\"".to_string())],
        )
        .unwrap();
        assert!(url.as_str().contains("query=localized"));
        assert!(!url.as_str().contains(' '));
    }

    #[test]
    fn required_fields_report_malformed_payloads() {
        let err = required_str(ProviderKind::Localities, &json!({}), "description").unwrap_err();
        assert!(matches!(err, SearchError::Provider { .. }));
        assert!(err.to_string().contains("description"));

        let err = required_array(ProviderKind::Address, &json!({"x": 1}), "predictions")
            .unwrap_err();
        assert!(err.to_string().contains("predictions"));
    }
}
