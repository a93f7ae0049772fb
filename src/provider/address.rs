// AddressProvider - street address autocomplete/geocode backend

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use reqwest::Client;
use serde_json::Value;

use crate::config::{ProviderConfig, ProviderKind};
use crate::error::SearchError;

use super::http::{build_url, get_json, required_array, required_str, RequestMemo, WOOSMAP_BASE_URL};
use super::{build_highlight, parse_location, parse_types, Candidate, DetailItem, Provider};

/// Autocomplete over street addresses.
///
/// The backend does not expose a stable public id for suggestions, so the
/// candidate id is the URL-safe base64 of the description; `details`
/// decodes it back into the geocode request.
pub struct AddressProvider {
    config: ProviderConfig,
    client: Client,
    base_url: String,
    memo: RequestMemo,
}

impl AddressProvider {
    pub fn new(config: ProviderConfig) -> Self {
        Self::with_base_url(config, WOOSMAP_BASE_URL)
    }

    /// Point the provider at a different host (tests, self-hosted gateways).
    pub fn with_base_url(config: ProviderConfig, base_url: impl Into<String>) -> Self {
        Self {
            config,
            client: Client::new(),
            base_url: base_url.into(),
            memo: RequestMemo::new(),
        }
    }

    fn parse_candidate(item: &Value) -> Result<Candidate, SearchError> {
        let kind = ProviderKind::Address;
        let description = required_str(kind, item, "description")?;
        let matched_substrings = item.get("matched_substring").cloned();
        Ok(Candidate {
            id: URL_SAFE.encode(description.as_bytes()),
            description: description.to_string(),
            highlight: build_highlight(description, matched_substrings.as_ref()),
            result_types: parse_types(item),
            matched_substrings,
            raw: item.clone(),
        })
    }
}

#[async_trait]
impl Provider for AddressProvider {
    fn config(&self) -> &ProviderConfig {
        &self.config
    }

    async fn search(&self, query: &str) -> Result<Vec<Candidate>, SearchError> {
        let kind = self.config.kind();
        let mut pairs = vec![
            ("private_key".to_string(), self.config.key().to_string()),
            ("input".to_string(), query.to_string()),
        ];
        pairs.extend(self.config.params().to_query_pairs(kind));
        pairs.push(("cc_format".to_string(), "alpha2".to_string()));

        let url = build_url(
            kind,
            &format!("{}/address/autocomplete/json", self.base_url),
            &pairs,
        )?;
        if let Some(cached) = self.memo.get(url.as_str()) {
            return Ok(cached);
        }

        let body = get_json(&self.client, kind, url.clone()).await?;
        let items = required_array(kind, &body, "predictions")?;
        let candidates = items
            .iter()
            .map(Self::parse_candidate)
            .collect::<Result<Vec<_>, _>>()?;
        self.memo.put(url.into(), &candidates);
        Ok(candidates)
    }

    async fn details(&self, id: &str) -> Result<DetailItem, SearchError> {
        let kind = self.config.kind();
        let address = URL_SAFE
            .decode(id.as_bytes())
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok())
            .ok_or_else(|| SearchError::provider(kind, "invalid address identifier"))?;

        let mut pairs = vec![
            ("private_key".to_string(), self.config.key().to_string()),
            ("address".to_string(), address),
        ];
        pairs.extend(self.config.params().to_query_pairs(kind));
        pairs.push(("cc_format".to_string(), "alpha2".to_string()));

        let url = build_url(
            kind,
            &format!("{}/address/details/json", self.base_url),
            &pairs,
        )?;
        let body = get_json(&self.client, kind, url).await?;

        // The geocode endpoint answers with a result list; the first entry
        // is the detail for the requested address.
        let result = match body.get("result") {
            Some(Value::Object(_)) => body.get("result").cloned(),
            Some(Value::Array(results)) => results.first().cloned(),
            _ => body
                .get("results")
                .and_then(Value::as_array)
                .and_then(|r| r.first())
                .cloned(),
        }
        .ok_or_else(|| SearchError::provider(kind, "malformed payload: missing `result`"))?;

        Ok(DetailItem {
            id: id.to_string(),
            name: result
                .get("name")
                .and_then(Value::as_str)
                .map(str::to_string),
            formatted_address: result
                .get("formatted_address")
                .and_then(Value::as_str)
                .map(str::to_string),
            types: parse_types(&result),
            geometry: parse_location(&result),
            provider: kind,
            raw: result,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn candidate_id_round_trips_through_base64() {
        let item = json!({ "description": "23 Rue Delizy, 93500 Pantin, France" });
        let candidate = AddressProvider::parse_candidate(&item).unwrap();
        let decoded = URL_SAFE.decode(candidate.id.as_bytes()).unwrap();
        assert_eq!(
            String::from_utf8(decoded).unwrap(),
            "23 Rue Delizy, 93500 Pantin, France"
        );
    }

    #[test]
    fn missing_description_is_a_provider_error() {
        let err = AddressProvider::parse_candidate(&json!({})).unwrap_err();
        assert!(matches!(
            err,
            SearchError::Provider {
                kind: ProviderKind::Address,
                ..
            }
        ));
    }
}
