// PlacesProvider - generic places catalog backend (Google Places API)

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::config::{ProviderConfig, ProviderKind};
use crate::error::SearchError;

use super::http::{build_url, get_json, required_array, required_str, RequestMemo, GOOGLE_BASE_URL};
use super::{build_highlight, parse_location, parse_types, Candidate, DetailItem, Provider};

const DETAIL_FIELDS: &str =
    "address_component,adr_address,formatted_address,geometry,icon,name,place_id,type,url,vicinity";

/// Broad catch-all places autocomplete, usually registered last.
pub struct PlacesProvider {
    config: ProviderConfig,
    client: Client,
    base_url: String,
    memo: RequestMemo,
}

impl PlacesProvider {
    pub fn new(config: ProviderConfig) -> Self {
        Self::with_base_url(config, GOOGLE_BASE_URL)
    }

    /// Point the provider at a different host (tests, proxying gateways).
    pub fn with_base_url(config: ProviderConfig, base_url: impl Into<String>) -> Self {
        Self {
            config,
            client: Client::new(),
            base_url: base_url.into(),
            memo: RequestMemo::new(),
        }
    }

    fn parse_candidate(item: &Value) -> Result<Candidate, SearchError> {
        let kind = ProviderKind::Places;
        let description = required_str(kind, item, "description")?;
        let id = required_str(kind, item, "place_id")?;
        let matched_substrings = item.get("matched_substrings").cloned();
        Ok(Candidate {
            id: id.to_string(),
            description: description.to_string(),
            highlight: build_highlight(description, matched_substrings.as_ref()),
            result_types: parse_types(item),
            matched_substrings,
            raw: item.clone(),
        })
    }

    fn check_status(&self, body: &Value) -> Result<(), SearchError> {
        let Some(status) = body.get("status").and_then(Value::as_str) else {
            return Ok(());
        };
        match status {
            "OK" | "ZERO_RESULTS" => Ok(()),
            other => Err(SearchError::provider(self.config.kind(), other.to_string())),
        }
    }
}

#[async_trait]
impl Provider for PlacesProvider {
    fn config(&self) -> &ProviderConfig {
        &self.config
    }

    async fn search(&self, query: &str) -> Result<Vec<Candidate>, SearchError> {
        let kind = self.config.kind();
        let mut pairs = vec![
            ("input".to_string(), query.to_string()),
            ("key".to_string(), self.config.key().to_string()),
        ];
        pairs.extend(self.config.params().to_query_pairs(kind));

        let url = build_url(kind, &format!("{}/autocomplete/json", self.base_url), &pairs)?;
        if let Some(cached) = self.memo.get(url.as_str()) {
            return Ok(cached);
        }

        let body = get_json(&self.client, kind, url.clone()).await?;
        self.check_status(&body)?;
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
        let fields = self
            .config
            .params()
            .fields
            .clone()
            .filter(|f| !f.is_empty())
            .unwrap_or_else(|| DETAIL_FIELDS.to_string());
        let mut pairs = vec![
            ("place_id".to_string(), id.to_string()),
            ("key".to_string(), self.config.key().to_string()),
            ("fields".to_string(), fields),
        ];
        if let Some(language) = &self.config.params().language {
            pairs.push(("language".to_string(), language.clone()));
        }

        let url = build_url(kind, &format!("{}/details/json", self.base_url), &pairs)?;
        let body = get_json(&self.client, kind, url).await?;
        self.check_status(&body)?;
        let result = body
            .get("result")
            .filter(|r| r.is_object())
            .ok_or_else(|| SearchError::provider(kind, "malformed payload: missing `result`"))?;

        Ok(DetailItem {
            id: result
                .get("place_id")
                .and_then(Value::as_str)
                .unwrap_or(id)
                .to_string(),
            name: result
                .get("name")
                .and_then(Value::as_str)
                .map(str::to_string),
            formatted_address: result
                .get("formatted_address")
                .and_then(Value::as_str)
                .map(str::to_string),
            types: parse_types(result),
            geometry: parse_location(result),
            provider: kind,
            raw: result.clone(),
        })
    }
}
