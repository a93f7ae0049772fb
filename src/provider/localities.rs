// LocalitiesProvider - administrative localities and postal codes backend

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::config::{ProviderConfig, ProviderKind};
use crate::error::SearchError;

use super::http::{build_url, get_json, required_array, required_str, RequestMemo, WOOSMAP_BASE_URL};
use super::{build_highlight, parse_location, parse_types, Candidate, DetailItem, Provider};

/// Autocomplete over administrative localities and postal codes.
pub struct LocalitiesProvider {
    config: ProviderConfig,
    client: Client,
    base_url: String,
    memo: RequestMemo,
}

impl LocalitiesProvider {
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
        let kind = ProviderKind::Localities;
        let description = required_str(kind, item, "description")?;
        let id = required_str(kind, item, "public_id")?;
        let matched_substrings = item
            .get("matched_substrings")
            .and_then(|m| m.get("description"))
            .cloned();
        Ok(Candidate {
            id: id.to_string(),
            description: description.to_string(),
            highlight: build_highlight(description, matched_substrings.as_ref()),
            result_types: parse_types(item),
            matched_substrings,
            raw: item.clone(),
        })
    }
}

#[async_trait]
impl Provider for LocalitiesProvider {
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

        let url = build_url(
            kind,
            &format!("{}/localities/autocomplete", self.base_url),
            &pairs,
        )?;
        if let Some(cached) = self.memo.get(url.as_str()) {
            return Ok(cached);
        }

        let body = get_json(&self.client, kind, url.clone()).await?;
        let items = required_array(kind, &body, "localities")?;
        let candidates = items
            .iter()
            .map(Self::parse_candidate)
            .collect::<Result<Vec<_>, _>>()?;
        self.memo.put(url.into(), &candidates);
        Ok(candidates)
    }

    async fn details(&self, id: &str) -> Result<DetailItem, SearchError> {
        let kind = self.config.kind();
        let mut pairs = vec![
            ("private_key".to_string(), self.config.key().to_string()),
            ("public_id".to_string(), id.to_string()),
        ];
        if let Some(language) = &self.config.params().language {
            pairs.push(("language".to_string(), language.clone()));
        }
        if let Some(fields) = &self.config.params().fields {
            if !fields.is_empty() {
                pairs.push(("fields".to_string(), fields.clone()));
            }
        }

        let url = build_url(kind, &format!("{}/localities/details", self.base_url), &pairs)?;
        let body = get_json(&self.client, kind, url).await?;
        let result = body
            .get("result")
            .filter(|r| r.is_object())
            .ok_or_else(|| SearchError::provider(kind, "malformed payload: missing `result`"))?;

        Ok(DetailItem {
            id: result
                .get("public_id")
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
