// StoreProvider - client store directory backend

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::config::{ProviderConfig, ProviderKind};
use crate::error::SearchError;

use super::http::{build_url, get_json, required_array, required_str, RequestMemo, WOOSMAP_BASE_URL};
use super::{build_highlight, parse_types, Candidate, DetailItem, Geometry, Provider};

/// Autocomplete over a client's own store directory.
///
/// Typically registered always-on: the store list should appear regardless
/// of how the geographic providers score.
pub struct StoreProvider {
    config: ProviderConfig,
    client: Client,
    base_url: String,
    memo: RequestMemo,
}

impl StoreProvider {
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

    /// Store query clause: configured filters joined with the localized
    /// search term, e.g. `type:type1|localized:"Mont"`.
    fn search_query(&self, query: &str) -> String {
        let localized = format!("localized:\"{query}\"");
        let filters = &self.config.params().query;
        if filters.is_empty() {
            localized
        } else {
            format!("{}|{}", filters.join("|"), localized)
        }
    }

    fn parse_candidate(item: &Value) -> Result<Candidate, SearchError> {
        let kind = ProviderKind::Store;
        // The store backend has no `description` field; the name is the
        // display text.
        let name = required_str(kind, item, "name")?;
        let id = required_str(kind, item, "store_id")?;
        let matched_substrings = item.get("matched_substrings").cloned();
        let mut raw = item.clone();
        if let Some(object) = raw.as_object_mut() {
            object.insert("description".to_string(), Value::String(name.to_string()));
        }
        Ok(Candidate {
            id: id.to_string(),
            description: name.to_string(),
            highlight: build_highlight(name, matched_substrings.as_ref()),
            result_types: parse_types(item),
            matched_substrings,
            raw,
        })
    }
}

#[async_trait]
impl Provider for StoreProvider {
    fn config(&self) -> &ProviderConfig {
        &self.config
    }

    async fn search(&self, query: &str) -> Result<Vec<Candidate>, SearchError> {
        let kind = self.config.kind();
        let mut pairs = vec![
            ("private_key".to_string(), self.config.key().to_string()),
            ("query".to_string(), self.search_query(query)),
        ];
        pairs.extend(self.config.params().to_query_pairs(kind));

        let url = build_url(
            kind,
            &format!("{}/stores/autocomplete", self.base_url),
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
        let pairs = vec![
            ("private_key".to_string(), self.config.key().to_string()),
            ("query".to_string(), format!("idstore:\"{id}\"")),
        ];

        let url = build_url(kind, &format!("{}/stores/search", self.base_url), &pairs)?;
        let body = get_json(&self.client, kind, url).await?;
        let feature = required_array(kind, &body, "features")?
            .first()
            .cloned()
            .ok_or_else(|| SearchError::provider(kind, format!("no store found for id {id}")))?;

        let properties = feature
            .get("properties")
            .filter(|p| p.is_object())
            .ok_or_else(|| SearchError::provider(kind, "malformed payload: missing `properties`"))?;

        // GeoJSON point: coordinates are [lng, lat].
        let geometry = feature
            .get("geometry")
            .and_then(|g| g.get("coordinates"))
            .and_then(Value::as_array)
            .and_then(|coords| {
                Some(Geometry {
                    lat: coords.get(1)?.as_f64()?,
                    lng: coords.first()?.as_f64()?,
                })
            });
        let formatted_address = properties
            .get("address")
            .and_then(|a| a.get("lines"))
            .and_then(Value::as_array)
            .map(|lines| {
                lines
                    .iter()
                    .filter_map(Value::as_str)
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .filter(|lines| !lines.is_empty());

        Ok(DetailItem {
            id: properties
                .get("store_id")
                .and_then(Value::as_str)
                .unwrap_or(id)
                .to_string(),
            name: properties
                .get("name")
                .and_then(Value::as_str)
                .map(str::to_string),
            formatted_address,
            types: parse_types(properties),
            geometry,
            provider: kind,
            raw: feature,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn provider(filters: &[&str]) -> StoreProvider {
        let mut builder = ProviderConfig::builder(ProviderKind::Store).key("k");
        for filter in filters {
            builder = builder.query(*filter);
        }
        StoreProvider::new(builder.build().unwrap())
    }

    #[test]
    fn search_query_wraps_the_term_in_a_localized_clause() {
        assert_eq!(provider(&[]).search_query("Mont"), "localized:\"Mont\"");
        assert_eq!(
            provider(&["type:type1"]).search_query("Mont"),
            "type:type1|localized:\"Mont\""
        );
    }

    #[test]
    fn candidate_description_comes_from_the_store_name() {
        let item = json!({ "name": "My Store - Pantin", "store_id": "s-042" });
        let candidate = StoreProvider::parse_candidate(&item).unwrap();
        assert_eq!(candidate.id, "s-042");
        assert_eq!(candidate.description, "My Store - Pantin");
        assert_eq!(
            candidate.raw.get("description").and_then(Value::as_str),
            Some("My Store - Pantin")
        );
    }

    #[test]
    fn missing_store_id_is_a_provider_error() {
        let err = StoreProvider::parse_candidate(&json!({ "name": "x" })).unwrap_err();
        assert!(matches!(
            err,
            SearchError::Provider {
                kind: ProviderKind::Store,
                ..
            }
        ));
    }
}
