// Provider configuration - kind enum, per-provider options, forwarded query parameters

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SearchError;

/// The closed set of supported backend kinds.
///
/// `Localities` and `Address` target administrative/postal data, `Store`
/// targets a client's own store directory, `Places` targets a broad
/// generic-places catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Localities,
    Address,
    Store,
    Places,
}

impl ProviderKind {
    /// Default relevance threshold applied when a config does not set one.
    ///
    /// Localities 0.4, Address 0.5, Store 1.0, Places 1.0.
    pub fn default_breakpoint(self) -> f32 {
        match self {
            ProviderKind::Localities => 0.4,
            ProviderKind::Address => 0.5,
            ProviderKind::Store => 1.0,
            ProviderKind::Places => 1.0,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProviderKind::Localities => "localities",
            ProviderKind::Address => "address",
            ProviderKind::Store => "store",
            ProviderKind::Places => "places",
        };
        f.write_str(name)
    }
}

/// Postal-code search spectrum for the localities backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Data {
    Standard,
    Advanced,
}

impl Data {
    fn as_str(self) -> &'static str {
        match self {
            Data::Standard => "standard",
            Data::Advanced => "advanced",
        }
    }
}

/// Extra parameters forwarded verbatim to a provider's backend.
///
/// The orchestrator never reads these; each provider turns them into query
/// string pairs when shaping its request.
#[derive(Debug, Clone, Default)]
pub struct QueryParams {
    /// ISO 3166-1 alpha-2 country codes used to restrict results.
    pub countries: Vec<String>,
    /// Language code for localized results.
    pub language: Option<String>,
    /// Suggestion types to return (e.g. `locality`, `postal_code`).
    pub search_types: Vec<String>,
    /// Backend-specific query filters (e.g. store `type:` clauses).
    pub query: Vec<String>,
    /// Postal-code search spectrum.
    pub data: Option<Data>,
    /// Refined locality-name search over shared postal codes.
    pub extended: Option<String>,
    /// Restrict detail responses to the named fields.
    pub fields: Option<String>,
}

impl QueryParams {
    /// Query-string pairs shared by the Woosmap-style autocomplete endpoints.
    ///
    /// `query` filters are only meaningful for the address and localities
    /// backends; the store provider folds them into its own `query` clause.
    pub(crate) fn to_query_pairs(&self, kind: ProviderKind) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if !self.countries.is_empty() {
            let components = self
                .countries
                .iter()
                .map(|c| format!("country:{c}"))
                .collect::<Vec<_>>()
                .join("|");
            pairs.push(("components".to_string(), components));
        }
        if !self.search_types.is_empty() {
            pairs.push(("types".to_string(), self.search_types.join("|")));
        }
        if let Some(language) = &self.language {
            if !language.trim().is_empty() {
                pairs.push(("language".to_string(), language.trim().to_string()));
            }
        }
        if matches!(kind, ProviderKind::Address | ProviderKind::Localities) && !self.query.is_empty()
        {
            pairs.push(("query".to_string(), self.query.join("|")));
        }
        if let Some(data) = self.data {
            pairs.push(("data".to_string(), data.as_str().to_string()));
        }
        if let Some(extended) = &self.extended {
            if !extended.is_empty() {
                pairs.push(("extended".to_string(), extended.clone()));
            }
        }
        pairs
    }
}

/// Immutable configuration for one provider, created before registration.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    kind: ProviderKind,
    key: String,
    fallback_breakpoint: Option<f32>,
    min_input_length: usize,
    ignore_breakpoint: bool,
    params: QueryParams,
}

impl ProviderConfig {
    pub fn builder(kind: ProviderKind) -> ProviderConfigBuilder {
        ProviderConfigBuilder {
            kind,
            key: None,
            fallback_breakpoint: None,
            min_input_length: 0,
            ignore_breakpoint: false,
            params: QueryParams::default(),
        }
    }

    pub fn kind(&self) -> ProviderKind {
        self.kind
    }

    /// API key used by the provider.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Relevance threshold for this provider; items scoring above it are
    /// rejected. Falls back to the kind-specific default when unset.
    pub fn breakpoint(&self) -> f32 {
        self.fallback_breakpoint
            .unwrap_or_else(|| self.kind.default_breakpoint())
    }

    /// Queries shorter than this are not sent to the provider.
    pub fn min_input_length(&self) -> usize {
        self.min_input_length
    }

    /// Always-on flag: results bypass scoring and the provider never
    /// participates in the incremental-skip optimization.
    pub fn ignore_breakpoint(&self) -> bool {
        self.ignore_breakpoint
    }

    pub fn params(&self) -> &QueryParams {
        &self.params
    }
}

/// Builder for [`ProviderConfig`].
#[derive(Debug, Clone)]
pub struct ProviderConfigBuilder {
    kind: ProviderKind,
    key: Option<String>,
    fallback_breakpoint: Option<f32>,
    min_input_length: usize,
    ignore_breakpoint: bool,
    params: QueryParams,
}

impl ProviderConfigBuilder {
    /// API key used by the provider. Required.
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Relevance threshold in `[0, 1]`; lower is stricter.
    pub fn fallback_breakpoint(mut self, breakpoint: f32) -> Self {
        self.fallback_breakpoint = Some(breakpoint);
        self
    }

    pub fn min_input_length(mut self, length: usize) -> Self {
        self.min_input_length = length;
        self
    }

    pub fn ignore_breakpoint(mut self, ignore: bool) -> Self {
        self.ignore_breakpoint = ignore;
        self
    }

    /// Add an ISO 3166-1 alpha-2 country code restriction.
    pub fn country(mut self, country: impl Into<String>) -> Self {
        self.params.countries.push(country.into());
        self
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.params.language = Some(language.into());
        self
    }

    /// Add a suggestion type (e.g. `locality`, `postal_code`).
    pub fn search_type(mut self, search_type: impl Into<String>) -> Self {
        self.params.search_types.push(search_type.into());
        self
    }

    /// Add a backend-specific query filter clause.
    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.params.query.push(query.into());
        self
    }

    pub fn data(mut self, data: Data) -> Self {
        self.params.data = Some(data);
        self
    }

    pub fn extended(mut self, extended: impl Into<String>) -> Self {
        let extended: String = extended.into();
        self.params.extended = Some(extended.trim().to_string());
        self
    }

    pub fn fields(mut self, fields: impl Into<String>) -> Self {
        let fields: String = fields.into();
        self.params.fields = Some(fields.trim().to_string());
        self
    }

    /// Validate and build the configuration.
    pub fn build(self) -> Result<ProviderConfig, SearchError> {
        let key = self.key.unwrap_or_default();
        if key.trim().is_empty() {
            return Err(SearchError::Configuration(
                "API key cannot be empty".to_string(),
            ));
        }
        if let Some(breakpoint) = self.fallback_breakpoint {
            if !(0.0..=1.0).contains(&breakpoint) {
                return Err(SearchError::Configuration(format!(
                    "fallback breakpoint must be between 0 and 1, got {breakpoint}"
                )));
            }
        }
        Ok(ProviderConfig {
            kind: self.kind,
            key,
            fallback_breakpoint: self.fallback_breakpoint,
            min_input_length: self.min_input_length,
            ignore_breakpoint: self.ignore_breakpoint,
            params: self.params,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_key_is_rejected() {
        let err = ProviderConfig::builder(ProviderKind::Localities)
            .key("  ")
            .build()
            .unwrap_err();
        assert!(matches!(err, SearchError::Configuration(_)));

        let err = ProviderConfig::builder(ProviderKind::Localities)
            .build()
            .unwrap_err();
        assert!(matches!(err, SearchError::Configuration(_)));
    }

    #[test]
    fn breakpoint_out_of_range_is_rejected() {
        for bad in [-0.1_f32, 1.1] {
            let err = ProviderConfig::builder(ProviderKind::Address)
                .key("k")
                .fallback_breakpoint(bad)
                .build()
                .unwrap_err();
            assert!(matches!(err, SearchError::Configuration(_)));
        }
    }

    #[test]
    fn breakpoint_defaults_per_kind() {
        for (kind, expected) in [
            (ProviderKind::Localities, 0.4),
            (ProviderKind::Address, 0.5),
            (ProviderKind::Store, 1.0),
            (ProviderKind::Places, 1.0),
        ] {
            let config = ProviderConfig::builder(kind).key("k").build().unwrap();
            assert_eq!(config.breakpoint(), expected);
        }

        let config = ProviderConfig::builder(ProviderKind::Places)
            .key("k")
            .fallback_breakpoint(0.25)
            .build()
            .unwrap();
        assert_eq!(config.breakpoint(), 0.25);
    }

    #[test]
    fn query_pairs_shape_matches_backend_conventions() {
        let config = ProviderConfig::builder(ProviderKind::Localities)
            .key("k")
            .country("FR")
            .country("GB")
            .search_type("locality")
            .search_type("postal_code")
            .language("fr")
            .data(Data::Advanced)
            .build()
            .unwrap();
        let pairs = config.params().to_query_pairs(ProviderKind::Localities);
        assert!(pairs.contains(&("components".to_string(), "country:FR|country:GB".to_string())));
        assert!(pairs.contains(&("types".to_string(), "locality|postal_code".to_string())));
        assert!(pairs.contains(&("language".to_string(), "fr".to_string())));
        assert!(pairs.contains(&("data".to_string(), "advanced".to_string())));
    }

    #[test]
    fn query_filters_only_forwarded_for_address_and_localities() {
        let config = ProviderConfig::builder(ProviderKind::Store)
            .key("k")
            .query("type:type1")
            .build()
            .unwrap();
        let pairs = config.params().to_query_pairs(ProviderKind::Store);
        assert!(!pairs.iter().any(|(name, _)| name == "query"));

        let pairs = config.params().to_query_pairs(ProviderKind::Address);
        assert!(pairs.contains(&("query".to_string(), "type:type1".to_string())));
    }
}
