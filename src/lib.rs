// Module declarations
pub mod config;
pub mod error;
pub mod multisearch;
pub mod provider;
pub mod registry;
pub mod scorer;

mod state;

pub use config::{Data, ProviderConfig, ProviderConfigBuilder, ProviderKind, QueryParams};
pub use error::SearchError;
pub use multisearch::{MultiSearch, RankedItem, SearchListener};
pub use provider::{
    AddressProvider, Candidate, DetailItem, Geometry, LocalitiesProvider, PlacesProvider, Provider,
    StoreProvider,
};
pub use registry::ProviderRegistry;
pub use scorer::{FuzzyScorer, ScoredCandidate, Scorer};
