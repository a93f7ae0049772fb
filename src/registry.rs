// ProviderRegistry - ordered provider collection; registration order is priority order

use std::sync::Arc;

use crate::config::ProviderKind;
use crate::provider::Provider;

/// Ordered, keyed collection of configured providers.
///
/// At most one entry per kind. Iteration order equals registration order,
/// which is the fallback priority order. Re-registering an existing kind
/// replaces the provider in place without changing its position.
#[derive(Default)]
pub struct ProviderRegistry {
    entries: Vec<(ProviderKind, Arc<dyn Provider>)>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, provider: Arc<dyn Provider>) {
        let kind = provider.config().kind();
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| *k == kind) {
            entry.1 = provider;
        } else {
            self.entries.push((kind, provider));
        }
    }

    pub fn remove(&mut self, kind: ProviderKind) -> Option<Arc<dyn Provider>> {
        let index = self.entries.iter().position(|(k, _)| *k == kind)?;
        Some(self.entries.remove(index).1)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn get(&self, kind: ProviderKind) -> Option<&Arc<dyn Provider>> {
        self.entries
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, p)| p)
    }

    /// Position of `kind` in priority order, if registered.
    pub fn position(&self, kind: ProviderKind) -> Option<usize> {
        self.entries.iter().position(|(k, _)| *k == kind)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Provider>> {
        self.entries.iter().map(|(_, p)| p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderConfig;
    use crate::error::SearchError;
    use crate::provider::{Candidate, DetailItem};
    use async_trait::async_trait;

    struct FakeProvider {
        config: ProviderConfig,
    }

    impl FakeProvider {
        fn new(kind: ProviderKind) -> Arc<dyn Provider> {
            Arc::new(Self {
                config: ProviderConfig::builder(kind).key("k").build().unwrap(),
            })
        }
    }

    #[async_trait]
    impl Provider for FakeProvider {
        fn config(&self) -> &ProviderConfig {
            &self.config
        }

        async fn search(&self, _query: &str) -> Result<Vec<Candidate>, SearchError> {
            Ok(Vec::new())
        }

        async fn details(&self, id: &str) -> Result<DetailItem, SearchError> {
            Err(SearchError::provider(
                self.config.kind(),
                format!("no detail for {id}"),
            ))
        }
    }

    #[test]
    fn iteration_preserves_registration_order() {
        let mut registry = ProviderRegistry::new();
        registry.register(FakeProvider::new(ProviderKind::Store));
        registry.register(FakeProvider::new(ProviderKind::Localities));
        registry.register(FakeProvider::new(ProviderKind::Address));

        let kinds: Vec<_> = registry.iter().map(|p| p.config().kind()).collect();
        assert_eq!(
            kinds,
            vec![
                ProviderKind::Store,
                ProviderKind::Localities,
                ProviderKind::Address
            ]
        );
        assert_eq!(registry.position(ProviderKind::Localities), Some(1));
    }

    #[test]
    fn reregistering_keeps_position() {
        let mut registry = ProviderRegistry::new();
        registry.register(FakeProvider::new(ProviderKind::Localities));
        registry.register(FakeProvider::new(ProviderKind::Address));
        registry.register(FakeProvider::new(ProviderKind::Localities));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.position(ProviderKind::Localities), Some(0));
    }

    #[test]
    fn remove_and_clear() {
        let mut registry = ProviderRegistry::new();
        registry.register(FakeProvider::new(ProviderKind::Localities));
        registry.register(FakeProvider::new(ProviderKind::Address));

        assert!(registry.remove(ProviderKind::Localities).is_some());
        assert!(registry.remove(ProviderKind::Localities).is_none());
        assert_eq!(registry.position(ProviderKind::Address), Some(0));

        registry.clear();
        assert!(registry.is_empty());
    }
}
