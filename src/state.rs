// SearchState - remembers the previous query's outcome for incremental-typing shortcuts

use crate::config::ProviderKind;

/// Outcome of the previous orchestrated query.
///
/// Owned exclusively by one `MultiSearch` instance and mutated only inside an
/// orchestration run. Updated solely by providers whose results go through
/// scoring; always-on providers never touch it.
#[derive(Debug, Default)]
pub(crate) struct SearchState {
    last_query: String,
    last_provider: Option<ProviderKind>,
    last_result_count: Option<usize>,
}

impl SearchState {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn reset(&mut self) {
        self.last_query.clear();
        self.last_provider = None;
        self.last_result_count = None;
    }

    /// Record the outcome of a scored provider call.
    ///
    /// `result_count` is the scorer's full candidate count, not the accepted
    /// subset, so the "zero results means skip" signal stays independent of
    /// the threshold.
    pub(crate) fn record(&mut self, query: &str, provider: ProviderKind, result_count: usize) {
        self.last_query = query.to_string();
        self.last_provider = Some(provider);
        self.last_result_count = Some(result_count);
    }

    pub(crate) fn last_provider(&self) -> Option<ProviderKind> {
        self.last_provider
    }

    pub(crate) fn last_result_count(&self) -> Option<usize> {
        self.last_result_count
    }

    pub(crate) fn last_query_chars(&self) -> usize {
        self.last_query.chars().count()
    }

    /// True when `query` continues the previous query (user kept typing).
    pub(crate) fn is_forward_extension(&self, query: &str) -> bool {
        if self.last_query.is_empty() {
            return false;
        }
        if query.chars().count() < self.last_query_chars() {
            return false;
        }
        query.starts_with(&self.last_query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_history_is_never_an_extension() {
        let state = SearchState::new();
        assert!(!state.is_forward_extension("Mont"));
        assert!(!state.is_forward_extension(""));
    }

    #[test]
    fn forward_extension_requires_prefix_match() {
        let mut state = SearchState::new();
        state.record("Mo", ProviderKind::Localities, 0);
        assert!(state.is_forward_extension("Mo"));
        assert!(state.is_forward_extension("Montpel"));
        assert!(!state.is_forward_extension("M"));
        assert!(!state.is_forward_extension("Pa"));
        assert!(!state.is_forward_extension("xMo"));
    }

    #[test]
    fn reset_clears_all_fields() {
        let mut state = SearchState::new();
        state.record("Paris", ProviderKind::Address, 3);
        state.reset();
        assert_eq!(state.last_provider(), None);
        assert_eq!(state.last_result_count(), None);
        assert!(!state.is_forward_extension("Paris"));
    }

    #[test]
    fn extension_check_counts_chars_not_bytes() {
        let mut state = SearchState::new();
        state.record("Mé", ProviderKind::Localities, 1);
        assert!(state.is_forward_extension("Méribel"));
        assert!(!state.is_forward_extension("M"));
    }
}
