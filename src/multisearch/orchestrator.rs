// Fallback orchestration - walks the registry in priority order and merges results

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::config::ProviderKind;
use crate::error::SearchError;
use crate::provider::{Candidate, DetailItem, Provider};
use crate::registry::ProviderRegistry;
use crate::scorer::Scorer;
use crate::state::SearchState;

use super::RankedItem;

/// Registry plus incremental-typing state, guarded by one lock in
/// `MultiSearch` so registry mutation can never interleave with a run.
pub(super) struct Engine {
    pub(super) registry: ProviderRegistry,
    pub(super) state: SearchState,
}

impl Engine {
    pub(super) fn new() -> Self {
        Self {
            registry: ProviderRegistry::new(),
            state: SearchState::new(),
        }
    }
}

/// One orchestration run over every configured provider.
///
/// An empty registry is a configuration error; an empty query is an empty
/// success that also clears the typing history. A provider failure aborts
/// the whole run and clears the history, so a transient backend error can
/// never poison the skip decisions of the next keystroke.
pub(super) async fn run_multi(
    engine: &mut Engine,
    scorer: &dyn Scorer,
    cancel: &CancellationToken,
    query: &str,
) -> Result<Vec<RankedItem>, SearchError> {
    if engine.registry.is_empty() {
        return Err(SearchError::Configuration(
            "no search provider configured".to_string(),
        ));
    }
    let query = query.trim();
    if query.is_empty() {
        engine.state.reset();
        return Ok(Vec::new());
    }

    match walk_providers(engine, scorer, cancel, query).await {
        Ok(results) => Ok(results),
        Err(SearchError::Cancelled) => Err(SearchError::Cancelled),
        Err(err) => {
            engine.state.reset();
            Err(err)
        }
    }
}

async fn walk_providers(
    engine: &mut Engine,
    scorer: &dyn Scorer,
    cancel: &CancellationToken,
    query: &str,
) -> Result<Vec<RankedItem>, SearchError> {
    let query_len = query.chars().count();

    // A shorter query is a new search, not a continuation.
    if query_len < engine.state.last_query_chars() {
        engine.state.reset();
    }

    // The provider that decided the previous query may have been
    // unregistered since; its history is useless then.
    if engine
        .state
        .last_provider()
        .is_some_and(|kind| engine.registry.position(kind).is_none())
    {
        engine.state.reset();
    }

    let is_extension = engine.state.is_forward_extension(query);
    let last_provider = engine.state.last_provider();
    let last_position = last_provider.and_then(|kind| engine.registry.position(kind));
    let last_was_empty = engine.state.last_result_count() == Some(0);

    let providers: Vec<Arc<dyn Provider>> = engine.registry.iter().cloned().collect();
    let mut only_always_on = false;
    let mut accepted_from_filtered = 0usize;
    let mut results = Vec::new();

    for (position, provider) in providers.iter().enumerate() {
        let config = provider.config();
        let kind = config.kind();
        let always_on = config.ignore_breakpoint();

        // A shorter-prefix provider already put the rest of the chain out of
        // reach this round; only always-on providers still run.
        if only_always_on && !always_on {
            trace!(provider = %kind, "skip: below an unmet minimum input length");
            continue;
        }

        if is_extension {
            let at_or_after = last_position.is_some_and(|last| position >= last);
            if !at_or_after && !always_on {
                // A lower-priority provider decided the shorter prefix, so
                // this one was already rejected for it.
                debug!(provider = %kind, "skip: earlier prefix fell through this provider");
                continue;
            } else if Some(kind) == last_provider && last_was_empty {
                // Zero results for the prefix; typing more characters cannot
                // produce matches from a prefix-anchored backend.
                debug!(provider = %kind, "skip: zero results for the earlier prefix");
                continue;
            }
        }

        if query_len < config.min_input_length() {
            only_always_on = true;
            continue;
        }

        if always_on {
            let candidates = call_search(provider.as_ref(), cancel, query).await?;
            debug!(provider = %kind, count = candidates.len(), "always-on results merged");
            results.extend(candidates.into_iter().map(|candidate| RankedItem {
                provider: kind,
                score: None,
                candidate,
            }));
        } else if accepted_from_filtered == 0 {
            let candidates = call_search(provider.as_ref(), cancel, query).await?;
            let scored = scorer.score(candidates, query, config.breakpoint());
            let total = scored.len();
            let breakpoint = config.breakpoint();
            for item in scored {
                if item.score <= breakpoint {
                    results.push(RankedItem {
                        provider: kind,
                        score: Some(item.score),
                        candidate: item.candidate,
                    });
                    accepted_from_filtered += 1;
                }
            }
            debug!(
                provider = %kind,
                candidates = total,
                accepted = accepted_from_filtered,
                "scored provider results"
            );
            // The full candidate count, not the accepted subset: a provider
            // that answered but scored badly must not look like one that
            // answered nothing.
            engine.state.record(query, kind, total);
        }
    }

    Ok(results)
}

/// Query exactly one provider, bypassing the fallback chain and the typing
/// history.
pub(super) async fn run_single(
    engine: &Engine,
    scorer: &dyn Scorer,
    cancel: &CancellationToken,
    kind: ProviderKind,
    query: &str,
) -> Result<Vec<RankedItem>, SearchError> {
    let provider = registered(engine, kind)?;
    let config = provider.config();

    let query = query.trim();
    if query.is_empty() || query.chars().count() < config.min_input_length() {
        return Ok(Vec::new());
    }

    let candidates = call_search(provider.as_ref(), cancel, query).await?;
    let scored = scorer.score(candidates, query, config.breakpoint());
    let breakpoint = config.breakpoint();
    let accept_all = config.ignore_breakpoint();
    Ok(scored
        .into_iter()
        .filter(|item| accept_all || item.score <= breakpoint)
        .map(|item| RankedItem {
            provider: kind,
            score: Some(item.score),
            candidate: item.candidate,
        })
        .collect())
}

/// Fetch one item's detail from a named provider. No scoring involved.
pub(super) async fn run_details(
    engine: &Engine,
    cancel: &CancellationToken,
    kind: ProviderKind,
    id: &str,
) -> Result<DetailItem, SearchError> {
    let provider = registered(engine, kind)?;
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(SearchError::Cancelled),
        result = provider.details(id) => result,
    }
}

fn registered(engine: &Engine, kind: ProviderKind) -> Result<Arc<dyn Provider>, SearchError> {
    engine
        .registry
        .get(kind)
        .cloned()
        .ok_or_else(|| {
            SearchError::Configuration(format!("no configuration found for the {kind} provider"))
        })
}

/// Race a provider call against the run's cancellation token. The abort is
/// cooperative: a call that already completed still returns its result.
async fn call_search(
    provider: &dyn Provider,
    cancel: &CancellationToken,
    query: &str,
) -> Result<Vec<Candidate>, SearchError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(SearchError::Cancelled),
        result = provider.search(query) => result,
    }
}
