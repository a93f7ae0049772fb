// MultiSearch - debounced, cancellable entry point over the fallback orchestrator

mod orchestrator;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex, PoisonError, RwLock};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::{ProviderConfig, ProviderKind};
use crate::error::SearchError;
use crate::provider::{
    AddressProvider, Candidate, DetailItem, LocalitiesProvider, PlacesProvider, Provider,
    StoreProvider,
};
use crate::scorer::{FuzzyScorer, Scorer};

use orchestrator::Engine;

/// A candidate merged into the final result list.
///
/// The list preserves provider priority order; items within one provider
/// keep the scorer's best-first order. There is no global sort by score.
#[derive(Debug, Clone, Serialize)]
pub struct RankedItem {
    /// Which backend produced the item.
    pub provider: ProviderKind,
    /// Relevance score; `None` for always-on providers, whose results
    /// bypass scoring.
    pub score: Option<f32>,
    pub candidate: Candidate,
}

/// Asynchronous result delivery.
///
/// Callbacks run on a tokio worker, not on the submitting thread; marshal
/// to a UI context yourself if you need one. Superseded (debounced or
/// cancelled) runs are never delivered.
pub trait SearchListener: Send + Sync {
    fn on_search_complete(&self, result: Result<Vec<RankedItem>, SearchError>);
    fn on_detail_complete(&self, result: Result<DetailItem, SearchError>);
}

enum Request {
    Multi { query: String },
    Single { kind: ProviderKind, query: String },
    Details { kind: ProviderKind, id: String },
}

enum Outcome {
    Search(Vec<RankedItem>),
    Detail(DetailItem),
}

/// Multi-provider place search with fallback orchestration.
///
/// Register providers in priority order, attach a [`SearchListener`], then
/// feed it query strings as the user types. Each submission supersedes the
/// previous one: pending debounce timers are dropped and in-flight provider
/// calls are cooperatively cancelled.
///
/// Must be used from within a tokio runtime.
pub struct MultiSearch {
    engine: Arc<Mutex<Engine>>,
    scorer: Arc<dyn Scorer>,
    listener: Arc<RwLock<Option<Arc<dyn SearchListener>>>>,
    debounce: StdMutex<Duration>,
    pending: StdMutex<Option<JoinHandle<()>>>,
    current: StdMutex<CancellationToken>,
    generation: Arc<AtomicU64>,
}

impl Default for MultiSearch {
    fn default() -> Self {
        Self::new()
    }
}

impl MultiSearch {
    pub fn new() -> Self {
        Self::with_debounce(Duration::ZERO)
    }

    /// `debounce` is how long a submission waits for a newer one before the
    /// orchestration actually runs. Zero dispatches immediately.
    pub fn with_debounce(debounce: Duration) -> Self {
        Self {
            engine: Arc::new(Mutex::new(Engine::new())),
            scorer: Arc::new(FuzzyScorer::new()),
            listener: Arc::new(RwLock::new(None)),
            debounce: StdMutex::new(debounce),
            pending: StdMutex::new(None),
            current: StdMutex::new(CancellationToken::new()),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Replace the default [`FuzzyScorer`] with a custom scorer.
    pub fn with_scorer(mut self, scorer: Arc<dyn Scorer>) -> Self {
        self.scorer = scorer;
        self
    }

    pub fn debounce(&self) -> Duration {
        *lock(&self.debounce)
    }

    pub fn set_debounce(&self, debounce: Duration) {
        *lock(&self.debounce) = debounce;
    }

    pub fn set_listener(&self, listener: Arc<dyn SearchListener>) {
        if let Ok(mut slot) = self.listener.write() {
            *slot = Some(listener);
        }
    }

    /// Build and register the stock provider for `config.kind()`.
    ///
    /// Registration order is priority order; re-registering a kind replaces
    /// its provider in place. Serialized against in-flight runs.
    pub async fn register_provider(&self, config: ProviderConfig) {
        let provider: Arc<dyn Provider> = match config.kind() {
            ProviderKind::Localities => Arc::new(LocalitiesProvider::new(config)),
            ProviderKind::Address => Arc::new(AddressProvider::new(config)),
            ProviderKind::Store => Arc::new(StoreProvider::new(config)),
            ProviderKind::Places => Arc::new(PlacesProvider::new(config)),
        };
        self.register(provider).await;
    }

    /// Register a custom [`Provider`] implementation.
    pub async fn register(&self, provider: Arc<dyn Provider>) {
        self.engine.lock().await.registry.register(provider);
    }

    pub async fn remove_provider(&self, kind: ProviderKind) -> bool {
        self.engine.lock().await.registry.remove(kind).is_some()
    }

    pub async fn clear_providers(&self) {
        self.engine.lock().await.registry.clear();
    }

    /// Query every configured provider with fallback semantics; the merged
    /// list (or the failure) arrives via `on_search_complete`.
    pub fn autocomplete_multi(&self, query: &str) {
        self.submit(Request::Multi {
            query: query.trim().to_string(),
        });
    }

    /// Query exactly one provider, bypassing the fallback chain and the
    /// incremental-typing state.
    pub fn autocomplete_single(&self, kind: ProviderKind, query: &str) {
        self.submit(Request::Single {
            kind,
            query: query.trim().to_string(),
        });
    }

    /// Fetch one item's detail from the provider that produced it; the
    /// result arrives via `on_detail_complete`.
    pub fn details(&self, id: &str, kind: ProviderKind) {
        self.submit(Request::Details {
            kind,
            id: id.to_string(),
        });
    }

    /// Supersede any pending or in-flight run and schedule `request`.
    fn submit(&self, request: Request) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let token = CancellationToken::new();
        let previous = std::mem::replace(&mut *lock(&self.current), token.clone());
        previous.cancel();
        if let Some(handle) = lock(&self.pending).take() {
            handle.abort();
        }

        let delay = self.debounce();
        let engine = Arc::clone(&self.engine);
        let scorer = Arc::clone(&self.scorer);
        let listener = Arc::clone(&self.listener);
        let generations = Arc::clone(&self.generation);

        let handle = tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => return,
                    _ = tokio::time::sleep(delay) => {}
                }
            }

            let outcome = {
                let mut engine = engine.lock().await;
                match &request {
                    Request::Multi { query } => {
                        orchestrator::run_multi(&mut engine, scorer.as_ref(), &token, query)
                            .await
                            .map(Outcome::Search)
                    }
                    Request::Single { kind, query } => {
                        orchestrator::run_single(&engine, scorer.as_ref(), &token, *kind, query)
                            .await
                            .map(Outcome::Search)
                    }
                    Request::Details { kind, id } => {
                        orchestrator::run_details(&engine, &token, *kind, id)
                            .await
                            .map(Outcome::Detail)
                    }
                }
            };

            if matches!(outcome, Err(SearchError::Cancelled)) {
                return;
            }
            // A run that finished after being superseded stays silent; the
            // newer run owns the listener now.
            if generations.load(Ordering::SeqCst) != generation {
                debug!(generation, "dropping superseded run result");
                return;
            }
            let listener = listener.read().ok().and_then(|slot| slot.clone());
            let Some(listener) = listener else { return };
            match outcome {
                Ok(Outcome::Search(items)) => listener.on_search_complete(Ok(items)),
                Ok(Outcome::Detail(item)) => listener.on_detail_complete(Ok(item)),
                Err(err) => match request {
                    Request::Details { .. } => listener.on_detail_complete(Err(err)),
                    _ => listener.on_search_complete(Err(err)),
                },
            }
        });
        *lock(&self.pending) = Some(handle);
    }
}

fn lock<T>(mutex: &StdMutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
