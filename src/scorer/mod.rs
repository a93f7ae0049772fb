// Scorer trait - pluggable relevance scoring for provider candidates

pub mod fuzzy;

pub use fuzzy::FuzzyScorer;

use crate::provider::Candidate;

/// A candidate annotated with its relevance score.
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub candidate: Candidate,
    /// Relevance score in `[0, 1]`, where 0 is an exact/best match.
    pub score: f32,
}

/// Scores provider candidates against the query string.
///
/// Implementations MUST return every input candidate, annotated with its
/// score and ordered best-first; the orchestrator applies the threshold
/// filter itself so its state tracking sees the unfiltered candidate count.
/// `breakpoint` is the caller's acceptance threshold, passed for scorers
/// that want to tune their match algorithm around it.
///
/// Scoring MUST be deterministic and idempotent for identical inputs.
pub trait Scorer: Send + Sync {
    fn score(&self, candidates: Vec<Candidate>, query: &str, breakpoint: f32)
        -> Vec<ScoredCandidate>;
}
