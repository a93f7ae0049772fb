// FuzzyScorer - default approximate-string scorer built on strsim

use crate::provider::Candidate;

use super::{ScoredCandidate, Scorer};

/// Default scorer: weighted Jaro-Winkler distance over the candidate
/// description, with a prefix-anchored pass so that partially typed queries
/// score well against suggestions that start with them.
///
/// Scores land in `[0, 1]` with 0 as the best match. Sorting is stable, so
/// equal-scoring candidates keep the provider's order.
#[derive(Debug, Default, Clone, Copy)]
pub struct FuzzyScorer;

impl FuzzyScorer {
    pub fn new() -> Self {
        Self
    }

    fn distance(query: &str, description: &str) -> f32 {
        let query = query.to_lowercase();
        let description = description.to_lowercase();
        if query.is_empty() || description.is_empty() {
            return 1.0;
        }

        // Whole-string similarity.
        let mut best = strsim::jaro_winkler(&query, &description);

        // Anchor the query against the description prefix and against each
        // word start, so "Montp" matches "Montpellier, Hérault, France" and
        // "rue de" matches mid-address street names.
        let query_len = query.chars().count();
        for start in word_starts(&description) {
            let window: String = description[start..].chars().take(query_len).collect();
            if window.is_empty() {
                continue;
            }
            let similarity = strsim::jaro_winkler(&query, &window);
            if similarity > best {
                best = similarity;
            }
        }

        (1.0 - best as f32).clamp(0.0, 1.0)
    }
}

/// Byte offsets of the description's word starts.
fn word_starts(text: &str) -> Vec<usize> {
    let mut starts = vec![0];
    let mut previous_was_boundary = false;
    for (offset, ch) in text.char_indices() {
        if previous_was_boundary && !ch.is_whitespace() {
            starts.push(offset);
        }
        previous_was_boundary = ch.is_whitespace() || ch == ',';
    }
    starts
}

impl Scorer for FuzzyScorer {
    fn score(
        &self,
        candidates: Vec<Candidate>,
        query: &str,
        _breakpoint: f32,
    ) -> Vec<ScoredCandidate> {
        let mut scored: Vec<ScoredCandidate> = candidates
            .into_iter()
            .map(|candidate| ScoredCandidate {
                score: Self::distance(query, &candidate.description),
                candidate,
            })
            .collect();
        scored.sort_by(|a, b| a.score.total_cmp(&b.score));
        scored
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn candidate(description: &str) -> Candidate {
        Candidate {
            id: description.to_string(),
            description: description.to_string(),
            highlight: description.to_string(),
            result_types: Vec::new(),
            matched_substrings: None,
            raw: json!({}),
        }
    }

    #[test]
    fn exact_match_scores_zero() {
        let scorer = FuzzyScorer::new();
        let scored = scorer.score(vec![candidate("Paris")], "paris", 0.4);
        assert_eq!(scored.len(), 1);
        assert!(scored[0].score < 1e-6);
    }

    #[test]
    fn prefix_of_suggestion_scores_close_to_zero() {
        let scorer = FuzzyScorer::new();
        let scored = scorer.score(
            vec![
                candidate("Montpellier, Hérault, France"),
                candidate("Lyon, Rhône, France"),
            ],
            "Montp",
            0.4,
        );
        assert_eq!(scored[0].candidate.description, "Montpellier, Hérault, France");
        assert!(scored[0].score < 0.1, "got {}", scored[0].score);
        assert!(scored[1].score > scored[0].score);
    }

    #[test]
    fn returns_every_candidate_sorted_best_first() {
        let scorer = FuzzyScorer::new();
        let scored = scorer.score(
            vec![candidate("zzz"), candidate("Pantin"), candidate("Pant")],
            "Pant",
            0.4,
        );
        assert_eq!(scored.len(), 3);
        assert!(scored.windows(2).all(|w| w[0].score <= w[1].score));
        assert_eq!(scored[0].candidate.description, "Pant");
    }

    proptest! {
        #[test]
        fn scores_stay_in_unit_range_and_are_idempotent(
            query in "[a-zA-Z0-9 ]{0,24}",
            descriptions in prop::collection::vec("[a-zA-Z0-9 ,]{0,32}", 0..8),
        ) {
            let scorer = FuzzyScorer::new();
            let candidates: Vec<_> = descriptions.iter().map(|d| candidate(d)).collect();
            let first = scorer.score(candidates.clone(), &query, 0.5);
            let second = scorer.score(candidates, &query, 0.5);

            prop_assert_eq!(first.len(), second.len());
            for (a, b) in first.iter().zip(second.iter()) {
                prop_assert_eq!(a.score, b.score);
                prop_assert_eq!(&a.candidate.description, &b.candidate.description);
                prop_assert!((0.0..=1.0).contains(&a.score));
            }
        }
    }
}
