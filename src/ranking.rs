// SPDX-License-Identifier: MIT OR Apache-2.0

//! Hybrid ranking of listings: semantic similarity fused with a
//! price-tier-consistent price score.
//!
//! The corpus is scanned exhaustively; candidates are the oversampled
//! semantic top slice, re-ranked after price fusion and cut at a relative
//! margin below the best candidate.

use anyhow::Result;
use rayon::prelude::*;
use serde::Serialize;
use tracing::warn;

use crate::embedding::EmbeddingProvider;
use crate::errors::RankError;
use crate::intent::{PriceIntentReference, PriceTier};
use crate::listing::Listing;
use crate::vector::cosine_similarity;

/// Weight of the semantic score in the fused score; price gets the rest.
pub const DEFAULT_SEMANTIC_WEIGHT: f32 = 0.7;
/// Candidates more than this far below the best final score are cut.
pub const DEFAULT_SCORE_MARGIN: f32 = 0.3;
/// Semantic candidates fetched per requested result before price fusion.
pub const DEFAULT_OVERSAMPLE: usize = 5;
/// Default result cap.
pub const DEFAULT_LIMIT: usize = 10;

/// Price score when no price signal is available or no intent is expressed.
const NEUTRAL_PRICE_SCORE: f32 = 0.5;

/// Tunable ranking constants. These are configuration defaults, not
/// protocol guarantees.
#[derive(Debug, Clone, Copy)]
pub struct RankConfig {
    /// Weight of the semantic score in [0, 1]
    pub semantic_weight: f32,
    /// Relative cutoff below the best final score
    pub margin: f32,
    /// Oversampling factor for the pre-fusion candidate pool
    pub oversample: usize,
}

impl Default for RankConfig {
    fn default() -> Self {
        Self {
            semantic_weight: DEFAULT_SEMANTIC_WEIGHT,
            margin: DEFAULT_SCORE_MARGIN,
            oversample: DEFAULT_OVERSAMPLE,
        }
    }
}

impl RankConfig {
    pub fn with_semantic_weight(mut self, weight: f32) -> Self {
        self.semantic_weight = weight;
        self
    }

    pub fn with_margin(mut self, margin: f32) -> Self {
        self.margin = margin;
        self
    }

    pub fn with_oversample(mut self, oversample: usize) -> Self {
        self.oversample = oversample.max(1);
        self
    }
}

/// One ranked listing with its score breakdown. Exists only for the duration
/// of one query.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredResult {
    #[serde(flatten)]
    pub listing: Listing,
    pub final_score: f32,
    pub semantic_score: f32,
    pub price_score: f32,
}

/// The response for one ranked query.
#[derive(Debug, Clone, Serialize)]
pub struct RankedResponse {
    pub intent: PriceTier,
    pub results: Vec<ScoredResult>,
}

/// A scored candidate surviving into price fusion. `pos` is the corpus
/// position, used as the deterministic tiebreak everywhere.
struct Candidate {
    pos: usize,
    listing: Listing,
    semantic_score: f32,
    price_score: f32,
    final_score: f32,
}

/// Ranks listings against free-text queries.
pub struct SemanticRanker<'a> {
    config: RankConfig,
    reference: &'a PriceIntentReference,
}

impl<'a> SemanticRanker<'a> {
    pub fn new(config: RankConfig, reference: &'a PriceIntentReference) -> Self {
        Self { config, reference }
    }

    pub fn config(&self) -> &RankConfig {
        &self.config
    }

    /// Ranks the corpus against `query` and returns at most `limit` results.
    ///
    /// The corpus must be pre-filtered to listings that have a stored
    /// embedding. Listings whose stored vector fails to decode, or whose
    /// dimensionality does not match the query vector, are skipped with a
    /// warning; one corrupt row must not fail the whole query. An empty or
    /// all-corrupt corpus yields an empty result list, not an error.
    pub fn rank(
        &self,
        provider: &mut dyn EmbeddingProvider,
        query: &str,
        limit: usize,
        corpus: &[Listing],
    ) -> Result<RankedResponse> {
        let query_vec = provider.embed_one(query)?;
        let intent = self.reference.detect_vector(&query_vec)?;

        let mut candidates = score_corpus(&query_vec, corpus);
        if candidates.is_empty() {
            return Ok(RankedResponse {
                intent,
                results: Vec::new(),
            });
        }

        candidates.sort_by(by_semantic_desc);
        candidates.truncate(limit.saturating_mul(self.config.oversample));

        let price_range = known_price_range(&candidates);

        // A price-directed query should not surface listings it cannot judge
        // on price.
        if intent.is_priced() {
            candidates.retain(|c| c.listing.price.is_some());
        }

        for candidate in &mut candidates {
            candidate.price_score = price_score(intent, candidate.listing.price, price_range);
            candidate.final_score = self.config.semantic_weight * candidate.semantic_score
                + (1.0 - self.config.semantic_weight) * candidate.price_score;
        }

        candidates.sort_by(by_final_desc);

        if let Some(top) = candidates.first().map(|c| c.final_score) {
            let cutoff = top - self.config.margin;
            candidates.retain(|c| c.final_score >= cutoff);
        }
        candidates.truncate(limit);

        let results = candidates
            .into_iter()
            .map(|c| ScoredResult {
                listing: c.listing,
                final_score: c.final_score,
                semantic_score: c.semantic_score,
                price_score: c.price_score,
            })
            .collect();

        Ok(RankedResponse { intent, results })
    }
}

/// Scores every decodable listing against the query vector. Scoring is pure
/// and order-independent, so candidates are computed in parallel; corpus
/// position is preserved for deterministic tie-breaking.
fn score_corpus(query_vec: &[f32], corpus: &[Listing]) -> Vec<Candidate> {
    corpus
        .par_iter()
        .enumerate()
        .filter_map(|(pos, listing)| {
            let raw = listing.embedding.as_deref()?;
            let listing_vec: Vec<f32> = match serde_json::from_str(raw) {
                Ok(vec) => vec,
                Err(err) => {
                    warn!(url = %listing.url, %err, "skipping listing with undecodable embedding");
                    return None;
                }
            };
            let semantic_score = match cosine_similarity(query_vec, &listing_vec) {
                Ok(score) => score,
                Err(RankError::DimensionMismatch { expected, actual }) => {
                    warn!(
                        url = %listing.url,
                        expected,
                        actual,
                        "skipping listing with mismatched embedding dimension"
                    );
                    return None;
                }
            };
            Some(Candidate {
                pos,
                listing: listing.clone(),
                semantic_score,
                price_score: NEUTRAL_PRICE_SCORE,
                final_score: 0.0,
            })
        })
        .collect()
}

/// Descending by semantic score, ties broken by corpus position.
fn by_semantic_desc(a: &Candidate, b: &Candidate) -> std::cmp::Ordering {
    b.semantic_score
        .partial_cmp(&a.semantic_score)
        .unwrap_or(std::cmp::Ordering::Equal)
        .then_with(|| a.pos.cmp(&b.pos))
}

/// Descending by final score, ties broken by corpus position.
fn by_final_desc(a: &Candidate, b: &Candidate) -> std::cmp::Ordering {
    b.final_score
        .partial_cmp(&a.final_score)
        .unwrap_or(std::cmp::Ordering::Equal)
        .then_with(|| a.pos.cmp(&b.pos))
}

/// Min and max over candidate prices that are known; `None` if no candidate
/// has a price.
fn known_price_range(candidates: &[Candidate]) -> Option<(f64, f64)> {
    let mut range: Option<(f64, f64)> = None;
    for price in candidates.iter().filter_map(|c| c.listing.price) {
        range = Some(match range {
            Some((min, max)) => (min.min(price), max.max(price)),
            None => (price, price),
        });
    }
    range
}

/// Price score in [0, 1] for one candidate under the detected intent.
fn price_score(intent: PriceTier, price: Option<f64>, range: Option<(f64, f64)>) -> f32 {
    let (Some(price), Some((min_price, max_price))) = (price, range) else {
        return NEUTRAL_PRICE_SCORE;
    };
    if intent == PriceTier::Neutral || min_price == max_price {
        return NEUTRAL_PRICE_SCORE;
    }

    let norm = (((price - min_price) / (max_price - min_price)) as f32).clamp(0.0, 1.0);
    match intent {
        PriceTier::Cheap | PriceTier::Affordable => 1.0 - norm,
        PriceTier::Expensive | PriceTier::Premium => norm,
        PriceTier::Medium => 1.0 - 2.0 * (0.5 - norm).abs(),
        PriceTier::Neutral => NEUTRAL_PRICE_SCORE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_score_neutral_cases() {
        assert_eq!(
            price_score(PriceTier::Cheap, None, Some((100.0, 1000.0))),
            NEUTRAL_PRICE_SCORE
        );
        assert_eq!(
            price_score(PriceTier::Cheap, Some(500.0), None),
            NEUTRAL_PRICE_SCORE
        );
        // Degenerate range
        assert_eq!(
            price_score(PriceTier::Premium, Some(500.0), Some((500.0, 500.0))),
            NEUTRAL_PRICE_SCORE
        );
        // No intent expressed
        assert_eq!(
            price_score(PriceTier::Neutral, Some(500.0), Some((100.0, 1000.0))),
            NEUTRAL_PRICE_SCORE
        );
    }

    #[test]
    fn cheap_prefers_low_prices() {
        let range = Some((100.0, 1100.0));
        let low = price_score(PriceTier::Cheap, Some(100.0), range);
        let high = price_score(PriceTier::Cheap, Some(1100.0), range);
        assert!((low - 1.0).abs() < 1e-6);
        assert!(high.abs() < 1e-6);
        assert!(
            price_score(PriceTier::Affordable, Some(100.0), range)
                > price_score(PriceTier::Affordable, Some(1100.0), range)
        );
    }

    #[test]
    fn premium_prefers_high_prices() {
        let range = Some((100.0, 1100.0));
        assert!((price_score(PriceTier::Premium, Some(1100.0), range) - 1.0).abs() < 1e-6);
        assert!(price_score(PriceTier::Expensive, Some(100.0), range).abs() < 1e-6);
    }

    #[test]
    fn medium_peaks_at_midpoint() {
        let range = Some((0.0, 1000.0));
        let mid = price_score(PriceTier::Medium, Some(500.0), range);
        let low = price_score(PriceTier::Medium, Some(0.0), range);
        let high = price_score(PriceTier::Medium, Some(1000.0), range);
        assert!((mid - 1.0).abs() < 1e-6);
        assert!(low.abs() < 1e-6);
        assert!(high.abs() < 1e-6);
    }

    #[test]
    fn comparators_break_ties_by_position() {
        let make = |pos: usize, semantic: f32, fin: f32| Candidate {
            pos,
            listing: Listing {
                id: pos as i64,
                title: None,
                description: None,
                price: None,
                url: format!("u{}", pos),
                city: None,
                embedding: None,
                created_at: 0,
            },
            semantic_score: semantic,
            price_score: 0.5,
            final_score: fin,
        };

        let mut candidates = vec![make(2, 0.9, 0.8), make(0, 0.9, 0.8), make(1, 0.95, 0.7)];
        candidates.sort_by(by_semantic_desc);
        let order: Vec<usize> = candidates.iter().map(|c| c.pos).collect();
        assert_eq!(order, vec![1, 0, 2]);

        candidates.sort_by(by_final_desc);
        let order: Vec<usize> = candidates.iter().map(|c| c.pos).collect();
        assert_eq!(order, vec![0, 2, 1]);
    }

    #[test]
    fn known_price_range_ignores_unknown() {
        let make = |pos: usize, price: Option<f64>| Candidate {
            pos,
            listing: Listing {
                id: pos as i64,
                title: None,
                description: None,
                price,
                url: format!("u{}", pos),
                city: None,
                embedding: None,
                created_at: 0,
            },
            semantic_score: 0.0,
            price_score: 0.5,
            final_score: 0.0,
        };

        let candidates = vec![make(0, Some(300.0)), make(1, None), make(2, Some(120.0))];
        assert_eq!(known_price_range(&candidates), Some((120.0, 300.0)));
        assert_eq!(known_price_range(&[make(0, None)]), None);
        assert_eq!(known_price_range(&[]), None);
    }

    #[test]
    fn corrupt_and_mismatched_vectors_are_skipped() {
        let listing = |id: i64, embedding: &str| Listing {
            id,
            title: None,
            description: None,
            price: None,
            url: format!("u{}", id),
            city: None,
            embedding: Some(embedding.to_string()),
            created_at: 0,
        };

        let corpus = vec![
            listing(1, "[1.0, 0.0]"),
            listing(2, "not json"),
            listing(3, "[1.0, 0.0, 0.0]"),
        ];
        let scored = score_corpus(&[1.0, 0.0], &corpus);
        assert_eq!(scored.len(), 1);
        assert_eq!(scored[0].listing.id, 1);
    }
}
