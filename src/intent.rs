// SPDX-License-Identifier: MIT OR Apache-2.0

//! Price-tier intent detection.
//!
//! A free-text query is classified into one of five price tiers by comparing
//! its embedding against five fixed reference phrases. Queries with no price
//! language land in `Neutral`.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::embedding::EmbeddingProvider;
use crate::errors::RankError;
use crate::vector::cosine_similarity;

/// Minimum similarity against the best reference phrase before a tier is
/// trusted. Below this the query is treated as having no price intent.
pub const DEFAULT_CONFIDENCE_FLOOR: f32 = 0.3;

/// Price-tier intent of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceTier {
    Cheap,
    Affordable,
    Medium,
    Expensive,
    Premium,
    /// No price intent detected
    #[default]
    Neutral,
}

impl PriceTier {
    /// Whether this tier expresses an actual price preference.
    pub fn is_priced(self) -> bool {
        self != PriceTier::Neutral
    }
}

impl std::fmt::Display for PriceTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            PriceTier::Cheap => "cheap",
            PriceTier::Affordable => "affordable",
            PriceTier::Medium => "medium",
            PriceTier::Expensive => "expensive",
            PriceTier::Premium => "premium",
            PriceTier::Neutral => "neutral",
        };
        write!(f, "{}", label)
    }
}

impl std::str::FromStr for PriceTier {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cheap" => Ok(PriceTier::Cheap),
            "affordable" => Ok(PriceTier::Affordable),
            "medium" => Ok(PriceTier::Medium),
            "expensive" => Ok(PriceTier::Expensive),
            "premium" => Ok(PriceTier::Premium),
            "neutral" => Ok(PriceTier::Neutral),
            _ => Err(format!("Unknown price tier: {}", s)),
        }
    }
}

/// The five priced tiers in canonical iteration order. Ties during detection
/// keep the first-seen tier in this order.
pub const PRICED_TIERS: [PriceTier; 5] = [
    PriceTier::Cheap,
    PriceTier::Affordable,
    PriceTier::Medium,
    PriceTier::Expensive,
    PriceTier::Premium,
];

/// Canonical reference phrase for a priced tier.
pub fn tier_phrase(tier: PriceTier) -> &'static str {
    match tier {
        PriceTier::Cheap => "very cheap low price bargain budget item",
        PriceTier::Affordable => "affordable good price reasonable cost",
        PriceTier::Medium => "average mid-range price normal cost",
        PriceTier::Expensive => "expensive high price costly item",
        PriceTier::Premium => "premium top quality luxury flagship item",
        PriceTier::Neutral => "",
    }
}

/// Precomputed embeddings of the five tier reference phrases.
///
/// Built once at startup via the embedding provider and shared read-only for
/// the process lifetime; the phrases never change, so re-embedding per query
/// is pure waste.
#[derive(Debug, Clone)]
pub struct PriceIntentReference {
    entries: Vec<(PriceTier, Vec<f32>)>,
    confidence_floor: f32,
}

impl PriceIntentReference {
    /// Embeds the five reference phrases and caches the resulting vectors.
    pub fn build(provider: &mut dyn EmbeddingProvider) -> Result<Self> {
        let phrases: Vec<String> = PRICED_TIERS
            .iter()
            .map(|tier| tier_phrase(*tier).to_string())
            .collect();
        let vectors = provider.embed_texts(&phrases)?;
        anyhow::ensure!(
            vectors.len() == PRICED_TIERS.len(),
            "embedding provider returned {} vectors for {} tier phrases",
            vectors.len(),
            PRICED_TIERS.len()
        );

        Ok(Self::from_entries(
            PRICED_TIERS.iter().copied().zip(vectors).collect(),
        ))
    }

    /// Builds a reference from already-computed tier vectors.
    pub fn from_entries(entries: Vec<(PriceTier, Vec<f32>)>) -> Self {
        Self {
            entries,
            confidence_floor: DEFAULT_CONFIDENCE_FLOOR,
        }
    }

    /// Overrides the confidence floor below which detection returns neutral.
    pub fn with_confidence_floor(mut self, floor: f32) -> Self {
        self.confidence_floor = floor;
        self
    }

    /// Detects the price tier of a query string.
    pub fn detect(&self, provider: &mut dyn EmbeddingProvider, query: &str) -> Result<PriceTier> {
        let query_vec = provider.embed_one(query)?;
        Ok(self.detect_vector(&query_vec)?)
    }

    /// Detects the price tier from an already-embedded query vector.
    ///
    /// The provider is deterministic, so callers that embedded the query for
    /// ranking can reuse that vector instead of paying a second model call.
    pub fn detect_vector(&self, query_vec: &[f32]) -> Result<PriceTier, RankError> {
        let mut best: Option<(PriceTier, f32)> = None;

        for (tier, reference_vec) in &self.entries {
            let score = cosine_similarity(query_vec, reference_vec)?;
            // Strictly-greater keeps the first-seen tier on ties.
            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((*tier, score));
            }
        }

        let detected = match best {
            Some((tier, score)) if score >= self.confidence_floor => {
                debug!(tier = %tier, score, "price intent detected");
                tier
            }
            Some((tier, score)) => {
                debug!(
                    best_tier = %tier,
                    score,
                    floor = self.confidence_floor,
                    "price intent below confidence floor, treating as neutral"
                );
                PriceTier::Neutral
            }
            None => PriceTier::Neutral,
        };

        Ok(detected)
    }
}
