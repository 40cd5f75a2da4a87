// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end ranking pipeline tests with a deterministic mock provider.

use std::collections::HashMap;

use adsearch::embedding::EmbeddingProvider;
use adsearch::intent::{PriceIntentReference, PriceTier, PRICED_TIERS};
use adsearch::listing::Listing;
use adsearch::ranking::{RankConfig, SemanticRanker};

/// Maps exact query strings to fixed vectors.
struct MockProvider {
    vectors: HashMap<String, Vec<f32>>,
}

impl MockProvider {
    fn new(entries: &[(&str, Vec<f32>)]) -> Self {
        Self {
            vectors: entries
                .iter()
                .map(|(text, vec)| (text.to_string(), vec.clone()))
                .collect(),
        }
    }
}

impl EmbeddingProvider for MockProvider {
    fn model_id(&self) -> &str {
        "mock"
    }

    fn embed_texts(&mut self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        texts
            .iter()
            .map(|text| {
                self.vectors
                    .get(text)
                    .cloned()
                    .ok_or_else(|| anyhow::anyhow!("no mock vector for {:?}", text))
            })
            .collect()
    }
}

const DIM: usize = 6;

/// One axis per priced tier (canonical order), axis 5 free for
/// price-neutral semantics.
fn reference() -> PriceIntentReference {
    PriceIntentReference::from_entries(
        PRICED_TIERS
            .iter()
            .enumerate()
            .map(|(i, tier)| (*tier, axis(i)))
            .collect(),
    )
}

fn axis(i: usize) -> Vec<f32> {
    let mut v = vec![0.0_f32; DIM];
    v[i] = 1.0;
    v
}

fn listing(id: i64, price: Option<f64>, embedding: Option<&str>) -> Listing {
    Listing {
        id,
        title: Some(format!("listing {}", id)),
        description: None,
        price,
        url: format!("https://example.com/ad/{}", id),
        city: None,
        embedding: embedding.map(str::to_string),
        created_at: 0,
    }
}

fn json_vec(v: &[f32]) -> String {
    serde_json::to_string(v).unwrap()
}

#[test]
fn premium_intent_ranks_pricier_listings_first() {
    let reference = reference();
    let mut provider = MockProvider::new(&[("flagship phone", axis(4))]);

    // Identical semantic similarity, prices 100 / 500 / 1000.
    let shared = json_vec(&axis(4));
    let corpus = vec![
        listing(1, Some(100.0), Some(&shared)),
        listing(2, Some(500.0), Some(&shared)),
        listing(3, Some(1000.0), Some(&shared)),
    ];

    let ranker = SemanticRanker::new(RankConfig::default(), &reference);
    let response = ranker
        .rank(&mut provider, "flagship phone", 10, &corpus)
        .unwrap();

    assert_eq!(response.intent, PriceTier::Premium);
    let prices: Vec<f64> = response
        .results
        .iter()
        .map(|r| r.listing.price.unwrap())
        .collect();
    assert_eq!(prices, vec![1000.0, 500.0, 100.0]);
}

#[test]
fn cheap_intent_prefers_cheaper_on_equal_semantics() {
    let reference = reference();
    let mut provider = MockProvider::new(&[("cheap phone", axis(0))]);

    let shared = json_vec(&axis(0));
    let corpus = vec![
        listing(1, Some(1000.0), Some(&shared)),
        listing(2, Some(100.0), Some(&shared)),
    ];

    let ranker = SemanticRanker::new(RankConfig::default(), &reference);
    let response = ranker
        .rank(&mut provider, "cheap phone", 10, &corpus)
        .unwrap();

    assert_eq!(response.intent, PriceTier::Cheap);
    assert_eq!(response.results[0].listing.price, Some(100.0));
    assert!(response.results[0].final_score > response.results[1].final_score);
}

#[test]
fn query_without_price_language_is_neutral() {
    let reference = reference();
    let mut provider = MockProvider::new(&[("mountain bike", axis(5))]);

    let corpus = vec![
        listing(1, Some(100.0), Some(&json_vec(&axis(5)))),
        listing(2, None, Some(&json_vec(&axis(5)))),
    ];

    let ranker = SemanticRanker::new(RankConfig::default(), &reference);
    let response = ranker
        .rank(&mut provider, "mountain bike", 10, &corpus)
        .unwrap();

    assert_eq!(response.intent, PriceTier::Neutral);
    // No price intent: unknown-price listings survive and everyone gets the
    // neutral midpoint price score.
    assert_eq!(response.results.len(), 2);
    for result in &response.results {
        assert!((result.price_score - 0.5).abs() < 1e-6);
    }
}

#[test]
fn priced_intent_drops_unknown_price_candidates() {
    let reference = reference();
    let mut provider = MockProvider::new(&[("premium watch", axis(4))]);

    let shared = json_vec(&axis(4));
    let corpus = vec![
        listing(1, None, Some(&shared)),
        listing(2, Some(900.0), Some(&shared)),
        listing(3, None, Some(&shared)),
    ];

    let ranker = SemanticRanker::new(RankConfig::default(), &reference);
    let response = ranker
        .rank(&mut provider, "premium watch", 10, &corpus)
        .unwrap();

    assert_eq!(response.intent, PriceTier::Premium);
    assert_eq!(response.results.len(), 1);
    assert_eq!(response.results[0].listing.id, 2);
}

#[test]
fn margin_cutoff_drops_distant_candidates() {
    let reference = reference();
    let mut provider = MockProvider::new(&[("mountain bike", axis(5))]);

    // cos(query, close) = 1.0, cos(query, far) = 0.2; final scores differ by
    // 0.7 * 0.8 = 0.56, beyond the default 0.3 margin.
    let far = vec![0.9798_f32, 0.0, 0.0, 0.0, 0.0, 0.2];
    let corpus = vec![
        listing(1, None, Some(&json_vec(&axis(5)))),
        listing(2, None, Some(&json_vec(&far))),
    ];

    let ranker = SemanticRanker::new(RankConfig::default(), &reference);
    let response = ranker
        .rank(&mut provider, "mountain bike", 10, &corpus)
        .unwrap();

    assert_eq!(response.results.len(), 1);
    assert_eq!(response.results[0].listing.id, 1);

    // A wide margin keeps both.
    let lenient = SemanticRanker::new(RankConfig::default().with_margin(1.0), &reference);
    let response = lenient
        .rank(&mut provider, "mountain bike", 10, &corpus)
        .unwrap();
    assert_eq!(response.results.len(), 2);
}

#[test]
fn results_are_sorted_and_capped_at_limit() {
    let reference = reference();
    let mut provider = MockProvider::new(&[("mountain bike", axis(5))]);

    let corpus: Vec<Listing> = (0..8)
        .map(|i| {
            // Decreasing similarity to the query axis.
            let a = 1.0 - i as f32 * 0.05;
            let b = (1.0 - a * a).max(0.0).sqrt();
            let mut v = vec![0.0_f32; DIM];
            v[5] = a;
            v[0] = b;
            listing(i as i64, None, Some(&json_vec(&v)))
        })
        .collect();

    let ranker = SemanticRanker::new(RankConfig::default().with_margin(1.0), &reference);
    let response = ranker
        .rank(&mut provider, "mountain bike", 3, &corpus)
        .unwrap();

    assert_eq!(response.results.len(), 3);
    for pair in response.results.windows(2) {
        assert!(pair[0].final_score >= pair[1].final_score);
    }
    assert_eq!(response.results[0].listing.id, 0);
}

#[test]
fn every_result_is_within_margin_of_the_best() {
    let reference = reference();
    let mut provider = MockProvider::new(&[("mountain bike", axis(5))]);

    let corpus: Vec<Listing> = (0..10)
        .map(|i| {
            let a = 1.0 - i as f32 * 0.08;
            let b = (1.0 - a * a).max(0.0).sqrt();
            let mut v = vec![0.0_f32; DIM];
            v[5] = a;
            v[1] = b;
            listing(i as i64, None, Some(&json_vec(&v)))
        })
        .collect();

    let config = RankConfig::default();
    let ranker = SemanticRanker::new(config, &reference);
    let response = ranker
        .rank(&mut provider, "mountain bike", 10, &corpus)
        .unwrap();

    assert!(!response.results.is_empty());
    let top = response.results[0].final_score;
    for result in &response.results {
        assert!(result.final_score >= top - config.margin - 1e-6);
    }
}

#[test]
fn oversampling_bounds_the_fusion_pool() {
    let reference = reference();
    let mut provider = MockProvider::new(&[("premium watch", axis(4))]);

    // Six listings with identical semantics; with limit 1 and 5x oversample
    // only the first five (corpus order tiebreak) reach price fusion, so the
    // 600-priced sixth can never win.
    let shared = json_vec(&axis(4));
    let corpus: Vec<Listing> = (1..=6)
        .map(|i| listing(i, Some(i as f64 * 100.0), Some(&shared)))
        .collect();

    let ranker = SemanticRanker::new(RankConfig::default(), &reference);
    let response = ranker
        .rank(&mut provider, "premium watch", 1, &corpus)
        .unwrap();

    assert_eq!(response.results.len(), 1);
    assert_eq!(response.results[0].listing.price, Some(500.0));
}

#[test]
fn empty_and_corrupt_corpora_yield_empty_results() {
    let reference = reference();
    let mut provider = MockProvider::new(&[("mountain bike", axis(5))]);

    let ranker = SemanticRanker::new(RankConfig::default(), &reference);

    let response = ranker.rank(&mut provider, "mountain bike", 10, &[]).unwrap();
    assert!(response.results.is_empty());

    let corpus = vec![
        listing(1, None, Some("not json")),
        listing(2, None, Some("[1.0, 2.0]")), // wrong dimension
    ];
    let response = ranker
        .rank(&mut provider, "mountain bike", 10, &corpus)
        .unwrap();
    assert!(response.results.is_empty());
}

#[test]
fn provider_failure_aborts_the_query() {
    let reference = reference();
    let mut provider = MockProvider::new(&[]);

    let ranker = SemanticRanker::new(RankConfig::default(), &reference);
    let corpus = vec![listing(1, None, Some("[1.0]"))];
    assert!(ranker.rank(&mut provider, "unknown", 10, &corpus).is_err());
}
