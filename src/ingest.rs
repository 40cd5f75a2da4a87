// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ingestion of scraped listings.
//!
//! Consumes already-extracted records (scraping itself lives outside this
//! crate), deduplicates by URL, composes the canonical text, and embeds it
//! when non-empty. Also hosts the lazy embedding backfill pass.

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashSet;
use tracing::debug;

use crate::compose::{compose_listing_text, compose_new_listing_text};
use crate::embedding::EmbeddingProvider;
use crate::listing::NewListing;
use crate::store::ListingStore;

/// One record as delivered by a scraper. Price may arrive already parsed or
/// as raw display text ("45 000 сом").
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScrapedListing {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub price_text: Option<String>,
    pub url: Option<String>,
    pub city: Option<String>,
}

/// Outcome of one ingestion batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Records inserted as new listings
    pub new: usize,
    /// Records whose URL was already stored
    pub existing: usize,
    /// Records dropped (no URL, or duplicate within the batch)
    pub skipped: usize,
}

/// Ingests a batch of scraped records.
///
/// URL is the identity key: records without one are dropped, repeats within
/// the batch collapse to the first occurrence, and URLs already in the store
/// are left untouched. New listings get an embedding iff their composed text
/// is non-empty.
pub fn ingest(
    store: &ListingStore,
    provider: &mut dyn EmbeddingProvider,
    batch: &[ScrapedListing],
) -> Result<IngestReport> {
    let mut report = IngestReport::default();
    let mut seen_urls: HashSet<&str> = HashSet::new();

    for record in batch {
        let Some(url) = record.url.as_deref().map(str::trim).filter(|u| !u.is_empty()) else {
            report.skipped += 1;
            continue;
        };
        if !seen_urls.insert(url) {
            report.skipped += 1;
            continue;
        }
        if store.get_by_url(url)?.is_some() {
            report.existing += 1;
            continue;
        }

        let listing = NewListing {
            title: record.title.clone(),
            description: record.description.clone(),
            price: record.price.or_else(|| parse_price(record.price_text.as_deref())),
            url: url.to_string(),
            city: record.city.clone(),
        };

        let text = compose_new_listing_text(&listing);
        let embedding = if text.trim().is_empty() {
            // Nothing to embed; a degenerate vector would only pollute the corpus.
            None
        } else {
            let vector = provider.embed_one(&text)?;
            Some(serde_json::to_string(&vector)?)
        };

        store.insert(&listing, embedding.as_deref())?;
        debug!(url, embedded = embedding.is_some(), "listing ingested");
        report.new += 1;
    }

    Ok(report)
}

/// Embeds stored listings whose embedding is missing but whose composed text
/// is non-empty. Returns the number of listings updated.
pub fn backfill_embeddings(
    store: &ListingStore,
    provider: &mut dyn EmbeddingProvider,
) -> Result<usize> {
    let pending = store.listings_missing_embedding()?;
    if pending.is_empty() {
        return Ok(0);
    }

    let bar = ProgressBar::new(pending.len() as u64);
    bar.set_style(
        ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    bar.set_message("embedding listings");

    let mut updated = 0;
    for listing in &pending {
        bar.inc(1);
        let text = compose_listing_text(listing);
        if text.trim().is_empty() {
            continue;
        }
        let vector = provider.embed_one(&text)?;
        store.set_embedding(listing.id, &serde_json::to_string(&vector)?)?;
        updated += 1;
    }
    bar.finish_and_clear();

    Ok(updated)
}

static NON_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\d]").expect("static regex"));

/// Extracts a price from display text by dropping every non-digit character.
pub fn parse_price(text: Option<&str>) -> Option<f64> {
    let digits = NON_DIGITS.replace_all(text?, "");
    if digits.is_empty() {
        return None;
    }
    digits.parse::<f64>().ok()
}

/// Reads a batch of scraped records from a JSON array.
pub fn read_batch(reader: impl std::io::Read) -> Result<Vec<ScrapedListing>> {
    serde_json::from_reader(reader).context("Failed to parse listings JSON")
}
