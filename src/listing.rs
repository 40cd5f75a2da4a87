// SPDX-License-Identifier: MIT OR Apache-2.0

//! Listing records as stored and served.

use serde::{Deserialize, Serialize};

/// A marketplace listing. Immutable after creation; the embedding may be
/// populated lazily by a later backfill pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    /// Storage-assigned identifier
    pub id: i64,
    /// Listing title
    pub title: Option<String>,
    /// Listing description
    pub description: Option<String>,
    /// Price in som; `None` means price unknown
    pub price: Option<f64>,
    /// Source URL, the external identity key (unique)
    pub url: String,
    /// City the listing was posted in
    pub city: Option<String>,
    /// Embedding vector serialized as a JSON array of floats
    #[serde(skip_serializing)]
    pub embedding: Option<String>,
    /// Unix timestamp of ingestion
    pub created_at: i64,
}

/// Input record for creating a listing, before storage assigns an id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewListing {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub url: String,
    pub city: Option<String>,
}
