// SPDX-License-Identifier: MIT OR Apache-2.0

//! Canonical text composition for listings.
//!
//! The composed string is what gets embedded, so its shape must be
//! deterministic: same listing fields, same text, same vector.

use crate::listing::{Listing, NewListing};

/// Builds the embedding text from individual listing fields.
///
/// The title is emitted twice so title matches outweigh pure description
/// matches. Absent or empty fields are skipped; if nothing is present the
/// result is empty and callers must not embed it.
pub fn compose_parts(
    title: Option<&str>,
    price: Option<f64>,
    city: Option<&str>,
    description: Option<&str>,
) -> String {
    let mut parts: Vec<String> = Vec::new();

    if let Some(title) = non_empty(title) {
        parts.push(title.to_string());
        parts.push(title.to_string());
    }

    if let Some(price) = price {
        parts.push(format!("Price {} som", price.round() as i64));
    }

    if let Some(city) = non_empty(city) {
        parts.push(format!("Located in {}", city));
    }

    if let Some(description) = non_empty(description) {
        parts.push(description.to_string());
    }

    parts.join(". ")
}

/// Composes the embedding text for a stored listing.
pub fn compose_listing_text(listing: &Listing) -> String {
    compose_parts(
        listing.title.as_deref(),
        listing.price,
        listing.city.as_deref(),
        listing.description.as_deref(),
    )
}

/// Composes the embedding text for a listing about to be ingested.
pub fn compose_new_listing_text(listing: &NewListing) -> String {
    compose_parts(
        listing.title.as_deref(),
        listing.price,
        listing.city.as_deref(),
        listing.description.as_deref(),
    )
}

fn non_empty(field: Option<&str>) -> Option<&str> {
    field.map(str::trim).filter(|s| !s.is_empty())
}
