// SPDX-License-Identifier: MIT OR Apache-2.0

//! Terminal output for search results
//!
//! Colored rendering respecting the NO_COLOR environment variable, plus JSON
//! output for machine consumers.

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;

use crate::listing::Listing;
use crate::ranking::RankedResponse;

/// Check if colors should be used (respects NO_COLOR env var)
pub fn use_colors() -> bool {
    std::env::var("NO_COLOR").is_err()
}

/// Renders a price for display; unknown prices are negotiable by convention.
pub fn format_price(price: Option<f64>) -> String {
    match price {
        Some(p) => format!("{} som", p.round() as i64),
        None => "negotiable".to_string(),
    }
}

/// Serializes any result payload as pretty JSON.
pub fn to_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Prints a ranked response in human-readable form.
pub fn print_ranked(response: &RankedResponse, use_color: bool) {
    println!("intent: {}", colorize_intent(&response.intent.to_string(), use_color));

    if response.results.is_empty() {
        println!("no results");
        return;
    }

    for (rank, result) in response.results.iter().enumerate() {
        println!(
            "{:>2}. {}  {}  {}  {}",
            rank + 1,
            colorize_score(result.final_score, use_color),
            colorize_title(result.listing.title.as_deref().unwrap_or("(untitled)"), use_color),
            colorize_price(&format_price(result.listing.price), use_color),
            colorize_city(result.listing.city.as_deref().unwrap_or(""), use_color),
        );
        println!(
            "      sem {:.3}  price {:.3}",
            result.semantic_score, result.price_score
        );
        println!("      {}", colorize_url(&result.listing.url, use_color));
    }
}

/// Prints a plain listing set (local search) in human-readable form.
pub fn print_listings(listings: &[Listing], use_color: bool) {
    if listings.is_empty() {
        println!("no results");
        return;
    }

    for listing in listings {
        println!(
            "{}  {}  {}",
            colorize_title(listing.title.as_deref().unwrap_or("(untitled)"), use_color),
            colorize_price(&format_price(listing.price), use_color),
            colorize_city(listing.city.as_deref().unwrap_or(""), use_color),
        );
        println!("    {}", colorize_url(&listing.url, use_color));
    }
}

fn colorize_title(text: &str, use_color: bool) -> String {
    if use_color {
        text.bold().to_string()
    } else {
        text.to_string()
    }
}

fn colorize_price(text: &str, use_color: bool) -> String {
    if use_color {
        text.green().to_string()
    } else {
        text.to_string()
    }
}

fn colorize_city(text: &str, use_color: bool) -> String {
    if use_color {
        text.dimmed().to_string()
    } else {
        text.to_string()
    }
}

fn colorize_url(text: &str, use_color: bool) -> String {
    if use_color {
        text.cyan().to_string()
    } else {
        text.to_string()
    }
}

fn colorize_intent(text: &str, use_color: bool) -> String {
    if use_color {
        text.magenta().to_string()
    } else {
        text.to_string()
    }
}

fn colorize_score(score: f32, use_color: bool) -> String {
    let text = format!("{:.3}", score);
    if use_color {
        text.yellow().to_string()
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_formatting() {
        assert_eq!(format_price(Some(45000.0)), "45000 som");
        assert_eq!(format_price(Some(999.6)), "1000 som");
        assert_eq!(format_price(None), "negotiable");
    }
}
