// SPDX-License-Identifier: MIT OR Apache-2.0

//! CLI argument parsing using clap

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// adsearch - hybrid semantic + price-intent search over marketplace listings
///
/// Ingests scraped listings, stores them with a precomputed embedding, and
/// serves ranked search that fuses semantic similarity with detected price
/// intent.
#[derive(Parser, Debug)]
#[command(name = "adsearch")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true)]
    pub format: Option<OutputFormat>,

    /// Path to the listings database (overrides config)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Hybrid ranked search (semantic similarity + price intent)
    #[command(alias = "s")]
    Search {
        /// Free-text query
        query: String,

        /// Maximum number of results
        #[arg(short = 'm', long = "limit")]
        limit: Option<usize>,

        /// Weight of the semantic score in fusion (0.0-1.0)
        #[arg(long)]
        semantic_weight: Option<f32>,

        /// Relative cutoff below the best final score
        #[arg(long)]
        margin: Option<f32>,

        /// Oversampling factor for the pre-fusion candidate pool
        #[arg(long)]
        oversample: Option<usize>,

        /// Similarity floor for price-intent detection
        #[arg(long)]
        confidence_floor: Option<f32>,
    },

    /// Detect the price-tier intent of a query without ranking
    Intent {
        /// Free-text query
        query: String,

        /// Similarity floor for price-intent detection
        #[arg(long)]
        confidence_floor: Option<f32>,
    },

    /// Field-filtered search over stored listings (no embeddings involved)
    #[command(alias = "l")]
    Local {
        /// Per-word substring match over title and description
        query: Option<String>,

        /// Exact city match
        #[arg(long)]
        city: Option<String>,

        /// Minimum price
        #[arg(long)]
        min_price: Option<f64>,

        /// Maximum price
        #[arg(long)]
        max_price: Option<f64>,

        /// Maximum number of results
        #[arg(short = 'm', long = "limit")]
        limit: Option<usize>,
    },

    /// Ingest scraped listings from a JSON array (file or stdin)
    Ingest {
        /// Path to a JSON file; reads stdin when omitted
        file: Option<PathBuf>,
    },

    /// Embed stored listings that are missing an embedding
    Backfill,

    /// Show listing and embedding counts
    Stats,

    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}
