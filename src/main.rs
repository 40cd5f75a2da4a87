// SPDX-License-Identifier: MIT OR Apache-2.0

//! adsearch - hybrid semantic + price-intent listing search
//!
//! Ingests scraped marketplace listings, embeds them once, and serves ranked
//! search fusing semantic similarity with detected price intent.

mod cli;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Commands, OutputFormat};
use std::fs::File;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use adsearch::config::Config;
use adsearch::embedding::{create_provider, EmbeddingProvider};
use adsearch::ingest;
use adsearch::intent::PriceIntentReference;
use adsearch::output;
use adsearch::ranking::{RankConfig, SemanticRanker};
use adsearch::store::{ListingStore, LocalSearchParams};

fn main() -> Result<()> {
    // ADSEARCH_LOG=debug adsearch search "query"
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("ADSEARCH_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load();
    let format = cli.format.unwrap_or_default();

    match cli.command {
        Commands::Search {
            query,
            limit,
            semantic_weight,
            margin,
            oversample,
            confidence_floor,
        } => {
            let store = open_store(cli.db, &config)?;
            let mut provider = provider_from_config(&config)?;

            let reference = PriceIntentReference::build(provider.as_mut())?
                .with_confidence_floor(
                    confidence_floor.unwrap_or_else(|| config.intent.confidence_floor()),
                );
            let rank_config = RankConfig::default()
                .with_semantic_weight(
                    semantic_weight.unwrap_or_else(|| config.search.semantic_weight()),
                )
                .with_margin(margin.unwrap_or_else(|| config.search.margin()))
                .with_oversample(oversample.unwrap_or_else(|| config.search.oversample()));

            let corpus = store.corpus()?;
            let ranker = SemanticRanker::new(rank_config, &reference);
            let response = ranker.rank(
                provider.as_mut(),
                &query,
                limit.unwrap_or_else(|| config.search.limit()),
                &corpus,
            )?;

            match format {
                OutputFormat::Json => println!("{}", output::to_json(&response)?),
                OutputFormat::Text => output::print_ranked(&response, output::use_colors()),
            }
        }

        Commands::Intent {
            query,
            confidence_floor,
        } => {
            let mut provider = provider_from_config(&config)?;
            let reference = PriceIntentReference::build(provider.as_mut())?
                .with_confidence_floor(
                    confidence_floor.unwrap_or_else(|| config.intent.confidence_floor()),
                );
            let tier = reference.detect(provider.as_mut(), &query)?;

            match format {
                OutputFormat::Json => println!(
                    "{}",
                    output::to_json(&serde_json::json!({ "query": query, "intent": tier }))?
                ),
                OutputFormat::Text => println!("{}", tier),
            }
        }

        Commands::Local {
            query,
            city,
            min_price,
            max_price,
            limit,
        } => {
            let store = open_store(cli.db, &config)?;
            let listings = store.local_search(&LocalSearchParams {
                query,
                city,
                min_price,
                max_price,
                limit,
            })?;

            match format {
                OutputFormat::Json => println!("{}", output::to_json(&listings)?),
                OutputFormat::Text => output::print_listings(&listings, output::use_colors()),
            }
        }

        Commands::Ingest { file } => {
            let store = open_store(cli.db, &config)?;
            let mut provider = provider_from_config(&config)?;

            let batch = match file {
                Some(path) => {
                    let file = File::open(&path)
                        .with_context(|| format!("Failed to open {}", path.display()))?;
                    ingest::read_batch(file)?
                }
                None => ingest::read_batch(std::io::stdin().lock())?,
            };

            let report = ingest::ingest(&store, provider.as_mut(), &batch)?;
            match format {
                OutputFormat::Json => println!(
                    "{}",
                    output::to_json(&serde_json::json!({
                        "new": report.new,
                        "existing": report.existing,
                        "skipped": report.skipped,
                    }))?
                ),
                OutputFormat::Text => println!(
                    "ingested {} new, {} existing, {} skipped",
                    report.new, report.existing, report.skipped
                ),
            }
        }

        Commands::Backfill => {
            let store = open_store(cli.db, &config)?;
            let mut provider = provider_from_config(&config)?;
            let updated = ingest::backfill_embeddings(&store, provider.as_mut())?;
            match format {
                OutputFormat::Json => println!(
                    "{}",
                    output::to_json(&serde_json::json!({ "updated": updated }))?
                ),
                OutputFormat::Text => println!("embedded {} listings", updated),
            }
        }

        Commands::Stats => {
            let store = open_store(cli.db, &config)?;
            let total = store.count()?;
            let embedded = store.count_embedded()?;
            match format {
                OutputFormat::Json => println!(
                    "{}",
                    output::to_json(&serde_json::json!({
                        "listings": total,
                        "embedded": embedded,
                        "db_path": store.path(),
                    }))?
                ),
                OutputFormat::Text => {
                    println!("listings: {}", total);
                    println!("embedded: {}", embedded);
                    println!("db: {}", store.path().display());
                }
            }
        }

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "adsearch", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn open_store(cli_db: Option<PathBuf>, config: &Config) -> Result<ListingStore> {
    match cli_db.or_else(|| config.store.db_path.clone()) {
        Some(path) => ListingStore::open(path),
        None => ListingStore::open_default(),
    }
}

fn provider_from_config(config: &Config) -> Result<Box<dyn EmbeddingProvider>> {
    create_provider(
        config.embeddings.provider(),
        config.embeddings.command.as_deref(),
        config.embeddings.model.as_deref(),
        config.embeddings.dimension(),
    )
}
