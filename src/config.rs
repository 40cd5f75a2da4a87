// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration file support for adsearch
//!
//! Loads configuration from .adsearchrc.toml in the current directory or
//! ~/.config/adsearch/config.toml. CLI flags override config values, which
//! override built-in defaults.

use serde::Deserialize;
use std::path::PathBuf;
use tracing::warn;

use crate::embedding::{ProviderKind, DEFAULT_EMBEDDING_DIM};
use crate::intent::DEFAULT_CONFIDENCE_FLOOR;
use crate::ranking::{
    DEFAULT_LIMIT, DEFAULT_OVERSAMPLE, DEFAULT_SCORE_MARGIN, DEFAULT_SEMANTIC_WEIGHT,
};

/// Search/ranking configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Weight for the semantic score in hybrid fusion (0.0-1.0)
    pub semantic_weight: Option<f32>,
    /// Relative cutoff below the best final score
    pub margin: Option<f32>,
    /// Oversampling factor for the pre-fusion candidate pool
    pub oversample: Option<usize>,
    /// Default maximum number of results
    pub limit: Option<usize>,
}

impl SearchConfig {
    pub fn semantic_weight(&self) -> f32 {
        self.semantic_weight.unwrap_or(DEFAULT_SEMANTIC_WEIGHT)
    }

    pub fn margin(&self) -> f32 {
        self.margin.unwrap_or(DEFAULT_SCORE_MARGIN)
    }

    pub fn oversample(&self) -> usize {
        self.oversample.unwrap_or(DEFAULT_OVERSAMPLE)
    }

    pub fn limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_LIMIT)
    }
}

/// Price-intent configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IntentConfig {
    /// Similarity floor below which a query is treated as neutral
    pub confidence_floor: Option<f32>,
}

impl IntentConfig {
    pub fn confidence_floor(&self) -> f32 {
        self.confidence_floor.unwrap_or(DEFAULT_CONFIDENCE_FLOOR)
    }
}

/// Embedding provider configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Provider type (builtin, command, dummy)
    pub provider: Option<ProviderKind>,
    /// Model identifier passed to the command provider
    pub model: Option<String>,
    /// Command to execute for the command provider
    pub command: Option<String>,
    /// Vector dimension for the dummy provider
    pub dimension: Option<usize>,
}

impl EmbeddingConfig {
    pub fn provider(&self) -> ProviderKind {
        self.provider.unwrap_or_default()
    }

    pub fn dimension(&self) -> usize {
        self.dimension.unwrap_or(DEFAULT_EMBEDDING_DIM)
    }
}

/// Storage configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Path to the listings database
    pub db_path: Option<PathBuf>,
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub search: SearchConfig,
    pub intent: IntentConfig,
    pub embeddings: EmbeddingConfig,
    pub store: StoreConfig,
}

impl Config {
    /// Loads configuration from the first file found, falling back to
    /// defaults. A malformed file is reported but never fatal.
    pub fn load() -> Self {
        for path in Self::candidate_paths() {
            if !path.exists() {
                continue;
            }
            match std::fs::read_to_string(&path) {
                Ok(raw) => match toml::from_str(&raw) {
                    Ok(config) => return config,
                    Err(err) => {
                        warn!(path = %path.display(), %err, "ignoring malformed config file");
                    }
                },
                Err(err) => {
                    warn!(path = %path.display(), %err, "failed to read config file");
                }
            }
        }
        Self::default()
    }

    fn candidate_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(".adsearchrc.toml")];
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("adsearch").join("config.toml"));
        }
        paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_ranking_constants() {
        let config = Config::default();
        assert_eq!(config.search.semantic_weight(), DEFAULT_SEMANTIC_WEIGHT);
        assert_eq!(config.search.margin(), DEFAULT_SCORE_MARGIN);
        assert_eq!(config.search.oversample(), DEFAULT_OVERSAMPLE);
        assert_eq!(config.search.limit(), DEFAULT_LIMIT);
        assert_eq!(config.intent.confidence_floor(), DEFAULT_CONFIDENCE_FLOOR);
        assert_eq!(config.embeddings.provider(), ProviderKind::Builtin);
        assert_eq!(config.embeddings.dimension(), DEFAULT_EMBEDDING_DIM);
    }

    #[test]
    fn parses_partial_config() {
        let raw = r#"
[search]
semantic_weight = 0.8
limit = 5

[embeddings]
provider = "dummy"
dimension = 8
"#;
        let config: Config = toml::from_str(raw).unwrap();
        assert_eq!(config.search.semantic_weight(), 0.8);
        assert_eq!(config.search.limit(), 5);
        // Unset values fall back to defaults
        assert_eq!(config.search.margin(), DEFAULT_SCORE_MARGIN);
        assert_eq!(config.embeddings.provider(), ProviderKind::Dummy);
        assert_eq!(config.embeddings.dimension(), 8);
    }

    #[test]
    fn unknown_provider_fails_to_parse() {
        let raw = r#"
[embeddings]
provider = "quantum"
"#;
        assert!(toml::from_str::<Config>(raw).is_err());
    }
}
