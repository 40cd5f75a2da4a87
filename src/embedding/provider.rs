// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedding provider interface and implementations.
//!
//! The builtin provider uses fastembed (all-MiniLM-L6-v2) on CPU; a command
//! provider shells out to an external process for anything else.

use anyhow::{bail, Context, Result};
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use serde::Deserialize;
use serde_json::Value;
use std::borrow::Cow;
use std::io::Write;
use std::process::{Command, Stdio};

/// Output dimension of sentence-transformers/all-MiniLM-L6-v2.
pub const DEFAULT_EMBEDDING_DIM: usize = 384;

/// Listing texts are short; anything longer carries no extra signal.
const DEFAULT_MAX_CHARS: usize = 1500;

/// Which provider implementation to construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Builtin,
    Command,
    Dummy,
}

/// Trait for embedding providers.
///
/// Assumed deterministic for identical input; failures are transport/model
/// errors and are propagated, never recovered locally.
pub trait EmbeddingProvider: Send {
    /// Returns the model identifier.
    fn model_id(&self) -> &str;

    /// Generates embeddings for the given texts.
    fn embed_texts(&mut self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Generates an embedding for a single text.
    fn embed_one(&mut self, text: &str) -> Result<Vec<f32>> {
        let mut result = self.embed_texts(&[text.to_string()])?;
        result
            .pop()
            .ok_or_else(|| anyhow::anyhow!("No embedding returned"))
    }
}

/// Constructs a provider from configuration.
pub fn create_provider(
    kind: ProviderKind,
    command: Option<&str>,
    model: Option<&str>,
    dimension: usize,
) -> Result<Box<dyn EmbeddingProvider>> {
    match kind {
        ProviderKind::Builtin => Ok(Box::new(FastEmbedder::new()?)),
        ProviderKind::Command => {
            let command = command
                .filter(|c| !c.trim().is_empty())
                .context("embeddings.command must be set for the command provider")?;
            Ok(Box::new(CommandProvider::new(
                command.to_string(),
                model.unwrap_or("external").to_string(),
            )))
        }
        ProviderKind::Dummy => Ok(Box::new(DummyProvider::new(dimension))),
    }
}

/// FastEmbed provider using sentence-transformers/all-MiniLM-L6-v2.
pub struct FastEmbedder {
    embedder: TextEmbedding,
    model_id: String,
}

impl FastEmbedder {
    pub fn new() -> Result<Self> {
        let model = EmbeddingModel::AllMiniLML6V2;
        let model_id = model.to_string();
        let init = InitOptions::new(model);
        let embedder =
            TextEmbedding::try_new(init).context("Failed to initialize fastembed model")?;

        Ok(Self { embedder, model_id })
    }
}

impl EmbeddingProvider for FastEmbedder {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn embed_texts(&mut self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let prepared = truncate_texts(texts, DEFAULT_MAX_CHARS);
        let mut embeddings = self.embedder.embed(&prepared, None)?;
        for embedding in embeddings.iter_mut() {
            l2_normalize(embedding);
        }

        Ok(embeddings)
    }
}

/// Command provider that shells out to an external process.
///
/// The process receives `{"model": ..., "texts": [...]}` on stdin and must
/// print a JSON array of vectors (or an object with an `embeddings`,
/// `vectors`, or `data` field) on stdout.
pub struct CommandProvider {
    command: String,
    model: String,
}

impl CommandProvider {
    pub fn new(command: String, model: String) -> Self {
        Self { command, model }
    }

    fn run_command(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let payload = serde_json::json!({
            "model": self.model,
            "texts": texts,
        });

        let mut child = Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to spawn embedding command: {}", self.command))?;

        if let Some(mut stdin) = child.stdin.take() {
            let payload_str = payload.to_string();
            stdin
                .write_all(payload_str.as_bytes())
                .context("Failed to write embeddings payload to stdin")?;
        }

        let output = child
            .wait_with_output()
            .context("Failed to read embeddings command output")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "Embedding command failed (status {}): {}",
                output.status,
                stderr.trim()
            );
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let parsed: Value = serde_json::from_str(stdout.trim())
            .with_context(|| "Failed to parse embeddings command output as JSON")?;

        let embeddings_value = match parsed {
            Value::Array(arr) => Value::Array(arr),
            Value::Object(ref obj) => {
                if let Some(value) = obj.get("embeddings") {
                    value.clone()
                } else if let Some(value) = obj.get("vectors") {
                    value.clone()
                } else if let Some(value) = obj.get("data") {
                    value.clone()
                } else {
                    bail!("Embeddings command output missing 'embeddings' field");
                }
            }
            _ => bail!("Embeddings command output must be JSON array or object"),
        };

        let vectors = embeddings_value
            .as_array()
            .ok_or_else(|| anyhow::anyhow!("Embeddings output must be a JSON array"))?
            .iter()
            .map(|row| {
                row.as_array()
                    .ok_or_else(|| anyhow::anyhow!("Embedding row must be an array"))?
                    .iter()
                    .map(|value| {
                        value
                            .as_f64()
                            .ok_or_else(|| anyhow::anyhow!("Embedding value must be a number"))
                            .map(|v| v as f32)
                    })
                    .collect::<Result<Vec<f32>>>()
            })
            .collect::<Result<Vec<Vec<f32>>>>()?;

        Ok(vectors)
    }
}

impl EmbeddingProvider for CommandProvider {
    fn model_id(&self) -> &str {
        &self.model
    }

    fn embed_texts(&mut self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.run_command(texts)
    }
}

/// Dummy provider that returns zero vectors (for testing/fallback).
pub struct DummyProvider {
    model: String,
    dimension: usize,
}

impl DummyProvider {
    pub fn new(dimension: usize) -> Self {
        Self {
            model: "dummy".to_string(),
            dimension,
        }
    }
}

impl EmbeddingProvider for DummyProvider {
    fn model_id(&self) -> &str {
        &self.model
    }

    fn embed_texts(&mut self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let vectors: Vec<Vec<f32>> = texts.iter().map(|_| vec![0.0; self.dimension]).collect();

        Ok(vectors)
    }
}

fn truncate_texts<'a>(texts: &'a [String], max_chars: usize) -> Vec<Cow<'a, str>> {
    texts
        .iter()
        .map(|text| truncate_to_chars(text.as_str(), max_chars))
        .collect()
}

fn truncate_to_chars(input: &str, max_chars: usize) -> Cow<'_, str> {
    if max_chars == 0 {
        return Cow::Borrowed("");
    }

    let mut count = 0;
    for (idx, _) in input.char_indices() {
        if count == max_chars {
            return Cow::Owned(input[..idx].to_string());
        }
        count += 1;
    }

    Cow::Borrowed(input)
}

fn l2_normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm == 0.0 {
        return;
    }
    for value in vector.iter_mut() {
        *value /= norm;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dummy_provider_returns_fixed_dimension() {
        let mut provider = DummyProvider::new(384);
        assert_eq!(provider.model_id(), "dummy");

        let result = provider
            .embed_texts(&["hello".to_string(), "world".to_string()])
            .unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].len(), 384);
        assert!(result[0].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn empty_input_yields_empty_output() {
        let mut provider = DummyProvider::new(384);
        let result = provider.embed_texts(&[]).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn embed_one_returns_single_vector() {
        let mut provider = DummyProvider::new(128);
        let vector = provider.embed_one("test").unwrap();
        assert_eq!(vector.len(), 128);
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(
            truncate_to_chars("hello", 2),
            Cow::<str>::Owned("he".to_string())
        );
        assert_eq!(truncate_to_chars("hello", 5), Cow::Borrowed("hello"));
    }

    #[test]
    fn l2_normalize_leaves_zero_vector_alone() {
        let mut v = vec![0.0_f32, 0.0];
        l2_normalize(&mut v);
        assert_eq!(v, vec![0.0, 0.0]);

        let mut v = vec![3.0_f32, 4.0];
        l2_normalize(&mut v);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn command_provider_requires_command() {
        assert!(create_provider(ProviderKind::Command, None, None, 8).is_err());
        assert!(create_provider(ProviderKind::Command, Some("  "), None, 8).is_err());
    }
}
