// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedding providers.
//!
//! The ranking core only needs `text -> fixed-length vector`; everything
//! about the model lives behind the [`EmbeddingProvider`] trait so tests can
//! substitute a deterministic mock.

pub mod provider;

pub use provider::{
    create_provider, CommandProvider, DummyProvider, EmbeddingProvider, FastEmbedder,
    ProviderKind, DEFAULT_EMBEDDING_DIM,
};
