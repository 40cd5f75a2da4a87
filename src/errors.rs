// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed errors for the ranking core.

use thiserror::Error;

/// Errors produced while scoring listings against a query.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RankError {
    /// Two vectors with different dimensionality were compared.
    ///
    /// This always indicates corrupt stored data or a provider/model change;
    /// callers decide whether to skip the offending listing or abort.
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}
