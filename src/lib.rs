// SPDX-License-Identifier: MIT OR Apache-2.0

//! adsearch - hybrid listing search library
//!
//! Shared modules for the adsearch CLI tool.

pub mod compose;
pub mod config;
pub mod embedding;
pub mod errors;
pub mod ingest;
pub mod intent;
pub mod listing;
pub mod output;
pub mod ranking;
pub mod store;
pub mod vector;
