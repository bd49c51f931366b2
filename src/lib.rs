// ABOUTME: Main library entry point for the archery shot analysis service
// ABOUTME: Orchestrates scoring, grouping, motion, and statistics engines behind async entry points
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

#![deny(unsafe_code)]

//! # Archery Analysis
//!
//! Turns recorded arrow impacts and extracted pose keypoints into scores,
//! group diagnoses, phase-segmented technique feedback, and longitudinal
//! training statistics.
//!
//! ## Architecture
//!
//! - **`archery-core`**: error type, domain models, constants
//! - **`archery-intelligence`**: the pure analysis engines and their configuration
//! - **orchestrator**: bounded worker pool, cancellation, content keys, and the
//!   collaborator traits that supply inputs and persist results
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use archery_analysis::config::environment::ServerConfig;
//! use archery_analysis::orchestrator::{AnalysisOrchestrator, Collaborators, InMemoryStore};
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//! use uuid::Uuid;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::from_env()?;
//!     let store = Arc::new(InMemoryStore::new()?);
//!     let orchestrator = AnalysisOrchestrator::new(Collaborators::single(store), &config);
//!
//!     let analysis = orchestrator
//!         .analyze_target(Uuid::new_v4(), &CancellationToken::new())
//!         .await?;
//!     println!("{}", analysis.grouping.pattern.as_str());
//!     Ok(())
//! }
//! ```

/// Runtime configuration from the environment
pub mod config;

/// Unified error handling
pub mod errors;

/// Engine re-exports
pub mod intelligence;

/// Structured logging setup
pub mod logging;

/// Analysis entry points and collaborator interfaces
pub mod orchestrator;

/// Domain models
pub mod models {
    pub use archery_core::models::*;
}

/// Application constants
pub mod constants {
    pub use archery_core::constants::*;
}
