// ABOUTME: Configuration module for the archery-intelligence crate
// ABOUTME: Re-exports the analysis engine configuration types
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

/// Analysis engine configuration (scoring, grouping, segmentation, motion, statistics)
pub mod intelligence;

pub use intelligence::{ConfigError, IntelligenceConfig};
