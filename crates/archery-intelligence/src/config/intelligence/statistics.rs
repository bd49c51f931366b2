// ABOUTME: Period statistics configuration for accuracy classification
// ABOUTME: Holds the in-target threshold applied when counting accurate arrows
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Statistics Aggregation Configuration
//!
//! Arrows scoring above the in-target threshold count towards accuracy.

use crate::archery_constants::statistics;
use serde::{Deserialize, Serialize};

/// Statistics Aggregator Configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatisticsConfig {
    /// Arrows scoring strictly above this count toward the accuracy rate
    pub in_target_score_threshold: u32,
}

impl Default for StatisticsConfig {
    fn default() -> Self {
        Self {
            in_target_score_threshold: statistics::IN_TARGET_SCORE_THRESHOLD,
        }
    }
}
