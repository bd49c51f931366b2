// ABOUTME: Grouping analysis configuration for pattern classification and wind estimation
// ABOUTME: Shape thresholds, distance-indexed reference spreads, and the grouping rule table
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Grouping Analysis Configuration
//!
//! Every boundary the grouping analyzer classifies against lives here so the
//! shape tags can be retuned without touching the analyzer.

use crate::archery_constants::{grouping, wind};
use crate::recommendation_rules::{default_grouping_rules, GroupingRule};
use serde::{Deserialize, Serialize};

/// Grouping Analyzer Configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupingConfig {
    /// Shape classification thresholds
    pub thresholds: PatternThresholds,
    /// Reference maximum spread by shooting distance, ascending by distance
    pub reference_spread: Vec<ReferenceSpread>,
    /// Wind drift model
    pub wind: WindEffectConfig,
    /// Ordered grouping advice
    pub rules: Vec<GroupingRule>,
}

/// Pattern classification thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternThresholds {
    /// Spread / outer radius at or below which a group is tight
    pub tight_spread_ratio: f64,
    /// Major / minor axis ratio at or above which a group is a string
    pub string_axis_ratio: f64,
    /// Allowed deviation from vertical or horizontal, degrees
    pub orientation_tolerance_deg: f64,
    /// Offset / outer radius at or below which the group is centred
    pub centered_tolerance_ratio: f64,
    /// Fewest arrows a shape is classified from
    pub min_arrows_for_pattern: usize,
}

/// Reference spread for one shooting distance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceSpread {
    /// Shooting distance in metres
    pub distance_m: u32,
    /// Reference maximum spread as a fraction of the face's outer radius
    pub spread_ratio: f64,
}

/// Wind drift model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindEffectConfig {
    /// Face drift per m/s of wind per metre of distance
    pub drift_per_ms_per_m: f64,
}

impl GroupingConfig {
    /// Reference spread ratio for `distance_m`
    ///
    /// Linear between table entries, clamped to the first and last entries
    /// outside the table.
    #[must_use]
    pub fn reference_spread_ratio(&self, distance_m: u32) -> f64 {
        let table = &self.reference_spread;
        let (Some(first), Some(last)) = (table.first(), table.last()) else {
            return 1.0;
        };
        if distance_m <= first.distance_m {
            return first.spread_ratio;
        }
        if distance_m >= last.distance_m {
            return last.spread_ratio;
        }
        table
            .windows(2)
            .find(|pair| distance_m <= pair[1].distance_m)
            .map_or(last.spread_ratio, |pair| {
                let span = f64::from(pair[1].distance_m - pair[0].distance_m);
                let t = f64::from(distance_m - pair[0].distance_m) / span;
                (pair[1].spread_ratio - pair[0].spread_ratio).mul_add(t, pair[0].spread_ratio)
            })
    }
}

impl Default for GroupingConfig {
    fn default() -> Self {
        Self {
            thresholds: PatternThresholds::default(),
            reference_spread: grouping::REFERENCE_SPREAD_BY_DISTANCE
                .iter()
                .map(|&(distance_m, spread_ratio)| ReferenceSpread {
                    distance_m,
                    spread_ratio,
                })
                .collect(),
            wind: WindEffectConfig::default(),
            rules: default_grouping_rules(),
        }
    }
}

impl Default for PatternThresholds {
    fn default() -> Self {
        Self {
            tight_spread_ratio: grouping::TIGHT_SPREAD_RATIO,
            string_axis_ratio: grouping::STRING_AXIS_RATIO,
            orientation_tolerance_deg: grouping::ORIENTATION_TOLERANCE_DEG,
            centered_tolerance_ratio: grouping::CENTERED_TOLERANCE_RATIO,
            min_arrows_for_pattern: grouping::MIN_ARROWS_FOR_PATTERN,
        }
    }
}

impl Default for WindEffectConfig {
    fn default() -> Self {
        Self {
            drift_per_ms_per_m: wind::DRIFT_PER_MS_PER_M,
        }
    }
}
