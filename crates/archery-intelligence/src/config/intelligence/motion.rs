// ABOUTME: Motion scoring configuration for stability, consistency, and technique advice
// ABOUTME: Normalisation scales plus the ordered motion recommendation rule table
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Motion Scoring Configuration
//!
//! Scales that map stability and consistency measures onto 0-100 scores,
//! plus the ordered technique rule table.

use crate::archery_constants::motion;
use crate::recommendation_rules::{default_motion_rules, MotionRule};
use serde::{Deserialize, Serialize};

/// Motion Scorer Configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MotionConfig {
    /// Holding aim-angle variance (deg^2) mapping to a stability of 50
    pub stability_variance_scale: f64,
    /// Mean normalised cross-shot variance mapping to a consistency of 50
    pub consistency_variance_scale: f64,
    /// Ordered technique advice
    pub rules: Vec<MotionRule>,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            stability_variance_scale: motion::STABILITY_VARIANCE_SCALE,
            consistency_variance_scale: motion::CONSISTENCY_VARIANCE_SCALE,
            rules: default_motion_rules(),
        }
    }
}
