// ABOUTME: Geometric arrow scoring against a target face's ring and colour tables
// ABOUTME: Pure and deterministic: identical coordinate and spec always give the same score
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use crate::config::intelligence::{LineRule, ScoringConfig};
use crate::config::IntelligenceConfig;
use archery_core::constants::zone_colors;
use archery_core::errors::{AppError, AppResult};
use archery_core::models::{ArrowImpact, Point2, RingBand, ScoredArrow, ShotScore, TargetSpec};

/// Scores arrow impacts by radial distance from the target centre
#[derive(Debug, Clone)]
pub struct ArrowScorer {
    config: ScoringConfig,
}

impl Default for ArrowScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl ArrowScorer {
    /// Create a scorer using the global configuration
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: IntelligenceConfig::global().scoring.clone(),
        }
    }

    /// Create a scorer with a custom configuration
    #[must_use]
    pub const fn with_config(config: ScoringConfig) -> Self {
        Self { config }
    }

    /// Score one coordinate
    ///
    /// An impact outside the outermost ring is a miss (`score 0, ring 0,
    /// "miss"`), not an error.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for a non-finite coordinate
    pub fn score(&self, point: Point2, spec: &TargetSpec) -> AppResult<ShotScore> {
        if !point.is_finite() {
            return Err(AppError::invalid_input(format!(
                "Arrow coordinate ({}, {}) is not finite",
                point.x, point.y
            )));
        }

        let distance = point.magnitude();
        let band = match self.config.line_rule {
            LineRule::OuterRing => spec.ring_for_distance(distance),
            LineRule::InnerRing => line_cutter_ring(spec, distance),
        };

        Ok(band.map_or_else(miss, |band| ShotScore {
            score: band.score,
            ring: band.ring,
            zone_color: spec
                .zone_color(band.ring)
                .unwrap_or(zone_colors::MISS)
                .to_owned(),
        }))
    }

    /// Score every impact, keeping input order
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if any impact has a non-finite coordinate
    pub fn score_arrows(
        &self,
        impacts: &[ArrowImpact],
        spec: &TargetSpec,
    ) -> AppResult<Vec<ScoredArrow>> {
        impacts
            .iter()
            .map(|impact| {
                self.score(impact.position(), spec)
                    .map(|shot| ScoredArrow {
                        impact: impact.clone(),
                        shot,
                    })
                    .map_err(|e| e.with_resource_id(impact.id.to_string()))
            })
            .collect()
    }
}

/// Innermost ring whose closed `[inner, outer]` bracket holds `distance`
fn line_cutter_ring(spec: &TargetSpec, distance: f64) -> Option<&RingBand> {
    spec.rings()
        .iter()
        .find(|band| distance >= band.inner_radius && distance <= band.outer_radius)
}

fn miss() -> ShotScore {
    ShotScore {
        score: 0,
        ring: 0,
        zone_color: zone_colors::MISS.to_owned(),
    }
}
