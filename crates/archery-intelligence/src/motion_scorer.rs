// ABOUTME: Motion scoring: holding-phase aim stability and cross-shot phase consistency
// ABOUTME: Evaluates the ordered motion rule table against the scored phases
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use crate::config::intelligence::MotionConfig;
use crate::config::IntelligenceConfig;
use crate::recommendation_rules::{evaluate_motion_rules, MotionFacts};
use crate::statistical_analysis::StatisticalAnalyzer;
use archery_core::models::{MetricEstimate, PhaseSegment, ShotPhase, TrajectorySample};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Stability, consistency, and advice for one shot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotionScore {
    /// Holding-phase aim steadiness, `[0, 100]`
    pub stability: MetricEstimate,
    /// Repeatability against the compared shots, `[0, 100]`
    pub consistency: MetricEstimate,
    /// Advisory strings in rule-declaration order
    pub recommendations: Vec<String>,
}

/// Scores a segmented shot against its trajectory and sibling shots
#[derive(Debug, Clone)]
pub struct MotionScorer {
    config: MotionConfig,
}

impl Default for MotionScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl MotionScorer {
    /// Create a scorer using the global configuration
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: IntelligenceConfig::global().motion.clone(),
        }
    }

    /// Create a scorer with a custom configuration
    #[must_use]
    pub const fn with_config(config: MotionConfig) -> Self {
        Self { config }
    }

    /// Score one shot
    ///
    /// `peers` are the phase sequences of other shots from the same session.
    /// Without any peer, consistency is reported as not estimated; without a
    /// Holding phase, so is stability.
    #[must_use]
    pub fn score(
        &self,
        phases: &[PhaseSegment],
        trajectory: &[TrajectorySample],
        peers: &[&[PhaseSegment]],
    ) -> MotionScore {
        let stability = self.stability(phases, trajectory);

        let mut shots: Vec<&[PhaseSegment]> = Vec::with_capacity(peers.len() + 1);
        shots.push(phases);
        shots.extend_from_slice(peers);
        let consistency = self.consistency(&shots);

        let phase_scores: Vec<(ShotPhase, f64)> =
            phases.iter().map(|s| (s.phase, s.score)).collect();
        let recommendations = evaluate_motion_rules(
            &self.config.rules,
            &MotionFacts {
                phase_scores: &phase_scores,
                stability: stability.value(),
                consistency: consistency.value(),
            },
        );

        debug!(
            stability = ?stability.value(),
            consistency = ?consistency.value(),
            compared_shots = shots.len(),
            "Scored shot motion"
        );

        MotionScore {
            stability,
            consistency,
            recommendations,
        }
    }

    /// `100 / (1 + var(aiming angle during Holding) / scale)`
    fn stability(&self, phases: &[PhaseSegment], trajectory: &[TrajectorySample]) -> MetricEstimate {
        let Some(holding) = phases.iter().find(|s| s.phase == ShotPhase::Holding) else {
            return MetricEstimate::not_estimated();
        };
        let angles: Vec<f64> = trajectory
            .iter()
            .filter(|sample| (holding.start_frame..=holding.end_frame).contains(&sample.frame))
            .map(|sample| sample.aiming_angle_deg)
            .collect();

        StatisticalAnalyzer::variance(&angles).map_or_else(MetricEstimate::not_estimated, |var| {
            MetricEstimate::estimated(100.0 / (1.0 + var / self.config.stability_variance_scale))
        })
    }

    /// `100 / (1 + mean normalised variance / scale)` over phases every shot reached
    ///
    /// Durations contribute their squared coefficient of variation and scores
    /// the variance of `score / 100`, so both terms are unitless.
    fn consistency(&self, shots: &[&[PhaseSegment]]) -> MetricEstimate {
        if shots.len() < 2 {
            return MetricEstimate::not_estimated();
        }

        let common: Vec<ShotPhase> = ShotPhase::ALL
            .into_iter()
            .filter(|phase| shots.iter().all(|shot| shot.iter().any(|s| s.phase == *phase)))
            .collect();

        let mut terms = Vec::with_capacity(common.len() * 2);
        for phase in common {
            let segments: Vec<&PhaseSegment> = shots
                .iter()
                .filter_map(|shot| shot.iter().find(|s| s.phase == phase))
                .collect();
            let durations: Vec<f64> = segments.iter().map(|s| s.duration).collect();
            let scores: Vec<f64> = segments.iter().map(|s| s.score / 100.0).collect();
            terms.extend(StatisticalAnalyzer::squared_coefficient_of_variation(&durations));
            terms.extend(StatisticalAnalyzer::variance(&scores));
        }

        StatisticalAnalyzer::mean(&terms).map_or_else(MetricEstimate::not_estimated, |mean| {
            MetricEstimate::estimated(100.0 / (1.0 + mean / self.config.consistency_variance_scale))
        })
    }
}
