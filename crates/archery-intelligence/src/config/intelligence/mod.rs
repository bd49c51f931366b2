// ABOUTME: Analysis engine configuration for scoring, grouping, segmentation, and statistics
// ABOUTME: Orchestrates domain-specific configs and provides unified validation and loading
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Intelligence Configuration Module
//!
//! Type-safe configuration for every analysis engine.
//!
//! # Module Structure
//!
//! - `scoring` - Ring boundary handling
//! - `grouping` - Pattern thresholds, reference spreads, wind model, grouping rules
//! - `segmentation` - Tracked joints, transition triggers, phase scoring
//! - `motion` - Stability/consistency normalisation and motion rules
//! - `statistics` - In-target threshold

pub mod error;
pub mod grouping;
pub mod motion;
pub mod scoring;
pub mod segmentation;
pub mod statistics;

pub use error::ConfigError;
pub use grouping::{GroupingConfig, PatternThresholds, ReferenceSpread, WindEffectConfig};
pub use motion::MotionConfig;
pub use scoring::{LineRule, ScoringConfig};
pub use segmentation::{
    AngleDirection, DrawArmConfig, PhaseProfile, PhaseScoringConfig, SegmentationConfig,
    StabilityMeasure, TransitionThresholds,
};
pub use statistics::StatisticsConfig;

use crate::recommendation_rules::{GroupingCondition, MotionCondition};
use archery_core::models::ShotPhase;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::sync::OnceLock;
use tracing::warn;

/// Global configuration singleton
static INTELLIGENCE_CONFIG: OnceLock<IntelligenceConfig> = OnceLock::new();

/// Main analysis configuration container
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntelligenceConfig {
    /// Configuration for arrow scoring
    pub scoring: ScoringConfig,
    /// Configuration for group shape and wind analysis
    pub grouping: GroupingConfig,
    /// Configuration for shot phase segmentation
    pub segmentation: SegmentationConfig,
    /// Configuration for motion stability and consistency scoring
    pub motion: MotionConfig,
    /// Configuration for period statistics
    pub statistics: StatisticsConfig,
}

impl IntelligenceConfig {
    /// Get the global configuration instance
    pub fn global() -> &'static Self {
        INTELLIGENCE_CONFIG.get_or_init(|| {
            Self::load().unwrap_or_else(|e| {
                warn!("Failed to load intelligence config: {}, using defaults", e);
                Self::default()
            })
        })
    }

    /// Load configuration from defaults and `ARCHERY_*` environment overrides
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables contain invalid values or validation fails
    pub fn load() -> Result<Self, ConfigError> {
        let config = Self::default().apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns the first inconsistent threshold, weight, or rule found
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_grouping()?;
        self.validate_segmentation()?;
        self.validate_motion()
    }

    fn validate_grouping(&self) -> Result<(), ConfigError> {
        let thresholds = &self.grouping.thresholds;
        if !(thresholds.tight_spread_ratio > 0.0 && thresholds.tight_spread_ratio < 1.0) {
            return Err(ConfigError::ValueOutOfRange(
                "tight_spread_ratio must be in (0, 1)",
            ));
        }
        if !(thresholds.string_axis_ratio > 1.0 && thresholds.string_axis_ratio.is_finite()) {
            return Err(ConfigError::ValueOutOfRange(
                "string_axis_ratio must be finite and > 1",
            ));
        }
        if !(thresholds.orientation_tolerance_deg > 0.0
            && thresholds.orientation_tolerance_deg < 45.0)
        {
            return Err(ConfigError::ValueOutOfRange(
                "orientation_tolerance_deg must be in (0, 45)",
            ));
        }
        if !(0.0..1.0).contains(&thresholds.centered_tolerance_ratio) {
            return Err(ConfigError::ValueOutOfRange(
                "centered_tolerance_ratio must be in [0, 1)",
            ));
        }
        if thresholds.min_arrows_for_pattern == 0 {
            return Err(ConfigError::ValueOutOfRange(
                "min_arrows_for_pattern must be at least 1",
            ));
        }

        let spreads = &self.grouping.reference_spread;
        if spreads.is_empty() {
            return Err(ConfigError::MissingField("grouping.reference_spread"));
        }
        if spreads.iter().any(|entry| entry.spread_ratio <= 0.0) {
            return Err(ConfigError::ValueOutOfRange(
                "reference spread ratios must be positive",
            ));
        }
        if spreads
            .windows(2)
            .any(|pair| pair[0].distance_m >= pair[1].distance_m)
        {
            return Err(ConfigError::InvalidRange(
                "reference spreads must be strictly ascending by distance",
            ));
        }

        if !(self.grouping.wind.drift_per_ms_per_m >= 0.0
            && self.grouping.wind.drift_per_ms_per_m.is_finite())
        {
            return Err(ConfigError::ValueOutOfRange(
                "drift_per_ms_per_m must be finite and non-negative",
            ));
        }

        for (index, rule) in self.grouping.rules.iter().enumerate() {
            if rule.conditions.is_empty() || rule.message.trim().is_empty() {
                return Err(ConfigError::InvalidRule(format!(
                    "grouping rule {index} needs at least one condition and a message"
                )));
            }
            let ratio_ok = rule.conditions.iter().all(|condition| match condition {
                GroupingCondition::AverageScoreRatioBelow(ratio)
                | GroupingCondition::WindExplainedAbove(ratio) => (0.0..=1.0).contains(ratio),
                GroupingCondition::Pattern(_) | GroupingCondition::Offset(_) => true,
            });
            if !ratio_ok {
                return Err(ConfigError::InvalidRule(format!(
                    "grouping rule {index} has a ratio outside [0, 1]"
                )));
            }
        }
        Ok(())
    }

    fn validate_segmentation(&self) -> Result<(), ConfigError> {
        let seg = &self.segmentation;
        let triggers = &seg.triggers;
        if !(triggers.draw_trigger_angle_deg > 0.0 && triggers.draw_trigger_angle_deg < 180.0) {
            return Err(ConfigError::ValueOutOfRange(
                "draw_trigger_angle_deg must be in (0, 180)",
            ));
        }
        if triggers.draw_debounce_secs < 0.0
            || triggers.holding_dwell_secs < 0.0
            || triggers.angle_noise_tolerance_deg < 0.0
        {
            return Err(ConfigError::ValueOutOfRange(
                "debounce, dwell, and noise tolerance must be non-negative",
            ));
        }
        if triggers.stillness_velocity_deg_s <= 0.0 {
            return Err(ConfigError::ValueOutOfRange(
                "stillness_velocity_deg_s must be positive",
            ));
        }
        if triggers.release_angular_velocity_deg_s <= triggers.stillness_velocity_deg_s {
            return Err(ConfigError::InvalidRange(
                "stillness_velocity_deg_s must be < release_angular_velocity_deg_s",
            ));
        }
        if triggers.release_position_speed <= 0.0 || triggers.max_follow_through_secs <= 0.0 {
            return Err(ConfigError::ValueOutOfRange(
                "release_position_speed and max_follow_through_secs must be positive",
            ));
        }
        if !(0.0..=1.0).contains(&seg.min_keypoint_confidence) {
            return Err(ConfigError::ValueOutOfRange(
                "min_keypoint_confidence must be in [0, 1]",
            ));
        }
        if seg.key_frames_per_phase == 0 {
            return Err(ConfigError::ValueOutOfRange(
                "key_frames_per_phase must be at least 1",
            ));
        }
        if seg.draw_arm.angle_name.is_empty() || seg.aiming_angle_name.is_empty() {
            return Err(ConfigError::MissingField("segmentation angle names"));
        }

        let scoring = &seg.scoring;
        if !(0.0..=1.0).contains(&scoring.stability_weight) {
            return Err(ConfigError::InvalidWeights(
                "stability_weight must be in [0, 1]",
            ));
        }
        if scoring.angle_variance_scale <= 0.0 || scoring.velocity_variance_scale <= 0.0 {
            return Err(ConfigError::ValueOutOfRange(
                "phase variance scales must be positive",
            ));
        }
        for phase in ShotPhase::ALL {
            let Some(profile) = scoring.profile(phase) else {
                return Err(ConfigError::MissingField("segmentation.scoring.profiles"));
            };
            if profile.reference_min_secs < 0.0
                || profile.reference_min_secs > profile.reference_max_secs
            {
                return Err(ConfigError::InvalidRange(
                    "phase reference_min_secs must be >= 0 and <= reference_max_secs",
                ));
            }
        }
        Ok(())
    }

    fn validate_motion(&self) -> Result<(), ConfigError> {
        let motion = &self.motion;
        if motion.stability_variance_scale <= 0.0 || motion.consistency_variance_scale <= 0.0 {
            return Err(ConfigError::ValueOutOfRange(
                "motion variance scales must be positive",
            ));
        }
        for (index, rule) in motion.rules.iter().enumerate() {
            if rule.message.trim().is_empty() {
                return Err(ConfigError::InvalidRule(format!(
                    "motion rule {index} has an empty message"
                )));
            }
            let threshold = match &rule.condition {
                MotionCondition::PhaseScoreBelow { threshold, .. }
                | MotionCondition::StabilityBelow { threshold }
                | MotionCondition::ConsistencyBelow { threshold } => Some(*threshold),
                MotionCondition::PhaseMissing { .. } => None,
            };
            if threshold.is_some_and(|t| !(0.0..=100.0).contains(&t)) {
                return Err(ConfigError::InvalidRule(format!(
                    "motion rule {index} threshold must be in [0, 100]"
                )));
            }
        }
        Ok(())
    }

    /// Helper function to parse and apply an environment variable override
    fn apply_env_var<T: FromStr>(env_var_name: &str, target: &mut T) -> Result<(), ConfigError> {
        if let Ok(val) = env::var(env_var_name) {
            *target = val
                .parse()
                .map_err(|_| ConfigError::Parse(format!("Invalid {env_var_name}")))?;
        }
        Ok(())
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(mut self) -> Result<Self, ConfigError> {
        Self::apply_env_var("ARCHERY_SCORING_LINE_RULE", &mut self.scoring.line_rule)?;

        // Grouping
        let thresholds = &mut self.grouping.thresholds;
        Self::apply_env_var(
            "ARCHERY_GROUPING_TIGHT_SPREAD_RATIO",
            &mut thresholds.tight_spread_ratio,
        )?;
        Self::apply_env_var(
            "ARCHERY_GROUPING_STRING_AXIS_RATIO",
            &mut thresholds.string_axis_ratio,
        )?;
        Self::apply_env_var(
            "ARCHERY_GROUPING_ORIENTATION_TOLERANCE_DEG",
            &mut thresholds.orientation_tolerance_deg,
        )?;
        Self::apply_env_var(
            "ARCHERY_GROUPING_CENTERED_TOLERANCE_RATIO",
            &mut thresholds.centered_tolerance_ratio,
        )?;
        Self::apply_env_var(
            "ARCHERY_GROUPING_MIN_ARROWS",
            &mut thresholds.min_arrows_for_pattern,
        )?;
        Self::apply_env_var(
            "ARCHERY_WIND_DRIFT_PER_MS_PER_M",
            &mut self.grouping.wind.drift_per_ms_per_m,
        )?;

        // Segmentation
        let seg = &mut self.segmentation;
        Self::apply_env_var("ARCHERY_SEGMENT_DRAW_ANGLE", &mut seg.draw_arm.angle_name)?;
        Self::apply_env_var("ARCHERY_SEGMENT_AIMING_ANGLE", &mut seg.aiming_angle_name)?;
        Self::apply_env_var(
            "ARCHERY_SEGMENT_DRAW_TRIGGER_DEG",
            &mut seg.triggers.draw_trigger_angle_deg,
        )?;
        Self::apply_env_var(
            "ARCHERY_SEGMENT_DRAW_DEBOUNCE_SECS",
            &mut seg.triggers.draw_debounce_secs,
        )?;
        Self::apply_env_var(
            "ARCHERY_SEGMENT_STILLNESS_DEG_S",
            &mut seg.triggers.stillness_velocity_deg_s,
        )?;
        Self::apply_env_var(
            "ARCHERY_SEGMENT_HOLDING_DWELL_SECS",
            &mut seg.triggers.holding_dwell_secs,
        )?;
        Self::apply_env_var(
            "ARCHERY_SEGMENT_RELEASE_DEG_S",
            &mut seg.triggers.release_angular_velocity_deg_s,
        )?;
        Self::apply_env_var(
            "ARCHERY_SEGMENT_RELEASE_SPEED",
            &mut seg.triggers.release_position_speed,
        )?;
        Self::apply_env_var(
            "ARCHERY_SEGMENT_MAX_FOLLOW_THROUGH_SECS",
            &mut seg.triggers.max_follow_through_secs,
        )?;
        Self::apply_env_var(
            "ARCHERY_SEGMENT_MIN_CONFIDENCE",
            &mut seg.min_keypoint_confidence,
        )?;
        Self::apply_env_var("ARCHERY_SEGMENT_KEY_FRAMES", &mut seg.key_frames_per_phase)?;

        // Motion
        Self::apply_env_var(
            "ARCHERY_MOTION_STABILITY_SCALE",
            &mut self.motion.stability_variance_scale,
        )?;
        Self::apply_env_var(
            "ARCHERY_MOTION_CONSISTENCY_SCALE",
            &mut self.motion.consistency_variance_scale,
        )?;

        // Statistics
        Self::apply_env_var(
            "ARCHERY_STATS_IN_TARGET_THRESHOLD",
            &mut self.statistics.in_target_score_threshold,
        )?;

        Ok(self)
    }
}
