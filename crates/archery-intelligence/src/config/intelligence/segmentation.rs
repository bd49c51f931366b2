// ABOUTME: Shot phase segmentation configuration for transition triggers and phase scoring
// ABOUTME: Names the tracked joints and holds debounce, dwell, spike, and reference-duration values
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Phase Segmentation Configuration

use crate::archery_constants::{phase_scoring, segmentation};
use archery_core::models::ShotPhase;
use serde::{Deserialize, Serialize};

/// Phase Segmenter Configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentationConfig {
    /// Joint driving the Preparation/Draw/Holding transitions
    pub draw_arm: DrawArmConfig,
    /// Joint angle tracked for aim steadiness
    pub aiming_angle_name: String,
    /// Transition triggers
    pub triggers: TransitionThresholds,
    /// Keypoints below this confidence are ignored
    pub min_keypoint_confidence: f64,
    /// Per-phase quality scoring
    pub scoring: PhaseScoringConfig,
    /// Representative frames per phase
    pub key_frames_per_phase: usize,
}

/// Direction the draw-arm angle moves while drawing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AngleDirection {
    /// The angle closes (elbow folds)
    #[default]
    Decreasing,
    /// The angle opens
    Increasing,
}

impl AngleDirection {
    /// `+1` for increasing, `-1` for decreasing
    #[must_use]
    pub const fn sign(self) -> f64 {
        match self {
            Self::Increasing => 1.0,
            Self::Decreasing => -1.0,
        }
    }
}

/// Draw-arm joint definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrawArmConfig {
    /// Joint angle name looked up on each frame
    pub angle_name: String,
    /// Keypoints the angle is computed from when the frame has no such angle
    pub keypoints: [String; 3],
    /// Keypoint tracked for positional release spikes and the trajectory
    pub hand_keypoint: String,
    /// Direction the angle moves while drawing
    pub draw_direction: AngleDirection,
}

/// Phase transition triggers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionThresholds {
    /// Angle the draw arm must pass to begin the draw
    pub draw_trigger_angle_deg: f64,
    /// Time the draw must be sustained before it is confirmed
    pub draw_debounce_secs: f64,
    /// Per-frame movement against the draw direction still counted as drawing
    pub angle_noise_tolerance_deg: f64,
    /// Angular speed under which the draw arm is still
    pub stillness_velocity_deg_s: f64,
    /// Stillness time that confirms holding
    pub holding_dwell_secs: f64,
    /// Angular speed marking the release
    pub release_angular_velocity_deg_s: f64,
    /// Draw-hand speed marking the release
    pub release_position_speed: f64,
    /// Longest follow-through analysed
    pub max_follow_through_secs: f64,
}

/// Signal the per-phase stability component is measured on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StabilityMeasure {
    /// Variance of the phase's dominant joint angle
    AngleVariance,
    /// Variance of the draw-arm angular velocity (smoothness)
    VelocityVariance,
}

/// Reference profile for one phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseProfile {
    /// Phase described
    pub phase: ShotPhase,
    /// Shortest duration scoring full duration fit
    pub reference_min_secs: f64,
    /// Longest duration scoring full duration fit
    pub reference_max_secs: f64,
    /// Joint angle dominating this phase, draw arm when absent
    pub dominant_angle: Option<String>,
    /// Signal the stability component uses
    pub measure: StabilityMeasure,
}

/// Per-phase quality scoring
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseScoringConfig {
    /// Weight of stability against duration fit, `[0, 1]`
    pub stability_weight: f64,
    /// Angle variance (deg^2) mapping to a stability of 50
    pub angle_variance_scale: f64,
    /// Angular velocity variance mapping to a stability of 50
    pub velocity_variance_scale: f64,
    /// One profile per phase
    pub profiles: Vec<PhaseProfile>,
}

impl PhaseScoringConfig {
    /// Profile for `phase`
    #[must_use]
    pub fn profile(&self, phase: ShotPhase) -> Option<&PhaseProfile> {
        self.profiles.iter().find(|profile| profile.phase == phase)
    }
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            draw_arm: DrawArmConfig::default(),
            aiming_angle_name: segmentation::AIMING_ANGLE.to_owned(),
            triggers: TransitionThresholds::default(),
            min_keypoint_confidence: segmentation::MIN_KEYPOINT_CONFIDENCE,
            scoring: PhaseScoringConfig::default(),
            key_frames_per_phase: segmentation::KEY_FRAMES_PER_PHASE,
        }
    }
}

impl Default for DrawArmConfig {
    fn default() -> Self {
        Self {
            angle_name: segmentation::DRAW_ARM_ANGLE.to_owned(),
            keypoints: segmentation::DRAW_ARM_KEYPOINTS.map(str::to_owned),
            hand_keypoint: segmentation::DRAW_HAND_KEYPOINT.to_owned(),
            draw_direction: AngleDirection::default(),
        }
    }
}

impl Default for TransitionThresholds {
    fn default() -> Self {
        Self {
            draw_trigger_angle_deg: segmentation::DRAW_TRIGGER_ANGLE_DEG,
            draw_debounce_secs: segmentation::DRAW_DEBOUNCE_SECS,
            angle_noise_tolerance_deg: segmentation::ANGLE_NOISE_TOLERANCE_DEG,
            stillness_velocity_deg_s: segmentation::STILLNESS_VELOCITY_DEG_S,
            holding_dwell_secs: segmentation::HOLDING_DWELL_SECS,
            release_angular_velocity_deg_s: segmentation::RELEASE_ANGULAR_VELOCITY_DEG_S,
            release_position_speed: segmentation::RELEASE_POSITION_SPEED,
            max_follow_through_secs: segmentation::MAX_FOLLOW_THROUGH_SECS,
        }
    }
}

impl Default for PhaseScoringConfig {
    fn default() -> Self {
        let profile = |phase, (min, max): (f64, f64), dominant: Option<&str>, measure| {
            PhaseProfile {
                phase,
                reference_min_secs: min,
                reference_max_secs: max,
                dominant_angle: dominant.map(str::to_owned),
                measure,
            }
        };

        Self {
            stability_weight: phase_scoring::STABILITY_WEIGHT,
            angle_variance_scale: phase_scoring::ANGLE_VARIANCE_SCALE,
            velocity_variance_scale: phase_scoring::VELOCITY_VARIANCE_SCALE,
            profiles: vec![
                profile(
                    ShotPhase::Preparation,
                    phase_scoring::PREPARATION_SECS,
                    Some(segmentation::AIMING_ANGLE),
                    StabilityMeasure::AngleVariance,
                ),
                profile(
                    ShotPhase::Draw,
                    phase_scoring::DRAW_SECS,
                    None,
                    StabilityMeasure::VelocityVariance,
                ),
                profile(
                    ShotPhase::Holding,
                    phase_scoring::HOLDING_SECS,
                    Some(segmentation::AIMING_ANGLE),
                    StabilityMeasure::AngleVariance,
                ),
                profile(
                    ShotPhase::Release,
                    phase_scoring::RELEASE_SECS,
                    Some(segmentation::AIMING_ANGLE),
                    StabilityMeasure::AngleVariance,
                ),
                profile(
                    ShotPhase::FollowThrough,
                    phase_scoring::FOLLOW_THROUGH_SECS,
                    Some(segmentation::AIMING_ANGLE),
                    StabilityMeasure::AngleVariance,
                ),
            ],
        }
    }
}
