// ABOUTME: Named default thresholds for grouping, segmentation, motion, and statistics analysis
// ABOUTME: Every tunable boundary used by the engines starts from one of these constants
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Archery analysis constants
//!
//! Default values for every threshold the engines compare against. The
//! engines never read these directly: they flow through
//! [`crate::config::IntelligenceConfig`] so deployments can tune them.
//!
//! Target-face distances are in the same unit as the ring radii (centimetres
//! on the standard faces); angles are in degrees; times in seconds.

/// Group shape classification boundaries
pub mod grouping {
    /// A group whose mean spread is at most this fraction of the face's
    /// outer radius is tagged `tight`
    pub const TIGHT_SPREAD_RATIO: f64 = 0.1;

    /// Major/minor covariance axis ratio at or above which a group is a string
    pub const STRING_AXIS_RATIO: f64 = 2.0;

    /// Maximum deviation of the major axis from vertical/horizontal, in
    /// degrees, for a vertical/horizontal string; anything else is diagonal
    pub const ORIENTATION_TOLERANCE_DEG: f64 = 22.5;

    /// Centre offsets within this fraction of the outer radius count as centred
    pub const CENTERED_TOLERANCE_RATIO: f64 = 0.1;

    /// Fewer arrows than this cannot be classified into a shape
    pub const MIN_ARROWS_FOR_PATTERN: usize = 2;

    /// Reference maximum spread as a fraction of outer radius, by distance (m)
    pub const REFERENCE_SPREAD_BY_DISTANCE: [(u32, f64); 5] =
        [(18, 0.35), (30, 0.4), (50, 0.45), (70, 0.5), (90, 0.55)];

    /// Average score below this fraction of the face maximum triggers basic-form advice
    pub const LOW_AVERAGE_SCORE_RATIO: f64 = 0.7;

    /// Wind-explained share above which aiming-off advice is given
    pub const WIND_DOMINANT_SHARE: f64 = 0.5;
}

/// Wind drift model
pub mod wind {
    /// Expected lateral drift on the face per m/s of wind per metre of distance
    pub const DRIFT_PER_MS_PER_M: f64 = 0.07;
}

/// Shot phase transition triggers
pub mod segmentation {
    /// Default draw-arm joint angle name
    pub const DRAW_ARM_ANGLE: &str = "right_elbow";
    /// Keypoints defining the draw-arm angle, vertex in the middle
    pub const DRAW_ARM_KEYPOINTS: [&str; 3] = ["right_shoulder", "right_elbow", "right_wrist"];
    /// Keypoint tracked for positional release spikes and the trajectory
    pub const DRAW_HAND_KEYPOINT: &str = "right_wrist";
    /// Default aiming-relevant joint angle (bow-arm shoulder)
    pub const AIMING_ANGLE: &str = "left_shoulder";

    /// Draw-arm angle the elbow must close past to start the draw
    pub const DRAW_TRIGGER_ANGLE_DEG: f64 = 150.0;
    /// Debounce window the draw must be sustained for
    pub const DRAW_DEBOUNCE_SECS: f64 = 0.1;
    /// Per-frame angle change against the draw direction still tolerated
    pub const ANGLE_NOISE_TOLERANCE_DEG: f64 = 0.5;

    /// Angular speed below which the draw arm is considered still
    pub const STILLNESS_VELOCITY_DEG_S: f64 = 15.0;
    /// Dwell time of stillness that confirms holding
    pub const HOLDING_DWELL_SECS: f64 = 0.2;

    /// Angular speed spike marking the release
    pub const RELEASE_ANGULAR_VELOCITY_DEG_S: f64 = 200.0;
    /// Draw-hand speed spike marking the release (pose units per second)
    pub const RELEASE_POSITION_SPEED: f64 = 1.5;

    /// Longest follow-through analysed after the release
    pub const MAX_FOLLOW_THROUGH_SECS: f64 = 2.0;

    /// Keypoints below this confidence are ignored
    pub const MIN_KEYPOINT_CONFIDENCE: f64 = 0.5;

    /// Representative frames selected per phase
    pub const KEY_FRAMES_PER_PHASE: usize = 3;

    /// Fewest frames a stream must contain to be segmented
    pub const MIN_FRAMES: usize = 2;
}

/// Per-phase quality scoring
pub mod phase_scoring {
    /// Weight of angle stability against duration fit
    pub const STABILITY_WEIGHT: f64 = 0.6;
    /// Angle variance (deg^2) at which stability scores 50
    pub const ANGLE_VARIANCE_SCALE: f64 = 25.0;
    /// Angular velocity variance ((deg/s)^2) at which smoothness scores 50
    pub const VELOCITY_VARIANCE_SCALE: f64 = 400.0;

    /// Reference duration ranges in seconds: (min, max)
    pub const PREPARATION_SECS: (f64, f64) = (1.0, 3.0);
    /// Draw reference duration
    pub const DRAW_SECS: (f64, f64) = (1.0, 2.5);
    /// Holding reference duration
    pub const HOLDING_SECS: (f64, f64) = (1.5, 4.0);
    /// Release reference duration
    pub const RELEASE_SECS: (f64, f64) = (0.0, 0.2);
    /// Follow-through reference duration
    pub const FOLLOW_THROUGH_SECS: (f64, f64) = (1.0, 2.0);
}

/// Motion scoring
pub mod motion {
    /// Holding-phase aiming angle variance (deg^2) at which stability scores 50
    pub const STABILITY_VARIANCE_SCALE: f64 = 4.0;
    /// Mean normalised variance across shots at which consistency scores 50
    pub const CONSISTENCY_VARIANCE_SCALE: f64 = 0.05;
    /// Phase score below which phase advice fires
    pub const PHASE_SCORE_THRESHOLD: f64 = 70.0;
    /// Stability below which steadiness advice fires
    pub const STABILITY_THRESHOLD: f64 = 85.0;
    /// Consistency below which repeatability advice fires
    pub const CONSISTENCY_THRESHOLD: f64 = 80.0;
}

/// Period statistics
pub mod statistics {
    /// Arrows scoring above this value count as in-target
    pub const IN_TARGET_SCORE_THRESHOLD: u32 = 0;
    /// Seconds per day, for the improvement trend's x axis
    pub const SECONDS_PER_DAY: f64 = 86_400.0;
}
