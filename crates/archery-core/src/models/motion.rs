// ABOUTME: Pose keypoint inputs, shot phase segments, and per-video motion results
// ABOUTME: Frames are produced externally; segments and results are immutable once built
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use super::MetricEstimate;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// 3-D position in the pose estimator's coordinate space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point3 {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
    /// Z coordinate
    pub z: f64,
}

impl Point3 {
    /// Create a point
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance to `other`
    #[must_use]
    pub fn distance_to(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dz.mul_add(dz, dx.mul_add(dx, dy * dy)).sqrt()
    }

    /// Whether all components are finite
    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// Named anatomical point detected in one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    /// Landmark name, e.g. `right_wrist`
    pub name: String,
    /// Detected position
    pub position: Point3,
    /// Detector confidence in `[0, 1]`
    pub confidence: f64,
}

/// Named joint angle computed by the pose source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JointAngle {
    /// Angle name, e.g. `right_elbow`
    pub name: String,
    /// Angle in degrees
    pub degrees: f64,
    /// The three keypoints defining the angle, vertex in the middle
    pub points: [String; 3],
}

/// One timestamped set of keypoints and angles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseFrame {
    /// Index of the frame in the source video
    pub frame_index: usize,
    /// Seconds since the start of the video
    pub timestamp_secs: f64,
    /// Detected keypoints
    #[serde(default)]
    pub keypoints: Vec<Keypoint>,
    /// Computed joint angles
    #[serde(default)]
    pub angles: Vec<JointAngle>,
}

impl PoseFrame {
    /// Keypoint by name
    #[must_use]
    pub fn keypoint(&self, name: &str) -> Option<&Keypoint> {
        self.keypoints.iter().find(|keypoint| keypoint.name == name)
    }

    /// Joint angle by name
    #[must_use]
    pub fn angle(&self, name: &str) -> Option<&JointAngle> {
        self.angles.iter().find(|angle| angle.name == name)
    }
}

/// One of the five ordered stages of a shot cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShotPhase {
    /// Stance and set-up before the draw
    Preparation,
    /// Drawing the string back
    Draw,
    /// Anchor and aim
    Holding,
    /// The release event
    Release,
    /// Follow-through after release
    FollowThrough,
}

impl ShotPhase {
    /// All phases in shot order
    pub const ALL: [Self; 5] = [
        Self::Preparation,
        Self::Draw,
        Self::Holding,
        Self::Release,
        Self::FollowThrough,
    ];

    /// Following phase, `None` after follow-through
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Preparation => Some(Self::Draw),
            Self::Draw => Some(Self::Holding),
            Self::Holding => Some(Self::Release),
            Self::Release => Some(Self::FollowThrough),
            Self::FollowThrough => None,
        }
    }

    /// Wire name of the phase
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Preparation => "preparation",
            Self::Draw => "draw",
            Self::Holding => "holding",
            Self::Release => "release",
            Self::FollowThrough => "follow_through",
        }
    }
}

impl fmt::Display for ShotPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Contiguous time slice of the analysed interval assigned to one phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseSegment {
    /// Phase tag
    pub phase: ShotPhase,
    /// First frame (position in the analysed stream) belonging to the phase
    pub start_frame: usize,
    /// Last frame belonging to the phase, inclusive
    pub end_frame: usize,
    /// Segment start, seconds
    pub start_time: f64,
    /// Segment end, seconds; equals the next segment's start
    pub end_time: f64,
    /// `end_time - start_time`
    pub duration: f64,
    /// Phase quality score in `[0, 100]`
    pub score: f64,
    /// Representative frame positions for display
    pub key_frames: Vec<usize>,
}

impl PhaseSegment {
    /// Number of frames in the segment
    #[must_use]
    pub const fn frame_count(&self) -> usize {
        self.end_frame - self.start_frame + 1
    }
}

/// Draw-hand position and aiming angle at one analysed frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectorySample {
    /// Position in the analysed stream
    pub frame: usize,
    /// Seconds since the start of the video
    pub timestamp_secs: f64,
    /// Draw-hand position, absent when the keypoint was not confidently detected
    pub position: Option<Point3>,
    /// Aiming-relevant joint angle in degrees
    pub aiming_angle_deg: f64,
}

/// Complete motion analysis of one video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotionResult {
    /// Analysed video
    pub video_id: Uuid,
    /// Session the video belongs to
    pub session_id: Uuid,
    /// Ordered, contiguous phase segments
    pub phases: Vec<PhaseSegment>,
    /// Per-frame trajectory samples
    pub trajectory: Vec<TrajectorySample>,
    /// Start of the analysed interval, seconds
    pub interval_start: f64,
    /// End of the analysed interval, seconds
    pub interval_end: f64,
    /// Frames after the follow-through limit that were not analysed
    pub frames_trimmed: usize,
    /// Holding-phase aim steadiness, `[0, 100]`
    pub stability: MetricEstimate,
    /// Repeatability against other shots of the session, `[0, 100]`
    pub consistency: MetricEstimate,
    /// Advisory strings in rule-declaration order
    pub recommendations: Vec<String>,
    /// Content key of the inputs this result was computed from
    pub content_key: String,
}

impl MotionResult {
    /// Segment for `phase`, if the shot reached it
    #[must_use]
    pub fn segment(&self, phase: ShotPhase) -> Option<&PhaseSegment> {
        self.phases.iter().find(|segment| segment.phase == phase)
    }
}
