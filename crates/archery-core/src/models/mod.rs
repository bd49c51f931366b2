// ABOUTME: Core data models for target scoring, motion analysis, and period statistics
// ABOUTME: Shared between the analysis engines, the orchestrator, and its collaborators
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # Data Models
//!
//! Reference data (`TargetSpec`), raw inputs (`ArrowImpact`, `PoseFrame`),
//! and analytic results (`GroupingResult`, `MotionResult`, `PeriodStatistics`).

use serde::{Deserialize, Serialize};

/// Motion capture inputs and phase segmentation results
pub mod motion;
/// Period statistics and completed target analyses
pub mod statistics;
/// Target faces, arrow impacts, and grouping results
pub mod target;
/// Ambient conditions for a session
pub mod weather;

pub use motion::{
    JointAngle, Keypoint, MotionResult, PhaseSegment, Point3, PoseFrame, ShotPhase,
    TrajectorySample,
};
pub use statistics::{PeriodStatistics, StatisticsPeriod, TargetAnalysis};
pub use target::{
    ArrowImpact, CenterOffset, ColorZone, GroupingResult, OffsetDirection, PatternTag, Point2,
    RingBand, ScoredArrow, ShotScore, TargetFaceType, TargetSpec, TargetSpecData, TargetSpecKey,
};
pub use weather::WeatherConditions;

/// A metric that may not be computable from the available data
///
/// `estimated = false` means "not enough data"; `value` is then zero and
/// must not be shown as a real measurement.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MetricEstimate {
    /// Whether the value was actually computed
    pub estimated: bool,
    /// Computed value, zero when not estimated
    pub value: f64,
}

impl MetricEstimate {
    /// A computed value
    #[must_use]
    pub const fn estimated(value: f64) -> Self {
        Self {
            estimated: true,
            value,
        }
    }

    /// Marker for "insufficient data"
    #[must_use]
    pub const fn not_estimated() -> Self {
        Self {
            estimated: false,
            value: 0.0,
        }
    }

    /// The value when estimated
    #[must_use]
    pub const fn value(self) -> Option<f64> {
        if self.estimated {
            Some(self.value)
        } else {
            None
        }
    }
}
