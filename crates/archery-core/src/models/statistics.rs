// ABOUTME: Completed target analyses and longitudinal period statistics models
// ABOUTME: Period statistics are always a full recomputation over the sessions in range
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use super::{GroupingResult, ScoredArrow, TargetSpecKey};
use crate::errors::{AppError, AppResult};
use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Result of analysing one closed target session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetAnalysis {
    /// Analysed session
    pub session_id: Uuid,
    /// Archer who shot the session
    pub subject_id: Uuid,
    /// When the session was shot
    pub recorded_at: DateTime<Utc>,
    /// Target face used
    pub target: TargetSpecKey,
    /// Reference data version the arrows were scored against
    pub spec_version: u32,
    /// Maximum single-arrow score on the face
    pub max_arrow_score: u32,
    /// Arrows with their derived scores
    pub arrows: Vec<ScoredArrow>,
    /// Group analysis
    pub grouping: GroupingResult,
    /// Content key of the inputs this result was computed from
    pub content_key: String,
}

/// Named statistics window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatisticsPeriod {
    /// Trailing seven days
    Week,
    /// Trailing calendar month
    Month,
    /// Trailing calendar year
    Year,
    /// Caller-supplied bounds
    Custom,
}

impl StatisticsPeriod {
    /// Inclusive `(start, end)` bounds of the window ending at `end`
    ///
    /// `Custom` has no intrinsic length and yields `(end, end)`; callers
    /// supply their own bounds for it.
    #[must_use]
    pub fn bounds_ending(self, end: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        let start = match self {
            Self::Week => end - Duration::days(7),
            Self::Month => end.checked_sub_months(Months::new(1)).unwrap_or(end),
            Self::Year => end.checked_sub_months(Months::new(12)).unwrap_or(end),
            Self::Custom => end,
        };
        (start, end)
    }

    /// Wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
            Self::Custom => "custom",
        }
    }
}

impl fmt::Display for StatisticsPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatisticsPeriod {
    type Err = AppError;

    fn from_str(value: &str) -> AppResult<Self> {
        match value.to_ascii_lowercase().as_str() {
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "year" => Ok(Self::Year),
            "custom" => Ok(Self::Custom),
            other => Err(AppError::invalid_input(format!(
                "Unknown statistics period '{other}'"
            ))),
        }
    }
}

/// Aggregate training statistics for one subject over one period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodStatistics {
    /// Archer
    pub subject_id: Uuid,
    /// Window label
    pub period: StatisticsPeriod,
    /// Inclusive window start
    pub period_start: DateTime<Utc>,
    /// Inclusive window end
    pub period_end: DateTime<Utc>,
    /// Sessions in range
    pub session_count: usize,
    /// Arrows in range
    pub total_shots: u64,
    /// Sum of arrow scores
    pub total_score: u64,
    /// `total_score / total_shots`, 0 when there are no shots
    pub average_score: f64,
    /// Best single arrow
    pub best_score: u32,
    /// Best session total
    pub best_session_score: u64,
    /// Fraction of arrows scoring above the in-target threshold
    pub accuracy_rate: f64,
    /// `1 - normalised variance` of per-session averages
    pub consistency_rate: f64,
    /// Whether enough sessions existed to compute consistency
    pub consistency_estimated: bool,
    /// Normalised trend slope of per-session averages, may be negative
    pub improvement_rate: f64,
    /// Whether enough distinct session dates existed to fit a trend
    pub improvement_estimated: bool,
    /// Score value to number of arrows with that score
    pub score_distribution: BTreeMap<u32, u64>,
}
