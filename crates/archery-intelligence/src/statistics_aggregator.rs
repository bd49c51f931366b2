// ABOUTME: Period statistics aggregation over a subject's completed target analyses
// ABOUTME: Always a full recomputation: parallel per-session summaries reduced in a fixed order
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Statistics aggregation
//!
//! Sessions are filtered to the subject and the inclusive period, ordered by
//! `(recorded_at, session_id)`, summarised in parallel, and reduced
//! sequentially in that order, so the result never depends on input order.
//!
//! - accuracy: arrows scoring above the in-target threshold / all arrows
//! - consistency: `1 - var(session averages) / (max_arrow_score^2 / 4)`,
//!   clamped to `[0, 1]`; `max^2 / 4` is the largest variance scores bounded
//!   by `[0, max]` can have
//! - improvement: least-squares slope of session average per day, divided by
//!   the spread between the best and worst session averages

use crate::archery_constants::statistics::SECONDS_PER_DAY;
use crate::config::intelligence::StatisticsConfig;
use crate::config::IntelligenceConfig;
use crate::statistical_analysis::StatisticalAnalyzer;
use archery_core::constants::cancellation::SESSION_CHECK_INTERVAL;
use archery_core::errors::{AppError, AppResult};
use archery_core::models::{PeriodStatistics, StatisticsPeriod, TargetAnalysis};
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use std::collections::BTreeMap;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;

/// Inclusive time window statistics are computed over
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodWindow {
    /// Window label
    pub period: StatisticsPeriod,
    /// Inclusive start
    pub start: DateTime<Utc>,
    /// Inclusive end
    pub end: DateTime<Utc>,
}

impl PeriodWindow {
    /// Window for a preset period ending at `end`
    #[must_use]
    pub fn ending(period: StatisticsPeriod, end: DateTime<Utc>) -> Self {
        let (start, end) = period.bounds_ending(end);
        Self { period, start, end }
    }

    /// Caller-supplied bounds
    #[must_use]
    pub const fn custom(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            period: StatisticsPeriod::Custom,
            start,
            end,
        }
    }

    /// Whether `at` lies inside the window
    #[must_use]
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.end
    }
}

/// Counters for one session
#[derive(Debug, Clone)]
struct SessionSummary {
    recorded_at: DateTime<Utc>,
    shots: u64,
    total: u64,
    best_arrow: u32,
    in_target: u64,
    max_arrow_score: u32,
    distribution: BTreeMap<u32, u64>,
}

impl SessionSummary {
    fn of(session: &TargetAnalysis, in_target_threshold: u32) -> Self {
        let mut distribution = BTreeMap::new();
        let mut total = 0_u64;
        let mut best_arrow = 0_u32;
        let mut in_target = 0_u64;
        for arrow in &session.arrows {
            let score = arrow.shot.score;
            *distribution.entry(score).or_insert(0) += 1;
            total += u64::from(score);
            best_arrow = best_arrow.max(score);
            if score > in_target_threshold {
                in_target += 1;
            }
        }
        Self {
            recorded_at: session.recorded_at,
            shots: session.arrows.len() as u64,
            total,
            best_arrow,
            in_target,
            max_arrow_score: session.max_arrow_score,
            distribution,
        }
    }

    fn average(&self) -> Option<f64> {
        (self.shots > 0).then(|| self.total as f64 / self.shots as f64)
    }
}

/// Rolls completed target analyses up into period statistics
#[derive(Debug, Clone)]
pub struct StatisticsAggregator {
    config: StatisticsConfig,
}

impl Default for StatisticsAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl StatisticsAggregator {
    /// Create an aggregator using the global configuration
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: IntelligenceConfig::global().statistics.clone(),
        }
    }

    /// Create an aggregator with a custom configuration
    #[must_use]
    pub const fn with_config(config: StatisticsConfig) -> Self {
        Self { config }
    }

    /// Recompute statistics for `subject_id` over `window`
    ///
    /// Sessions for other subjects or outside the window are ignored.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` when the window starts after it ends and
    /// `Cancelled` when `cancel` fires
    pub fn aggregate(
        &self,
        subject_id: Uuid,
        window: PeriodWindow,
        sessions: &[TargetAnalysis],
        cancel: &CancellationToken,
    ) -> AppResult<PeriodStatistics> {
        if window.start > window.end {
            return Err(AppError::invalid_input(format!(
                "Period start {} is after period end {}",
                window.start, window.end
            ))
            .with_subject_id(subject_id));
        }

        let mut in_range: Vec<&TargetAnalysis> = sessions
            .iter()
            .filter(|s| s.subject_id == subject_id && window.contains(s.recorded_at))
            .collect();
        in_range.sort_by_key(|s| (s.recorded_at, s.session_id));

        let threshold = self.config.in_target_score_threshold;
        let summaries = in_range
            .par_iter()
            .enumerate()
            .map(|(index, session)| {
                if index % SESSION_CHECK_INTERVAL == 0 && cancel.is_cancelled() {
                    return Err(AppError::cancelled("Statistics aggregation"));
                }
                Ok(SessionSummary::of(session, threshold))
            })
            .collect::<AppResult<Vec<_>>>()?;

        let stats = Self::reduce(subject_id, window, &summaries, cancel)?;
        debug!(
            subject_id = %subject_id,
            period = %window.period,
            sessions = stats.session_count,
            shots = stats.total_shots,
            "Aggregated period statistics"
        );
        Ok(stats)
    }

    fn reduce(
        subject_id: Uuid,
        window: PeriodWindow,
        summaries: &[SessionSummary],
        cancel: &CancellationToken,
    ) -> AppResult<PeriodStatistics> {
        let mut total_shots = 0_u64;
        let mut total_score = 0_u64;
        let mut best_score = 0_u32;
        let mut best_session_score = 0_u64;
        let mut in_target = 0_u64;
        let mut max_arrow_score = 0_u32;
        let mut score_distribution = BTreeMap::new();

        for (index, summary) in summaries.iter().enumerate() {
            if index % SESSION_CHECK_INTERVAL == 0 && cancel.is_cancelled() {
                return Err(AppError::cancelled("Statistics aggregation"));
            }
            total_shots += summary.shots;
            total_score += summary.total;
            best_score = best_score.max(summary.best_arrow);
            best_session_score = best_session_score.max(summary.total);
            in_target += summary.in_target;
            max_arrow_score = max_arrow_score.max(summary.max_arrow_score);
            for (score, count) in &summary.distribution {
                *score_distribution.entry(*score).or_insert(0) += count;
            }
        }

        let ratio = |part: u64| {
            if total_shots == 0 {
                0.0
            } else {
                part as f64 / total_shots as f64
            }
        };

        let dated_averages: Vec<(DateTime<Utc>, f64)> = summaries
            .iter()
            .filter_map(|s| s.average().map(|avg| (s.recorded_at, avg)))
            .collect();
        let consistency = consistency_rate(&dated_averages, max_arrow_score);
        let improvement = improvement_rate(&dated_averages);

        Ok(PeriodStatistics {
            subject_id,
            period: window.period,
            period_start: window.start,
            period_end: window.end,
            session_count: summaries.len(),
            total_shots,
            total_score,
            average_score: ratio(total_score),
            best_score,
            best_session_score,
            accuracy_rate: ratio(in_target),
            consistency_rate: consistency.unwrap_or(0.0),
            consistency_estimated: consistency.is_some(),
            improvement_rate: improvement.unwrap_or(0.0),
            improvement_estimated: improvement.is_some(),
            score_distribution,
        })
    }
}

/// `None` with fewer than two scored sessions or a zero-point face
fn consistency_rate(dated_averages: &[(DateTime<Utc>, f64)], max_arrow_score: u32) -> Option<f64> {
    if dated_averages.len() < 2 || max_arrow_score == 0 {
        return None;
    }
    let averages: Vec<f64> = dated_averages.iter().map(|(_, avg)| *avg).collect();
    let max = f64::from(max_arrow_score);
    let variance = StatisticalAnalyzer::variance(&averages)?;
    Some((1.0 - variance / (max * max / 4.0)).clamp(0.0, 1.0))
}

/// `None` unless the scored sessions span at least two distinct instants
fn improvement_rate(dated_averages: &[(DateTime<Utc>, f64)]) -> Option<f64> {
    let (first, _) = dated_averages.first()?;
    let points: Vec<(f64, f64)> = dated_averages
        .iter()
        .map(|(at, avg)| {
            let seconds = (*at - *first).num_milliseconds() as f64 / 1000.0;
            (seconds / SECONDS_PER_DAY, *avg)
        })
        .collect();
    let fit = StatisticalAnalyzer::linear_regression(&points).ok()?;

    let (low, high) = points
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(low, high), (_, avg)| {
            (low.min(*avg), high.max(*avg))
        });
    let range = high - low;
    if range <= f64::EPSILON {
        return Some(0.0);
    }
    Some(fit.slope / range)
}
