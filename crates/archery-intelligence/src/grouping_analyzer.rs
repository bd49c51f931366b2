// ABOUTME: Arrow group analysis: centroid offset, spread, covariance shape, wind share, advice
// ABOUTME: Classifies the group into a pattern tag against configured shape thresholds
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Grouping analysis
//!
//! The covariance ellipse of the impacts gives the group's shape: its
//! semi-axes are the square roots of the covariance eigenvalues and its
//! orientation is the major eigenvector's angle from +x, folded into
//! `[0, 180)`. Shape tags are decided in this order:
//!
//! 1. fewer than `min_arrows_for_pattern` arrows: `insufficient-data`
//! 2. `spread / outer_radius <= tight_spread_ratio`: `tight`
//! 3. `major / minor >= string_axis_ratio`: vertical, horizontal, or diagonal
//!    string by orientation
//! 4. otherwise `scattered`

use crate::config::intelligence::GroupingConfig;
use crate::config::IntelligenceConfig;
use crate::recommendation_rules::{evaluate_grouping_rules, GroupingFacts};
use archery_core::errors::{AppError, AppResult};
use archery_core::models::{
    CenterOffset, GroupingResult, MetricEstimate, OffsetDirection, PatternTag, Point2,
    ScoredArrow, TargetSpec, WeatherConditions,
};
use tracing::debug;

/// Compass buckets counter-clockwise from +x, 45 degrees each
const COMPASS: [OffsetDirection; 8] = [
    OffsetDirection::Right,
    OffsetDirection::UpRight,
    OffsetDirection::Up,
    OffsetDirection::UpLeft,
    OffsetDirection::Left,
    OffsetDirection::DownLeft,
    OffsetDirection::Down,
    OffsetDirection::DownRight,
];

/// Covariance ellipse of a point set
#[derive(Debug, Clone, Copy, PartialEq)]
struct Ellipse {
    major: f64,
    minor: f64,
    orientation_deg: f64,
}

/// Analyzes the spatial pattern of one session's arrows
#[derive(Debug, Clone)]
pub struct GroupingAnalyzer {
    config: GroupingConfig,
}

impl Default for GroupingAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl GroupingAnalyzer {
    /// Create an analyzer using the global configuration
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: IntelligenceConfig::global().grouping.clone(),
        }
    }

    /// Create an analyzer with a custom configuration
    #[must_use]
    pub const fn with_config(config: GroupingConfig) -> Self {
        Self { config }
    }

    /// Analyze a scored arrow group on `spec`
    ///
    /// Zero arrows yield the `insufficient-data` result with zeroed metrics.
    /// Without weather the wind share is reported as not estimated.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for non-finite coordinates or wind values, or a
    /// negative wind speed
    pub fn analyze(
        &self,
        arrows: &[ScoredArrow],
        spec: &TargetSpec,
        weather: Option<&WeatherConditions>,
    ) -> AppResult<GroupingResult> {
        if let Some(arrow) = arrows.iter().find(|a| !a.impact.position().is_finite()) {
            return Err(AppError::invalid_input("Arrow coordinate is not finite")
                .with_resource_id(arrow.impact.id.to_string()));
        }
        if let Some(conditions) = weather {
            validate_weather(conditions)?;
        }
        if arrows.is_empty() {
            return Ok(empty_result());
        }

        let points: Vec<Point2> = arrows.iter().map(|a| a.impact.position()).collect();
        let n = points.len() as f64;

        let centroid = Point2::new(
            points.iter().map(|p| p.x).sum::<f64>() / n,
            points.iter().map(|p| p.y).sum::<f64>() / n,
        );
        let spread = points.iter().map(|p| p.distance_to(centroid)).sum::<f64>() / n;
        let diameter = max_pairwise_distance(&points);
        let ellipse = covariance_ellipse(&points, centroid);
        let outer_radius = spec.outer_radius();
        let center_offset = self.center_offset(centroid, outer_radius);
        let pattern = self.classify(points.len(), spread, outer_radius, ellipse);

        let total_score: u32 = arrows.iter().map(|a| a.shot.score).sum();
        let average_score = f64::from(total_score) / n;

        let reference = outer_radius * self.config.reference_spread_ratio(spec.distance_m());
        let consistency_score = if reference > 0.0 {
            (1.0 - spread / reference).clamp(0.0, 1.0)
        } else {
            0.0
        };

        let wind_effect = weather.map_or_else(MetricEstimate::not_estimated, |conditions| {
            self.wind_effect(conditions, &center_offset, spec.distance_m())
        });

        let max_score = spec.max_score();
        let facts = GroupingFacts {
            pattern,
            direction: center_offset.direction,
            average_score_ratio: if max_score == 0 {
                0.0
            } else {
                average_score / f64::from(max_score)
            },
            wind_explained: wind_effect.value(),
        };
        let recommendations = evaluate_grouping_rules(&self.config.rules, &facts);

        debug!(
            arrows = points.len(),
            pattern = %pattern,
            spread,
            offset = center_offset.magnitude,
            "Analyzed arrow group"
        );

        Ok(GroupingResult {
            arrow_count: points.len(),
            total_score,
            average_score,
            centroid,
            center_offset,
            spread,
            diameter,
            major_axis: ellipse.major,
            minor_axis: ellipse.minor,
            orientation_deg: ellipse.orientation_deg,
            pattern,
            wind_effect,
            consistency_score,
            recommendations,
        })
    }

    fn center_offset(&self, centroid: Point2, outer_radius: f64) -> CenterOffset {
        let magnitude = centroid.magnitude();
        let angle_deg = fold_degrees(centroid.y.atan2(centroid.x).to_degrees(), 360.0);
        let direction =
            if magnitude <= self.config.thresholds.centered_tolerance_ratio * outer_radius {
                OffsetDirection::Center
            } else {
                compass_bucket(angle_deg)
            };
        CenterOffset {
            dx: centroid.x,
            dy: centroid.y,
            magnitude,
            angle_deg,
            direction,
        }
    }

    fn classify(&self, count: usize, spread: f64, outer_radius: f64, ellipse: Ellipse) -> PatternTag {
        let thresholds = &self.config.thresholds;
        if count < thresholds.min_arrows_for_pattern {
            return PatternTag::InsufficientData;
        }
        if outer_radius > 0.0 && spread / outer_radius <= thresholds.tight_spread_ratio {
            return PatternTag::Tight;
        }

        let axis_ratio = if ellipse.minor <= f64::EPSILON {
            f64::INFINITY
        } else {
            ellipse.major / ellipse.minor
        };
        if axis_ratio < thresholds.string_axis_ratio {
            return PatternTag::Scattered;
        }

        let tolerance = thresholds.orientation_tolerance_deg;
        let theta = ellipse.orientation_deg;
        if (theta - 90.0).abs() <= tolerance {
            PatternTag::VerticalString
        } else if theta <= tolerance || theta >= 180.0 - tolerance {
            PatternTag::HorizontalString
        } else {
            PatternTag::DiagonalString
        }
    }

    /// Share of the centre offset the wind drift accounts for
    fn wind_effect(
        &self,
        conditions: &WeatherConditions,
        offset: &CenterOffset,
        distance_m: u32,
    ) -> MetricEstimate {
        if offset.magnitude <= f64::EPSILON {
            return MetricEstimate::estimated(0.0);
        }
        let drift =
            conditions.wind_speed_ms * self.config.wind.drift_per_ms_per_m * f64::from(distance_m);
        let (wx, wy) = conditions.wind_unit_vector();
        let cos_between = wx.mul_add(offset.dx, wy * offset.dy) / offset.magnitude;
        MetricEstimate::estimated((drift * cos_between / offset.magnitude).clamp(0.0, 1.0))
    }
}

fn validate_weather(conditions: &WeatherConditions) -> AppResult<()> {
    if !conditions.wind_speed_ms.is_finite() || !conditions.wind_direction_deg.is_finite() {
        return Err(AppError::invalid_input("Wind speed and direction must be finite"));
    }
    if conditions.wind_speed_ms < 0.0 {
        return Err(AppError::invalid_input("Wind speed cannot be negative"));
    }
    Ok(())
}

fn compass_bucket(angle_deg: f64) -> OffsetDirection {
    // angle_deg is in [0, 360), so the bucket index is in [0, 8]
    let index = ((angle_deg + 22.5) / 45.0).floor() as usize % COMPASS.len();
    COMPASS[index]
}

/// Fold an angle into `[0, period)`
fn fold_degrees(angle: f64, period: f64) -> f64 {
    let folded = angle.rem_euclid(period);
    if folded >= period {
        0.0
    } else {
        folded
    }
}

fn max_pairwise_distance(points: &[Point2]) -> f64 {
    points
        .iter()
        .enumerate()
        .flat_map(|(i, a)| points[i + 1..].iter().map(move |b| a.distance_to(*b)))
        .fold(0.0, f64::max)
}

fn covariance_ellipse(points: &[Point2], centroid: Point2) -> Ellipse {
    let n = points.len() as f64;
    let (sxx, syy, sxy) = points.iter().fold((0.0, 0.0, 0.0), |(sxx, syy, sxy), p| {
        let dx = p.x - centroid.x;
        let dy = p.y - centroid.y;
        (dx.mul_add(dx, sxx), dy.mul_add(dy, syy), dx.mul_add(dy, sxy))
    });
    let (sxx, syy, sxy) = (sxx / n, syy / n, sxy / n);

    let half_trace = (sxx + syy) / 2.0;
    let half_diff = (sxx - syy) / 2.0;
    let disc = half_diff.hypot(sxy);
    let major = (half_trace + disc).max(0.0).sqrt();
    let minor = (half_trace - disc).max(0.0).sqrt();
    let orientation_deg = fold_degrees((0.5 * (2.0 * sxy).atan2(sxx - syy)).to_degrees(), 180.0);

    Ellipse {
        major,
        minor,
        orientation_deg,
    }
}

fn empty_result() -> GroupingResult {
    GroupingResult {
        arrow_count: 0,
        total_score: 0,
        average_score: 0.0,
        centroid: Point2::ORIGIN,
        center_offset: CenterOffset::centered(),
        spread: 0.0,
        diameter: 0.0,
        major_axis: 0.0,
        minor_axis: 0.0,
        orientation_deg: 0.0,
        pattern: PatternTag::InsufficientData,
        wind_effect: MetricEstimate::not_estimated(),
        consistency_score: 0.0,
        recommendations: Vec::new(),
    }
}
