// ABOUTME: Archery analysis engines: scoring, grouping, phase segmentation, motion, statistics
// ABOUTME: Pure, side-effect-free computations configured through IntelligenceConfig
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

#![deny(unsafe_code)]

//! # Archery Intelligence
//!
//! The analytic core of the archery analysis service. Every engine is a pure
//! function of its inputs and its configuration: no I/O, no shared mutable
//! state, safe to run concurrently and to retry.
//!
//! ## Engines
//!
//! - [`scoring::ArrowScorer`]: coordinate and target face to score, ring, colour
//! - [`grouping_analyzer::GroupingAnalyzer`]: group shape, offset, wind share, advice
//! - [`phase_segmenter::PhaseSegmenter`]: pose stream to five scored shot phases
//! - [`motion_scorer::MotionScorer`]: stability, consistency, technique advice
//! - [`statistics_aggregator::StatisticsAggregator`]: period roll-ups
//!
//! Target faces come from the versioned [`target_catalog::TargetSpecCatalog`].

/// Named default thresholds
pub mod archery_constants;

/// Engine configuration with environment overrides and validation
pub mod config;

/// Group shape, offset, and wind analysis
pub mod grouping_analyzer;

/// Holding stability and cross-shot consistency
pub mod motion_scorer;

/// Five-phase shot segmentation state machine
pub mod phase_segmenter;

/// Ordered recommendation rule tables
pub mod recommendation_rules;

/// Geometric arrow scoring
pub mod scoring;

/// Descriptive statistics and regression
pub mod statistical_analysis;

/// Period statistics roll-up
pub mod statistics_aggregator;

/// Versioned target face reference data
pub mod target_catalog;

pub use config::{ConfigError, IntelligenceConfig};
pub use grouping_analyzer::GroupingAnalyzer;
pub use motion_scorer::{MotionScore, MotionScorer};
pub use phase_segmenter::{PhaseSegmenter, SegmentationOutcome};
pub use scoring::ArrowScorer;
pub use statistical_analysis::{RegressionResult, StatisticalAnalyzer};
pub use statistics_aggregator::{PeriodWindow, StatisticsAggregator};
pub use target_catalog::TargetSpecCatalog;
