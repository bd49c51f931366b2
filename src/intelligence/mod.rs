// ABOUTME: Intelligence module re-exports from the archery-intelligence crate
// ABOUTME: Preserves crate::intelligence paths for the orchestrator and binaries
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # Intelligence Module
//!
//! Scoring, grouping, segmentation, motion, and statistics engines.

pub use archery_intelligence::*;

pub use archery_intelligence::{
    archery_constants, grouping_analyzer, motion_scorer, phase_segmenter, recommendation_rules,
    scoring, statistical_analysis, statistics_aggregator, target_catalog,
};
