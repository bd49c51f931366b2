// ABOUTME: Arrow scoring configuration for ring boundary handling
// ABOUTME: Decides which ring an arrow exactly on a dividing line belongs to
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Arrow Scoring Configuration

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// How an impact lying exactly on a ring boundary is scored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineRule {
    /// Rings are half-open `[inner, outer)`: a line arrow scores the outer ring
    #[default]
    OuterRing,
    /// A line arrow scores the higher, inner ring (line-cutter rule)
    InnerRing,
}

impl FromStr for LineRule {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "outer_ring" | "outer" => Ok(Self::OuterRing),
            "inner_ring" | "inner" => Ok(Self::InnerRing),
            other => Err(format!("unknown line rule '{other}'")),
        }
    }
}

/// Scoring Engine Configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Boundary handling
    pub line_rule: LineRule,
}
