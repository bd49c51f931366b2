// ABOUTME: Ordered rule tables mapping grouping and motion findings to advisory strings
// ABOUTME: Every rule whose predicate holds fires, in declaration order
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Recommendation rule tables
//!
//! A rule table is an ordered list of `(predicate, message)` pairs evaluated
//! in full. Several pieces of advice may fire for the same result; the
//! output order is the table order.

use crate::archery_constants::{grouping, motion};
use archery_core::models::{OffsetDirection, PatternTag, ShotPhase};
use serde::{Deserialize, Serialize};

/// Which centre offsets a grouping rule applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "direction")]
pub enum OffsetFilter {
    /// Any off-centre group
    AnyOffCenter,
    /// Only centred groups
    Centered,
    /// Groups with an upward component
    High,
    /// Groups with a downward component
    Low,
    /// Groups with a leftward component
    Left,
    /// Groups with a rightward component
    Right,
    /// One exact compass bucket
    Exactly(OffsetDirection),
}

impl OffsetFilter {
    /// Whether `direction` passes this filter
    #[must_use]
    pub fn matches(self, direction: OffsetDirection) -> bool {
        match self {
            Self::AnyOffCenter => direction != OffsetDirection::Center,
            Self::Centered => direction == OffsetDirection::Center,
            Self::High => direction.is_high(),
            Self::Low => direction.is_low(),
            Self::Left => direction.is_left(),
            Self::Right => direction.is_right(),
            Self::Exactly(expected) => direction == expected,
        }
    }
}

/// One predicate over a grouping finding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum GroupingCondition {
    /// Group shape equals the tag
    Pattern(PatternTag),
    /// Centre offset passes the filter
    Offset(OffsetFilter),
    /// Average arrow score below this fraction of the face maximum
    AverageScoreRatioBelow(f64),
    /// Wind explains more than this share of the offset
    WindExplainedAbove(f64),
}

/// Facts a grouping rule is evaluated against
#[derive(Debug, Clone, Copy)]
pub struct GroupingFacts {
    /// Group shape
    pub pattern: PatternTag,
    /// Compass bucket of the centre offset
    pub direction: OffsetDirection,
    /// Average score divided by the face maximum
    pub average_score_ratio: f64,
    /// Wind-explained share, when estimated
    pub wind_explained: Option<f64>,
}

impl GroupingCondition {
    fn holds(&self, facts: &GroupingFacts) -> bool {
        match self {
            Self::Pattern(tag) => facts.pattern == *tag,
            Self::Offset(filter) => filter.matches(facts.direction),
            Self::AverageScoreRatioBelow(ratio) => facts.average_score_ratio < *ratio,
            Self::WindExplainedAbove(share) => facts.wind_explained.is_some_and(|w| w > *share),
        }
    }
}

/// Grouping advice: fires when every condition holds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupingRule {
    /// Conjunction of predicates
    pub conditions: Vec<GroupingCondition>,
    /// Advisory string
    pub message: String,
}

impl GroupingRule {
    fn new(conditions: Vec<GroupingCondition>, message: &str) -> Self {
        Self {
            conditions,
            message: message.to_owned(),
        }
    }

    /// Whether the rule fires for `facts`
    #[must_use]
    pub fn fires(&self, facts: &GroupingFacts) -> bool {
        self.conditions.iter().all(|condition| condition.holds(facts))
    }
}

/// Evaluate a grouping rule table in full, keeping declaration order
#[must_use]
pub fn evaluate_grouping_rules(rules: &[GroupingRule], facts: &GroupingFacts) -> Vec<String> {
    rules
        .iter()
        .filter(|rule| rule.fires(facts))
        .map(|rule| rule.message.clone())
        .collect()
}

/// Default grouping rule table
#[must_use]
pub fn default_grouping_rules() -> Vec<GroupingRule> {
    use GroupingCondition::{AverageScoreRatioBelow, Offset, Pattern, WindExplainedAbove};

    vec![
        GroupingRule::new(
            vec![Pattern(PatternTag::Tight), Offset(OffsetFilter::Centered)],
            "Tight, centred group: keep the current form and shot routine.",
        ),
        GroupingRule::new(
            vec![Pattern(PatternTag::Tight), Offset(OffsetFilter::AnyOffCenter)],
            "Tight group away from the centre: the form is repeatable, move the sight toward the group instead of changing technique.",
        ),
        GroupingRule::new(
            vec![Pattern(PatternTag::VerticalString)],
            "Vertical stringing: check anchor height and keep the bow arm at the same elevation through the shot.",
        ),
        GroupingRule::new(
            vec![Pattern(PatternTag::HorizontalString)],
            "Horizontal stringing: check string alignment, bow hand torque, and release direction.",
        ),
        GroupingRule::new(
            vec![Pattern(PatternTag::DiagonalString)],
            "Diagonal stringing: look for canting the bow and plucking the string on release.",
        ),
        GroupingRule::new(
            vec![Pattern(PatternTag::Scattered)],
            "Scattered group: work on a consistent shot routine before chasing the centre.",
        ),
        GroupingRule::new(
            vec![Offset(OffsetFilter::High)],
            "Group sits high: confirm the anchor is not creeping low, then adjust the sight.",
        ),
        GroupingRule::new(
            vec![Offset(OffsetFilter::Low)],
            "Group sits low: watch for the bow arm dropping at release, then adjust the sight.",
        ),
        GroupingRule::new(
            vec![Offset(OffsetFilter::Left)],
            "Group sits left: check bow hand pressure and release direction, then adjust the sight.",
        ),
        GroupingRule::new(
            vec![Offset(OffsetFilter::Right)],
            "Group sits right: check for gripping the bow and a late release, then adjust the sight.",
        ),
        GroupingRule::new(
            vec![WindExplainedAbove(grouping::WIND_DOMINANT_SHARE)],
            "Most of the offset matches the wind: aim off into the wind rather than changing technique.",
        ),
        GroupingRule::new(
            vec![AverageScoreRatioBelow(grouping::LOW_AVERAGE_SCORE_RATIO)],
            "Low average score: review the basic stance and aiming point.",
        ),
    ]
}

/// Predicate over a motion finding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum MotionCondition {
    /// The phase was reached and scored below the threshold
    PhaseScoreBelow {
        /// Phase checked
        phase: ShotPhase,
        /// Score threshold in `[0, 100]`
        threshold: f64,
    },
    /// The shot never reached the phase
    PhaseMissing {
        /// Phase checked
        phase: ShotPhase,
    },
    /// Holding stability was estimated and is below the threshold
    StabilityBelow {
        /// Threshold in `[0, 100]`
        threshold: f64,
    },
    /// Cross-shot consistency was estimated and is below the threshold
    ConsistencyBelow {
        /// Threshold in `[0, 100]`
        threshold: f64,
    },
}

/// Facts a motion rule is evaluated against
#[derive(Debug, Clone, Copy)]
pub struct MotionFacts<'a> {
    /// `(phase, score)` for each phase reached
    pub phase_scores: &'a [(ShotPhase, f64)],
    /// Stability, when estimated
    pub stability: Option<f64>,
    /// Consistency, when estimated
    pub consistency: Option<f64>,
}

impl MotionCondition {
    fn holds(&self, facts: &MotionFacts<'_>) -> bool {
        let score_of = |wanted: ShotPhase| {
            facts
                .phase_scores
                .iter()
                .find(|(phase, _)| *phase == wanted)
                .map(|(_, score)| *score)
        };
        match self {
            Self::PhaseScoreBelow { phase, threshold } => {
                score_of(*phase).is_some_and(|score| score < *threshold)
            }
            Self::PhaseMissing { phase } => score_of(*phase).is_none(),
            Self::StabilityBelow { threshold } => facts.stability.is_some_and(|s| s < *threshold),
            Self::ConsistencyBelow { threshold } => {
                facts.consistency.is_some_and(|c| c < *threshold)
            }
        }
    }
}

/// Motion advice keyed by a single condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotionRule {
    /// Predicate
    pub condition: MotionCondition,
    /// Advisory string
    pub message: String,
}

impl MotionRule {
    fn new(condition: MotionCondition, message: &str) -> Self {
        Self {
            condition,
            message: message.to_owned(),
        }
    }
}

/// Evaluate a motion rule table in full, keeping declaration order
#[must_use]
pub fn evaluate_motion_rules(rules: &[MotionRule], facts: &MotionFacts<'_>) -> Vec<String> {
    rules
        .iter()
        .filter(|rule| rule.condition.holds(facts))
        .map(|rule| rule.message.clone())
        .collect()
}

/// Default motion rule table
#[must_use]
pub fn default_motion_rules() -> Vec<MotionRule> {
    let below = |phase| MotionCondition::PhaseScoreBelow {
        phase,
        threshold: motion::PHASE_SCORE_THRESHOLD,
    };

    vec![
        MotionRule::new(
            below(ShotPhase::Preparation),
            "Set-up is unsettled: build a repeatable stance and pre-draw routine.",
        ),
        MotionRule::new(
            below(ShotPhase::Draw),
            "Draw is uneven: draw in one smooth motion with the elbow raised level with the shoulder.",
        ),
        MotionRule::new(
            below(ShotPhase::Holding),
            "Body sways while aiming: strengthen core and back tension to settle the hold.",
        ),
        MotionRule::new(
            below(ShotPhase::Release),
            "Release is disturbed: relax the string hand and let back tension carry the release.",
        ),
        MotionRule::new(
            below(ShotPhase::FollowThrough),
            "Follow-through is cut short: keep the bow arm up and hold position after the release.",
        ),
        MotionRule::new(
            MotionCondition::PhaseMissing {
                phase: ShotPhase::Holding,
            },
            "No hold detected: settle at anchor before releasing.",
        ),
        MotionRule::new(
            MotionCondition::StabilityBelow {
                threshold: motion::STABILITY_THRESHOLD,
            },
            "Aim drifts during the hold: add balance work such as single-leg stands to improve stability.",
        ),
        MotionRule::new(
            MotionCondition::ConsistencyBelow {
                threshold: motion::CONSISTENCY_THRESHOLD,
            },
            "Shot rhythm varies between arrows: repeat blank-bale drills to build muscle memory.",
        ),
    ]
}
