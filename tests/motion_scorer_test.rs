// ABOUTME: Tests for motion scoring: holding stability, cross-shot consistency, and technique advice
// ABOUTME: Builds phase sequences by hand so every expected value can be computed directly
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]
#![allow(
    clippy::float_cmp,
    clippy::cast_precision_loss,
    clippy::uninlined_format_args
)]

mod common;

use archery_analysis::intelligence::config::intelligence::{MotionConfig, SegmentationConfig};
use archery_analysis::intelligence::recommendation_rules::default_motion_rules;
use archery_analysis::intelligence::{MotionScorer, PhaseSegmenter};
use archery_analysis::models::{PhaseSegment, ShotPhase, TrajectorySample};
use tokio_util::sync::CancellationToken;

const HOLDING_LOW: usize = 2;
const NO_HOLD: usize = 5;
const STABILITY_LOW: usize = 6;
const CONSISTENCY_LOW: usize = 7;

fn scorer() -> MotionScorer {
    MotionScorer::with_config(MotionConfig::default())
}

fn message(index: usize) -> String {
    default_motion_rules()[index].message.clone()
}

fn phase(phase: ShotPhase, start_frame: usize, end_frame: usize, duration: f64, score: f64) -> PhaseSegment {
    let start_time = start_frame as f64 / common::FPS;
    PhaseSegment {
        phase,
        start_frame,
        end_frame,
        start_time,
        end_time: start_time + duration,
        duration,
        score,
        key_frames: vec![start_frame],
    }
}

fn trajectory(angles: &[f64]) -> Vec<TrajectorySample> {
    angles
        .iter()
        .enumerate()
        .map(|(frame, &aiming_angle_deg)| TrajectorySample {
            frame,
            timestamp_secs: frame as f64 / common::FPS,
            position: None,
            aiming_angle_deg,
        })
        .collect()
}

#[test]
fn test_stability_uses_holding_aim_only() {
    // Frames 0..=3 are outside the hold and swing wildly
    let track = trajectory(&[10.0, 80.0, 150.0, 40.0, 1.0, 3.0, 1.0, 3.0]);
    let phases = vec![
        phase(ShotPhase::Draw, 0, 3, 1.5, 90.0),
        phase(ShotPhase::Holding, 4, 7, 2.0, 90.0),
    ];

    let score = scorer().score(&phases, &track, &[]);

    // var([1, 3, 1, 3]) = 1, so 100 / (1 + 1 / 4)
    assert!(score.stability.estimated);
    assert!((score.stability.value - 80.0).abs() < 1e-9);
    assert!(score.recommendations.contains(&message(STABILITY_LOW)));
}

#[test]
fn test_missing_hold_is_reported_not_scored() {
    let track = trajectory(&[170.0, 160.0, 150.0]);
    let phases = vec![phase(ShotPhase::Preparation, 0, 2, 2.0, 90.0)];

    let score = scorer().score(&phases, &track, &[]);

    assert!(!score.stability.estimated);
    assert_eq!(score.stability.value(), None);
    assert_eq!(score.recommendations, vec![message(NO_HOLD)]);
}

#[test]
fn test_single_shot_consistency_is_not_estimated() {
    let track = trajectory(&[100.0; 4]);
    let phases = vec![phase(ShotPhase::Holding, 0, 3, 2.0, 95.0)];

    let score = scorer().score(&phases, &track, &[]);

    assert!(score.stability.estimated);
    assert!((score.stability.value - 100.0).abs() < 1e-9);
    assert!(!score.consistency.estimated);
    assert!(score.recommendations.is_empty());
}

#[test]
fn test_identical_shots_are_fully_consistent() {
    let track = trajectory(&[100.0; 4]);
    let phases = vec![
        phase(ShotPhase::Draw, 0, 1, 1.5, 88.0),
        phase(ShotPhase::Holding, 2, 3, 2.0, 95.0),
    ];
    let peer = phases.clone();

    let score = scorer().score(&phases, &track, &[&peer]);

    assert!(score.consistency.estimated);
    assert!((score.consistency.value - 100.0).abs() < 1e-9);
}

#[test]
fn test_consistency_penalises_varying_rhythm() {
    let track = trajectory(&[100.0; 4]);
    let shot = vec![phase(ShotPhase::Holding, 0, 3, 2.0, 80.0)];
    let peer = vec![phase(ShotPhase::Holding, 0, 3, 4.0, 80.0)];

    let score = scorer().score(&shot, &track, &[&peer]);

    // Durations [2, 4]: CV^2 = 1/9; scores equal: 0. Mean term 1/18.
    let expected = 100.0 / (1.0 + (1.0 / 18.0) / 0.05);
    assert!((score.consistency.value - expected).abs() < 1e-9);
    assert!(score.recommendations.contains(&message(CONSISTENCY_LOW)));
}

#[test]
fn test_consistency_compares_only_shared_phases() {
    let track = trajectory(&[100.0; 6]);
    let shot = vec![
        phase(ShotPhase::Preparation, 0, 1, 9.0, 10.0),
        phase(ShotPhase::Holding, 2, 5, 2.0, 90.0),
    ];
    let peer = vec![phase(ShotPhase::Holding, 0, 3, 2.0, 90.0)];

    let score = scorer().score(&shot, &track, &[&peer]);
    assert!((score.consistency.value - 100.0).abs() < 1e-9);
}

#[test]
fn test_consistency_does_not_depend_on_peer_order() {
    let track = trajectory(&[100.0; 4]);
    let shot = vec![phase(ShotPhase::Holding, 0, 3, 2.0, 80.0)];
    let a = vec![phase(ShotPhase::Holding, 0, 3, 2.5, 70.0)];
    let b = vec![phase(ShotPhase::Holding, 0, 3, 3.5, 95.0)];

    let forward = scorer().score(&shot, &track, &[&a, &b]);
    let backward = scorer().score(&shot, &track, &[&b, &a]);
    assert!((forward.consistency.value - backward.consistency.value).abs() < 1e-9);
    assert_eq!(forward.recommendations, backward.recommendations);
}

#[test]
fn test_recommendations_follow_table_order() {
    let track = trajectory(&[0.0, 10.0, 0.0, 10.0, 0.0]);
    let phases = vec![
        phase(ShotPhase::Preparation, 0, 0, 0.1, 10.0),
        phase(ShotPhase::Draw, 1, 1, 0.1, 20.0),
        phase(ShotPhase::Holding, 2, 3, 0.1, 30.0),
        phase(ShotPhase::Release, 4, 4, 0.1, 40.0),
    ];
    let peer = vec![phase(ShotPhase::Holding, 0, 1, 3.0, 90.0)];

    let score = scorer().score(&phases, &track, &[&peer]);

    let rules = default_motion_rules();
    let expected: Vec<String> = [0, 1, HOLDING_LOW, 3, STABILITY_LOW, CONSISTENCY_LOW]
        .iter()
        .map(|&i| rules[i].message.clone())
        .collect();
    assert_eq!(score.recommendations, expected);
}

#[test]
fn test_scores_segmented_shot() {
    let segmenter = PhaseSegmenter::with_config(SegmentationConfig::default());
    let cancel = CancellationToken::new();
    let shot = segmenter.segment(&common::canonical_shot(), &cancel).unwrap();
    let peer = segmenter
        .segment(&common::shot_with_hold(15), &cancel)
        .unwrap();

    let score = scorer().score(&shot.phases, &shot.trajectory, &[&peer.phases]);

    assert!((score.stability.value - 100.0).abs() < 1e-9);
    assert!(score.consistency.estimated);
    assert!((0.0..100.0).contains(&score.consistency.value));
    assert!(!score.recommendations.contains(&message(NO_HOLD)));
}
