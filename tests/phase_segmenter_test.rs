// ABOUTME: Tests for five-phase shot segmentation over synthetic 30 fps pose streams
// ABOUTME: Covers boundaries, contiguity, absorption, follow-through trimming, validation, cancellation
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

use archery_analysis::errors::ErrorCode;
use archery_analysis::intelligence::config::intelligence::SegmentationConfig;
use archery_analysis::intelligence::phase_segmenter::{
    transition, MotionSample, SegmenterState, Transition,
};
use archery_analysis::intelligence::{PhaseSegmenter, SegmentationOutcome};
use archery_analysis::models::{Keypoint, PoseFrame, Point3, ShotPhase};
use tokio_util::sync::CancellationToken;

const EPS: f64 = 1e-9;

fn segmenter() -> PhaseSegmenter {
    PhaseSegmenter::with_config(SegmentationConfig::default())
}

fn segment(frames: &[PoseFrame]) -> SegmentationOutcome {
    segmenter()
        .segment(frames, &CancellationToken::new())
        .unwrap()
}

fn assert_contiguous(outcome: &SegmentationOutcome) {
    let phases = &outcome.phases;
    assert_eq!(phases[0].start_frame, 0);
    assert!((phases[0].start_time - outcome.interval_start).abs() < EPS);
    for pair in phases.windows(2) {
        assert_eq!(pair[1].start_frame, pair[0].end_frame + 1);
        assert!((pair[1].start_time - pair[0].end_time).abs() < EPS);
        assert!(pair[0].phase < pair[1].phase);
    }
    let last = phases.last().unwrap();
    assert!((last.end_time - outcome.interval_end).abs() < EPS);

    let total: f64 = phases.iter().map(|p| p.duration).sum();
    assert!((total - (outcome.interval_end - outcome.interval_start)).abs() < 1e-6);
    assert!(phases.iter().all(|p| (0.0..=100.0).contains(&p.score)));
}

#[test]
fn test_canonical_shot_yields_five_phases() {
    let outcome = segment(&common::canonical_shot());

    let bounds: Vec<(ShotPhase, usize, usize)> = outcome
        .phases
        .iter()
        .map(|p| (p.phase, p.start_frame, p.end_frame))
        .collect();
    assert_eq!(
        bounds,
        vec![
            (ShotPhase::Preparation, 0, 27),
            (ShotPhase::Draw, 28, 49),
            (ShotPhase::Holding, 50, 89),
            (ShotPhase::Release, 90, 90),
            (ShotPhase::FollowThrough, 91, 119),
        ]
    );
    assert_eq!(outcome.frames_trimmed, 0);
    assert_eq!(outcome.trajectory.len(), 120);
    assert!((outcome.interval_end - 4.0).abs() < 1e-6);
    assert_contiguous(&outcome);
}

#[test]
fn test_debounced_boundaries_sit_where_the_condition_began() {
    let outcome = segment(&common::canonical_shot());

    let draw = &outcome.phases[1];
    assert!((draw.start_time - 28.0 / common::FPS).abs() < EPS);
    let holding = &outcome.phases[2];
    assert!((holding.start_time - 50.0 / common::FPS).abs() < EPS);
}

#[test]
fn test_steady_hold_scores_high_and_has_key_frames() {
    let outcome = segment(&common::canonical_shot());
    let holding = &outcome.phases[2];

    // Constant aim: full stability, duration 1.33 s against a 1.5 s minimum
    let expected = 0.6f64.mul_add(100.0, 0.4 * 100.0 * (40.0 / 30.0) / 1.5);
    assert!((holding.score - expected).abs() < 1e-6);
    assert_eq!(holding.key_frames, vec![50, 69, 89]);
    assert_eq!(outcome.phases[3].key_frames, vec![90]);
}

#[test]
fn test_phase_without_trigger_absorbs_remaining_frames() {
    let at_rest: Vec<PoseFrame> = (0..60).map(|i| common::angle_frame(i, 170.0)).collect();
    let outcome = segment(&at_rest);
    assert_eq!(outcome.phases.len(), 1);
    assert_eq!(outcome.phases[0].phase, ShotPhase::Preparation);
    assert_eq!(outcome.phases[0].end_frame, 59);
    assert!((outcome.interval_end - 2.0).abs() < 1e-6);
    assert_contiguous(&outcome);

    let never_settles: Vec<PoseFrame> = (0..60)
        .map(|i| common::angle_frame(i, (i as f64).mul_add(-7.0 / 3.0, 170.0)))
        .collect();
    let outcome = segment(&never_settles);
    let phases: Vec<ShotPhase> = outcome.phases.iter().map(|p| p.phase).collect();
    assert_eq!(phases, vec![ShotPhase::Preparation, ShotPhase::Draw]);
    assert_eq!(outcome.phases[1].start_frame, 9);
    assert_eq!(outcome.phases[1].end_frame, 59);
    assert_contiguous(&outcome);
}

#[test]
fn test_draw_needs_a_crossing_and_sustained_motion() {
    // Held past the trigger from the first frame: never crossed, never moving
    let static_arm: Vec<PoseFrame> = (0..60).map(|i| common::angle_frame(i, 140.0)).collect();
    let outcome = segment(&static_arm);
    assert_eq!(outcome.phases.len(), 1);
    assert_eq!(outcome.phases[0].phase, ShotPhase::Preparation);
    assert_eq!(outcome.phases[0].end_frame, 59);
    assert_contiguous(&outcome);

    // Moving, but already past the trigger on the first frame
    let starts_drawn: Vec<PoseFrame> = (0..60)
        .map(|i| common::angle_frame(i, (i as f64).mul_add(-1.0, 140.0)))
        .collect();
    assert_eq!(segment(&starts_drawn).phases.len(), 1);

    // Crosses the trigger in one jump, then freezes
    let jump_then_freeze: Vec<PoseFrame> = (0..60)
        .map(|i| common::angle_frame(i, if i < 10 { 170.0 } else { 140.0 }))
        .collect();
    let outcome = segment(&jump_then_freeze);
    assert_eq!(outcome.phases.len(), 1);
    assert_eq!(outcome.phases[0].phase, ShotPhase::Preparation);
}

#[test]
fn test_backward_motion_resets_pending_draw() {
    let step = 7.0 / 3.0;
    let angle = |i: usize| match i {
        0..=29 => common::canonical_angle(i),
        30 => common::canonical_angle(29) + 3.0,
        _ => (i as f64 - 30.0).mul_add(-step, common::canonical_angle(29) + 3.0),
    };
    let frames: Vec<PoseFrame> = (0..60).map(|i| common::angle_frame(i, angle(i))).collect();

    let outcome = segment(&frames);
    let phases: Vec<ShotPhase> = outcome.phases.iter().map(|p| p.phase).collect();
    assert_eq!(phases, vec![ShotPhase::Preparation, ShotPhase::Draw]);
    // The uninterrupted stream would start drawing at frame 28
    assert_eq!(outcome.phases[1].start_frame, 31);
    assert_contiguous(&outcome);
}

#[test]
fn test_transition_requires_armed_trigger() {
    let config = SegmentationConfig::default();
    let crossing = MotionSample {
        position: 5,
        timestamp_secs: 5.0 / common::FPS,
        draw_angle_deg: 149.0,
        angle_delta_deg: -2.0,
        angular_velocity_deg_s: -60.0,
        hand_speed: None,
    };

    match transition(state(ShotPhase::Preparation, 0), &crossing, &config) {
        Transition::Continue { state, boundary } => {
            assert!(state.pending.is_none());
            assert!(boundary.is_none());
        }
        Transition::Finished => panic!("preparation cannot finish the stream"),
    }

    let armed = SegmenterState {
        draw_armed: true,
        ..state(ShotPhase::Preparation, 0)
    };
    match transition(armed, &crossing, &config) {
        Transition::Continue { state, .. } => {
            let pending = state.pending.unwrap();
            assert_eq!(pending.start_frame, 5);
            assert!((pending.start_angle_deg - 149.0).abs() < EPS);
        }
        Transition::Finished => panic!("preparation cannot finish the stream"),
    }

    let still = MotionSample {
        angle_delta_deg: 0.0,
        angular_velocity_deg_s: 0.0,
        ..crossing
    };
    match transition(armed, &still, &config) {
        Transition::Continue { state, .. } => assert!(state.pending.is_none()),
        Transition::Finished => panic!("preparation cannot finish the stream"),
    }
}

#[test]
fn test_follow_through_is_trimmed_at_limit() {
    let mut frames = common::canonical_shot();
    frames.extend((120..200).map(|i| common::angle_frame(i, 180.0)));

    let outcome = segment(&frames);
    assert!(outcome.frames_trimmed > 0);

    let follow = outcome.phases.last().unwrap();
    assert_eq!(follow.phase, ShotPhase::FollowThrough);
    assert_eq!(follow.end_frame + 1 + outcome.frames_trimmed, frames.len());
    assert!((follow.duration - 2.0).abs() <= 1.0 / common::FPS + 1e-6);
    assert_eq!(outcome.trajectory.len(), frames.len() - outcome.frames_trimmed);
    assert_contiguous(&outcome);
}

#[test]
fn test_segmentation_is_deterministic() {
    let frames = common::shot_with_hold(15);
    let first = segment(&frames);
    let second = segment(&frames);
    assert_eq!(first, second);
}

#[test]
fn test_invalid_streams_are_rejected() {
    let cancel = CancellationToken::new();
    let segmenter = segmenter();

    let err = segmenter
        .segment(&[common::angle_frame(0, 170.0)], &cancel)
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidInput);

    let mut repeated = vec![common::angle_frame(0, 170.0), common::angle_frame(1, 170.0)];
    repeated[1].timestamp_secs = repeated[0].timestamp_secs;
    let err = segmenter.segment(&repeated, &cancel).unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidInput);

    let mut no_angle = common::canonical_shot();
    no_angle[40].angles.clear();
    let err = segmenter.segment(&no_angle, &cancel).unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidInput);

    let mut nan_angle = common::canonical_shot();
    nan_angle[3].angles[0].degrees = f64::NAN;
    let err = segmenter.segment(&nan_angle, &cancel).unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidInput);

    let mut bad_confidence = common::canonical_shot();
    bad_confidence[5].keypoints.push(Keypoint {
        name: "right_wrist".to_owned(),
        position: Point3::new(0.0, 0.0, 0.0),
        confidence: 1.5,
    });
    let err = segmenter.segment(&bad_confidence, &cancel).unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidInput);
}

#[test]
fn test_cancelled_token_stops_segmentation() {
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = segmenter()
        .segment(&common::canonical_shot(), &cancel)
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::Cancelled);
    assert!(err.is_cancelled());
}

fn arm_frame(frame_index: usize, wrist: Point3, confidence: f64) -> PoseFrame {
    let keypoint = |name: &str, position| Keypoint {
        name: name.to_owned(),
        position,
        confidence,
    };
    PoseFrame {
        frame_index,
        timestamp_secs: frame_index as f64 / common::FPS,
        keypoints: vec![
            keypoint("right_shoulder", Point3::new(1.0, 0.0, 0.0)),
            keypoint("right_elbow", Point3::new(0.0, 0.0, 0.0)),
            keypoint("right_wrist", wrist),
        ],
        angles: Vec::new(),
    }
}

#[test]
fn test_samples_fall_back_to_keypoint_angle_and_hand_speed() {
    let cancel = CancellationToken::new();
    let frames = vec![
        arm_frame(0, Point3::new(0.0, 1.0, 0.0), 0.9),
        arm_frame(1, Point3::new(0.0, 1.1, 0.0), 0.9),
    ];
    let samples = segmenter().derive_samples(&frames, &cancel).unwrap();

    assert!((samples[0].draw_angle_deg - 90.0).abs() < 1e-9);
    assert_eq!(samples[0].hand_speed, None);
    let speed = samples[1].hand_speed.unwrap();
    assert!((speed - 3.0).abs() < 1e-6);

    let unsure = vec![
        arm_frame(0, Point3::new(0.0, 1.0, 0.0), 0.3),
        arm_frame(1, Point3::new(0.0, 1.1, 0.0), 0.3),
    ];
    let samples = segmenter().derive_samples(&unsure, &cancel).unwrap();
    assert_eq!(samples[1].hand_speed, None);
}

fn sample(position: usize, angular_velocity_deg_s: f64, hand_speed: Option<f64>) -> MotionSample {
    MotionSample {
        position,
        timestamp_secs: position as f64 / common::FPS,
        draw_angle_deg: 100.0,
        angle_delta_deg: angular_velocity_deg_s / common::FPS,
        angular_velocity_deg_s,
        hand_speed,
    }
}

fn state(phase: ShotPhase, start: usize) -> SegmenterState {
    SegmenterState {
        phase,
        phase_start_frame: start,
        phase_start_time: start as f64 / common::FPS,
        pending: None,
        draw_armed: false,
    }
}

#[test]
fn test_transition_release_on_hand_spike() {
    let config = SegmentationConfig::default();

    match transition(state(ShotPhase::Holding, 10), &sample(11, 0.0, Some(2.0)), &config) {
        Transition::Continue {
            state,
            boundary: Some(boundary),
        } => {
            assert_eq!(state.phase, ShotPhase::Release);
            assert_eq!(boundary.phase, ShotPhase::Release);
            assert_eq!(boundary.start_frame, 11);
        }
        other => panic!("expected a release boundary, got {other:?}"),
    }

    // A phase never ends on its own first frame
    match transition(state(ShotPhase::Holding, 11), &sample(11, 500.0, None), &config) {
        Transition::Continue { state, boundary } => {
            assert_eq!(state.phase, ShotPhase::Holding);
            assert!(boundary.is_none());
        }
        Transition::Finished => panic!("holding cannot finish the stream"),
    }
}

#[test]
fn test_transition_follow_through_limit() {
    let config = SegmentationConfig::default();

    match transition(state(ShotPhase::Release, 5), &sample(6, 0.0, None), &config) {
        Transition::Continue {
            boundary: Some(boundary),
            ..
        } => assert_eq!(boundary.phase, ShotPhase::FollowThrough),
        other => panic!("release must hand over to follow-through, got {other:?}"),
    }

    let follow = state(ShotPhase::FollowThrough, 0);
    assert!(matches!(
        transition(follow, &sample(30, 0.0, None), &config),
        Transition::Continue { boundary: None, .. }
    ));
    assert_eq!(
        transition(follow, &sample(90, 0.0, None), &config),
        Transition::Finished
    );
}
