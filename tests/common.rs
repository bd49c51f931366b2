// ABOUTME: Shared test utilities and fixture builders for integration tests
// ABOUTME: Provides target faces, arrow groups, pose streams, and seeded in-memory stores
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::module_name_repetitions,
    clippy::too_many_lines,
    clippy::similar_names,
    clippy::uninlined_format_args,
    clippy::redundant_closure_for_method_calls,
    clippy::unwrap_used,
    clippy::expect_used
)]
//! Shared test utilities for `archery_analysis`
//!
//! Builders for the inputs every engine test needs, so individual tests only
//! spell out what they are actually checking.

use archery_analysis::models::{
    ArrowImpact, ColorZone, JointAngle, PoseFrame, RingBand, ScoredArrow, ShotScore,
    TargetFaceType, TargetSpec,
};
use archery_analysis::orchestrator::{InMemoryStore, MotionCapture, TargetSession};
use chrono::{DateTime, TimeZone, Utc};
use std::sync::Once;
use uuid::Uuid;

static INIT_LOGGER: Once = Once::new();

/// Install a quiet test subscriber once per test binary
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("warn")
            .with_test_writer()
            .try_init();
    });
}

/// Frame rate of the synthetic pose streams
pub const FPS: f64 = 30.0;

/// Three-ring face: `[0,10) -> 10`, `[10,20) -> 8`, `[20,30) -> 5`
pub fn three_ring_spec() -> TargetSpec {
    TargetSpec::new(
        TargetFaceType::Ring,
        18,
        vec![
            ring(1, 0.0, 10.0, 10),
            ring(2, 10.0, 20.0, 8),
            ring(3, 20.0, 30.0, 5),
        ],
        vec![
            zone("gold", &[1]),
            zone("red", &[2]),
            zone("blue", &[3]),
        ],
    )
    .expect("three-ring face is valid")
}

/// Ten equal rings of `width`, scoring 10 down to 1
pub fn ten_ring_spec(distance_m: u32, width: f64) -> TargetSpec {
    let rings = (1_u8..=10)
        .map(|n| {
            ring(
                n,
                width * f64::from(n - 1),
                width * f64::from(n),
                11 - u32::from(n),
            )
        })
        .collect();
    TargetSpec::new(
        TargetFaceType::Ring,
        distance_m,
        rings,
        vec![
            zone("gold", &[1, 2]),
            zone("red", &[3, 4]),
            zone("blue", &[5, 6]),
            zone("black", &[7, 8]),
            zone("white", &[9, 10]),
        ],
    )
    .expect("ten-ring face is valid")
}

pub fn ring(ring: u8, inner_radius: f64, outer_radius: f64, score: u32) -> RingBand {
    RingBand {
        ring,
        inner_radius,
        outer_radius,
        score,
    }
}

pub fn zone(color: &str, rings: &[u8]) -> ColorZone {
    ColorZone {
        color: color.to_owned(),
        rings: rings.to_vec(),
    }
}

/// Arrows at `points`, all scored with `score` on ring 1
pub fn scored_arrows(session_id: Uuid, points: &[(f64, f64)], score: u32) -> Vec<ScoredArrow> {
    points
        .iter()
        .map(|&(x, y)| ScoredArrow {
            impact: ArrowImpact::new(session_id, x, y),
            shot: ShotScore {
                score,
                ring: 1,
                zone_color: "gold".to_owned(),
            },
        })
        .collect()
}

pub fn impacts(session_id: Uuid, points: &[(f64, f64)]) -> Vec<ArrowImpact> {
    points
        .iter()
        .map(|&(x, y)| ArrowImpact::new(session_id, x, y))
        .collect()
}

/// Frame carrying only the draw-arm angle
pub fn angle_frame(frame_index: usize, draw_angle_deg: f64) -> PoseFrame {
    PoseFrame {
        frame_index,
        timestamp_secs: frame_index as f64 / FPS,
        keypoints: Vec::new(),
        angles: vec![JointAngle {
            name: "right_elbow".to_owned(),
            degrees: draw_angle_deg,
            points: [
                "right_shoulder".to_owned(),
                "right_elbow".to_owned(),
                "right_wrist".to_owned(),
            ],
        }],
    }
}

/// Draw-arm angle of the canonical 120-frame shot at frame `i`
///
/// - 0..=19 at rest (170 degrees)
/// - 20..=49 drawing at 70 deg/s down to 100 degrees
/// - 50..=89 anchored at 100 degrees
/// - 90..=99 release snap at 240 deg/s
/// - 100..=119 settled at 180 degrees
pub fn canonical_angle(i: usize) -> f64 {
    match i {
        0..=19 => 170.0,
        20..=49 => 170.0 - (i as f64 - 19.0) * 70.0 / 30.0,
        50..=89 => 100.0,
        90..=99 => 100.0 + (i as f64 - 89.0) * 8.0,
        _ => 180.0,
    }
}

/// The canonical 120-frame shot at 30 fps
pub fn canonical_shot() -> Vec<PoseFrame> {
    (0..120).map(|i| angle_frame(i, canonical_angle(i))).collect()
}

/// Canonical shot with the anchored hold stretched by `extra_hold` frames
pub fn shot_with_hold(extra_hold: usize) -> Vec<PoseFrame> {
    let hold_end = 89 + extra_hold;
    (0..120 + extra_hold)
        .map(|i| {
            let angle = if i <= 49 {
                canonical_angle(i)
            } else if i <= hold_end {
                100.0
            } else {
                canonical_angle(i - extra_hold)
            };
            angle_frame(i, angle)
        })
        .collect()
}

pub fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 12, 0, 0)
        .single()
        .expect("valid date")
}

pub fn target_session(
    subject_id: Uuid,
    recorded_at: DateTime<Utc>,
    spec: &TargetSpec,
    points: &[(f64, f64)],
) -> TargetSession {
    let session_id = Uuid::new_v4();
    TargetSession {
        session_id,
        subject_id,
        recorded_at,
        target: spec.key(),
        spec_version: None,
        arrows: impacts(session_id, points),
    }
}

pub fn capture(session_id: Uuid, frames: Vec<PoseFrame>) -> MotionCapture {
    MotionCapture {
        video_id: Uuid::new_v4(),
        session_id,
        frames,
    }
}

/// Store with the standard faces and nothing else
pub fn empty_store() -> InMemoryStore {
    InMemoryStore::new().expect("standard faces are valid")
}
