// ABOUTME: Tests for geometric arrow scoring against ring and colour tables
// ABOUTME: Covers ring lookup, misses, line-cutter rules, determinism, and invalid coordinates
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]
#![allow(clippy::float_cmp, clippy::uninlined_format_args)]

mod common;

use archery_analysis::errors::ErrorCode;
use archery_analysis::intelligence::config::intelligence::{LineRule, ScoringConfig};
use archery_analysis::intelligence::ArrowScorer;
use archery_analysis::models::{ArrowImpact, Point2};
use uuid::Uuid;

fn scorer(line_rule: LineRule) -> ArrowScorer {
    ArrowScorer::with_config(ScoringConfig { line_rule })
}

#[test]
fn test_scores_by_radial_distance() {
    let spec = common::three_ring_spec();
    let scorer = scorer(LineRule::OuterRing);

    let center = scorer.score(Point2::new(3.0, 4.0), &spec).unwrap();
    assert_eq!(center.score, 10);
    assert_eq!(center.ring, 1);
    assert_eq!(center.zone_color, "gold");

    let middle = scorer.score(Point2::new(0.0, -15.0), &spec).unwrap();
    assert_eq!((middle.score, middle.ring), (8, 2));
    assert_eq!(middle.zone_color, "red");

    let outer = scorer.score(Point2::new(-25.0, 0.0), &spec).unwrap();
    assert_eq!((outer.score, outer.ring), (5, 3));
    assert_eq!(outer.zone_color, "blue");
}

#[test]
fn test_outside_outermost_ring_is_a_miss() {
    let spec = common::three_ring_spec();
    let shot = scorer(LineRule::OuterRing)
        .score(Point2::new(21.0, 28.0), &spec)
        .unwrap();

    assert_eq!(shot.score, 0);
    assert_eq!(shot.ring, 0);
    assert_eq!(shot.zone_color, "miss");
}

#[test]
fn test_line_on_boundary_defaults_to_outer_ring() {
    let spec = common::three_ring_spec();
    let on_line = Point2::new(10.0, 0.0);

    let shot = scorer(LineRule::OuterRing).score(on_line, &spec).unwrap();
    assert_eq!((shot.score, shot.ring), (8, 2));

    let edge = scorer(LineRule::OuterRing)
        .score(Point2::new(0.0, 30.0), &spec)
        .unwrap();
    assert_eq!(edge.score, 0);
}

#[test]
fn test_inner_ring_rule_awards_line_cutters() {
    let spec = common::three_ring_spec();
    let scorer = scorer(LineRule::InnerRing);

    let shot = scorer.score(Point2::new(10.0, 0.0), &spec).unwrap();
    assert_eq!((shot.score, shot.ring), (10, 1));

    let edge = scorer.score(Point2::new(0.0, 30.0), &spec).unwrap();
    assert_eq!((edge.score, edge.ring), (5, 3));

    let inside = scorer.score(Point2::new(0.0, 15.0), &spec).unwrap();
    assert_eq!(inside.score, 8);
}

#[test]
fn test_scoring_is_deterministic() {
    let spec = common::ten_ring_spec(70, 6.1);
    let scorer = scorer(LineRule::OuterRing);
    let point = Point2::new(12.2, -7.3);

    let first = scorer.score(point, &spec).unwrap();
    for _ in 0..10 {
        assert_eq!(scorer.score(point, &spec).unwrap(), first);
    }
}

#[test]
fn test_non_finite_coordinate_is_invalid_input() {
    let spec = common::three_ring_spec();
    let scorer = scorer(LineRule::OuterRing);

    for point in [
        Point2::new(f64::NAN, 0.0),
        Point2::new(0.0, f64::INFINITY),
        Point2::new(f64::NEG_INFINITY, 1.0),
    ] {
        let err = scorer.score(point, &spec).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidInput);
    }
}

#[test]
fn test_score_arrows_keeps_order_and_tags_bad_impact() {
    let session_id = Uuid::new_v4();
    let spec = common::three_ring_spec();
    let scorer = scorer(LineRule::OuterRing);

    let arrows = common::impacts(session_id, &[(25.0, 0.0), (1.0, 1.0), (40.0, 0.0)]);
    let scored = scorer.score_arrows(&arrows, &spec).unwrap();
    let scores: Vec<u32> = scored.iter().map(|a| a.shot.score).collect();
    assert_eq!(scores, vec![5, 10, 0]);
    assert_eq!(scored[1].impact.id, arrows[1].id);

    let bad = ArrowImpact::new(session_id, f64::NAN, 0.0);
    let err = scorer
        .score_arrows(&[arrows[0].clone(), bad.clone()], &spec)
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidInput);
    assert_eq!(err.context.resource_id.as_deref(), Some(bad.id.to_string().as_str()));
}
