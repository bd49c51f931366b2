// ABOUTME: Integration tests for the analysis orchestrator over the in-memory collaborators
// ABOUTME: Covers persistence, content-key deduplication, cancellation, batching, and statistics
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use archery_analysis::config::IntelligenceConfig;
use archery_analysis::errors::ErrorCode;
use archery_analysis::models::{StatisticsPeriod, WeatherConditions};
use archery_analysis::orchestrator::{AnalysisOrchestrator, Collaborators, InMemoryStore};
use common::{
    at, canonical_shot, capture, empty_store, init_test_logging, shot_with_hold,
    target_session, three_ring_spec,
};
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

fn orchestrator(store: &Arc<InMemoryStore>) -> AnalysisOrchestrator {
    init_test_logging();
    AnalysisOrchestrator::with_intelligence_config(
        Collaborators::single(Arc::clone(store)),
        NonZeroUsize::new(2).expect("non-zero"),
        &IntelligenceConfig::default(),
    )
}

/// Store with the three-ring face published over the standard 18 m face
fn store_with_three_ring_face() -> Arc<InMemoryStore> {
    let store = empty_store();
    store.catalog().publish(three_ring_spec());
    Arc::new(store)
}

#[tokio::test]
async fn test_analyze_target_persists_result() {
    let store = store_with_three_ring_face();
    let subject = Uuid::new_v4();
    let session = target_session(
        subject,
        at(2025, 3, 8),
        &three_ring_spec(),
        &[(1.0, 0.0), (0.0, 1.0), (-1.0, 0.0), (12.0, 0.0)],
    );
    let session_id = session.session_id;
    store.insert_session(session);

    let analysis = orchestrator(&store)
        .analyze_target(session_id, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(analysis.session_id, session_id);
    assert_eq!(analysis.subject_id, subject);
    assert_eq!(analysis.spec_version, 2);
    assert_eq!(analysis.max_arrow_score, 10);
    let scores: Vec<u32> = analysis.arrows.iter().map(|a| a.shot.score).collect();
    assert_eq!(scores, vec![10, 10, 10, 8]);
    assert_eq!(analysis.content_key.len(), 64);

    assert_eq!(store.target_analysis(session_id), Some(analysis));
}

#[tokio::test]
async fn test_repeated_analysis_has_identical_content_key() {
    let store = store_with_three_ring_face();
    let session = target_session(
        Uuid::new_v4(),
        at(2025, 3, 8),
        &three_ring_spec(),
        &[(1.0, 0.0), (0.0, 1.0)],
    );
    let session_id = session.session_id;
    store.insert_session(session);
    let orchestrator = orchestrator(&store);
    let cancel = CancellationToken::new();

    let first = orchestrator.analyze_target(session_id, &cancel).await.unwrap();
    let second = orchestrator.analyze_target(session_id, &cancel).await.unwrap();

    assert_eq!(first.content_key, second.content_key);
    assert_eq!(first, second);
    assert_eq!(store.target_analysis(session_id), Some(first));
}

#[tokio::test]
async fn test_weather_changes_content_key() {
    let store = store_with_three_ring_face();
    let session = target_session(
        Uuid::new_v4(),
        at(2025, 3, 8),
        &three_ring_spec(),
        &[(1.0, 0.0), (0.0, 1.0)],
    );
    let session_id = session.session_id;
    store.insert_session(session);
    let orchestrator = orchestrator(&store);
    let cancel = CancellationToken::new();

    let calm = orchestrator.analyze_target(session_id, &cancel).await.unwrap();
    assert!(!calm.grouping.wind_effect.estimated);

    store.insert_weather(session_id, WeatherConditions::wind(5.0, 0.0));
    let windy = orchestrator.analyze_target(session_id, &cancel).await.unwrap();

    assert_ne!(calm.content_key, windy.content_key);
    assert!(windy.grouping.wind_effect.estimated);
    assert_eq!(store.target_analysis(session_id), Some(windy));
}

#[tokio::test]
async fn test_cancelled_target_analysis_persists_nothing() {
    let store = store_with_three_ring_face();
    let session = target_session(
        Uuid::new_v4(),
        at(2025, 3, 8),
        &three_ring_spec(),
        &[(1.0, 0.0)],
    );
    let session_id = session.session_id;
    store.insert_session(session);

    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = orchestrator(&store)
        .analyze_target(session_id, &cancel)
        .await
        .unwrap_err();

    assert!(err.is_cancelled());
    assert_eq!(err.context.resource_id, Some(session_id.to_string()));
    assert!(store.target_analysis(session_id).is_none());
}

#[tokio::test]
async fn test_missing_session_is_not_found() {
    let store = store_with_three_ring_face();
    let missing = Uuid::new_v4();

    let err = orchestrator(&store)
        .analyze_target(missing, &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::ResourceNotFound);
    assert_eq!(err.context.resource_id, Some(missing.to_string()));
}

#[tokio::test]
async fn test_pinned_spec_version_scores_against_that_version() {
    let store = store_with_three_ring_face();
    let mut session = target_session(
        Uuid::new_v4(),
        at(2025, 3, 8),
        &three_ring_spec(),
        &[(5.0, 0.0)],
    );
    session.spec_version = Some(1);
    let session_id = session.session_id;
    store.insert_session(session);

    let analysis = orchestrator(&store)
        .analyze_target(session_id, &CancellationToken::new())
        .await
        .unwrap();

    // Standard 18 m face: 2 cm rings, so 5 cm lands in ring 3
    assert_eq!(analysis.spec_version, 1);
    assert_eq!(analysis.arrows[0].shot.ring, 3);
    assert_eq!(analysis.arrows[0].shot.score, 8);
}

#[tokio::test]
async fn test_pinned_spec_version_errors() {
    let store = store_with_three_ring_face();
    let orchestrator = orchestrator(&store);
    let cancel = CancellationToken::new();

    let mut zero = target_session(
        Uuid::new_v4(),
        at(2025, 3, 8),
        &three_ring_spec(),
        &[(5.0, 0.0)],
    );
    zero.spec_version = Some(0);
    let zero_id = zero.session_id;
    store.insert_session(zero);

    let err = orchestrator.analyze_target(zero_id, &cancel).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ValueOutOfRange);
    assert!(err.code.is_client_error());
    assert_eq!(err.context.resource_id, Some(zero_id.to_string()));

    let mut unpublished = target_session(
        Uuid::new_v4(),
        at(2025, 3, 8),
        &three_ring_spec(),
        &[(5.0, 0.0)],
    );
    unpublished.spec_version = Some(9);
    let unpublished_id = unpublished.session_id;
    store.insert_session(unpublished);

    let err = orchestrator
        .analyze_target(unpublished_id, &cancel)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceNotFound);
    assert!(store.target_analysis(zero_id).is_none());
    assert!(store.target_analysis(unpublished_id).is_none());
}

#[tokio::test]
async fn test_batch_failures_are_isolated() {
    let store = store_with_three_ring_face();
    let session = target_session(
        Uuid::new_v4(),
        at(2025, 3, 8),
        &three_ring_spec(),
        &[(1.0, 0.0), (0.0, 1.0)],
    );
    let good = session.session_id;
    store.insert_session(session);
    let missing = Uuid::new_v4();

    let results = orchestrator(&store)
        .analyze_targets(&[missing, good], &CancellationToken::new())
        .await;

    assert_eq!(results.len(), 2);
    assert_eq!(
        results[0].as_ref().unwrap_err().code,
        ErrorCode::ResourceNotFound
    );
    assert_eq!(results[1].as_ref().unwrap().session_id, good);
}

#[tokio::test]
async fn test_motion_batch_consistency_is_symmetric() {
    let store = Arc::new(empty_store());
    let session_id = Uuid::new_v4();
    let first = capture(session_id, canonical_shot());
    let second = capture(session_id, shot_with_hold(15));
    let ids = [first.video_id, second.video_id];
    store.insert_capture(first);
    store.insert_capture(second);

    let results = orchestrator(&store)
        .analyze_motions(&ids, &CancellationToken::new())
        .await;
    let a = results[0].as_ref().unwrap();
    let b = results[1].as_ref().unwrap();

    assert!(a.consistency.estimated);
    assert!(b.consistency.estimated);
    assert!((a.consistency.value - b.consistency.value).abs() < 1e-9);
    assert!(a.consistency.value < 100.0);
    assert!(a.stability.estimated);
    assert_eq!(a.phases.len(), 5);

    assert_eq!(store.motion_result(ids[0]).as_ref(), Some(a));
    assert_eq!(store.motion_result(ids[1]).as_ref(), Some(b));
}

#[tokio::test]
async fn test_single_motion_compares_against_stored_results() {
    let store = Arc::new(empty_store());
    let session_id = Uuid::new_v4();
    let first = capture(session_id, canonical_shot());
    let second = capture(session_id, canonical_shot());
    let (first_id, second_id) = (first.video_id, second.video_id);
    store.insert_capture(first);
    store.insert_capture(second);
    let orchestrator = orchestrator(&store);
    let cancel = CancellationToken::new();

    let alone = orchestrator.analyze_motion(first_id, &cancel).await.unwrap();
    assert!(!alone.consistency.estimated);

    let compared = orchestrator.analyze_motion(second_id, &cancel).await.unwrap();
    assert!(compared.consistency.estimated);
    assert!((compared.consistency.value - 100.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_motion_errors_carry_video_id() {
    let store = Arc::new(empty_store());
    let session_id = Uuid::new_v4();
    let empty = capture(session_id, Vec::new());
    let empty_id = empty.video_id;
    store.insert_capture(empty);
    let missing = Uuid::new_v4();

    let results = orchestrator(&store)
        .analyze_motions(&[empty_id, missing], &CancellationToken::new())
        .await;

    let invalid = results[0].as_ref().unwrap_err();
    assert_eq!(invalid.code, ErrorCode::InvalidInput);
    assert_eq!(invalid.context.resource_id, Some(empty_id.to_string()));

    let not_found = results[1].as_ref().unwrap_err();
    assert_eq!(not_found.code, ErrorCode::ResourceNotFound);
    assert_eq!(not_found.context.resource_id, Some(missing.to_string()));
}

#[tokio::test]
async fn test_statistics_over_analysed_sessions() {
    let store = store_with_three_ring_face();
    let subject = Uuid::new_v4();
    let spec = three_ring_spec();
    let early = target_session(subject, at(2025, 2, 1), &spec, &[(1.0, 0.0), (12.0, 0.0)]);
    let late = target_session(subject, at(2025, 3, 8), &spec, &[(1.0, 0.0), (0.0, 1.0)]);
    let other = target_session(Uuid::new_v4(), at(2025, 3, 8), &spec, &[(1.0, 0.0)]);
    let ids = [early.session_id, late.session_id, other.session_id];
    for session in [early, late, other] {
        store.insert_session(session);
    }
    let orchestrator = orchestrator(&store);
    let cancel = CancellationToken::new();
    for result in orchestrator.analyze_targets(&ids, &cancel).await {
        result.unwrap();
    }

    let all = orchestrator
        .get_statistics_between(subject, at(2025, 1, 1), at(2025, 12, 31), &cancel)
        .await
        .unwrap();
    assert_eq!(all.session_count, 2);
    assert_eq!(all.total_shots, 4);
    assert_eq!(all.total_score, 38);
    assert_eq!(all.best_score, 10);
    assert_eq!(all.best_session_score, 20);
    assert!(all.improvement_estimated);
    assert!(all.improvement_rate > 0.0);

    let week = orchestrator
        .get_statistics_ending(subject, StatisticsPeriod::Week, at(2025, 3, 10), &cancel)
        .await
        .unwrap();
    assert_eq!(week.period, StatisticsPeriod::Week);
    assert_eq!(week.session_count, 1);
    assert_eq!(week.total_score, 20);

    assert_eq!(store.statistics_count(), 2);
}

#[tokio::test]
async fn test_statistics_argument_errors() {
    let store = store_with_three_ring_face();
    let orchestrator = orchestrator(&store);
    let cancel = CancellationToken::new();
    let subject = Uuid::new_v4();

    let custom = orchestrator
        .get_statistics(subject, StatisticsPeriod::Custom, &cancel)
        .await
        .unwrap_err();
    assert_eq!(custom.code, ErrorCode::InvalidInput);
    assert_eq!(custom.context.subject_id, Some(subject));

    let inverted = orchestrator
        .get_statistics_between(subject, at(2025, 3, 1), at(2025, 2, 1), &cancel)
        .await
        .unwrap_err();
    assert_eq!(inverted.code, ErrorCode::InvalidInput);

    let empty = orchestrator
        .get_default_statistics(subject, &cancel)
        .await
        .unwrap();
    assert_eq!(empty.period, StatisticsPeriod::Month);
    assert_eq!(empty.session_count, 0);
    assert!(!empty.consistency_estimated);

    cancel.cancel();
    let cancelled = orchestrator
        .get_statistics(subject, StatisticsPeriod::Year, &cancel)
        .await
        .unwrap_err();
    assert!(cancelled.is_cancelled());
    assert_eq!(store.statistics_count(), 1);
}

#[tokio::test]
async fn test_pool_size_is_reported() {
    let store = Arc::new(empty_store());
    assert_eq!(orchestrator(&store).pool_size(), 2);
}
