// ABOUTME: Analysis orchestrator coordinating the engines per target session, video, and subject
// ABOUTME: Bounded worker pool, cooperative cancellation, content keys, and result persistence
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # Analysis Orchestrator
//!
//! Public entry points of the analysis service. Each call fetches its inputs
//! from the [`Collaborators`], runs the CPU-bound engines on the blocking pool
//! while holding a worker permit, stamps the result with a content key, and
//! hands it to the [`ResultSink`](collaborators::ResultSink).
//!
//! A call whose cancellation token fires returns `Cancelled` and persists
//! nothing, even if the computation itself had already finished.

/// Collaborator traits and the data they exchange
pub mod collaborators;
/// Input fingerprints for at-most-once persistence
pub mod content_key;
/// In-memory collaborator implementation
pub mod memory;

pub use collaborators::{
    Collaborators, MotionCapture, PoseSource, ResultSink, SessionStore, TargetSession,
    TargetSpecSource, WeatherProvider,
};
pub use content_key::content_key;
pub use memory::{InMemoryStore, SessionWeather, StoreFixture};

use crate::config::environment::ServerConfig;
use crate::logging::AnalysisLogger;
use archery_core::errors::{AppError, AppResult};
use archery_core::models::{
    MotionResult, PeriodStatistics, PhaseSegment, PoseFrame, StatisticsPeriod, TargetAnalysis,
    TargetSpec, WeatherConditions,
};
use archery_intelligence::{
    ArrowScorer, GroupingAnalyzer, IntelligenceConfig, MotionScorer, PeriodWindow,
    PhaseSegmenter, SegmentationOutcome, StatisticsAggregator,
};
use chrono::{DateTime, Utc};
use serde_json::json;
use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::{self, JoinError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

const TARGET_ANALYSIS: &str = "Target analysis";
const MOTION_ANALYSIS: &str = "Motion analysis";
const STATISTICS: &str = "Statistics aggregation";

/// The analysis engines configured once per orchestrator
struct Engines {
    scorer: ArrowScorer,
    grouping: GroupingAnalyzer,
    segmenter: PhaseSegmenter,
    motion: MotionScorer,
    statistics: StatisticsAggregator,
}

impl Engines {
    fn from_config(config: &IntelligenceConfig) -> Self {
        Self {
            scorer: ArrowScorer::with_config(config.scoring.clone()),
            grouping: GroupingAnalyzer::with_config(config.grouping.clone()),
            segmenter: PhaseSegmenter::with_config(config.segmentation.clone()),
            motion: MotionScorer::with_config(config.motion.clone()),
            statistics: StatisticsAggregator::with_config(config.statistics.clone()),
        }
    }

    fn analyze_target(
        &self,
        session: &TargetSession,
        spec: &TargetSpec,
        weather: Option<&WeatherConditions>,
    ) -> AppResult<TargetAnalysis> {
        let arrows = self.scorer.score_arrows(&session.arrows, spec)?;
        let grouping = self.grouping.analyze(&arrows, spec, weather)?;
        let key = content_key(
            "target",
            &json!({
                "session_id": session.session_id,
                "subject_id": session.subject_id,
                "recorded_at": session.recorded_at,
                "target": session.target,
                "arrows": session.arrows,
                "weather": weather,
            }),
            spec.version(),
        )?;

        Ok(TargetAnalysis {
            session_id: session.session_id,
            subject_id: session.subject_id,
            recorded_at: session.recorded_at,
            target: spec.key(),
            spec_version: spec.version(),
            max_arrow_score: spec.max_score(),
            arrows,
            grouping,
            content_key: key,
        })
    }

    fn score_motion(
        &self,
        shot: SegmentedShot,
        peers: &[(Uuid, Vec<PhaseSegment>)],
    ) -> AppResult<MotionResult> {
        let peer_phases: Vec<&[PhaseSegment]> =
            peers.iter().map(|(_, phases)| phases.as_slice()).collect();
        let outcome = shot.outcome;
        let score = self
            .motion
            .score(&outcome.phases, &outcome.trajectory, &peer_phases);
        let key = content_key(
            "motion",
            &json!({
                "video_id": shot.video_id,
                "session_id": shot.session_id,
                "frames": shot.frames,
                "peers": peer_phases,
            }),
            0,
        )?;

        Ok(MotionResult {
            video_id: shot.video_id,
            session_id: shot.session_id,
            phases: outcome.phases,
            trajectory: outcome.trajectory,
            interval_start: outcome.interval_start,
            interval_end: outcome.interval_end,
            frames_trimmed: outcome.frames_trimmed,
            stability: score.stability,
            consistency: score.consistency,
            recommendations: score.recommendations,
            content_key: key,
        })
    }
}

/// One video after segmentation, before motion scoring
struct SegmentedShot {
    video_id: Uuid,
    session_id: Uuid,
    frames: Vec<PoseFrame>,
    outcome: SegmentationOutcome,
}

/// Coordinates analyses across a bounded worker pool
#[derive(Clone)]
pub struct AnalysisOrchestrator {
    collaborators: Collaborators,
    engines: Arc<Engines>,
    permits: Arc<Semaphore>,
    pool_size: usize,
    default_period: StatisticsPeriod,
}

impl AnalysisOrchestrator {
    /// Create an orchestrator from runtime configuration and the global
    /// engine configuration
    #[must_use]
    pub fn new(collaborators: Collaborators, config: &ServerConfig) -> Self {
        Self::with_intelligence_config(
            collaborators,
            config.worker_pool_size,
            IntelligenceConfig::global(),
        )
        .with_default_period(config.default_period)
    }

    /// Create an orchestrator with explicit engine configuration
    #[must_use]
    pub fn with_intelligence_config(
        collaborators: Collaborators,
        pool_size: NonZeroUsize,
        config: &IntelligenceConfig,
    ) -> Self {
        info!(workers = pool_size.get(), "Analysis orchestrator ready");
        Self {
            collaborators,
            engines: Arc::new(Engines::from_config(config)),
            permits: Arc::new(Semaphore::new(pool_size.get())),
            pool_size: pool_size.get(),
            default_period: StatisticsPeriod::Month,
        }
    }

    /// Window used by [`Self::get_default_statistics`]
    #[must_use]
    pub fn with_default_period(mut self, period: StatisticsPeriod) -> Self {
        self.default_period = period;
        self
    }

    /// Maximum analyses running at once
    #[must_use]
    pub const fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Score and group the arrows of one target session
    ///
    /// # Errors
    ///
    /// Returns collaborator errors unchanged, `InvalidInput` for malformed
    /// arrows or weather, and `Cancelled` when `cancel` fires
    pub async fn analyze_target(
        &self,
        session_id: Uuid,
        cancel: &CancellationToken,
    ) -> AppResult<TargetAnalysis> {
        let started = Instant::now();
        let result = self.run_target(session_id, cancel).await;
        AnalysisLogger::log_analysis(
            "target",
            &session_id.to_string(),
            result.is_ok(),
            elapsed_ms(started),
        );
        result.map_err(|e| e.with_resource_id(session_id.to_string()))
    }

    async fn run_target(
        &self,
        session_id: Uuid,
        cancel: &CancellationToken,
    ) -> AppResult<TargetAnalysis> {
        let _permit = self.acquire(cancel, TARGET_ANALYSIS).await?;

        let session = self.collaborators.sessions.target_session(session_id).await?;
        let spec = match session.spec_version {
            Some(version) => {
                self.collaborators
                    .specs
                    .target_spec_version(session.target, version)
                    .await?
            }
            None => self.collaborators.specs.target_spec(session.target).await?,
        };
        let weather = self.collaborators.weather.session_weather(session_id).await?;
        ensure_active(cancel, TARGET_ANALYSIS)?;

        let engines = Arc::clone(&self.engines);
        let analysis = run_blocking(TARGET_ANALYSIS, move || {
            engines.analyze_target(&session, &spec, weather.as_ref())
        })
        .await?;

        ensure_active(cancel, TARGET_ANALYSIS)?;
        let stored = self
            .collaborators
            .sink
            .store_target_analysis(&analysis)
            .await?;
        debug!(
            session_id = %session_id,
            arrows = analysis.arrows.len(),
            pattern = %analysis.grouping.pattern.as_str(),
            stored,
            "Target session analysed"
        );
        Ok(analysis)
    }

    /// Analyse several target sessions concurrently
    ///
    /// Results are returned in input order; one failure does not affect the
    /// others.
    pub async fn analyze_targets(
        &self,
        session_ids: &[Uuid],
        cancel: &CancellationToken,
    ) -> Vec<AppResult<TargetAnalysis>> {
        let handles: Vec<_> = session_ids
            .iter()
            .map(|&session_id| {
                let this = self.clone();
                let cancel = cancel.clone();
                tokio::spawn(async move { this.analyze_target(session_id, &cancel).await })
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            results.push(flatten_join(handle.await, TARGET_ANALYSIS));
        }
        results
    }

    /// Segment and score one video
    ///
    /// Consistency compares against motion results already stored for the
    /// same session.
    ///
    /// # Errors
    ///
    /// Returns collaborator errors unchanged, `InvalidInput` for a malformed
    /// pose stream, and `Cancelled` when `cancel` fires
    pub async fn analyze_motion(
        &self,
        video_id: Uuid,
        cancel: &CancellationToken,
    ) -> AppResult<MotionResult> {
        self.analyze_motions(&[video_id], cancel)
            .await
            .pop()
            .unwrap_or_else(|| Err(AppError::internal("Motion batch returned no result")))
    }

    /// Segment and score several videos
    ///
    /// Videos from the same session are compared with each other and with
    /// results already stored for that session, so consistency does not
    /// depend on completion order. Results are returned in input order.
    pub async fn analyze_motions(
        &self,
        video_ids: &[Uuid],
        cancel: &CancellationToken,
    ) -> Vec<AppResult<MotionResult>> {
        let started = Instant::now();
        let handles: Vec<_> = video_ids
            .iter()
            .map(|&video_id| {
                let this = self.clone();
                let cancel = cancel.clone();
                tokio::spawn(async move { this.segment_video(video_id, &cancel).await })
            })
            .collect();

        let mut segmented = Vec::with_capacity(handles.len());
        for handle in handles {
            segmented.push(flatten_join(handle.await, MOTION_ANALYSIS));
        }

        let batch_ids: HashSet<Uuid> = video_ids.iter().copied().collect();
        let batch_peers: Vec<Vec<(Uuid, Vec<PhaseSegment>)>> = segmented
            .iter()
            .enumerate()
            .map(|(index, shot)| match shot {
                Ok(shot) => segmented
                    .iter()
                    .enumerate()
                    .filter(|(other, _)| *other != index)
                    .filter_map(|(_, peer)| peer.as_ref().ok())
                    .filter(|peer| {
                        peer.session_id == shot.session_id && peer.video_id != shot.video_id
                    })
                    .map(|peer| (peer.video_id, peer.outcome.phases.clone()))
                    .collect(),
                Err(_) => Vec::new(),
            })
            .collect();

        let mut results = Vec::with_capacity(segmented.len());
        for (index, (shot, peers)) in segmented.into_iter().zip(batch_peers).enumerate() {
            let video_id = video_ids.get(index).copied().unwrap_or_default();
            let result = match shot {
                Ok(shot) => self.finish_motion(shot, peers, &batch_ids, cancel).await,
                Err(e) => Err(e),
            };
            AnalysisLogger::log_analysis(
                "motion",
                &video_id.to_string(),
                result.is_ok(),
                elapsed_ms(started),
            );
            results.push(result.map_err(|e| e.with_resource_id(video_id.to_string())));
        }
        results
    }

    async fn segment_video(
        &self,
        video_id: Uuid,
        cancel: &CancellationToken,
    ) -> AppResult<SegmentedShot> {
        let _permit = self.acquire(cancel, MOTION_ANALYSIS).await?;
        let capture = self.collaborators.poses.pose_capture(video_id).await?;
        ensure_active(cancel, MOTION_ANALYSIS)?;

        let engines = Arc::clone(&self.engines);
        let token = cancel.clone();
        run_blocking(MOTION_ANALYSIS, move || {
            let outcome = engines.segmenter.segment(&capture.frames, &token)?;
            Ok(SegmentedShot {
                video_id: capture.video_id,
                session_id: capture.session_id,
                frames: capture.frames,
                outcome,
            })
        })
        .await
    }

    async fn finish_motion(
        &self,
        shot: SegmentedShot,
        mut peers: Vec<(Uuid, Vec<PhaseSegment>)>,
        batch_ids: &HashSet<Uuid>,
        cancel: &CancellationToken,
    ) -> AppResult<MotionResult> {
        let _permit = self.acquire(cancel, MOTION_ANALYSIS).await?;
        let stored = self
            .collaborators
            .sessions
            .motion_results(shot.session_id)
            .await?;
        peers.extend(
            stored
                .into_iter()
                .filter(|r| r.video_id != shot.video_id && !batch_ids.contains(&r.video_id))
                .map(|r| (r.video_id, r.phases)),
        );
        peers.sort_by_key(|(video_id, _)| *video_id);
        ensure_active(cancel, MOTION_ANALYSIS)?;

        let engines = Arc::clone(&self.engines);
        let result = run_blocking(MOTION_ANALYSIS, move || engines.score_motion(shot, &peers)).await?;

        ensure_active(cancel, MOTION_ANALYSIS)?;
        let stored = self.collaborators.sink.store_motion_result(&result).await?;
        debug!(
            video_id = %result.video_id,
            phases = result.phases.len(),
            frames_trimmed = result.frames_trimmed,
            stored,
            "Video analysed"
        );
        Ok(result)
    }

    /// Statistics for a preset period ending now
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for [`StatisticsPeriod::Custom`], which has no
    /// intrinsic bounds (use [`Self::get_statistics_between`]), collaborator
    /// errors unchanged, and `Cancelled` when `cancel` fires
    pub async fn get_statistics(
        &self,
        subject_id: Uuid,
        period: StatisticsPeriod,
        cancel: &CancellationToken,
    ) -> AppResult<PeriodStatistics> {
        self.get_statistics_ending(subject_id, period, Utc::now(), cancel)
            .await
    }

    /// Statistics for a preset period ending at `end`
    ///
    /// # Errors
    ///
    /// See [`Self::get_statistics`]
    pub async fn get_statistics_ending(
        &self,
        subject_id: Uuid,
        period: StatisticsPeriod,
        end: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> AppResult<PeriodStatistics> {
        if period == StatisticsPeriod::Custom {
            return Err(AppError::invalid_input(
                "Custom statistics periods need explicit start and end bounds",
            )
            .with_subject_id(subject_id));
        }
        self.aggregate(subject_id, PeriodWindow::ending(period, end), cancel)
            .await
    }

    /// Statistics for the configured default period ending now
    ///
    /// # Errors
    ///
    /// See [`Self::get_statistics`]
    pub async fn get_default_statistics(
        &self,
        subject_id: Uuid,
        cancel: &CancellationToken,
    ) -> AppResult<PeriodStatistics> {
        self.get_statistics(subject_id, self.default_period, cancel)
            .await
    }

    /// Statistics for caller-supplied inclusive bounds
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` when `start` is after `end`, collaborator errors
    /// unchanged, and `Cancelled` when `cancel` fires
    pub async fn get_statistics_between(
        &self,
        subject_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> AppResult<PeriodStatistics> {
        if start > end {
            return Err(AppError::invalid_input(format!(
                "Period start {start} is after period end {end}"
            ))
            .with_subject_id(subject_id));
        }
        self.aggregate(subject_id, PeriodWindow::custom(start, end), cancel)
            .await
    }

    async fn aggregate(
        &self,
        subject_id: Uuid,
        window: PeriodWindow,
        cancel: &CancellationToken,
    ) -> AppResult<PeriodStatistics> {
        let started = Instant::now();
        let result = self.run_aggregate(subject_id, window, cancel).await;
        AnalysisLogger::log_analysis(
            "statistics",
            &subject_id.to_string(),
            result.is_ok(),
            elapsed_ms(started),
        );
        result
    }

    async fn run_aggregate(
        &self,
        subject_id: Uuid,
        window: PeriodWindow,
        cancel: &CancellationToken,
    ) -> AppResult<PeriodStatistics> {
        let _permit = self.acquire(cancel, STATISTICS).await?;
        let sessions = self
            .collaborators
            .sessions
            .completed_analyses(subject_id, window.start, window.end)
            .await?;
        ensure_active(cancel, STATISTICS)?;

        let engines = Arc::clone(&self.engines);
        let token = cancel.clone();
        let statistics = run_blocking(STATISTICS, move || {
            engines
                .statistics
                .aggregate(subject_id, window, &sessions, &token)
        })
        .await?;

        ensure_active(cancel, STATISTICS)?;
        self.collaborators.sink.store_statistics(&statistics).await?;
        Ok(statistics)
    }

    /// Wait for a worker permit unless cancelled first
    async fn acquire(
        &self,
        cancel: &CancellationToken,
        operation: &str,
    ) -> AppResult<OwnedSemaphorePermit> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(AppError::cancelled(operation)),
            permit = Arc::clone(&self.permits).acquire_owned() => {
                permit.map_err(|e| AppError::internal(format!("Worker pool closed: {e}")))
            }
        }
    }
}

fn ensure_active(cancel: &CancellationToken, operation: &str) -> AppResult<()> {
    if cancel.is_cancelled() {
        return Err(AppError::cancelled(operation));
    }
    Ok(())
}

/// Run CPU-bound engine work off the async executor
async fn run_blocking<T, F>(operation: &'static str, work: F) -> AppResult<T>
where
    F: FnOnce() -> AppResult<T> + Send + 'static,
    T: Send + 'static,
{
    flatten_join(task::spawn_blocking(work).await, operation)
}

fn flatten_join<T>(joined: Result<AppResult<T>, JoinError>, operation: &str) -> AppResult<T> {
    joined.unwrap_or_else(|e| Err(AppError::internal(format!("{operation} task failed: {e}"))))
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
