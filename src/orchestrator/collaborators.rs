// ABOUTME: Interfaces of the external collaborators that feed and persist analyses
// ABOUTME: Reference data, sessions, pose streams, weather, and result storage
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Collaborator traits
//!
//! The orchestrator performs no storage or network I/O itself. Everything it
//! reads or writes goes through these traits; `NotFound` and I/O failures are
//! theirs to report.

use archery_core::errors::AppResult;
use archery_core::models::{
    ArrowImpact, MotionResult, PeriodStatistics, PoseFrame, TargetAnalysis, TargetSpec,
    TargetSpecKey, WeatherConditions,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// A recorded target session awaiting analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetSession {
    /// Session ID
    pub session_id: Uuid,
    /// Archer
    pub subject_id: Uuid,
    /// When the session was shot
    pub recorded_at: DateTime<Utc>,
    /// Target face shot at
    pub target: TargetSpecKey,
    /// Pin scoring to a specific reference data version; latest when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec_version: Option<u32>,
    /// Arrow impacts in shot order
    #[serde(default)]
    pub arrows: Vec<ArrowImpact>,
}

/// Pose stream extracted from one video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotionCapture {
    /// Video ID
    pub video_id: Uuid,
    /// Session the video was recorded in
    pub session_id: Uuid,
    /// Time-ordered frames
    pub frames: Vec<PoseFrame>,
}

/// Target face reference data lookups
#[async_trait]
pub trait TargetSpecSource: Send + Sync {
    /// Latest spec for `key`
    async fn target_spec(&self, key: TargetSpecKey) -> AppResult<Arc<TargetSpec>>;

    /// A specific published version of `key`
    async fn target_spec_version(
        &self,
        key: TargetSpecKey,
        version: u32,
    ) -> AppResult<Arc<TargetSpec>>;
}

/// Session and historical result reads
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// A target session with its arrows
    async fn target_session(&self, session_id: Uuid) -> AppResult<TargetSession>;

    /// Completed target analyses for a subject recorded in `[start, end]`
    async fn completed_analyses(
        &self,
        subject_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<TargetAnalysis>>;

    /// Motion results already stored for a session
    async fn motion_results(&self, session_id: Uuid) -> AppResult<Vec<MotionResult>>;
}

/// Pose keypoint producer
#[async_trait]
pub trait PoseSource: Send + Sync {
    /// Frames extracted from a video
    async fn pose_capture(&self, video_id: Uuid) -> AppResult<MotionCapture>;
}

/// Optional ambient conditions
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Conditions during a session, `None` when unknown
    async fn session_weather(&self, session_id: Uuid) -> AppResult<Option<WeatherConditions>>;
}

/// Persistence for analysis results
///
/// Each `store_*` returns `false` when a result with the same content key is
/// already stored, leaving the earlier one untouched.
#[async_trait]
pub trait ResultSink: Send + Sync {
    /// Persist a target analysis
    async fn store_target_analysis(&self, analysis: &TargetAnalysis) -> AppResult<bool>;

    /// Persist a motion result
    async fn store_motion_result(&self, result: &MotionResult) -> AppResult<bool>;

    /// Persist period statistics, replacing any for the same subject and window
    async fn store_statistics(&self, statistics: &PeriodStatistics) -> AppResult<bool>;
}

/// The full set of collaborators an orchestrator talks to
#[derive(Clone)]
pub struct Collaborators {
    /// Target face lookups
    pub specs: Arc<dyn TargetSpecSource>,
    /// Sessions and history
    pub sessions: Arc<dyn SessionStore>,
    /// Pose streams
    pub poses: Arc<dyn PoseSource>,
    /// Weather
    pub weather: Arc<dyn WeatherProvider>,
    /// Result persistence
    pub sink: Arc<dyn ResultSink>,
}

impl Collaborators {
    /// Use one value for every role
    pub fn single<T>(store: Arc<T>) -> Self
    where
        T: TargetSpecSource + SessionStore + PoseSource + WeatherProvider + ResultSink + 'static,
    {
        Self {
            specs: store.clone(),
            sessions: store.clone(),
            poses: store.clone(),
            weather: store.clone(),
            sink: store,
        }
    }
}
