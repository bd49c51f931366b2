// ABOUTME: In-memory implementation of every collaborator, loadable from a JSON fixture
// ABOUTME: Backs the CLI and tests; enforces at-most-once storage by content key
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use super::collaborators::{
    MotionCapture, PoseSource, ResultSink, SessionStore, TargetSession, TargetSpecSource,
    WeatherProvider,
};
use archery_core::errors::{AppError, AppResult};
use archery_core::models::{
    MotionResult, PeriodStatistics, StatisticsPeriod, TargetAnalysis, TargetSpec, TargetSpecKey,
    WeatherConditions,
};
use archery_intelligence::TargetSpecCatalog;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::{DashMap, DashSet};
use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, info};
use uuid::Uuid;

/// Weather recorded for one session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionWeather {
    /// Session ID
    pub session_id: Uuid,
    /// Conditions during the session
    pub conditions: WeatherConditions,
}

/// JSON document an [`InMemoryStore`] can be seeded from
///
/// Every section is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreFixture {
    /// Extra faces published on top of the standard ones
    #[serde(default)]
    pub target_specs: Vec<TargetSpec>,
    /// Target sessions
    #[serde(default)]
    pub sessions: Vec<TargetSession>,
    /// Pose streams
    #[serde(default)]
    pub captures: Vec<MotionCapture>,
    /// Weather by session
    #[serde(default)]
    pub weather: Vec<SessionWeather>,
    /// Previously completed target analyses
    #[serde(default)]
    pub analyses: Vec<TargetAnalysis>,
}

type StatisticsKey = (Uuid, StatisticsPeriod, DateTime<Utc>, DateTime<Utc>);

/// Concurrent in-process store
#[derive(Debug, Default)]
pub struct InMemoryStore {
    catalog: TargetSpecCatalog,
    sessions: DashMap<Uuid, TargetSession>,
    captures: DashMap<Uuid, MotionCapture>,
    weather: DashMap<Uuid, WeatherConditions>,
    target_results: DashMap<Uuid, TargetAnalysis>,
    motion_results: DashMap<Uuid, MotionResult>,
    statistics: DashMap<StatisticsKey, PeriodStatistics>,
    content_keys: DashSet<String>,
}

impl InMemoryStore {
    /// Store preloaded with the standard target faces
    ///
    /// # Errors
    ///
    /// Returns an error if a built-in face fails validation
    pub fn new() -> AppResult<Self> {
        Ok(Self {
            catalog: TargetSpecCatalog::with_standard_faces()?,
            ..Self::default()
        })
    }

    /// Standard faces plus the contents of `fixture`
    ///
    /// # Errors
    ///
    /// Returns an error if a built-in face fails validation
    pub fn from_fixture(fixture: StoreFixture) -> AppResult<Self> {
        let store = Self::new()?;
        for spec in fixture.target_specs {
            store.catalog.publish(spec);
        }
        for session in fixture.sessions {
            store.insert_session(session);
        }
        for capture in fixture.captures {
            store.insert_capture(capture);
        }
        for entry in fixture.weather {
            store.insert_weather(entry.session_id, entry.conditions);
        }
        for analysis in fixture.analyses {
            store.content_keys.insert(analysis.content_key.clone());
            store.target_results.insert(analysis.session_id, analysis);
        }
        Ok(store)
    }

    /// Parse a fixture from JSON text
    ///
    /// # Errors
    ///
    /// Returns a serialization error for malformed JSON, or `InvalidInput`
    /// when an embedded target spec fails validation
    pub fn from_json_str(json: &str) -> AppResult<Self> {
        let fixture: StoreFixture = serde_json::from_str(json)?;
        Self::from_fixture(fixture)
    }

    /// Read and parse a fixture file
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for a missing file, `ExternalServiceError` when
    /// an existing file cannot be read, or a parse error
    pub async fn load_json_file(path: &Path) -> AppResult<Self> {
        let json = fs::read_to_string(path).await.map_err(|e| {
            let error = if e.kind() == io::ErrorKind::NotFound {
                AppError::invalid_input(format!("Fixture {} does not exist", path.display()))
            } else {
                AppError::external_service(
                    "fixture store",
                    format!("Cannot read {}", path.display()),
                )
            };
            error.with_source(e)
        })?;
        let store = Self::from_json_str(&json)?;
        info!(
            path = %path.display(),
            sessions = store.sessions.len(),
            captures = store.captures.len(),
            analyses = store.target_results.len(),
            "Loaded fixture"
        );
        Ok(store)
    }

    /// Versioned face catalog
    #[must_use]
    pub const fn catalog(&self) -> &TargetSpecCatalog {
        &self.catalog
    }

    /// Add or replace a target session
    pub fn insert_session(&self, session: TargetSession) {
        self.sessions.insert(session.session_id, session);
    }

    /// Add or replace a pose stream
    pub fn insert_capture(&self, capture: MotionCapture) {
        self.captures.insert(capture.video_id, capture);
    }

    /// Record weather for a session
    pub fn insert_weather(&self, session_id: Uuid, conditions: WeatherConditions) {
        self.weather.insert(session_id, conditions);
    }

    /// Every session ID, sorted
    #[must_use]
    pub fn all_session_ids(&self) -> Vec<Uuid> {
        let mut ids: Vec<Uuid> = self.sessions.iter().map(|entry| *entry.key()).collect();
        ids.sort_unstable();
        ids
    }

    /// Session IDs belonging to `subject_id`, sorted
    #[must_use]
    pub fn session_ids_for(&self, subject_id: Uuid) -> Vec<Uuid> {
        let mut ids: Vec<Uuid> = self
            .sessions
            .iter()
            .filter(|entry| entry.subject_id == subject_id)
            .map(|entry| *entry.key())
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Video IDs recorded in `session_id`, sorted
    #[must_use]
    pub fn video_ids_for(&self, session_id: Uuid) -> Vec<Uuid> {
        let mut ids: Vec<Uuid> = self
            .captures
            .iter()
            .filter(|entry| entry.session_id == session_id)
            .map(|entry| *entry.key())
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Stored analysis for a session
    #[must_use]
    pub fn target_analysis(&self, session_id: Uuid) -> Option<TargetAnalysis> {
        self.target_results.get(&session_id).map(|r| r.clone())
    }

    /// Stored motion result for a video
    #[must_use]
    pub fn motion_result(&self, video_id: Uuid) -> Option<MotionResult> {
        self.motion_results.get(&video_id).map(|r| r.clone())
    }

    /// Number of stored statistics snapshots
    #[must_use]
    pub fn statistics_count(&self) -> usize {
        self.statistics.len()
    }
}

#[async_trait]
impl TargetSpecSource for InMemoryStore {
    async fn target_spec(&self, key: TargetSpecKey) -> AppResult<Arc<TargetSpec>> {
        self.catalog
            .lookup(key)
            .ok_or_else(|| AppError::not_found(format!("Target spec {key}")))
    }

    async fn target_spec_version(
        &self,
        key: TargetSpecKey,
        version: u32,
    ) -> AppResult<Arc<TargetSpec>> {
        if version == 0 {
            return Err(AppError::out_of_range(format!(
                "Target spec {key} version 0: versions start at 1"
            )));
        }
        self.catalog
            .lookup_version(key, version)
            .ok_or_else(|| AppError::not_found(format!("Target spec {key} version {version}")))
    }
}

#[async_trait]
impl SessionStore for InMemoryStore {
    async fn target_session(&self, session_id: Uuid) -> AppResult<TargetSession> {
        self.sessions
            .get(&session_id)
            .map(|s| s.clone())
            .ok_or_else(|| AppError::not_found(format!("Target session {session_id}")))
    }

    async fn completed_analyses(
        &self,
        subject_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<TargetAnalysis>> {
        Ok(self
            .target_results
            .iter()
            .filter(|a| a.subject_id == subject_id && start <= a.recorded_at && a.recorded_at <= end)
            .map(|a| a.clone())
            .collect())
    }

    async fn motion_results(&self, session_id: Uuid) -> AppResult<Vec<MotionResult>> {
        let mut results: Vec<MotionResult> = self
            .motion_results
            .iter()
            .filter(|r| r.session_id == session_id)
            .map(|r| r.clone())
            .collect();
        results.sort_by_key(|r| r.video_id);
        Ok(results)
    }
}

#[async_trait]
impl PoseSource for InMemoryStore {
    async fn pose_capture(&self, video_id: Uuid) -> AppResult<MotionCapture> {
        self.captures
            .get(&video_id)
            .map(|c| c.clone())
            .ok_or_else(|| AppError::not_found(format!("Pose capture for video {video_id}")))
    }
}

#[async_trait]
impl WeatherProvider for InMemoryStore {
    async fn session_weather(&self, session_id: Uuid) -> AppResult<Option<WeatherConditions>> {
        Ok(self.weather.get(&session_id).map(|w| w.clone()))
    }
}

#[async_trait]
impl ResultSink for InMemoryStore {
    async fn store_target_analysis(&self, analysis: &TargetAnalysis) -> AppResult<bool> {
        if !self.content_keys.insert(analysis.content_key.clone()) {
            debug!(session_id = %analysis.session_id, "Target analysis already stored");
            return Ok(false);
        }
        self.target_results
            .insert(analysis.session_id, analysis.clone());
        Ok(true)
    }

    async fn store_motion_result(&self, result: &MotionResult) -> AppResult<bool> {
        if !self.content_keys.insert(result.content_key.clone()) {
            debug!(video_id = %result.video_id, "Motion result already stored");
            return Ok(false);
        }
        self.motion_results.insert(result.video_id, result.clone());
        Ok(true)
    }

    async fn store_statistics(&self, statistics: &PeriodStatistics) -> AppResult<bool> {
        let key = (
            statistics.subject_id,
            statistics.period,
            statistics.period_start,
            statistics.period_end,
        );
        self.statistics.insert(key, statistics.clone());
        Ok(true)
    }
}
