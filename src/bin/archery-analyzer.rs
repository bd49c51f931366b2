// ABOUTME: Command-line front end for the archery analysis engines over a JSON fixture
// ABOUTME: Analyses target sessions, videos, and period statistics and prints JSON results
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org
//!
//! Usage:
//! ```bash
//! # Score and group one target session
//! archery-analyzer target --fixture sessions.json --session <uuid>
//!
//! # Segment every video recorded in a session
//! archery-analyzer motion --fixture sessions.json --session <uuid>
//!
//! # Monthly statistics ending at a given instant
//! archery-analyzer statistics --fixture sessions.json --subject <uuid> --period month --end 2025-06-30T23:59:59Z
//!
//! # List the available target faces
//! archery-analyzer specs
//! ```

use anyhow::{bail, Result};
use archery_analysis::config::environment::ServerConfig;
use archery_analysis::models::StatisticsPeriod;
use archery_analysis::orchestrator::{AnalysisOrchestrator, Collaborators, InMemoryStore};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Parser)]
#[command(
    name = "archery-analyzer",
    about = "Archery shot analysis",
    long_about = "Scores arrow groups, segments shot motion, and aggregates training statistics from a JSON fixture."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Score and group target sessions
    Target {
        /// Fixture file
        #[arg(long)]
        fixture: PathBuf,

        /// Session to analyse (all sessions in the fixture if omitted)
        #[arg(long)]
        session: Option<Uuid>,
    },

    /// Segment and score shot videos
    Motion {
        /// Fixture file
        #[arg(long)]
        fixture: PathBuf,

        /// A single video
        #[arg(long, conflicts_with = "session")]
        video: Option<Uuid>,

        /// Every video recorded in this session
        #[arg(long)]
        session: Option<Uuid>,
    },

    /// Period statistics for one archer
    Statistics {
        /// Fixture file
        #[arg(long)]
        fixture: PathBuf,

        /// Archer
        #[arg(long)]
        subject: Uuid,

        /// week, month, or year (defaults to ANALYSIS_DEFAULT_PERIOD)
        #[arg(long)]
        period: Option<StatisticsPeriod>,

        /// Inclusive start; makes the window custom
        #[arg(long, requires = "end")]
        start: Option<DateTime<Utc>>,

        /// Inclusive end (defaults to now)
        #[arg(long)]
        end: Option<DateTime<Utc>>,
    },

    /// List target faces
    Specs {
        /// Fixture with extra faces
        #[arg(long)]
        fixture: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = ServerConfig::from_env()?;
    if cli.verbose {
        config.logging = config.logging.verbose();
    }
    config.logging.init()?;

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling analyses");
            on_signal.cancel();
        }
    });

    match cli.command {
        Command::Target { fixture, session } => {
            run_target(&fixture, session, &config, &cancel).await
        }
        Command::Motion {
            fixture,
            video,
            session,
        } => run_motion(&fixture, video, session, &config, &cancel).await,
        Command::Statistics {
            fixture,
            subject,
            period,
            start,
            end,
        } => {
            let window = Window {
                period: period.unwrap_or(config.default_period),
                start,
                end: end.unwrap_or_else(Utc::now),
            };
            run_statistics(&fixture, subject, window, &config, &cancel).await
        }
        Command::Specs { fixture } => run_specs(fixture.as_deref()).await,
    }
}

/// Statistics window requested on the command line
struct Window {
    period: StatisticsPeriod,
    start: Option<DateTime<Utc>>,
    end: DateTime<Utc>,
}

async fn run_target(
    fixture: &Path,
    session: Option<Uuid>,
    config: &ServerConfig,
    cancel: &CancellationToken,
) -> Result<()> {
    let (store, orchestrator) = load(fixture, config).await?;
    let ids = session.map_or_else(|| store.all_session_ids(), |id| vec![id]);
    let mut analyses = Vec::with_capacity(ids.len());
    for result in orchestrator.analyze_targets(&ids, cancel).await {
        analyses.push(result?);
    }
    print_json(&analyses)
}

async fn run_motion(
    fixture: &Path,
    video: Option<Uuid>,
    session: Option<Uuid>,
    config: &ServerConfig,
    cancel: &CancellationToken,
) -> Result<()> {
    let (store, orchestrator) = load(fixture, config).await?;
    let ids = match (video, session) {
        (Some(video), _) => vec![video],
        (None, Some(session)) => store.video_ids_for(session),
        (None, None) => bail!("Pass --video or --session"),
    };
    let mut results = Vec::with_capacity(ids.len());
    for result in orchestrator.analyze_motions(&ids, cancel).await {
        results.push(result?);
    }
    print_json(&results)
}

async fn run_statistics(
    fixture: &Path,
    subject: Uuid,
    window: Window,
    config: &ServerConfig,
    cancel: &CancellationToken,
) -> Result<()> {
    let (store, orchestrator) = load(fixture, config).await?;
    let sessions = store.session_ids_for(subject);
    info!(sessions = sessions.len(), "Analysing sessions before aggregation");
    for result in orchestrator.analyze_targets(&sessions, cancel).await {
        if let Err(e) = result {
            warn!(error = %e, "Session skipped");
        }
    }

    let statistics = match window.start {
        Some(start) => {
            orchestrator
                .get_statistics_between(subject, start, window.end, cancel)
                .await?
        }
        None => {
            orchestrator
                .get_statistics_ending(subject, window.period, window.end, cancel)
                .await?
        }
    };
    print_json(&statistics)
}

async fn run_specs(fixture: Option<&Path>) -> Result<()> {
    let store = match fixture {
        Some(path) => InMemoryStore::load_json_file(path).await?,
        None => InMemoryStore::new()?,
    };
    let specs: Vec<_> = store
        .catalog()
        .latest()
        .iter()
        .map(|spec| spec.as_ref().clone())
        .collect();
    print_json(&specs)
}

async fn load(
    fixture: &Path,
    config: &ServerConfig,
) -> Result<(Arc<InMemoryStore>, AnalysisOrchestrator)> {
    let store = Arc::new(InMemoryStore::load_json_file(fixture).await?);
    let orchestrator = AnalysisOrchestrator::new(Collaborators::single(Arc::clone(&store)), config);
    Ok((store, orchestrator))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
