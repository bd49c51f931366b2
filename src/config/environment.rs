// ABOUTME: Runtime configuration for the analysis service read from environment variables
// ABOUTME: Worker pool sizing, default statistics window, deployment environment, and logging
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Environment-based runtime configuration

use crate::logging::LoggingConfig;
use anyhow::{Context, Result};
use archery_core::constants::env_config;
use archery_core::models::StatisticsPeriod;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::num::NonZeroUsize;
use std::thread;
use tracing::info;

/// Environment type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development
    #[default]
    Development,
    /// Production deployment
    Production,
    /// Test runs
    Testing,
}

impl Environment {
    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "testing" | "test" => Self::Testing,
            _ => Self::Development,
        }
    }

    /// Check if this is a production environment
    #[must_use]
    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
            Self::Testing => write!(f, "testing"),
        }
    }
}

/// Analysis service runtime configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Maximum analyses running at once
    pub worker_pool_size: NonZeroUsize,
    /// Window used when a statistics request names none
    pub default_period: StatisticsPeriod,
    /// Deployment environment
    pub environment: Environment,
    /// Logging setup
    pub logging: LoggingConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            worker_pool_size: default_pool_size(),
            default_period: StatisticsPeriod::Month,
            environment: Environment::Development,
            logging: LoggingConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a set variable cannot be parsed
    pub fn from_env() -> Result<Self> {
        let worker_pool_size = match env::var(env_config::WORKER_POOL_SIZE) {
            Ok(raw) => {
                let size: usize = raw
                    .trim()
                    .parse()
                    .with_context(|| format!("Invalid {} value", env_config::WORKER_POOL_SIZE))?;
                NonZeroUsize::new(size).unwrap_or(NonZeroUsize::MIN)
            }
            Err(_) => default_pool_size(),
        };

        let default_period = match env::var(env_config::DEFAULT_PERIOD) {
            Ok(raw) => raw
                .parse()
                .with_context(|| format!("Invalid {} value", env_config::DEFAULT_PERIOD))?,
            Err(_) => StatisticsPeriod::Month,
        };

        let environment = Environment::from_str_or_default(
            &env::var(env_config::ENVIRONMENT).unwrap_or_default(),
        );

        let config = Self {
            worker_pool_size,
            default_period,
            environment,
            logging: LoggingConfig::from_env(),
        };
        info!(
            workers = config.worker_pool_size.get(),
            period = %config.default_period,
            environment = %config.environment,
            "Loaded analysis service configuration"
        );
        Ok(config)
    }
}

fn default_pool_size() -> NonZeroUsize {
    thread::available_parallelism().unwrap_or(NonZeroUsize::MIN)
}
