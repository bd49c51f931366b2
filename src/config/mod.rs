// ABOUTME: Configuration module for the analysis service runtime
// ABOUTME: Engine thresholds live in archery-intelligence; this covers pool, period, and logging
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

/// Environment and server configuration
pub mod environment;

pub use archery_intelligence::config::{ConfigError, IntelligenceConfig};
pub use environment::{Environment, ServerConfig};
