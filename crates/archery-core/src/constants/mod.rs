// ABOUTME: Constants module with domain-separated organization
// ABOUTME: Pure data constants shared by the engines, orchestrator, and CLI
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Constants module
//!
//! Constants are grouped into logical domains rather than being in a single
//! large list. Tunable analysis thresholds live in the intelligence crate's
//! configuration, not here.

/// Service identification used in structured logs
pub mod service_names {
    /// Name of the analysis service
    pub const ARCHERY_ANALYSIS: &str = "archery-analysis";
}

/// Colour zone names painted on standard faces
pub mod zone_colors {
    /// Innermost zone (10/9 on a ten-ring face)
    pub const GOLD: &str = "gold";
    /// 8/7 zone
    pub const RED: &str = "red";
    /// 6/5 zone
    pub const BLUE: &str = "blue";
    /// 4/3 zone
    pub const BLACK: &str = "black";
    /// 2/1 zone
    pub const WHITE: &str = "white";
    /// Field face centre spot
    pub const YELLOW: &str = "yellow";
    /// Reported for impacts outside the outermost ring
    pub const MISS: &str = "miss";
}

/// Environment variable names read at start-up
pub mod env_config {
    /// Worker pool size for concurrent analyses
    pub const WORKER_POOL_SIZE: &str = "ANALYSIS_WORKER_POOL_SIZE";
    /// Default statistics window (`week`, `month`, `year`)
    pub const DEFAULT_PERIOD: &str = "ANALYSIS_DEFAULT_PERIOD";
    /// Deployment environment name
    pub const ENVIRONMENT: &str = "ENVIRONMENT";
}

/// Cooperative cancellation cadence
pub mod cancellation {
    /// Frames processed between cancellation checks during segmentation
    pub const FRAME_CHECK_INTERVAL: usize = 32;
    /// Sessions processed between cancellation checks during aggregation
    pub const SESSION_CHECK_INTERVAL: usize = 8;
}
