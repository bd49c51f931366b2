// ABOUTME: Unified error handling re-exported from the archery-core crate
// ABOUTME: Keeps crate::errors paths stable for the orchestrator and binaries
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

pub use archery_core::errors::*;
