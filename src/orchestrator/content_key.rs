// ABOUTME: Content keys identifying the exact inputs an analysis result was computed from
// ABOUTME: SHA-256 over canonical JSON of the inputs plus the reference data version
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use archery_core::errors::{AppError, AppResult};
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Hex SHA-256 of `kind`, `spec_version`, and the canonical JSON of `inputs`
///
/// Object keys are sorted before hashing, so field order never changes the
/// key; array order does.
///
/// # Errors
///
/// Returns a serialization error if `inputs` cannot be represented as JSON
pub fn content_key<T: Serialize>(kind: &str, inputs: &T, spec_version: u32) -> AppResult<String> {
    let canonical = canonical_json(inputs)?;

    let mut hasher = Sha256::new();
    hasher.update(kind.as_bytes());
    hasher.update([0]);
    hasher.update(spec_version.to_be_bytes());
    hasher.update(canonical.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// JSON text with object keys in sorted order
fn canonical_json<T: Serialize>(inputs: &T) -> AppResult<String> {
    // `Value` objects are backed by an ordered map
    let value = serde_json::to_value(inputs)
        .map_err(|e| AppError::serialization(format!("Failed to encode analysis inputs: {e}")))?;
    serde_json::to_string(&value)
        .map_err(|e| AppError::serialization(format!("Failed to encode analysis inputs: {e}")))
}
