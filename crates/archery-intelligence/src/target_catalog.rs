// ABOUTME: Versioned catalog of target face reference data keyed by face type and distance
// ABOUTME: Publishing a face appends a new immutable version and repoints the key to it
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Target spec catalog
//!
//! Specs are never edited in place. [`TargetSpecCatalog::publish`] stores a
//! new version and the key's latest lookup moves to it, while results that
//! were scored against an older version can still resolve it through
//! [`TargetSpecCatalog::lookup_version`].

use archery_core::constants::zone_colors;
use archery_core::errors::AppResult;
use archery_core::models::{ColorZone, RingBand, TargetFaceType, TargetSpec, TargetSpecKey};
use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;

/// Concurrent map of target spec version histories
#[derive(Debug, Clone, Default)]
pub struct TargetSpecCatalog {
    /// Key -> versions, oldest first; version `n` sits at index `n - 1`
    specs: Arc<DashMap<TargetSpecKey, Vec<Arc<TargetSpec>>>>,
}

impl TargetSpecCatalog {
    /// Create an empty catalog
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog preloaded with the standard outdoor, indoor, and field faces
    ///
    /// # Errors
    ///
    /// Returns an error if a built-in face table fails validation
    pub fn with_standard_faces() -> AppResult<Self> {
        let catalog = Self::new();
        for spec in standard_faces()? {
            catalog.publish(spec);
        }
        Ok(catalog)
    }

    /// Publish `spec` as the next version for its key
    ///
    /// Any version number carried by `spec` is replaced.
    pub fn publish(&self, spec: TargetSpec) -> Arc<TargetSpec> {
        let key = spec.key();
        let mut versions = self.specs.entry(key).or_default();
        let version = u32::try_from(versions.len() + 1).unwrap_or(u32::MAX);
        let published = Arc::new(spec.with_version(version));
        versions.push(Arc::clone(&published));
        drop(versions);

        debug!(target_key = %key, version, "Published target spec");
        published
    }

    /// Latest version for `key`
    #[must_use]
    pub fn lookup(&self, key: TargetSpecKey) -> Option<Arc<TargetSpec>> {
        self.specs
            .get(&key)
            .and_then(|versions| versions.last().cloned())
    }

    /// A specific historical version for `key`
    #[must_use]
    pub fn lookup_version(&self, key: TargetSpecKey, version: u32) -> Option<Arc<TargetSpec>> {
        let index = usize::try_from(version).ok()?.checked_sub(1)?;
        self.specs
            .get(&key)
            .and_then(|versions| versions.get(index).cloned())
    }

    /// Every key with at least one published version, sorted
    #[must_use]
    pub fn keys(&self) -> Vec<TargetSpecKey> {
        let mut keys: Vec<_> = self.specs.iter().map(|entry| *entry.key()).collect();
        keys.sort_unstable();
        keys
    }

    /// Latest version of every key, sorted by key
    #[must_use]
    pub fn latest(&self) -> Vec<Arc<TargetSpec>> {
        self.keys()
            .into_iter()
            .filter_map(|key| self.lookup(key))
            .collect()
    }
}

/// Concentric face of equal-width rings, scores listed centre outward
fn concentric_face(
    face_type: TargetFaceType,
    distance_m: u32,
    ring_width: f64,
    scores: &[u32],
    zones: &[(&str, &[u8])],
) -> AppResult<TargetSpec> {
    let rings = (1_u8..)
        .zip(scores)
        .map(|(ring, &score)| RingBand {
            ring,
            inner_radius: ring_width * f64::from(ring - 1),
            outer_radius: ring_width * f64::from(ring),
            score,
        })
        .collect();
    let color_zones = zones
        .iter()
        .map(|(color, rings)| ColorZone {
            color: (*color).to_owned(),
            rings: rings.to_vec(),
        })
        .collect();
    TargetSpec::new(face_type, distance_m, rings, color_zones)
}

fn standard_faces() -> AppResult<Vec<TargetSpec>> {
    const TEN_RING_SCORES: [u32; 10] = [10, 9, 8, 7, 6, 5, 4, 3, 2, 1];
    const TEN_RING_ZONES: [(&str, &[u8]); 5] = [
        (zone_colors::GOLD, &[1, 2]),
        (zone_colors::RED, &[3, 4]),
        (zone_colors::BLUE, &[5, 6]),
        (zone_colors::BLACK, &[7, 8]),
        (zone_colors::WHITE, &[9, 10]),
    ];
    const TRIPLE_SPOT_ZONES: [(&str, &[u8]); 3] = [
        (zone_colors::GOLD, &[1, 2]),
        (zone_colors::RED, &[3, 4]),
        (zone_colors::BLUE, &[5]),
    ];
    const FIELD_ZONES: [(&str, &[u8]); 2] = [
        (zone_colors::YELLOW, &[1, 2]),
        (zone_colors::BLACK, &[3, 4, 5, 6]),
    ];

    Ok(vec![
        // 122 cm face
        concentric_face(TargetFaceType::Ring, 70, 6.1, &TEN_RING_SCORES, &TEN_RING_ZONES)?,
        // 80 cm face
        concentric_face(TargetFaceType::Ring, 50, 4.0, &TEN_RING_SCORES, &TEN_RING_ZONES)?,
        concentric_face(TargetFaceType::Ring, 30, 4.0, &TEN_RING_SCORES, &TEN_RING_ZONES)?,
        // 40 cm face
        concentric_face(TargetFaceType::Ring, 18, 2.0, &TEN_RING_SCORES, &TEN_RING_ZONES)?,
        // 40 cm triple spot, one spot
        concentric_face(
            TargetFaceType::MultiSpot,
            18,
            2.0,
            &TEN_RING_SCORES[..5],
            &TRIPLE_SPOT_ZONES,
        )?,
        // 80 cm field face
        concentric_face(
            TargetFaceType::Field,
            50,
            40.0 / 6.0,
            &[6, 5, 4, 3, 2, 1],
            &FIELD_ZONES,
        )?,
    ])
}
