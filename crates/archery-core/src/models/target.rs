// ABOUTME: Target face reference data, arrow impacts, and grouping result models
// ABOUTME: TargetSpec validates its ring and colour tables on construction and deserialization
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use super::MetricEstimate;
use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Kind of target face
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TargetFaceType {
    /// Concentric ten-ring face
    Ring,
    /// Reduced multi-spot face (e.g. triple spot), inner rings only
    MultiSpot,
    /// Field archery face
    Field,
}

impl fmt::Display for TargetFaceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ring => "ring",
            Self::MultiSpot => "multi-spot",
            Self::Field => "field",
        };
        f.write_str(name)
    }
}

/// Lookup key for target reference data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TargetSpecKey {
    /// Face type
    pub face_type: TargetFaceType,
    /// Shooting distance in whole metres
    pub distance_m: u32,
}

impl TargetSpecKey {
    /// Create a key
    #[must_use]
    pub const fn new(face_type: TargetFaceType, distance_m: u32) -> Self {
        Self {
            face_type,
            distance_m,
        }
    }
}

impl fmt::Display for TargetSpecKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}m", self.face_type, self.distance_m)
    }
}

/// One concentric scoring band, `[inner_radius, outer_radius)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RingBand {
    /// Ring number, 1 = innermost
    pub ring: u8,
    /// Inclusive inner radius
    pub inner_radius: f64,
    /// Exclusive outer radius
    pub outer_radius: f64,
    /// Points awarded for an impact inside this band
    pub score: u32,
}

/// Named colour zone covering one or more rings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorZone {
    /// Colour name shown to the archer
    pub color: String,
    /// Ring numbers painted in this colour
    pub rings: Vec<u8>,
}

/// Unvalidated wire form of [`TargetSpec`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetSpecData {
    /// Face type
    pub face_type: TargetFaceType,
    /// Shooting distance in whole metres
    pub distance_m: u32,
    /// Reference data version (assigned by the catalog)
    #[serde(default)]
    pub version: u32,
    /// Ring table ordered from the centre outward
    pub rings: Vec<RingBand>,
    /// Colour zone table
    pub color_zones: Vec<ColorZone>,
}

/// Immutable, validated target face reference data
///
/// Ring/score/colour lookups are a pure function of the coordinate and this
/// value, so a spec is never edited in place: a changed face is published as
/// a new version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TargetSpecData", into = "TargetSpecData")]
pub struct TargetSpec {
    face_type: TargetFaceType,
    distance_m: u32,
    version: u32,
    rings: Vec<RingBand>,
    color_zones: Vec<ColorZone>,
}

impl TargetSpec {
    /// Build and validate a target spec
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` when the ring table is empty, not contiguous from
    /// the centre outward, has scores increasing outward, or a ring has no
    /// colour zone; `MissingRequiredField` when the ring table is absent
    pub fn new(
        face_type: TargetFaceType,
        distance_m: u32,
        rings: Vec<RingBand>,
        color_zones: Vec<ColorZone>,
    ) -> AppResult<Self> {
        Self::try_from(TargetSpecData {
            face_type,
            distance_m,
            version: 0,
            rings,
            color_zones,
        })
    }

    /// Copy of this spec carrying a different reference-data version
    #[must_use]
    pub fn with_version(&self, version: u32) -> Self {
        Self {
            version,
            ..self.clone()
        }
    }

    /// Lookup key of this spec
    #[must_use]
    pub const fn key(&self) -> TargetSpecKey {
        TargetSpecKey::new(self.face_type, self.distance_m)
    }

    /// Face type
    #[must_use]
    pub const fn face_type(&self) -> TargetFaceType {
        self.face_type
    }

    /// Shooting distance in metres
    #[must_use]
    pub const fn distance_m(&self) -> u32 {
        self.distance_m
    }

    /// Reference data version
    #[must_use]
    pub const fn version(&self) -> u32 {
        self.version
    }

    /// Ring table, centre outward
    #[must_use]
    pub fn rings(&self) -> &[RingBand] {
        &self.rings
    }

    /// Colour zone table
    #[must_use]
    pub fn color_zones(&self) -> &[ColorZone] {
        &self.color_zones
    }

    /// Outer radius of the outermost scoring ring
    #[must_use]
    pub fn outer_radius(&self) -> f64 {
        self.rings.last().map_or(0.0, |band| band.outer_radius)
    }

    /// Highest score a single arrow can achieve on this face
    #[must_use]
    pub fn max_score(&self) -> u32 {
        self.rings.first().map_or(0, |band| band.score)
    }

    /// Ring whose `[inner, outer)` bracket contains `radial_distance`
    #[must_use]
    pub fn ring_for_distance(&self, radial_distance: f64) -> Option<&RingBand> {
        self.rings.iter().find(|band| {
            radial_distance >= band.inner_radius && radial_distance < band.outer_radius
        })
    }

    /// Colour painted on `ring`
    #[must_use]
    pub fn zone_color(&self, ring: u8) -> Option<&str> {
        self.color_zones
            .iter()
            .find(|zone| zone.rings.contains(&ring))
            .map(|zone| zone.color.as_str())
    }
}

impl TryFrom<TargetSpecData> for TargetSpec {
    type Error = AppError;

    fn try_from(data: TargetSpecData) -> AppResult<Self> {
        if data.distance_m == 0 {
            return Err(AppError::invalid_input(
                "Target spec distance must be positive",
            ));
        }
        if data.rings.is_empty() {
            return Err(AppError::missing_field("rings"));
        }

        let mut expected_inner = 0.0;
        let mut previous_score = u32::MAX;
        for (index, band) in data.rings.iter().enumerate() {
            let expected_ring = index + 1;
            if usize::from(band.ring) != expected_ring {
                return Err(AppError::invalid_input(format!(
                    "Ring table must be numbered from 1 outward: position {expected_ring} holds ring {}",
                    band.ring
                )));
            }
            if !band.inner_radius.is_finite() || !band.outer_radius.is_finite() {
                return Err(AppError::invalid_input(format!(
                    "Ring {} has a non-finite radius",
                    band.ring
                )));
            }
            if (band.inner_radius - expected_inner).abs() > f64::EPSILON {
                return Err(AppError::invalid_input(format!(
                    "Ring {} must start at radius {expected_inner}, found {}",
                    band.ring, band.inner_radius
                )));
            }
            if band.outer_radius <= band.inner_radius {
                return Err(AppError::invalid_input(format!(
                    "Ring {} outer radius must exceed its inner radius",
                    band.ring
                )));
            }
            if band.score > previous_score {
                return Err(AppError::invalid_input(format!(
                    "Ring {} scores more than the ring inside it",
                    band.ring
                )));
            }
            expected_inner = band.outer_radius;
            previous_score = band.score;
        }

        if let Some(band) = data
            .rings
            .iter()
            .find(|band| !data.color_zones.iter().any(|zone| zone.rings.contains(&band.ring)))
        {
            return Err(AppError::invalid_input(format!(
                "Ring {} has no colour zone",
                band.ring
            )));
        }

        Ok(Self {
            face_type: data.face_type,
            distance_m: data.distance_m,
            version: data.version,
            rings: data.rings,
            color_zones: data.color_zones,
        })
    }
}

impl From<TargetSpec> for TargetSpecData {
    fn from(spec: TargetSpec) -> Self {
        Self {
            face_type: spec.face_type,
            distance_m: spec.distance_m,
            version: spec.version,
            rings: spec.rings,
            color_zones: spec.color_zones,
        }
    }
}

/// Planar coordinate on the target face (+x right, +y up)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2 {
    /// Horizontal offset
    pub x: f64,
    /// Vertical offset
    pub y: f64,
}

impl Point2 {
    /// Origin (target centre)
    pub const ORIGIN: Self = Self { x: 0.0, y: 0.0 };

    /// Create a point
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Distance from the target centre
    #[must_use]
    pub fn magnitude(self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Euclidean distance to `other`
    #[must_use]
    pub fn distance_to(self, other: Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Whether both components are finite
    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// One recorded arrow impact, immutable once created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrowImpact {
    /// Arrow record ID
    pub id: Uuid,
    /// Owning target session
    pub session_id: Uuid,
    /// Horizontal offset from target centre
    pub x: f64,
    /// Vertical offset from target centre
    pub y: f64,
    /// Order within the end/session, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shot_number: Option<u32>,
}

impl ArrowImpact {
    /// Create an impact with a fresh ID
    #[must_use]
    pub fn new(session_id: Uuid, x: f64, y: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            session_id,
            x,
            y,
            shot_number: None,
        }
    }

    /// Impact coordinate
    #[must_use]
    pub const fn position(&self) -> Point2 {
        Point2::new(self.x, self.y)
    }
}

/// Score, ring, and colour derived for a single coordinate
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShotScore {
    /// Points scored (0 for a miss)
    pub score: u32,
    /// Ring number, 1 = innermost, 0 = miss
    pub ring: u8,
    /// Colour zone name, `"miss"` outside the face
    pub zone_color: String,
}

/// Arrow impact viewed together with its derived score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredArrow {
    /// Source impact
    #[serde(flatten)]
    pub impact: ArrowImpact,
    /// Derived score
    #[serde(flatten)]
    pub shot: ShotScore,
}

/// Shape classification of an arrow group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PatternTag {
    /// Compact group
    Tight,
    /// Elongated up/down
    VerticalString,
    /// Elongated left/right
    HorizontalString,
    /// Elongated along a diagonal
    DiagonalString,
    /// Wide with no dominant axis
    Scattered,
    /// Too few arrows to classify
    InsufficientData,
}

impl PatternTag {
    /// Wire name of the tag
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tight => "tight",
            Self::VerticalString => "vertical-string",
            Self::HorizontalString => "horizontal-string",
            Self::DiagonalString => "diagonal-string",
            Self::Scattered => "scattered",
            Self::InsufficientData => "insufficient-data",
        }
    }
}

impl fmt::Display for PatternTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compass bucket of the group centre relative to the target centre
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OffsetDirection {
    /// Within the centred tolerance
    Center,
    /// High
    Up,
    /// High and right
    UpRight,
    /// Right
    Right,
    /// Low and right
    DownRight,
    /// Low
    Down,
    /// Low and left
    DownLeft,
    /// Left
    Left,
    /// High and left
    UpLeft,
}

impl OffsetDirection {
    /// Whether this bucket has an upward component
    #[must_use]
    pub const fn is_high(self) -> bool {
        matches!(self, Self::Up | Self::UpLeft | Self::UpRight)
    }

    /// Whether this bucket has a downward component
    #[must_use]
    pub const fn is_low(self) -> bool {
        matches!(self, Self::Down | Self::DownLeft | Self::DownRight)
    }

    /// Whether this bucket has a leftward component
    #[must_use]
    pub const fn is_left(self) -> bool {
        matches!(self, Self::Left | Self::UpLeft | Self::DownLeft)
    }

    /// Whether this bucket has a rightward component
    #[must_use]
    pub const fn is_right(self) -> bool {
        matches!(self, Self::Right | Self::UpRight | Self::DownRight)
    }
}

/// Distance and direction of the group centre from the target centre
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CenterOffset {
    /// Horizontal component
    pub dx: f64,
    /// Vertical component
    pub dy: f64,
    /// Euclidean length
    pub magnitude: f64,
    /// Angle in degrees counter-clockwise from +x, in `[0, 360)`
    pub angle_deg: f64,
    /// Compass bucket
    pub direction: OffsetDirection,
}

impl CenterOffset {
    /// Offset of a group sitting exactly on the centre
    #[must_use]
    pub const fn centered() -> Self {
        Self {
            dx: 0.0,
            dy: 0.0,
            magnitude: 0.0,
            angle_deg: 0.0,
            direction: OffsetDirection::Center,
        }
    }
}

/// Spatial analysis of one target session's arrow group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupingResult {
    /// Number of arrows analysed
    pub arrow_count: usize,
    /// Sum of arrow scores
    pub total_score: u32,
    /// Mean arrow score (0 for an empty group)
    pub average_score: f64,
    /// Mean impact coordinate
    pub centroid: Point2,
    /// Offset of the centroid from the target centre
    pub center_offset: CenterOffset,
    /// Mean distance of arrows to the centroid (lower is tighter)
    pub spread: f64,
    /// Largest distance between any two arrows
    pub diameter: f64,
    /// Covariance ellipse major semi-axis (standard deviation along it)
    pub major_axis: f64,
    /// Covariance ellipse minor semi-axis
    pub minor_axis: f64,
    /// Orientation of the major axis in degrees, `[0, 180)`
    pub orientation_deg: f64,
    /// Group shape
    pub pattern: PatternTag,
    /// Share of the centre offset explainable by wind, `[0, 1]`
    pub wind_effect: MetricEstimate,
    /// `1 - spread / reference spread`, clamped to `[0, 1]`
    pub consistency_score: f64,
    /// Advisory strings in rule-declaration order
    pub recommendations: Vec<String>,
}
