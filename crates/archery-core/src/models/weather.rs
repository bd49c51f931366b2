// ABOUTME: Ambient weather conditions supplied by the optional weather provider
// ABOUTME: Wind is expressed as the face-plane direction it pushes arrows toward
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use serde::{Deserialize, Serialize};

/// Weather during a target session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherConditions {
    /// Wind speed in metres per second
    pub wind_speed_ms: f64,
    /// Direction the wind pushes arrows on the target face, degrees
    /// counter-clockwise from +x (archer's right)
    pub wind_direction_deg: f64,
    /// Air temperature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature_celsius: Option<f64>,
    /// Relative humidity, 0-100
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub humidity_percent: Option<f64>,
    /// Free-form summary ("overcast", "light rain")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<String>,
}

impl WeatherConditions {
    /// Wind-only conditions
    #[must_use]
    pub const fn wind(wind_speed_ms: f64, wind_direction_deg: f64) -> Self {
        Self {
            wind_speed_ms,
            wind_direction_deg,
            temperature_celsius: None,
            humidity_percent: None,
            conditions: None,
        }
    }

    /// Unit vector of the wind push on the face
    #[must_use]
    pub fn wind_unit_vector(&self) -> (f64, f64) {
        let radians = self.wind_direction_deg.to_radians();
        (radians.cos(), radians.sin())
    }
}
