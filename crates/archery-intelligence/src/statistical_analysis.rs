// ABOUTME: Descriptive statistics and least-squares regression shared by the analysis engines
// ABOUTME: Population mean/variance helpers plus a slope/intercept/R-squared linear fit
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use archery_core::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Result of a least-squares line fit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionResult {
    /// Change in y per unit x
    pub slope: f64,
    /// y at x = 0
    pub intercept: f64,
    /// Coefficient of determination, `[0, 1]`
    pub r_squared: f64,
}

/// Statistical helpers over plain `f64` samples
pub struct StatisticalAnalyzer;

impl StatisticalAnalyzer {
    /// Arithmetic mean, `None` for an empty slice
    #[must_use]
    pub fn mean(values: &[f64]) -> Option<f64> {
        if values.is_empty() {
            return None;
        }
        let n = values.len() as f64;
        Some(values.iter().sum::<f64>() / n)
    }

    /// Population variance, `None` for an empty slice
    #[must_use]
    pub fn variance(values: &[f64]) -> Option<f64> {
        let mean = Self::mean(values)?;
        let n = values.len() as f64;
        Some(
            values
                .iter()
                .map(|value| (value - mean) * (value - mean))
                .sum::<f64>()
                / n,
        )
    }

    /// Squared coefficient of variation (`variance / mean^2`), 0 for a zero mean
    #[must_use]
    pub fn squared_coefficient_of_variation(values: &[f64]) -> Option<f64> {
        let mean = Self::mean(values)?;
        let variance = Self::variance(values)?;
        if mean.abs() < f64::EPSILON {
            return Some(0.0);
        }
        Some(variance / (mean * mean))
    }

    /// Fit `y = slope * x + intercept` through `(x, y)` points
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` with fewer than two points or when every x is equal
    pub fn linear_regression(points: &[(f64, f64)]) -> AppResult<RegressionResult> {
        if points.len() < 2 {
            return Err(AppError::invalid_input(format!(
                "Insufficient data points for regression: need at least 2, got {}",
                points.len()
            )));
        }

        let xs: Vec<f64> = points.iter().map(|(x, _)| *x).collect();
        let ys: Vec<f64> = points.iter().map(|(_, y)| *y).collect();
        let (Some(mean_x), Some(mean_y)) = (Self::mean(&xs), Self::mean(&ys)) else {
            return Err(AppError::invalid_input("No data points for regression"));
        };

        // Centred sums keep the fit sign-symmetric in y
        let (sxx, sxy, syy) = points.iter().fold((0.0, 0.0, 0.0), |(sxx, sxy, syy), (x, y)| {
            let dx = x - mean_x;
            let dy = y - mean_y;
            (dx.mul_add(dx, sxx), dx.mul_add(dy, sxy), dy.mul_add(dy, syy))
        });

        if sxx.abs() < f64::EPSILON {
            return Err(AppError::invalid_input(
                "Cannot calculate regression: zero variance in x",
            ));
        }

        let slope = sxy / sxx;
        let intercept = slope.mul_add(-mean_x, mean_y);
        let r_squared = if syy.abs() < f64::EPSILON {
            0.0
        } else {
            (sxy * sxy) / (sxx * syy)
        };

        Ok(RegressionResult {
            slope,
            intercept,
            r_squared,
        })
    }
}
