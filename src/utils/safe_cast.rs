//! Saturating numeric conversions for pixel coordinates and overlay readouts

use crate::{Error, Result};

/// Convert a non-negative i32 dimension to usize
///
/// # Errors
///
/// Returns an error if the value is negative
pub fn i32_to_usize(value: i32) -> Result<usize> {
    value
        .try_into()
        .map_err(|_| Error::InvalidInput(format!("Dimension {value} must not be negative")))
}

/// Clamp and convert f32 to i32 for pixel coordinates
///
/// Non-finite input maps to `min`.
#[must_use]
#[allow(clippy::cast_precision_loss)] // Acceptable for clamping bounds
#[allow(clippy::cast_possible_truncation)] // Clamping ensures safe truncation
pub fn f32_to_i32_clamp(value: f32, min: i32, max: i32) -> i32 {
    let (min, max) = if min <= max { (min, max) } else { (max, min) };

    if !value.is_finite() {
        return min;
    }

    let clamped = value.clamp(min as f32, max as f32);
    (clamped as i32).clamp(min, max)
}

/// Truncate f64 toward zero into i32, saturating at the i32 range
///
/// NaN maps to 0.
#[must_use]
#[allow(clippy::cast_possible_truncation)] // `as` saturates for f64 -> i32
pub fn f64_to_i32_saturating(value: f64) -> i32 {
    if value.is_nan() {
        0
    } else {
        value.trunc() as i32
    }
}
