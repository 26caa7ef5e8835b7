//! Safe casting utilities between pixel, score and floating-point domains

use crate::{constants::MAX_SCORE, Error, Result};

/// Widen u32 to f64 (lossless)
#[must_use]
pub fn u32_to_f64(value: u32) -> f64 {
    f64::from(value)
}

/// Safely convert usize to u32 with overflow checking
///
/// # Errors
///
/// Returns an error if the value exceeds u32::MAX
pub fn usize_to_u32(value: usize) -> Result<u32> {
    value
        .try_into()
        .map_err(|_| Error::InvalidInput(format!("Value {value} too large to fit in u32")))
}

/// Clamp and convert f64 to u32 for pixel coordinates
#[must_use]
#[allow(clippy::cast_possible_truncation)] // Clamping ensures safe truncation
#[allow(clippy::cast_sign_loss)] // Clamped to a non-negative range
pub fn f64_to_u32_clamp(value: f64, min: u32, max: u32) -> u32 {
    let (min, max) = if min <= max { (min, max) } else { (max, min) };

    if !value.is_finite() {
        return min;
    }

    let clamped = value.clamp(f64::from(min), f64::from(max));
    (clamped as u32).clamp(min, max)
}

/// Round a score-like value to the nearest integer inside `[0, 100]`
#[must_use]
#[allow(clippy::cast_possible_truncation)] // Clamped to [0, 100]
#[allow(clippy::cast_sign_loss)] // Clamped to [0, 100]
pub fn round_score(value: f64) -> u8 {
    if !value.is_finite() {
        return 0;
    }
    value.round().clamp(0.0, f64::from(MAX_SCORE)) as u8
}
