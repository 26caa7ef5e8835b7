//! Temporal smoothing for match scores.
//!
//! Detector noise makes raw scores jitter from frame to frame. A filter sits
//! between the raw score and everything that reacts to it (the on-screen
//! meter and the auto-capture hold timer).

/// Exponential moving average
pub mod exponential;

use crate::Result;

/// Trait for all score filters
pub trait ScoreFilter: Send + Sync {
    /// Feed one raw value and return the smoothed value
    fn apply(&mut self, value: f64) -> f64;

    /// Reset filter state
    fn reset(&mut self);

    /// Get filter name
    fn name(&self) -> &str;
}

/// No-op filter that passes through values unchanged
pub struct NoFilter;

impl ScoreFilter for NoFilter {
    fn apply(&mut self, value: f64) -> f64 {
        value
    }

    fn reset(&mut self) {}

    fn name(&self) -> &str {
        "NoFilter"
    }
}

/// Create a score filter by type name
///
/// # Errors
///
/// Returns an error for an unknown filter name or an out-of-range alpha
pub fn create_filter(filter_type: &str, alpha: f64) -> Result<Box<dyn ScoreFilter>> {
    match filter_type.to_lowercase().as_str() {
        "none" | "nofilter" => Ok(Box::new(NoFilter)),
        "exponential" | "ema" => {
            if alpha > 0.0 && alpha <= 1.0 {
                Ok(Box::new(exponential::ExponentialFilter::new(alpha)))
            } else {
                Err(crate::Error::ConfigError(format!(
                    "Smoothing alpha must be in (0, 1], got {alpha}"
                )))
            }
        }
        _ => Err(crate::Error::ConfigError(format!("Unknown filter type: {filter_type}"))),
    }
}
