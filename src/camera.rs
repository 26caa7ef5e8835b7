//! Camera capability contract.
//!
//! The camera is an external collaborator. This module owns the policy around
//! it: which resolutions to try and in what order, which facing to request,
//! and which optional controls are surfaced to the user.

use crate::{landmarks::ImageSize, Error, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};

/// Which physical camera to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraFacing {
    /// Selfie camera; previews and captures are mirrored by default
    #[default]
    Front,
    Rear,
}

/// Supported range of a device control
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlRange {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl ControlRange {
    /// Clamp `value` into the range, snapping to `step` from `min` when a step is given
    #[must_use]
    pub fn clamp(&self, value: f64) -> f64 {
        let clamped = if value.is_finite() {
            value.clamp(self.min, self.max)
        } else {
            self.min
        };
        if self.step > 0.0 {
            let steps = ((clamped - self.min) / self.step).round();
            steps.mul_add(self.step, self.min).min(self.max)
        } else {
            clamped
        }
    }
}

/// Optional per-track controls reported by the device
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CameraControls {
    pub zoom: Option<ControlRange>,
    pub exposure_compensation: Option<ControlRange>,
}

/// External camera feed
pub trait Camera {
    /// Start the feed at `resolution`; returns the resolution actually delivered
    ///
    /// # Errors
    ///
    /// Returns an error if the device cannot deliver this resolution
    fn open(&mut self, resolution: ImageSize, facing: CameraFacing) -> Result<ImageSize>;

    /// Stop the feed
    fn close(&mut self);

    /// Controls the active track supports
    fn controls(&self) -> CameraControls {
        CameraControls::default()
    }

    /// Set the zoom level
    ///
    /// # Errors
    ///
    /// Returns an error if the device rejects the value
    fn set_zoom(&mut self, _value: f64) -> Result<()> {
        Err(Error::InvalidInput("Zoom not supported".to_string()))
    }

    /// Set exposure compensation
    ///
    /// # Errors
    ///
    /// Returns an error if the device rejects the value
    fn set_exposure_compensation(&mut self, _value: f64) -> Result<()> {
        Err(Error::InvalidInput("Exposure compensation not supported".to_string()))
    }
}

/// Try each resolution in order until the camera opens
///
/// # Errors
///
/// Returns [`Error::CameraUnavailable`] once every resolution has failed
pub fn open_with_fallback<C: Camera + ?Sized>(
    camera: &mut C,
    resolutions: &[ImageSize],
    facing: CameraFacing,
) -> Result<ImageSize> {
    let mut last_error = None;
    for &resolution in resolutions {
        match camera.open(resolution, facing) {
            Ok(actual) => {
                info!("Camera opened at {} (requested {})", actual, resolution);
                return Ok(actual);
            }
            Err(e) => {
                warn!("Camera failed at {}: {}", resolution, e);
                last_error = Some(e);
            }
        }
    }
    Err(Error::CameraUnavailable(last_error.map_or_else(
        || "no resolutions to try".to_string(),
        |e| e.to_string(),
    )))
}

/// Controls to show the user; empty when the configuration hides them
#[must_use]
pub fn visible_controls<C: Camera + ?Sized>(camera: &C, expose: bool) -> CameraControls {
    if expose {
        camera.controls()
    } else {
        CameraControls::default()
    }
}

/// Set zoom, clamped into the device's range
///
/// # Errors
///
/// Returns an error if the device has no zoom control or rejects the value
pub fn apply_zoom<C: Camera + ?Sized>(camera: &mut C, value: f64) -> Result<f64> {
    let range = camera
        .controls()
        .zoom
        .ok_or_else(|| Error::InvalidInput("Zoom not supported".to_string()))?;
    let value = range.clamp(value);
    camera.set_zoom(value)?;
    Ok(value)
}

/// Set exposure compensation, clamped into the device's range
///
/// # Errors
///
/// Returns an error if the device has no exposure control or rejects the value
pub fn apply_exposure<C: Camera + ?Sized>(camera: &mut C, value: f64) -> Result<f64> {
    let range = camera
        .controls()
        .exposure_compensation
        .ok_or_else(|| Error::InvalidInput("Exposure compensation not supported".to_string()))?;
    let value = range.clamp(value);
    camera.set_exposure_compensation(value)?;
    Ok(value)
}
