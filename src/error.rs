//! Error types for the pose matching library.

use thiserror::Error;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// The detector found no body in a template image
    #[error("No pose detected in template image")]
    NoPoseDetected,

    /// Every camera resolution in the fallback ladder failed to open
    #[error("Camera unavailable: {0}")]
    CameraUnavailable(String),

    /// The landmark detector could not be initialised
    #[error("Detector initialisation failed: {0}")]
    DetectorInitFailed(String),

    /// Persisting a captured artifact failed
    #[error("Save failed: {0}")]
    SaveFailed(String),

    /// A capture is already being rendered or confirmed
    #[error("A capture is already in flight")]
    CaptureInFlight,

    /// Requested artifact does not exist in the store
    #[error("Not found: {0}")]
    NotFound(String),

    /// Image decoding, encoding or processing failed
    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    /// File I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid input parameters provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl Error {
    /// Whether the UI can recover by returning to a stable step.
    ///
    /// Only configuration and invalid-input errors indicate a programming or
    /// setup problem; everything the pipeline surfaces at runtime degrades to
    /// the idle or upload step.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        !matches!(self, Self::ConfigError(_) | Self::InvalidInput(_))
    }
}

/// Convenience type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surfaced_signals_are_recoverable() {
        assert!(Error::NoPoseDetected.is_recoverable());
        assert!(Error::CameraUnavailable("no device".into()).is_recoverable());
        assert!(Error::DetectorInitFailed("wasm".into()).is_recoverable());
        assert!(Error::SaveFailed("offline".into()).is_recoverable());
        assert!(!Error::ConfigError("bad".into()).is_recoverable());
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(Error::NoPoseDetected.to_string(), "No pose detected in template image");
        assert_eq!(Error::SaveFailed("quota".into()).to_string(), "Save failed: quota");
    }
}
