//! Configuration management for the pose matching pipeline
//!
//! One configuration surface covers every camera-page variant: front or rear
//! camera, mirrored or plain output, with or without camera controls. The
//! scorer and state machine are implemented once and parameterized here.

use crate::{
    camera::CameraFacing,
    constants::{
        DEFAULT_CAMERA_RESOLUTIONS, DEFAULT_COUNTDOWN_SECONDS, DEFAULT_GUIDANCE_LEFT_BOUND,
        DEFAULT_GUIDANCE_RIGHT_BOUND, DEFAULT_GUIDANCE_SCORE_CEILING, DEFAULT_GUIDANCE_TOO_CLOSE,
        DEFAULT_GUIDANCE_TOO_FAR, DEFAULT_HOLD_MILLIS, DEFAULT_MAX_EXPECTED_DISTANCE,
        DEFAULT_MIN_DETECTION_CONFIDENCE, DEFAULT_MIN_MATCHED_POINTS, DEFAULT_MIN_TRACKING_CONFIDENCE,
        DEFAULT_MIN_VISIBILITY, DEFAULT_MODEL_COMPLEXITY, DEFAULT_SMOOTHING_ALPHA,
        DEFAULT_SUCCESS_THRESHOLD, DEFAULT_TEMPLATE_MAX_EDGE, KEY_POINT_INDICES, MAX_SCORE,
    },
    filters::create_filter,
    landmarks::ImageSize,
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Pipeline configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Match scoring parameters
    pub scoring: ScoringConfig,

    /// Guidance hint thresholds
    pub guidance: GuidanceConfig,

    /// Auto-capture behaviour
    pub capture: CaptureConfig,

    /// Camera selection and controls
    pub camera: CameraConfig,

    /// Settings handed to the external detector
    pub detector: DetectorConfig,

    /// Template acquisition
    pub template: TemplateConfig,
}

/// Match scoring parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Landmark indices compared between template and live skeletons
    pub key_points: Vec<usize>,

    /// Minimum visibility on both sides for a point to count
    pub min_visibility: f64,

    /// Minimum mutually visible points before any score is given
    pub min_matched_points: usize,

    /// Mean distance that maps to a score of zero
    pub max_expected_distance: f64,

    /// Smoothing filter name (`exponential` or `none`)
    pub smoothing: String,

    /// Exponential smoothing factor
    pub smoothing_alpha: f64,
}

/// Guidance hint thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuidanceConfig {
    /// Hints are only given below this score
    pub score_ceiling: u8,

    /// Shoulder centre below this asks the user to move left
    pub left_bound: f64,

    /// Shoulder centre above this asks the user to move right
    pub right_bound: f64,

    /// Shoulder width above this asks the user to back up
    pub too_close: f64,

    /// Shoulder width below this asks the user to come closer
    pub too_far: f64,

    /// Minimum visibility of both shoulders before any hint is given
    pub min_visibility: f64,
}

/// Auto-capture behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Smoothed score at or above which a hold counts
    pub success_threshold: u8,

    /// Continuous hold time before the countdown starts
    pub hold_millis: u64,

    /// Countdown length in seconds
    pub countdown_seconds: u32,

    /// Whether auto-capture starts enabled
    pub auto_capture: bool,

    /// Mirror rendered stills; follows the camera facing when unset
    pub mirror_output: Option<bool>,
}

/// Camera selection and controls
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Camera requested when a session starts
    pub default_facing: CameraFacing,

    /// Surface zoom and exposure controls when the device supports them
    pub expose_controls: bool,

    /// Resolutions to try, highest first
    pub resolutions: Vec<ImageSize>,
}

/// Settings handed to the external detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Model tier; 0 is the cheapest
    pub model_complexity: u8,

    /// Detector-side temporal landmark smoothing
    pub smooth_landmarks: bool,

    /// Minimum confidence for initial detection (0.0-1.0)
    pub min_detection_confidence: f64,

    /// Minimum confidence for frame-to-frame tracking (0.0-1.0)
    pub min_tracking_confidence: f64,
}

/// Template acquisition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateConfig {
    /// Longest edge of the image handed to the detector
    pub max_edge: u32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            key_points: KEY_POINT_INDICES.to_vec(),
            min_visibility: DEFAULT_MIN_VISIBILITY,
            min_matched_points: DEFAULT_MIN_MATCHED_POINTS,
            max_expected_distance: DEFAULT_MAX_EXPECTED_DISTANCE,
            smoothing: "exponential".to_string(),
            smoothing_alpha: DEFAULT_SMOOTHING_ALPHA,
        }
    }
}

impl Default for GuidanceConfig {
    fn default() -> Self {
        Self {
            score_ceiling: DEFAULT_GUIDANCE_SCORE_CEILING,
            left_bound: DEFAULT_GUIDANCE_LEFT_BOUND,
            right_bound: DEFAULT_GUIDANCE_RIGHT_BOUND,
            too_close: DEFAULT_GUIDANCE_TOO_CLOSE,
            too_far: DEFAULT_GUIDANCE_TOO_FAR,
            min_visibility: DEFAULT_MIN_VISIBILITY,
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            success_threshold: DEFAULT_SUCCESS_THRESHOLD,
            hold_millis: DEFAULT_HOLD_MILLIS,
            countdown_seconds: DEFAULT_COUNTDOWN_SECONDS,
            auto_capture: true,
            mirror_output: None,
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            default_facing: CameraFacing::Front,
            expose_controls: false,
            resolutions: DEFAULT_CAMERA_RESOLUTIONS
                .iter()
                .map(|&(w, h)| ImageSize::new(w, h))
                .collect(),
        }
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            model_complexity: DEFAULT_MODEL_COMPLEXITY,
            smooth_landmarks: true,
            min_detection_confidence: DEFAULT_MIN_DETECTION_CONFIDENCE,
            min_tracking_confidence: DEFAULT_MIN_TRACKING_CONFIDENCE,
        }
    }
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            max_edge: DEFAULT_TEMPLATE_MAX_EDGE,
        }
    }
}

impl Config {
    /// Front camera, mirrored output, no camera controls
    #[must_use]
    pub fn selfie() -> Self {
        let mut config = Self::default();
        config.camera.default_facing = CameraFacing::Front;
        config.camera.expose_controls = false;
        config.capture.mirror_output = Some(true);
        config
    }

    /// Rear camera, unmirrored output, zoom and exposure controls exposed
    #[must_use]
    pub fn rear() -> Self {
        let mut config = Self::default();
        config.camera.default_facing = CameraFacing::Rear;
        config.camera.expose_controls = true;
        config.capture.mirror_output = Some(false);
        config
    }

    /// Whether stills from a camera with `facing` are mirrored
    #[must_use]
    pub fn mirror_output(&self, facing: CameraFacing) -> bool {
        self.capture
            .mirror_output
            .unwrap_or(facing == CameraFacing::Front)
    }

    /// Load configuration from a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;

        serde_yaml::from_str(&content).map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))
    }

    /// Save configuration to a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized or written
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)
            .map_err(|e| Error::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)?;

        Ok(())
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] describing the first invalid value
    pub fn validate(&self) -> Result<()> {
        let unit = 0.0..=1.0;

        // Scoring
        if self.scoring.key_points.is_empty() {
            return Err(Error::ConfigError("At least one key point is required".to_string()));
        }
        if self.scoring.min_matched_points == 0 || self.scoring.min_matched_points > self.scoring.key_points.len() {
            return Err(Error::ConfigError(format!(
                "min_matched_points must be between 1 and {}",
                self.scoring.key_points.len()
            )));
        }
        if !unit.contains(&self.scoring.min_visibility) {
            return Err(Error::ConfigError("min_visibility must be between 0.0 and 1.0".to_string()));
        }
        if self.scoring.max_expected_distance <= 0.0 || !self.scoring.max_expected_distance.is_finite() {
            return Err(Error::ConfigError("max_expected_distance must be positive".to_string()));
        }
        create_filter(&self.scoring.smoothing, self.scoring.smoothing_alpha)?;

        // Guidance
        if self.guidance.left_bound >= self.guidance.right_bound {
            return Err(Error::ConfigError("Guidance left_bound must be below right_bound".to_string()));
        }
        if !unit.contains(&self.guidance.min_visibility) {
            return Err(Error::ConfigError("Guidance min_visibility must be between 0.0 and 1.0".to_string()));
        }
        if self.guidance.too_far >= self.guidance.too_close {
            return Err(Error::ConfigError("Guidance too_far must be below too_close".to_string()));
        }

        // Capture
        if self.capture.success_threshold == 0 || self.capture.success_threshold > MAX_SCORE {
            return Err(Error::ConfigError(format!(
                "success_threshold must be between 1 and {MAX_SCORE}"
            )));
        }

        // Camera
        if self.camera.resolutions.is_empty() {
            return Err(Error::ConfigError("At least one camera resolution is required".to_string()));
        }
        if self.camera.resolutions.iter().any(|r| r.aspect_ratio().is_none()) {
            return Err(Error::ConfigError("Camera resolutions must be non-zero".to_string()));
        }

        // Detector
        if !unit.contains(&self.detector.min_detection_confidence)
            || !unit.contains(&self.detector.min_tracking_confidence)
        {
            return Err(Error::ConfigError(
                "Detector confidence thresholds must be between 0.0 and 1.0".to_string(),
            ));
        }

        // Template
        if self.template.max_edge == 0 {
            return Err(Error::ConfigError("Template max_edge must be greater than 0".to_string()));
        }

        Ok(())
    }
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r"# Pose Match Configuration

# Match scoring
scoring:
  key_points: [11, 12, 13, 14, 15, 16, 23, 24, 25, 26]
  min_visibility: 0.5
  min_matched_points: 5
  max_expected_distance: 0.42
  smoothing: exponential
  smoothing_alpha: 0.2

# Repositioning hints
guidance:
  score_ceiling: 50
  left_bound: 0.38
  right_bound: 0.62
  too_close: 0.42
  too_far: 0.16
  min_visibility: 0.5

# Auto-capture
capture:
  success_threshold: 80
  hold_millis: 3000
  countdown_seconds: 3
  auto_capture: true
  # mirror_output: true   # defaults to mirroring the front camera only

# Camera
camera:
  default_facing: front
  expose_controls: false
  resolutions:
    - { width: 1920, height: 1080 }
    - { width: 1280, height: 720 }
    - { width: 640, height: 480 }

# External landmark detector
detector:
  model_complexity: 0
  smooth_landmarks: true
  min_detection_confidence: 0.5
  min_tracking_confidence: 0.5

# Template acquisition
template:
  max_edge: 640
";
