//! Constants used throughout the library

/// Landmark indices compared by the scorer: shoulders, elbows, wrists, hips, knees
pub const KEY_POINT_INDICES: [usize; 10] = [11, 12, 13, 14, 15, 16, 23, 24, 25, 26];

/// Minimum per-landmark visibility on both sides for a point to be compared
pub const DEFAULT_MIN_VISIBILITY: f64 = 0.5;

/// Minimum number of mutually visible key points before a score is produced
pub const DEFAULT_MIN_MATCHED_POINTS: usize = 5;

/// Mean distance (box-normalized units) that maps to a score of zero
pub const DEFAULT_MAX_EXPECTED_DISTANCE: f64 = 0.42;

/// Exponential smoothing factor applied to raw scores
pub const DEFAULT_SMOOTHING_ALPHA: f64 = 0.2;

/// Highest possible score
pub const MAX_SCORE: u8 = 100;

/// Guidance is only offered below this score
pub const DEFAULT_GUIDANCE_SCORE_CEILING: u8 = 50;

/// Shoulder-centre bounds for horizontal guidance
pub const DEFAULT_GUIDANCE_LEFT_BOUND: f64 = 0.38;
pub const DEFAULT_GUIDANCE_RIGHT_BOUND: f64 = 0.62;

/// Shoulder-width bounds for distance guidance
pub const DEFAULT_GUIDANCE_TOO_CLOSE: f64 = 0.42;
pub const DEFAULT_GUIDANCE_TOO_FAR: f64 = 0.16;

/// Auto-capture defaults
pub const DEFAULT_SUCCESS_THRESHOLD: u8 = 80;
pub const DEFAULT_HOLD_MILLIS: u64 = 3000;
pub const DEFAULT_COUNTDOWN_SECONDS: u32 = 3;

/// Interval between countdown ticks
pub const COUNTDOWN_TICK_MILLIS: u64 = 1000;

/// Longest edge of an image handed to the detector in template mode
pub const DEFAULT_TEMPLATE_MAX_EDGE: u32 = 640;

/// Camera resolution fallback ladder, tried in order
pub const DEFAULT_CAMERA_RESOLUTIONS: [(u32, u32); 3] = [(1920, 1080), (1280, 720), (640, 480)];

/// Detector defaults
pub const DEFAULT_MODEL_COMPLEXITY: u8 = 0;
pub const DEFAULT_MIN_DETECTION_CONFIDENCE: f64 = 0.5;
pub const DEFAULT_MIN_TRACKING_CONFIDENCE: f64 = 0.5;

/// Numeric precision epsilon
pub const EPSILON: f64 = 1e-10;
