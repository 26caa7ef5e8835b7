//! Body landmark types produced by the external detector.
//!
//! Coordinates are normalized to `[0, 1]` relative to the image or frame the
//! detector was given. The core never constructs landmarks itself; it only
//! reads what the detector reports.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// A single detected body joint
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    /// Horizontal position, normalized to the source width
    pub x: f64,
    /// Vertical position, normalized to the source height
    pub y: f64,
    /// Relative depth, when the detector reports it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f64>,
    /// Detection confidence in `[0, 1]`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<f64>,
}

impl Landmark {
    #[must_use]
    pub const fn new(x: f64, y: f64, visibility: f64) -> Self {
        Self {
            x,
            y,
            z: None,
            visibility: Some(visibility),
        }
    }

    /// Visibility, treating an unreported value as fully visible
    #[must_use]
    pub fn visibility_or_full(&self) -> f64 {
        self.visibility.unwrap_or(1.0)
    }

    #[must_use]
    pub fn is_visible(&self, min_visibility: f64) -> bool {
        self.visibility_or_full() >= min_visibility
    }

    #[must_use]
    pub fn position(&self) -> Point2<f64> {
        Point2::new(self.x, self.y)
    }
}

/// Anatomical landmark numbering used by the detector (body subset)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum PoseLandmark {
    LeftShoulder = 11,
    RightShoulder = 12,
    LeftElbow = 13,
    RightElbow = 14,
    LeftWrist = 15,
    RightWrist = 16,
    LeftHip = 23,
    RightHip = 24,
    LeftKnee = 25,
    RightKnee = 26,
    LeftAnkle = 27,
    RightAnkle = 28,
}

impl PoseLandmark {
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Bone connections drawn for the ghost overlay
pub const SKELETON_CONNECTIONS: [(PoseLandmark, PoseLandmark); 12] = [
    // Upper body
    (PoseLandmark::LeftShoulder, PoseLandmark::RightShoulder),
    (PoseLandmark::LeftShoulder, PoseLandmark::LeftElbow),
    (PoseLandmark::LeftElbow, PoseLandmark::LeftWrist),
    (PoseLandmark::RightShoulder, PoseLandmark::RightElbow),
    (PoseLandmark::RightElbow, PoseLandmark::RightWrist),
    // Torso
    (PoseLandmark::LeftShoulder, PoseLandmark::LeftHip),
    (PoseLandmark::RightShoulder, PoseLandmark::RightHip),
    (PoseLandmark::LeftHip, PoseLandmark::RightHip),
    // Lower body
    (PoseLandmark::LeftHip, PoseLandmark::LeftKnee),
    (PoseLandmark::LeftKnee, PoseLandmark::LeftAnkle),
    (PoseLandmark::RightHip, PoseLandmark::RightKnee),
    (PoseLandmark::RightKnee, PoseLandmark::RightAnkle),
];

/// Ordered landmark sequence for one detected person.
///
/// An empty sequence means no body was found.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PoseLandmarks(Vec<Landmark>);

impl PoseLandmarks {
    #[must_use]
    pub const fn new(landmarks: Vec<Landmark>) -> Self {
        Self(landmarks)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Landmark> {
        self.0.get(index)
    }

    #[must_use]
    pub fn landmark(&self, which: PoseLandmark) -> Option<&Landmark> {
        self.get(which.index())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Landmark> {
        self.0.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Landmark] {
        &self.0
    }
}

impl From<Vec<Landmark>> for PoseLandmarks {
    fn from(landmarks: Vec<Landmark>) -> Self {
        Self(landmarks)
    }
}

/// Pixel dimensions of an image or camera frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width over height, `None` for a degenerate size
    #[must_use]
    pub fn aspect_ratio(&self) -> Option<f64> {
        if self.width == 0 || self.height == 0 {
            None
        } else {
            Some(f64::from(self.width) / f64::from(self.height))
        }
    }
}

impl std::fmt::Display for ImageSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl std::str::FromStr for ImageSize {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        let (w, h) = s
            .split_once(['x', 'X'])
            .ok_or_else(|| crate::Error::InvalidInput(format!("Expected WIDTHxHEIGHT, got {s}")))?;
        let width = w
            .trim()
            .parse()
            .map_err(|_| crate::Error::InvalidInput(format!("Invalid width in {s}")))?;
        let height = h
            .trim()
            .parse()
            .map_err(|_| crate::Error::InvalidInput(format!("Invalid height in {s}")))?;
        Ok(Self { width, height })
    }
}
