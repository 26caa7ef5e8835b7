//! Coarse repositioning hints derived from the live skeleton.
//!
//! Guidance only looks at the shoulders: their midpoint tells whether the user
//! is centered, their spacing is a proxy for distance from the camera. It is
//! independent of the template and is suppressed once the score shows rough
//! alignment.

use crate::{
    config::GuidanceConfig,
    landmarks::{PoseLandmark, PoseLandmarks},
};

/// A single directional hint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guidance {
    MoveLeft,
    MoveRight,
    BackUp,
    ComeCloser,
}

impl Guidance {
    /// Text shown to the user
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::MoveLeft => "Move left",
            Self::MoveRight => "Move right",
            Self::BackUp => "Back up",
            Self::ComeCloser => "Come closer",
        }
    }
}

impl std::fmt::Display for Guidance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// Derive a hint from the live skeleton, or `None` when no hint applies.
///
/// Centering is checked before distance.
#[must_use]
pub fn advise(config: &GuidanceConfig, live: Option<&PoseLandmarks>, score: u8) -> Option<Guidance> {
    if score >= config.score_ceiling {
        return None;
    }
    let live = live?;
    let left = live
        .landmark(PoseLandmark::LeftShoulder)
        .filter(|l| l.is_visible(config.min_visibility))?;
    let right = live
        .landmark(PoseLandmark::RightShoulder)
        .filter(|l| l.is_visible(config.min_visibility))?;

    let center_x = (left.x + right.x) / 2.0;
    let shoulder_width = nalgebra::distance(&left.position(), &right.position());

    if center_x < config.left_bound {
        Some(Guidance::MoveLeft)
    } else if center_x > config.right_bound {
        Some(Guidance::MoveRight)
    } else if shoulder_width > config.too_close {
        Some(Guidance::BackUp)
    } else if shoulder_width < config.too_far {
        Some(Guidance::ComeCloser)
    } else {
        None
    }
}
