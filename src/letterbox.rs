//! Letterbox projection between the camera frame and the template's aspect ratio.
//!
//! The comparison box is the centered sub-rectangle of the camera frame that
//! has the template image's aspect ratio. Scoring, ghost-overlay rendering and
//! capture cropping all go through the same [`LetterboxBox`] so they agree on
//! where the template lives inside the live frame.

use crate::{
    constants::EPSILON,
    landmarks::ImageSize,
    utils::safe_cast::{f64_to_u32_clamp, u32_to_f64},
};
use nalgebra::Point2;

/// Comparison box in camera-frame pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LetterboxBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Integer pixel rectangle, clamped inside a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl LetterboxBox {
    /// Compute the comparison box for a camera frame.
    ///
    /// `template` is the template source image size. When it is unknown (or
    /// degenerate) the camera's own aspect ratio is used, which makes the box
    /// cover the full frame.
    #[must_use]
    pub fn fit(frame: ImageSize, template: Option<ImageSize>) -> Self {
        let frame_w = u32_to_f64(frame.width);
        let frame_h = u32_to_f64(frame.height);

        let Some(camera_aspect) = frame.aspect_ratio() else {
            return Self {
                x: 0.0,
                y: 0.0,
                width: frame_w,
                height: frame_h,
            };
        };
        let template_aspect = template
            .and_then(|size| size.aspect_ratio())
            .unwrap_or(camera_aspect);

        if template_aspect < camera_aspect {
            // Template is narrower: full height, centered horizontally
            let width = frame_h * template_aspect;
            Self {
                x: (frame_w - width) / 2.0,
                y: 0.0,
                width,
                height: frame_h,
            }
        } else {
            // Template is wider (or equal): full width, centered vertically
            let height = frame_w / template_aspect;
            Self {
                x: 0.0,
                y: (frame_h - height) / 2.0,
                width: frame_w,
                height,
            }
        }
    }

    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.width < EPSILON || self.height < EPSILON
    }

    /// Map a frame-normalized point into box-normalized coordinates.
    ///
    /// Points outside the box map outside `[0, 1]`.
    #[must_use]
    pub fn project(&self, frame: ImageSize, point: Point2<f64>) -> Option<Point2<f64>> {
        if self.is_degenerate() {
            return None;
        }
        let px = point.x * u32_to_f64(frame.width);
        let py = point.y * u32_to_f64(frame.height);
        Some(Point2::new((px - self.x) / self.width, (py - self.y) / self.height))
    }

    /// Map a box-normalized point back to frame pixel coordinates.
    #[must_use]
    pub fn unproject(&self, point: Point2<f64>) -> Point2<f64> {
        Point2::new(
            point.x.mul_add(self.width, self.x),
            point.y.mul_add(self.height, self.y),
        )
    }

    /// The box as whole pixels, clamped inside `frame`
    #[must_use]
    pub fn pixel_rect(&self, frame: ImageSize) -> PixelRect {
        let x = f64_to_u32_clamp(self.x.round(), 0, frame.width);
        let y = f64_to_u32_clamp(self.y.round(), 0, frame.height);
        let width = f64_to_u32_clamp(self.width.round(), 0, frame.width - x);
        let height = f64_to_u32_clamp(self.height.round(), 0, frame.height - y);
        PixelRect { x, y, width, height }
    }
}
