//! Ghost overlay geometry and capture still rendering.
//!
//! Both go through the same [`LetterboxBox`] the scorer uses, so the ghost
//! skeleton drawn over the preview sits exactly where it is being scored and
//! the saved still shows exactly that region.

use crate::{
    landmarks::{ImageSize, PoseLandmarks, SKELETON_CONNECTIONS},
    letterbox::LetterboxBox,
    utils::safe_cast::u32_to_f64,
};
use image::{imageops, RgbaImage};
use nalgebra::Point2;

/// One bone of the ghost skeleton, in preview pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub from: Point2<f64>,
    pub to: Point2<f64>,
}

fn to_preview(letterbox: &LetterboxBox, frame: ImageSize, point: Point2<f64>, mirror: bool) -> Point2<f64> {
    let p = letterbox.unproject(point);
    if mirror {
        Point2::new(u32_to_f64(frame.width) - p.x, p.y)
    } else {
        p
    }
}

/// Bones of the template skeleton mapped into the preview.
///
/// Bones with either end below `min_visibility` are skipped.
#[must_use]
pub fn ghost_segments(
    template: &PoseLandmarks,
    template_size: Option<ImageSize>,
    frame: ImageSize,
    mirror: bool,
    min_visibility: f64,
) -> Vec<Segment> {
    let letterbox = LetterboxBox::fit(frame, template_size);
    if letterbox.is_degenerate() {
        return Vec::new();
    }

    SKELETON_CONNECTIONS
        .iter()
        .filter_map(|&(a, b)| {
            let a = template.landmark(a).filter(|l| l.is_visible(min_visibility))?;
            let b = template.landmark(b).filter(|l| l.is_visible(min_visibility))?;
            Some(Segment {
                from: to_preview(&letterbox, frame, a.position(), mirror),
                to: to_preview(&letterbox, frame, b.position(), mirror),
            })
        })
        .collect()
}

/// Crop `frame` to the comparison box and mirror it when requested
#[must_use]
pub fn render_still(frame: &RgbaImage, template_size: Option<ImageSize>, mirror: bool) -> RgbaImage {
    let (width, height) = frame.dimensions();
    let frame_size = ImageSize::new(width, height);
    let rect = LetterboxBox::fit(frame_size, template_size).pixel_rect(frame_size);

    let cropped = imageops::crop_imm(frame, rect.x, rect.y, rect.width, rect.height).to_image();
    if mirror {
        imageops::flip_horizontal(&cropped)
    } else {
        cropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::Landmark;
    use image::Rgba;

    fn template() -> PoseLandmarks {
        let mut landmarks = vec![Landmark::new(0.0, 0.0, 0.0); 33];
        landmarks[11] = Landmark::new(0.0, 0.25, 1.0);
        landmarks[12] = Landmark::new(1.0, 0.25, 1.0);
        PoseLandmarks::new(landmarks)
    }

    #[test]
    fn test_ghost_segments_follow_letterbox() {
        let frame = ImageSize::new(640, 480);
        let segments = ghost_segments(&template(), Some(ImageSize::new(300, 400)), frame, false, 0.5);
        // Only the shoulder line is visible
        assert_eq!(segments.len(), 1);
        let s = segments[0];
        assert!((s.from.x - 140.0).abs() < 1e-9);
        assert!((s.to.x - 500.0).abs() < 1e-9);
        assert!((s.from.y - 120.0).abs() < 1e-9);
    }

    #[test]
    fn test_ghost_segments_mirrored() {
        let frame = ImageSize::new(640, 480);
        let segments = ghost_segments(&template(), Some(ImageSize::new(300, 400)), frame, true, 0.5);
        let s = segments[0];
        assert!((s.from.x - 500.0).abs() < 1e-9);
        assert!((s.to.x - 140.0).abs() < 1e-9);
    }

    #[test]
    fn test_render_still_crops_to_box() {
        let mut frame = RgbaImage::new(640, 480);
        // Mark the left edge of the comparison box
        for y in 0..480 {
            frame.put_pixel(140, y, Rgba([255, 0, 0, 255]));
        }
        let still = render_still(&frame, Some(ImageSize::new(300, 400)), false);
        assert_eq!(still.dimensions(), (360, 480));
        assert_eq!(still.get_pixel(0, 0), &Rgba([255, 0, 0, 255]));

        let mirrored = render_still(&frame, Some(ImageSize::new(300, 400)), true);
        assert_eq!(mirrored.get_pixel(359, 10), &Rgba([255, 0, 0, 255]));
        assert_eq!(mirrored.get_pixel(0, 10), &Rgba([0, 0, 0, 0]));
    }
}
