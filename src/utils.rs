//! Utility functions for image sizing and numeric conversions.

pub mod safe_cast;

use crate::landmarks::ImageSize;
use safe_cast::{f64_to_u32_clamp, u32_to_f64};

/// Scale `size` down so its longest edge is at most `max_edge`, keeping the aspect ratio.
///
/// Sizes already within the limit are returned unchanged; images are never upscaled.
#[must_use]
pub fn fit_longest_edge(size: ImageSize, max_edge: u32) -> ImageSize {
    let longest = size.width.max(size.height);
    if longest <= max_edge || longest == 0 {
        return size;
    }

    let scale = u32_to_f64(max_edge) / u32_to_f64(longest);
    let width = f64_to_u32_clamp((u32_to_f64(size.width) * scale).round(), 1, max_edge);
    let height = f64_to_u32_clamp((u32_to_f64(size.height) * scale).round(), 1, max_edge);
    ImageSize::new(width, height)
}
