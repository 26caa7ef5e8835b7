//! Template acquisition: from a source image to a template skeleton.
//!
//! Images are downscaled before detection to bound detector latency and
//! memory, but the template remembers the original pixel size because scoring
//! and overlay rendering work in the original aspect ratio.

use crate::{
    detector::RequestToken,
    landmarks::{ImageSize, PoseLandmarks},
    store::{ArtifactId, PoseStore},
    utils::fit_longest_edge,
    Error, Result,
};
use image::{imageops::FilterType, DynamicImage, GenericImageView, RgbaImage};
use log::{debug, info};
use std::path::PathBuf;

/// Where a template image comes from
#[derive(Debug, Clone)]
pub enum TemplateSource {
    /// Image supplied directly by the user
    Upload { name: String, image: DynamicImage },
    /// Bundled preset image on disk
    Preset { name: String, path: PathBuf },
    /// A previously saved capture
    SavedCapture(ArtifactId),
}

impl TemplateSource {
    /// Resolve the source to a name and decoded image
    ///
    /// # Errors
    ///
    /// Returns an error if a preset cannot be decoded or a saved capture does not exist
    pub fn load<S: PoseStore + ?Sized>(self, store: &S) -> Result<(String, DynamicImage)> {
        match self {
            Self::Upload { name, image } => Ok((name, image)),
            Self::Preset { name, path } => {
                debug!("Loading preset template {} from {}", name, path.display());
                Ok((name, image::open(&path)?))
            }
            Self::SavedCapture(id) => {
                let artifact = store
                    .get_by_id(&id)?
                    .ok_or_else(|| Error::NotFound(id.to_string()))?;
                Ok((
                    artifact.metadata.pose_name,
                    DynamicImage::ImageRgba8(artifact.image),
                ))
            }
        }
    }
}

/// An accepted template
#[derive(Debug, Clone, PartialEq)]
pub struct PoseTemplate {
    pub name: String,
    pub landmarks: PoseLandmarks,
    /// Original (pre-downscale) pixel size of the source image
    pub image_size: ImageSize,
}

/// Image ready to hand to the detector
#[derive(Debug, Clone)]
pub struct PreparedTemplate {
    pub name: String,
    pub original_size: ImageSize,
    pub detector_input: RgbaImage,
}

/// Downscale `image` so its longest edge is at most `max_edge`
#[must_use]
pub fn prepare(name: impl Into<String>, image: &DynamicImage, max_edge: u32) -> PreparedTemplate {
    let (width, height) = image.dimensions();
    let original_size = ImageSize::new(width, height);
    let target = fit_longest_edge(original_size, max_edge);

    let detector_input = if target == original_size {
        image.to_rgba8()
    } else {
        debug!("Downscaling template from {} to {}", original_size, target);
        image
            .resize_exact(target.width, target.height, FilterType::Triangle)
            .to_rgba8()
    };

    PreparedTemplate {
        name: name.into(),
        original_size,
        detector_input,
    }
}

/// A template request awaiting its detector result
#[derive(Debug, Clone)]
pub struct PendingTemplate {
    pub token: RequestToken,
    pub name: String,
    pub original_size: ImageSize,
}

impl PendingTemplate {
    /// Turn the detector result into a template
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoPoseDetected`] if the detector found no body
    pub fn resolve(self, landmarks: Option<PoseLandmarks>) -> Result<PoseTemplate> {
        let landmarks = landmarks
            .filter(|l| !l.is_empty())
            .ok_or(Error::NoPoseDetected)?;
        info!(
            "Template '{}' accepted ({} landmarks, {})",
            self.name,
            landmarks.len(),
            self.original_size
        );
        Ok(PoseTemplate {
            name: self.name,
            landmarks,
            image_size: self.original_size,
        })
    }
}
