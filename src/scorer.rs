//! Template-vs-live skeleton similarity scoring.
//!
//! The live skeleton is normalized to the camera frame while the template is
//! normalized to its own source image. Before comparing, each live point is
//! projected into the letterbox box that has the template's aspect ratio, so
//! both skeletons are measured in the same unit square.

use crate::{
    config::ScoringConfig,
    filters::{create_filter, ScoreFilter},
    landmarks::{ImageSize, PoseLandmarks},
    letterbox::LetterboxBox,
    utils::safe_cast::{round_score, usize_to_u32},
    Result,
};
use log::debug;

/// Result of one scoring tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MatchScore {
    /// Unsmoothed score for this frame
    pub raw: u8,
    /// Score after temporal smoothing; this is what the UI and auto-capture see
    pub smoothed: u8,
}

/// Per-frame comparison statistics
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Comparison {
    /// Number of key points visible in both skeletons
    pub matched_points: usize,
    /// Mean Euclidean distance in box-normalized units
    pub mean_distance: f64,
}

/// Compare the configured key points of two skeletons inside the letterbox box.
///
/// Returns `None` when either skeleton is missing or empty, or when no key
/// point is visible on both sides.
#[must_use]
pub fn compare(
    config: &ScoringConfig,
    template: Option<&PoseLandmarks>,
    live: Option<&PoseLandmarks>,
    template_size: Option<ImageSize>,
    frame: ImageSize,
) -> Option<Comparison> {
    let template = template.filter(|t| !t.is_empty())?;
    let live = live.filter(|l| !l.is_empty())?;
    let letterbox = LetterboxBox::fit(frame, template_size);

    let distances: Vec<f64> = config
        .key_points
        .iter()
        .filter_map(|&index| {
            let t = template.get(index)?;
            let l = live.get(index)?;
            if !t.is_visible(config.min_visibility) || !l.is_visible(config.min_visibility) {
                return None;
            }
            let projected = letterbox.project(frame, l.position())?;
            Some(nalgebra::distance(&t.position(), &projected))
        })
        .collect();

    if distances.is_empty() {
        return None;
    }

    let count = f64::from(usize_to_u32(distances.len()).ok()?);
    Some(Comparison {
        matched_points: distances.len(),
        mean_distance: distances.iter().sum::<f64>() / count,
    })
}

/// Unsmoothed 0-100 similarity score.
///
/// Zero when either skeleton is missing or fewer than
/// `config.min_matched_points` key points are mutually visible.
#[must_use]
pub fn raw_score(
    config: &ScoringConfig,
    template: Option<&PoseLandmarks>,
    live: Option<&PoseLandmarks>,
    template_size: Option<ImageSize>,
    frame: ImageSize,
) -> u8 {
    let Some(comparison) = compare(config, template, live, template_size, frame) else {
        return 0;
    };
    if comparison.matched_points < config.min_matched_points {
        return 0;
    }

    let normalized = (comparison.mean_distance / config.max_expected_distance).clamp(0.0, 1.0);
    round_score(100.0 * (1.0 - normalized))
}

/// Stateful scorer owning the smoothing accumulator for one camera session
pub struct MatchScorer {
    config: ScoringConfig,
    filter: Box<dyn ScoreFilter>,
}

impl MatchScorer {
    /// Create a new scorer
    ///
    /// # Errors
    ///
    /// Returns an error if the configured smoothing filter is unknown or its alpha is invalid
    pub fn new(config: ScoringConfig) -> Result<Self> {
        let filter = create_filter(&config.smoothing, config.smoothing_alpha)?;
        Ok(Self { config, filter })
    }

    #[must_use]
    pub const fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Score one frame and advance the smoothing state
    pub fn update(
        &mut self,
        template: Option<&PoseLandmarks>,
        live: Option<&PoseLandmarks>,
        template_size: Option<ImageSize>,
        frame: ImageSize,
    ) -> MatchScore {
        let raw = raw_score(&self.config, template, live, template_size, frame);
        let smoothed = round_score(self.filter.apply(f64::from(raw)));
        debug!("Score raw={} smoothed={}", raw, smoothed);
        MatchScore { raw, smoothed }
    }

    /// Reset smoothing to zero (retry, back, or completed capture)
    pub fn reset(&mut self) {
        self.filter.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::Landmark;
    use proptest::prelude::*;

    fn skeleton(points: &[(usize, f64, f64, f64)]) -> PoseLandmarks {
        let mut landmarks = vec![Landmark::new(0.0, 0.0, 0.0); 33];
        for &(i, x, y, v) in points {
            landmarks[i] = Landmark::new(x, y, v);
        }
        PoseLandmarks::new(landmarks)
    }

    fn standing() -> PoseLandmarks {
        skeleton(&[
            (11, 0.40, 0.30, 0.9),
            (12, 0.60, 0.30, 0.9),
            (13, 0.35, 0.45, 0.9),
            (14, 0.65, 0.45, 0.9),
            (15, 0.33, 0.60, 0.9),
            (16, 0.67, 0.60, 0.9),
            (23, 0.45, 0.60, 0.9),
            (24, 0.55, 0.60, 0.9),
            (25, 0.45, 0.80, 0.9),
            (26, 0.55, 0.80, 0.9),
        ])
    }

    const SQUARE: ImageSize = ImageSize::new(600, 600);

    #[test]
    fn test_identical_skeleton_scores_full() {
        let config = ScoringConfig::default();
        let pose = standing();
        assert_eq!(raw_score(&config, Some(&pose), Some(&pose), Some(SQUARE), SQUARE), 100);
    }

    #[test]
    fn test_missing_inputs_score_zero() {
        let config = ScoringConfig::default();
        let pose = standing();
        let empty = PoseLandmarks::default();
        assert_eq!(raw_score(&config, None, Some(&pose), Some(SQUARE), SQUARE), 0);
        assert_eq!(raw_score(&config, Some(&pose), None, Some(SQUARE), SQUARE), 0);
        assert_eq!(raw_score(&config, Some(&empty), Some(&pose), Some(SQUARE), SQUARE), 0);
    }

    #[test]
    fn test_uniform_offset_maps_linearly() {
        let config = ScoringConfig::default();
        let template = standing();
        // Shift every live point right by 0.21, half the max expected distance
        let shifted: Vec<Landmark> = template
            .iter()
            .map(|l| Landmark::new(l.x + 0.21, l.y, l.visibility_or_full()))
            .collect();
        let live = PoseLandmarks::new(shifted);
        assert_eq!(raw_score(&config, Some(&template), Some(&live), Some(SQUARE), SQUARE), 50);
    }

    #[test]
    fn test_far_offset_clamps_to_zero() {
        let config = ScoringConfig::default();
        let template = standing();
        let shifted: Vec<Landmark> = template
            .iter()
            .map(|l| Landmark::new(l.x + 0.9, l.y, l.visibility_or_full()))
            .collect();
        let live = PoseLandmarks::new(shifted);
        assert_eq!(raw_score(&config, Some(&template), Some(&live), Some(SQUARE), SQUARE), 0);
    }

    #[test]
    fn test_insufficient_visibility_scores_zero() {
        let config = ScoringConfig::default();
        let template = standing();
        // Only four key points visible on the live side
        let live = skeleton(&[
            (11, 0.40, 0.30, 0.9),
            (12, 0.60, 0.30, 0.9),
            (13, 0.35, 0.45, 0.9),
            (14, 0.65, 0.45, 0.9),
            (15, 0.33, 0.60, 0.2),
            (16, 0.67, 0.60, 0.2),
        ]);
        let cmp = compare(&config, Some(&template), Some(&live), Some(SQUARE), SQUARE).unwrap();
        assert_eq!(cmp.matched_points, 4);
        assert!(cmp.mean_distance < 1e-12);
        assert_eq!(raw_score(&config, Some(&template), Some(&live), Some(SQUARE), SQUARE), 0);
    }

    #[test]
    fn test_live_points_are_letterboxed() {
        let config = ScoringConfig::default();
        // Template is 3:4, camera is 4:3; the template occupies the middle 360px of 640
        let template_size = ImageSize::new(300, 400);
        let frame = ImageSize::new(640, 480);
        let template = standing();
        let live: Vec<Landmark> = template
            .iter()
            .map(|l| {
                let x = l.x.mul_add(360.0, 140.0) / 640.0;
                Landmark::new(x, l.y, l.visibility_or_full())
            })
            .collect();
        let live = PoseLandmarks::new(live);
        assert_eq!(raw_score(&config, Some(&template), Some(&live), Some(template_size), frame), 100);
        // Without letterboxing the same pair would not be a perfect match
        assert!(raw_score(&config, Some(&template), Some(&live), None, frame) < 100);
    }

    #[test]
    fn test_scorer_smooths_and_resets() {
        let mut scorer = MatchScorer::new(ScoringConfig::default()).unwrap();
        let pose = standing();
        let first = scorer.update(Some(&pose), Some(&pose), Some(SQUARE), SQUARE);
        assert_eq!(first, MatchScore { raw: 100, smoothed: 20 });
        let second = scorer.update(Some(&pose), Some(&pose), Some(SQUARE), SQUARE);
        assert_eq!(second.smoothed, 36);

        scorer.reset();
        let after = scorer.update(Some(&pose), Some(&pose), Some(SQUARE), SQUARE);
        assert_eq!(after.smoothed, 20);
    }

    proptest! {
        #[test]
        fn prop_score_within_bounds(
            coords in proptest::collection::vec((-0.5f64..1.5, -0.5f64..1.5, 0.0f64..1.0), 33),
            tw in 1u32..4000,
            th in 1u32..4000,
        ) {
            let config = ScoringConfig::default();
            let template = standing();
            let live = PoseLandmarks::new(
                coords.iter().map(|&(x, y, v)| Landmark::new(x, y, v)).collect(),
            );
            let score = raw_score(
                &config,
                Some(&template),
                Some(&live),
                Some(ImageSize::new(tw, th)),
                ImageSize::new(1280, 720),
            );
            prop_assert!(score <= 100);
        }
    }
}
