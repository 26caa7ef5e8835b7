//! Tests for pose comparison, smoothing and guidance


use pose_match::{
    config::{GuidanceConfig, ScoringConfig},
    guidance::{advise, Guidance},
    landmarks::{ImageSize, Landmark, PoseLandmarks},
    letterbox::LetterboxBox,
    scorer::{compare, raw_score, MatchScorer},
};
use test_helpers::{shifted, shoulders_at, standing_pose};

const HD: ImageSize = ImageSize::new(1280, 720);

#[test]
fn test_identical_pose_scores_100() {
    let pose = standing_pose();
    let score = raw_score(&ScoringConfig::default(), Some(&pose), Some(&pose), Some(HD), HD);
    assert_eq!(score, 100);
}

#[test]
fn test_offset_of_one_tenth_max_distance_scores_90() {
    let template = standing_pose();
    let live = shifted(&template, 0.042, 0.0);
    let score = raw_score(&ScoringConfig::default(), Some(&template), Some(&live), Some(HD), HD);
    assert_eq!(score, 90);
}

#[test]
fn test_large_offset_scores_zero() {
    let template = standing_pose();
    let live = shifted(&template, 0.3, 0.4);
    let score = raw_score(&ScoringConfig::default(), Some(&template), Some(&live), Some(HD), HD);
    assert_eq!(score, 0);
}

#[test]
fn test_four_visible_points_is_not_enough() {
    let template = standing_pose();
    let mut live: Vec<Landmark> = template.as_slice().to_vec();
    // Hide everything except shoulders and elbows
    for index in [15, 16, 23, 24, 25, 26] {
        live[index].visibility = Some(0.2);
    }
    let live = PoseLandmarks::new(live);
    let config = ScoringConfig::default();

    let comparison = compare(&config, Some(&template), Some(&live), Some(HD), HD).unwrap();
    assert_eq!(comparison.matched_points, 4);
    assert_eq!(raw_score(&config, Some(&template), Some(&live), Some(HD), HD), 0);
}

#[test]
fn test_missing_visibility_counts_as_visible() {
    let template = standing_pose();
    let live = PoseLandmarks::new(
        template
            .iter()
            .map(|l| Landmark {
                visibility: None,
                ..*l
            })
            .collect(),
    );
    let score = raw_score(&ScoringConfig::default(), Some(&template), Some(&live), Some(HD), HD);
    assert_eq!(score, 100);
}

#[test]
fn test_absent_skeletons_score_zero() {
    let pose = standing_pose();
    let config = ScoringConfig::default();
    assert_eq!(raw_score(&config, None, Some(&pose), Some(HD), HD), 0);
    assert_eq!(raw_score(&config, Some(&pose), None, Some(HD), HD), 0);
    assert_eq!(
        raw_score(&config, Some(&pose), Some(&PoseLandmarks::default()), Some(HD), HD),
        0
    );
}

#[test]
fn test_portrait_template_in_landscape_frame() {
    let frame = ImageSize::new(640, 480);
    let template_size = ImageSize::new(300, 400);
    let letterbox = LetterboxBox::fit(frame, Some(template_size));
    assert!((letterbox.x - 140.0).abs() < 1e-9);
    assert!((letterbox.width - 360.0).abs() < 1e-9);

    // A live point at frame center lands at box center
    let mut template = vec![Landmark::new(0.5, 0.5, 1.0); 33];
    template[11] = Landmark::new(0.5, 0.5, 1.0);
    let template = PoseLandmarks::new(template);
    let live = PoseLandmarks::new(vec![Landmark::new(0.5, 0.5, 1.0); 33]);
    let score = raw_score(
        &ScoringConfig::default(),
        Some(&template),
        Some(&live),
        Some(template_size),
        frame,
    );
    assert_eq!(score, 100);
}

#[test]
fn test_unknown_template_size_falls_back_to_frame_aspect() {
    let pose = standing_pose();
    let with_size = raw_score(&ScoringConfig::default(), Some(&pose), Some(&pose), Some(HD), HD);
    let without_size = raw_score(&ScoringConfig::default(), Some(&pose), Some(&pose), None, HD);
    assert_eq!(with_size, without_size);
}

#[test]
fn test_smoothing_sequence() {
    let pose = standing_pose();
    let mut scorer = MatchScorer::new(ScoringConfig::default()).unwrap();

    let first = scorer.update(Some(&pose), Some(&pose), Some(HD), HD);
    assert_eq!(first.raw, 100);
    assert_eq!(first.smoothed, 20);

    let second = scorer.update(Some(&pose), Some(&pose), Some(HD), HD);
    assert_eq!(second.smoothed, 36);

    // Dropping to zero decays rather than snapping
    let third = scorer.update(Some(&pose), None, Some(HD), HD);
    assert_eq!(third.raw, 0);
    assert_eq!(third.smoothed, 29);

    scorer.reset();
    let after_reset = scorer.update(Some(&pose), Some(&pose), Some(HD), HD);
    assert_eq!(after_reset.smoothed, 20);
}

#[test]
fn test_guidance_centering_before_distance() {
    let config = GuidanceConfig::default();
    let live = shoulders_at(0.30, 0.50);
    assert_eq!(advise(&config, Some(&live), 10), Some(Guidance::MoveLeft));
}

#[test]
fn test_guidance_thresholds() {
    let config = GuidanceConfig::default();
    assert_eq!(
        advise(&config, Some(&shoulders_at(0.70, 0.2)), 10),
        Some(Guidance::MoveRight)
    );
    assert_eq!(
        advise(&config, Some(&shoulders_at(0.50, 0.45)), 10),
        Some(Guidance::BackUp)
    );
    assert_eq!(
        advise(&config, Some(&shoulders_at(0.50, 0.10)), 10),
        Some(Guidance::ComeCloser)
    );
    assert_eq!(advise(&config, Some(&shoulders_at(0.50, 0.25)), 10), None);
}

#[test]
fn test_guidance_suppressed_at_50() {
    let config = GuidanceConfig::default();
    let live = shoulders_at(0.10, 0.10);
    assert!(advise(&config, Some(&live), 49).is_some());
    assert_eq!(advise(&config, Some(&live), 50), None);
    assert_eq!(advise(&config, None, 0), None);
}
