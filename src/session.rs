//! Single-threaded pose matching session.
//!
//! A session owns every piece of mutable state the pipeline needs: the
//! template and live skeletons, the smoothing accumulator, the auto-capture
//! machine and the detector router. All of it is mutated from one logical
//! thread through the event methods below (frame ready, detector result,
//! scoring tick, timer tick, user input), so no locking is involved.

use crate::{
    camera::{apply_exposure, apply_zoom, open_with_fallback, visible_controls, Camera, CameraControls, CameraFacing},
    capture::{ArtifactMetadata, AutoCapture, CaptureEvent, CapturePhase, CapturedArtifact},
    config::Config,
    detector::{DetectionResult, DetectorRouter, LandmarkDetector, RequestToken, Routed},
    guidance::{advise, Guidance},
    landmarks::{ImageSize, PoseLandmarks},
    overlay::{ghost_segments, render_still, Segment},
    scorer::{MatchScore, MatchScorer},
    store::{ArtifactId, PoseStore},
    template::{prepare, PendingTemplate, PoseTemplate},
    Error, Result,
};
use image::{DynamicImage, RgbaImage};
use log::{debug, info, warn};
use std::time::{Instant, SystemTime};

/// What a detector result did to the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionOutcome {
    /// A new template was accepted
    TemplateAccepted,
    /// The live skeleton was replaced (possibly with "no body")
    LiveUpdated,
    /// The result did not match the outstanding request and was dropped
    Discarded,
}

/// Everything the UI needs after one scoring tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameFeedback {
    pub score: MatchScore,
    pub guidance: Option<Guidance>,
    pub phase: CapturePhase,
    pub countdown: Option<u32>,
    pub event: Option<CaptureEvent>,
}

/// Pose matching session
pub struct PoseSession {
    config: Config,
    scorer: MatchScorer,
    capture: AutoCapture,
    router: DetectorRouter,
    template: Option<PoseTemplate>,
    pending_template: Option<PendingTemplate>,
    live: Option<PoseLandmarks>,
    frame_size: Option<ImageSize>,
    facing: CameraFacing,
    camera_paused: bool,
    last_score: MatchScore,
}

impl PoseSession {
    /// Create a session from a validated configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let scorer = MatchScorer::new(config.scoring.clone())?;
        let capture = AutoCapture::new(config.capture.clone());
        let facing = config.camera.default_facing;
        Ok(Self {
            config,
            scorer,
            capture,
            router: DetectorRouter::new(),
            template: None,
            pending_template: None,
            live: None,
            frame_size: None,
            facing,
            camera_paused: false,
            last_score: MatchScore::default(),
        })
    }

    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub const fn template(&self) -> Option<&PoseTemplate> {
        self.template.as_ref()
    }

    #[must_use]
    pub const fn live(&self) -> Option<&PoseLandmarks> {
        self.live.as_ref()
    }

    #[must_use]
    pub const fn frame_size(&self) -> Option<ImageSize> {
        self.frame_size
    }

    #[must_use]
    pub const fn facing(&self) -> CameraFacing {
        self.facing
    }

    #[must_use]
    pub const fn is_camera_paused(&self) -> bool {
        self.camera_paused
    }

    #[must_use]
    pub const fn is_awaiting_template(&self) -> bool {
        self.pending_template.is_some()
    }

    #[must_use]
    pub const fn last_score(&self) -> MatchScore {
        self.last_score
    }

    #[must_use]
    pub const fn capture(&self) -> &AutoCapture {
        &self.capture
    }

    /// Whether stills are mirrored for the active camera
    #[must_use]
    pub fn mirror_output(&self) -> bool {
        self.config.mirror_output(self.facing)
    }

    /// Camera controls to surface; empty unless the configuration exposes them
    #[must_use]
    pub fn camera_controls<C: Camera + ?Sized>(&self, camera: &C) -> CameraControls {
        visible_controls(camera, self.config.camera.expose_controls)
    }

    /// Set zoom when camera controls are exposed
    ///
    /// # Errors
    ///
    /// Returns an error if controls are hidden or the device has no zoom
    pub fn set_zoom<C: Camera + ?Sized>(&self, camera: &mut C, value: f64) -> Result<f64> {
        self.require_controls()?;
        apply_zoom(camera, value)
    }

    /// Set exposure compensation when camera controls are exposed
    ///
    /// # Errors
    ///
    /// Returns an error if controls are hidden or the device has no exposure control
    pub fn set_exposure<C: Camera + ?Sized>(&self, camera: &mut C, value: f64) -> Result<f64> {
        self.require_controls()?;
        apply_exposure(camera, value)
    }

    fn require_controls(&self) -> Result<()> {
        if self.config.camera.expose_controls {
            Ok(())
        } else {
            Err(Error::InvalidInput("Camera controls are disabled".to_string()))
        }
    }

    /// Hand the configured detector settings to `detector` before first use
    ///
    /// # Errors
    ///
    /// Returns [`Error::DetectorInitFailed`] if the detector rejects the settings
    pub fn attach_detector<D: LandmarkDetector + ?Sized>(&self, detector: &mut D) -> Result<()> {
        detector.configure(&self.config.detector).map_err(|e| match e {
            Error::DetectorInitFailed(_) => e,
            other => Error::DetectorInitFailed(other.to_string()),
        })?;
        debug!(
            "Detector configured (complexity {}, detection {}, tracking {})",
            self.config.detector.model_complexity,
            self.config.detector.min_detection_confidence,
            self.config.detector.min_tracking_confidence
        );
        Ok(())
    }

    /// Open the camera with the configured resolution ladder
    ///
    /// # Errors
    ///
    /// Returns [`Error::CameraUnavailable`] when every resolution fails; the
    /// session stays idle
    pub fn start_camera<C: Camera + ?Sized>(&mut self, camera: &mut C, facing: CameraFacing) -> Result<ImageSize> {
        self.reset_capture_state();
        self.frame_size = None;
        let size = open_with_fallback(camera, &self.config.camera.resolutions, facing)?;
        self.facing = facing;
        self.frame_size = Some(size);
        Ok(size)
    }

    /// Begin acquiring a template from `image`.
    ///
    /// The camera feed is paused until the detector answers.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DetectorInitFailed`] if the detector is not ready, or
    /// the detector's own error if it rejects the request
    pub fn begin_template<D: LandmarkDetector + ?Sized>(
        &mut self,
        detector: &mut D,
        name: impl Into<String>,
        image: &DynamicImage,
    ) -> Result<RequestToken> {
        if !detector.is_ready() {
            return Err(Error::DetectorInitFailed("Detector is not ready".to_string()));
        }
        let prepared = prepare(name, image, self.config.template.max_edge);
        let token = self.router.issue_template();
        self.camera_paused = true;

        if let Err(e) = detector.submit(token, &prepared.detector_input) {
            // The new token already superseded any earlier template request
            self.router.cancel();
            self.pending_template = None;
            self.camera_paused = false;
            return Err(e);
        }

        debug!("Template '{}' submitted for detection", prepared.name);
        self.pending_template = Some(PendingTemplate {
            token,
            name: prepared.name,
            original_size: prepared.original_size,
        });
        Ok(token)
    }

    /// Submit a camera frame for live detection.
    ///
    /// Frames are dropped (returning `None`) while the camera is paused, while
    /// the detector is initialising, or while an earlier request is outstanding.
    pub fn submit_live_frame<D: LandmarkDetector + ?Sized>(
        &mut self,
        detector: &mut D,
        frame: &RgbaImage,
    ) -> Option<RequestToken> {
        if self.camera_paused {
            debug!("Dropping frame: camera paused for template acquisition");
            return None;
        }
        if !detector.is_ready() {
            debug!("Dropping frame: detector not ready");
            return None;
        }
        let token = self.router.issue_live()?;
        let (width, height) = frame.dimensions();
        self.frame_size = Some(ImageSize::new(width, height));

        if let Err(e) = detector.submit(token, frame) {
            warn!("Detector rejected live frame: {}", e);
            self.router.cancel();
            return None;
        }
        Some(token)
    }

    /// Apply a result delivered by the detector callback
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoPoseDetected`] when a template image contains no body;
    /// the previous template (if any) is kept and the camera resumes
    pub fn on_detection(&mut self, result: DetectionResult) -> Result<DetectionOutcome> {
        match self.router.accept(result) {
            Routed::Stale => Ok(DetectionOutcome::Discarded),
            Routed::Live(landmarks) => {
                self.live = landmarks;
                Ok(DetectionOutcome::LiveUpdated)
            }
            Routed::Template(landmarks) => {
                self.camera_paused = false;
                let pending = self
                    .pending_template
                    .take()
                    .ok_or_else(|| Error::InvalidInput("Template result without a pending request".to_string()))?;
                let template = pending.resolve(landmarks)?;
                self.template = Some(template);
                self.live = None;
                self.reset_capture_state();
                Ok(DetectionOutcome::TemplateAccepted)
            }
        }
    }

    /// Scoring tick: score the latest skeletons, derive guidance and drive auto-capture
    pub fn tick(&mut self, now: Instant) -> FrameFeedback {
        let score = match (&self.template, self.frame_size) {
            (Some(template), Some(frame)) => self.scorer.update(
                Some(&template.landmarks),
                self.live.as_ref(),
                Some(template.image_size),
                frame,
            ),
            _ => MatchScore::default(),
        };
        self.last_score = score;

        let event = if self.template.is_some() {
            self.capture.observe(score.smoothed, now)
        } else {
            None
        };

        FrameFeedback {
            score,
            guidance: advise(&self.config.guidance, self.live.as_ref(), score.smoothed),
            phase: self.capture.phase(),
            countdown: self.capture.countdown(),
            event,
        }
    }

    /// Countdown timer tick.
    ///
    /// Run after [`PoseSession::tick`] for the same instant so a score drop
    /// cancels the countdown before the last second can fire.
    pub fn timer_tick(&mut self, now: Instant) -> Option<CaptureEvent> {
        self.capture.tick(now)
    }

    /// User pressed the capture button
    pub fn capture_manual(&mut self) -> Option<CaptureEvent> {
        if self.template.is_none() {
            debug!("Manual capture ignored: no template");
            return None;
        }
        self.capture.trigger_manual()
    }

    /// Render `frame` into a still for the pending capture and stage it for confirmation
    ///
    /// # Errors
    ///
    /// Returns an error if no capture is pending
    pub fn render_capture(&mut self, frame: &RgbaImage, created_at: SystemTime) -> Result<&CapturedArtifact> {
        let (capture_type, score) = self
            .capture
            .pending_capture()
            .ok_or_else(|| Error::InvalidInput("No capture pending".to_string()))?;
        let template = self
            .template
            .as_ref()
            .ok_or_else(|| Error::InvalidInput("No template loaded".to_string()))?;

        let image = render_still(frame, Some(template.image_size), self.mirror_output());
        let artifact = CapturedArtifact {
            image,
            metadata: ArtifactMetadata {
                pose_name: template.name.clone(),
                score,
                capture_type,
                created_at,
            },
        };
        self.capture.stage(artifact)?;
        self.capture
            .staged()
            .ok_or_else(|| Error::InvalidInput("Capture was not staged".to_string()))
    }

    /// Confirm the staged capture: save it, then reset for the next attempt.
    ///
    /// Returns `None` when nothing was staged. A failed save is reported but
    /// the session still returns to idle.
    pub fn confirm<S: PoseStore + ?Sized>(&mut self, store: &mut S) -> Option<Result<ArtifactId>> {
        let outcome = self.capture.confirm(store)?;
        self.reset_capture_state();
        Some(outcome.map_err(|e| match e {
            Error::SaveFailed(_) => e,
            other => Error::SaveFailed(other.to_string()),
        }))
    }

    /// Discard the staged capture and try again with the same template
    pub fn retry(&mut self) {
        info!("Retrying pose");
        self.capture.discard();
        self.scorer.reset();
        self.last_score = MatchScore::default();
    }

    /// Leave the camera step: drop the template and any in-flight work
    pub fn back(&mut self) {
        info!("Leaving camera step");
        self.reset_capture_state();
        self.router.cancel();
        self.template = None;
        self.pending_template = None;
        self.camera_paused = false;
    }

    /// Enable or disable auto-capture
    pub fn set_auto_capture(&mut self, enabled: bool) -> Option<CaptureEvent> {
        self.capture.set_enabled(enabled)
    }

    /// Ghost skeleton for the current template in preview coordinates
    #[must_use]
    pub fn ghost_overlay(&self) -> Vec<Segment> {
        match (&self.template, self.frame_size) {
            (Some(template), Some(frame)) => ghost_segments(
                &template.landmarks,
                Some(template.image_size),
                frame,
                self.mirror_output(),
                self.config.scoring.min_visibility,
            ),
            _ => Vec::new(),
        }
    }

    fn reset_capture_state(&mut self) {
        self.capture.reset();
        self.scorer.reset();
        self.last_score = MatchScore::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::Landmark;
    use std::collections::VecDeque;

    #[derive(Default)]
    struct QueueDetector {
        requests: VecDeque<RequestToken>,
    }

    impl LandmarkDetector for QueueDetector {
        fn is_ready(&self) -> bool {
            true
        }

        fn submit(&mut self, token: RequestToken, _image: &RgbaImage) -> Result<()> {
            self.requests.push_back(token);
            Ok(())
        }
    }

    fn body() -> PoseLandmarks {
        PoseLandmarks::new(vec![Landmark::new(0.5, 0.5, 1.0); 33])
    }

    #[test]
    fn test_camera_paused_during_template_acquisition() {
        let mut session = PoseSession::new(Config::default()).unwrap();
        let mut detector = QueueDetector::default();
        let frame = RgbaImage::new(64, 48);

        let token = session
            .begin_template(&mut detector, "tree", &DynamicImage::new_rgba8(30, 40))
            .unwrap();
        assert!(session.is_camera_paused());
        assert!(session.submit_live_frame(&mut detector, &frame).is_none());

        let outcome = session
            .on_detection(DetectionResult {
                token,
                landmarks: Some(body()),
            })
            .unwrap();
        assert_eq!(outcome, DetectionOutcome::TemplateAccepted);
        assert!(!session.is_camera_paused());
        assert_eq!(session.template().unwrap().image_size, ImageSize::new(30, 40));
        assert!(session.submit_live_frame(&mut detector, &frame).is_some());
    }

    #[test]
    fn test_no_pose_keeps_previous_template() {
        let mut session = PoseSession::new(Config::default()).unwrap();
        let mut detector = QueueDetector::default();
        let image = DynamicImage::new_rgba8(30, 40);

        let first = session.begin_template(&mut detector, "tree", &image).unwrap();
        session
            .on_detection(DetectionResult {
                token: first,
                landmarks: Some(body()),
            })
            .unwrap();

        let second = session.begin_template(&mut detector, "chair", &image).unwrap();
        let err = session
            .on_detection(DetectionResult {
                token: second,
                landmarks: None,
            })
            .unwrap_err();
        assert!(matches!(err, Error::NoPoseDetected));
        assert_eq!(session.template().unwrap().name, "tree");
        assert!(!session.is_camera_paused());
    }

    #[test]
    fn test_tick_without_template_scores_zero() {
        let mut session = PoseSession::new(Config::default()).unwrap();
        let feedback = session.tick(Instant::now());
        assert_eq!(feedback.score, MatchScore::default());
        assert_eq!(feedback.phase, CapturePhase::Idle);
        assert!(session.capture_manual().is_none());
    }

    #[test]
    fn test_back_clears_template() {
        let mut session = PoseSession::new(Config::default()).unwrap();
        let mut detector = QueueDetector::default();
        let token = session
            .begin_template(&mut detector, "tree", &DynamicImage::new_rgba8(30, 40))
            .unwrap();
        session.back();
        assert!(!session.is_awaiting_template());
        assert!(!session.is_camera_paused());
        // The late result is discarded, not applied
        let outcome = session
            .on_detection(DetectionResult {
                token,
                landmarks: Some(body()),
            })
            .unwrap();
        assert_eq!(outcome, DetectionOutcome::Discarded);
        assert!(session.template().is_none());
    }
}
