//! Offline replay of recorded landmark streams.
//!
//! A recording is a JSON-lines file, one [`RecordedFrame`] per line. The
//! replay drives a [`PoseSession`] exactly as a live camera loop would: each
//! recorded frame is submitted, the scripted detector answers, then the
//! scoring tick and the countdown timer run at the recorded timestamp.

use crate::{
    camera::{Camera, CameraFacing},
    capture::{CaptureEvent, CapturePhase},
    config::Config,
    detector::{DetectionResult, LandmarkDetector, RequestToken},
    guidance::Guidance,
    landmarks::{ImageSize, PoseLandmarks},
    session::PoseSession,
    store::{ArtifactId, PoseStore},
    Error, Result,
};
use image::{DynamicImage, RgbaImage};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::{
    collections::VecDeque,
    fmt,
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
    time::{Duration, Instant, SystemTime},
};

/// One line of a recording
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedFrame {
    /// Milliseconds since the start of the recording
    pub t_ms: u64,
    /// `None` when no body was detected in this frame
    #[serde(default)]
    pub landmarks: Option<PoseLandmarks>,
}

/// Read a JSON-lines recording. Blank lines are skipped.
///
/// # Errors
///
/// Returns an error if the file cannot be read, a line is not valid JSON, or
/// timestamps go backwards
pub fn load_frames<P: AsRef<Path>>(path: P) -> Result<Vec<RecordedFrame>> {
    let reader = BufReader::new(File::open(path.as_ref())?);
    let mut frames: Vec<RecordedFrame> = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let frame: RecordedFrame = serde_json::from_str(&line)?;
        if let Some(prev) = frames.last() {
            if frame.t_ms < prev.t_ms {
                return Err(Error::InvalidInput(format!(
                    "Timestamps must not decrease ({} after {})",
                    frame.t_ms, prev.t_ms
                )));
            }
        }
        frames.push(frame);
    }
    debug!("Loaded {} recorded frames from {}", frames.len(), path.as_ref().display());
    Ok(frames)
}

/// Read a template skeleton stored as a JSON array of landmarks
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed
pub fn load_landmarks<P: AsRef<Path>>(path: P) -> Result<PoseLandmarks> {
    let file = File::open(path)?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

/// Detector that answers each request with a scripted skeleton
#[derive(Debug, Default)]
pub struct ReplayDetector {
    next: Option<Option<PoseLandmarks>>,
    completed: VecDeque<DetectionResult>,
}

impl ReplayDetector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the answer for the next submitted request
    pub fn script(&mut self, landmarks: Option<PoseLandmarks>) {
        self.next = Some(landmarks);
    }

    /// Take the oldest completed result
    pub fn poll(&mut self) -> Option<DetectionResult> {
        self.completed.pop_front()
    }
}

impl LandmarkDetector for ReplayDetector {
    fn is_ready(&self) -> bool {
        true
    }

    fn submit(&mut self, token: RequestToken, _image: &RgbaImage) -> Result<()> {
        let landmarks = self
            .next
            .take()
            .ok_or_else(|| Error::InvalidInput("No scripted detection for request".to_string()))?;
        self.completed.push_back(DetectionResult { token, landmarks });
        Ok(())
    }
}

/// Camera that always delivers one fixed resolution
#[derive(Debug, Clone, Copy)]
struct FixedCamera {
    size: ImageSize,
}

impl Camera for FixedCamera {
    fn open(&mut self, _resolution: ImageSize, _facing: CameraFacing) -> Result<ImageSize> {
        Ok(self.size)
    }

    fn close(&mut self) {}
}

/// Replay settings
#[derive(Debug, Clone)]
pub struct ReplayOptions {
    pub camera_size: ImageSize,
    pub facing: CameraFacing,
    pub auto_capture: bool,
    /// Confirm every capture into the store; otherwise captures are discarded
    pub auto_confirm: bool,
    /// Wall-clock time of the first frame, used for capture metadata
    pub started_at: SystemTime,
}

impl Default for ReplayOptions {
    fn default() -> Self {
        Self {
            camera_size: ImageSize::new(1280, 720),
            facing: CameraFacing::Front,
            auto_capture: true,
            auto_confirm: false,
            started_at: SystemTime::UNIX_EPOCH,
        }
    }
}

/// Template input for a replay
#[derive(Debug, Clone)]
pub struct ReplayTemplate {
    pub name: String,
    pub image: DynamicImage,
    pub landmarks: PoseLandmarks,
}

/// State after one replayed frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickRecord {
    pub t_ms: u64,
    pub raw: u8,
    pub smoothed: u8,
    pub guidance: Option<Guidance>,
    pub phase: CapturePhase,
    pub countdown: Option<u32>,
    pub events: [Option<CaptureEvent>; 2],
}

impl fmt::Display for TickRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:>7}ms score {:>3} (raw {:>3}) {:?}",
            self.t_ms, self.smoothed, self.raw, self.phase
        )?;
        if let Some(n) = self.countdown {
            write!(f, " [{n}]")?;
        }
        if let Some(g) = self.guidance {
            write!(f, " \"{g}\"")?;
        }
        for event in self.events.iter().flatten() {
            write!(f, " <{event:?}>")?;
        }
        Ok(())
    }
}

/// Outcome of a full replay
#[derive(Debug, Clone, Default)]
pub struct ReplayReport {
    pub ticks: Vec<TickRecord>,
    pub captures: usize,
    pub saved: Vec<ArtifactId>,
    pub failed_saves: usize,
}

/// Replay `frames` against `template`
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the template skeleton
/// is rejected
pub fn run_replay<S: PoseStore + ?Sized>(
    config: Config,
    template: ReplayTemplate,
    frames: &[RecordedFrame],
    options: &ReplayOptions,
    store: &mut S,
) -> Result<ReplayReport> {
    let mut session = PoseSession::new(config)?;
    let mut detector = ReplayDetector::new();
    session.attach_detector(&mut detector)?;
    let mut camera = FixedCamera {
        size: options.camera_size,
    };
    session.start_camera(&mut camera, options.facing)?;
    session.set_auto_capture(options.auto_capture);

    detector.script(Some(template.landmarks));
    session.begin_template(&mut detector, template.name, &template.image)?;
    while let Some(result) = detector.poll() {
        session.on_detection(result)?;
    }
    info!(
        "Replaying {} frames against template '{}'",
        frames.len(),
        session.template().map_or("", |t| t.name.as_str())
    );

    let blank = RgbaImage::new(options.camera_size.width, options.camera_size.height);
    let origin = Instant::now();
    let mut report = ReplayReport::default();

    for frame in frames {
        let now = origin + Duration::from_millis(frame.t_ms);

        detector.script(frame.landmarks.clone());
        if session.submit_live_frame(&mut detector, &blank).is_none() {
            debug!("Frame at {}ms dropped", frame.t_ms);
        }
        while let Some(result) = detector.poll() {
            session.on_detection(result)?;
        }

        // Score first so a drop below threshold cancels the countdown before it can fire
        let feedback = session.tick(now);
        let timer_event = if feedback.phase == CapturePhase::Countdown {
            session.timer_tick(now)
        } else {
            None
        };
        let events = [feedback.event, timer_event];

        report.ticks.push(TickRecord {
            t_ms: frame.t_ms,
            raw: feedback.score.raw,
            smoothed: feedback.score.smoothed,
            guidance: feedback.guidance,
            phase: session.capture().phase(),
            countdown: session.capture().countdown(),
            events,
        });

        if events
            .iter()
            .any(|e| matches!(e, Some(CaptureEvent::CaptureTriggered(_))))
        {
            report.captures += 1;
            let created_at = options.started_at + Duration::from_millis(frame.t_ms);
            if let Err(e) = session.render_capture(&blank, created_at) {
                if !e.is_recoverable() {
                    return Err(e);
                }
                warn!("Capture at {}ms not rendered: {}", frame.t_ms, e);
                session.retry();
                continue;
            }
            if options.auto_confirm {
                match session.confirm(store) {
                    Some(Ok(id)) => report.saved.push(id),
                    Some(Err(e)) => {
                        warn!("Replay capture at {}ms not saved: {}", frame.t_ms, e);
                        report.failed_saves += 1;
                    }
                    None => {}
                }
            } else {
                session.retry();
            }
        }
    }

    info!(
        "Replay finished: {} captures, {} saved",
        report.captures,
        report.saved.len()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::Landmark;
    use crate::store::MemoryStore;
    use std::io::Write;

    fn body() -> PoseLandmarks {
        PoseLandmarks::new(vec![Landmark::new(0.5, 0.5, 1.0); 33])
    }

    #[test]
    fn test_load_frames_skips_blank_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"t_ms": 0, "landmarks": null}}"#).unwrap();
        writeln!(file).unwrap();
        writeln!(file, r#"{{"t_ms": 33, "landmarks": [{{"x": 0.5, "y": 0.5}}]}}"#).unwrap();

        let frames = load_frames(file.path()).unwrap();
        assert_eq!(frames.len(), 2);
        assert!(frames[0].landmarks.is_none());
        assert_eq!(frames[1].landmarks.as_ref().unwrap().len(), 1);
    }

    #[test]
    fn test_load_frames_rejects_time_travel() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"t_ms": 100}}"#).unwrap();
        writeln!(file, r#"{{"t_ms": 50}}"#).unwrap();
        assert!(matches!(load_frames(file.path()), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_detector_requires_script() {
        let mut detector = ReplayDetector::new();
        let mut router = crate::detector::DetectorRouter::new();
        let token = router.issue_template();
        assert!(detector.submit(token, &RgbaImage::new(1, 1)).is_err());

        detector.script(None);
        detector.submit(token, &RgbaImage::new(1, 1)).unwrap();
        assert_eq!(detector.poll().unwrap().landmarks, None);
    }

    #[test]
    fn test_replay_holds_and_captures() {
        let frames: Vec<RecordedFrame> = (0..=250)
            .map(|i| RecordedFrame {
                t_ms: i * 33,
                landmarks: Some(body()),
            })
            .collect();
        let template = ReplayTemplate {
            name: "tree".into(),
            image: DynamicImage::new_rgba8(1280, 720),
            landmarks: body(),
        };
        let options = ReplayOptions {
            auto_confirm: true,
            ..ReplayOptions::default()
        };
        let mut store = MemoryStore::new("dave");

        let report = run_replay(Config::default(), template, &frames, &options, &mut store).unwrap();
        assert_eq!(report.ticks.len(), frames.len());
        assert!(report.captures >= 1);
        assert_eq!(report.saved.len(), report.captures);
        assert_eq!(store.list().unwrap().len(), report.captures);
    }
}
