//! Auto-capture state machine.
//!
//! ```text
//! Idle -> Holding -> Countdown -> Capturing -> Confirming -> Idle
//!   \________________ manual ______^
//! ```
//!
//! The machine is driven by two inputs: the smoothed score on every scoring
//! tick ([`AutoCapture::observe`]) and a periodic timer
//! ([`AutoCapture::tick`]). Time is always passed in, never read from the
//! clock, so every transition is deterministic.
//!
//! `Capturing` and `Confirming` together form the in-flight window: no new
//! capture can start until the staged artifact is confirmed or discarded.

use crate::{
    config::CaptureConfig,
    constants::COUNTDOWN_TICK_MILLIS,
    store::{ArtifactId, PoseStore},
    Error, Result,
};
use image::RgbaImage;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant, SystemTime};

/// How a capture was triggered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureType {
    Auto,
    Manual,
}

/// Metadata stored alongside a captured still
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub pose_name: String,
    pub score: u8,
    pub capture_type: CaptureType,
    pub created_at: SystemTime,
}

/// A rendered still plus its metadata, staged for confirmation
#[derive(Debug, Clone)]
pub struct CapturedArtifact {
    pub image: RgbaImage,
    pub metadata: ArtifactMetadata,
}

/// Observable phase of the machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapturePhase {
    Idle,
    Holding,
    Countdown,
    Capturing,
    Confirming,
}

/// Transitions reported to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureEvent {
    HoldStarted,
    HoldBroken,
    CountdownStarted(u32),
    CountdownTick(u32),
    CountdownCancelled,
    /// Render the current frame now and hand it to [`AutoCapture::stage`]
    CaptureTriggered(CaptureType),
}

#[derive(Debug)]
enum State {
    Idle,
    Holding { since: Instant },
    Countdown { remaining: u32, next_tick: Instant },
    Capturing { capture_type: CaptureType, score: u8 },
    Confirming { artifact: Box<CapturedArtifact> },
}

/// Auto-capture state machine for one camera session
#[derive(Debug)]
pub struct AutoCapture {
    config: CaptureConfig,
    enabled: bool,
    state: State,
    last_score: u8,
}

impl AutoCapture {
    #[must_use]
    pub fn new(config: CaptureConfig) -> Self {
        let enabled = config.auto_capture;
        Self {
            config,
            enabled,
            state: State::Idle,
            last_score: 0,
        }
    }

    #[must_use]
    pub const fn phase(&self) -> CapturePhase {
        match self.state {
            State::Idle => CapturePhase::Idle,
            State::Holding { .. } => CapturePhase::Holding,
            State::Countdown { .. } => CapturePhase::Countdown,
            State::Capturing { .. } => CapturePhase::Capturing,
            State::Confirming { .. } => CapturePhase::Confirming,
        }
    }

    /// Countdown value to display, if a countdown is running
    #[must_use]
    pub const fn countdown(&self) -> Option<u32> {
        match self.state {
            State::Countdown { remaining, .. } => Some(remaining),
            _ => None,
        }
    }

    /// When the current hold began, if holding
    #[must_use]
    pub const fn hold_started_at(&self) -> Option<Instant> {
        match self.state {
            State::Holding { since } => Some(since),
            _ => None,
        }
    }

    /// A capture is being rendered or awaiting confirmation
    #[must_use]
    pub const fn is_in_flight(&self) -> bool {
        matches!(self.state, State::Capturing { .. } | State::Confirming { .. })
    }

    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Capture awaiting rendering: its trigger type and the score at trigger time
    #[must_use]
    pub const fn pending_capture(&self) -> Option<(CaptureType, u8)> {
        match self.state {
            State::Capturing { capture_type, score } => Some((capture_type, score)),
            _ => None,
        }
    }

    /// Artifact awaiting confirmation
    #[must_use]
    pub fn staged(&self) -> Option<&CapturedArtifact> {
        match &self.state {
            State::Confirming { artifact } => Some(&**artifact),
            _ => None,
        }
    }

    /// Feed the smoothed score of one scoring tick
    pub fn observe(&mut self, score: u8, now: Instant) -> Option<CaptureEvent> {
        self.last_score = score;
        if !self.enabled {
            return None;
        }
        let matched = score >= self.config.success_threshold;

        match self.state {
            State::Idle if matched => {
                debug!("Hold started at score {}", score);
                self.state = State::Holding { since: now };
                // A zero hold time starts the countdown on the same tick
                self.check_hold(now).or(Some(CaptureEvent::HoldStarted))
            }
            State::Holding { .. } if !matched => {
                debug!("Hold broken at score {}", score);
                self.state = State::Idle;
                Some(CaptureEvent::HoldBroken)
            }
            State::Holding { .. } => self.check_hold(now),
            State::Countdown { .. } if !matched => {
                info!("Countdown cancelled, score dropped to {}", score);
                self.state = State::Idle;
                Some(CaptureEvent::CountdownCancelled)
            }
            State::Countdown { .. } => self.tick(now),
            _ => None,
        }
    }

    fn check_hold(&mut self, now: Instant) -> Option<CaptureEvent> {
        let State::Holding { since } = self.state else {
            return None;
        };
        if now.saturating_duration_since(since) < Duration::from_millis(self.config.hold_millis) {
            return None;
        }
        if self.config.countdown_seconds == 0 {
            return Some(self.begin_capture(CaptureType::Auto));
        }
        info!("Pose held, starting {}s countdown", self.config.countdown_seconds);
        self.state = State::Countdown {
            remaining: self.config.countdown_seconds,
            next_tick: now + Duration::from_millis(COUNTDOWN_TICK_MILLIS),
        };
        Some(CaptureEvent::CountdownStarted(self.config.countdown_seconds))
    }

    /// Advance the countdown timer
    pub fn tick(&mut self, now: Instant) -> Option<CaptureEvent> {
        let mut event = None;
        while let State::Countdown { remaining, next_tick } = self.state {
            if now < next_tick {
                break;
            }
            let remaining = remaining.saturating_sub(1);
            if remaining == 0 {
                return Some(self.begin_capture(CaptureType::Auto));
            }
            self.state = State::Countdown {
                remaining,
                next_tick: next_tick + Duration::from_millis(COUNTDOWN_TICK_MILLIS),
            };
            event = Some(CaptureEvent::CountdownTick(remaining));
        }
        event
    }

    /// User-triggered capture; skips hold and countdown.
    ///
    /// A no-op while another capture is in flight.
    pub fn trigger_manual(&mut self) -> Option<CaptureEvent> {
        if self.is_in_flight() {
            debug!("Manual capture ignored, capture already in flight");
            return None;
        }
        Some(self.begin_capture(CaptureType::Manual))
    }

    fn begin_capture(&mut self, capture_type: CaptureType) -> CaptureEvent {
        info!("Capture triggered ({:?}) at score {}", capture_type, self.last_score);
        self.state = State::Capturing {
            capture_type,
            score: self.last_score,
        };
        CaptureEvent::CaptureTriggered(capture_type)
    }

    /// Stage the rendered still for confirmation
    ///
    /// # Errors
    ///
    /// Returns [`Error::CaptureInFlight`] if a still is already staged, or an
    /// error if no capture is being rendered
    pub fn stage(&mut self, artifact: CapturedArtifact) -> Result<()> {
        match self.state {
            State::Capturing { .. } => {}
            State::Confirming { .. } => return Err(Error::CaptureInFlight),
            _ => return Err(Error::InvalidInput("No capture awaiting a still".to_string())),
        }
        self.state = State::Confirming {
            artifact: Box::new(artifact),
        };
        Ok(())
    }

    /// Persist the staged artifact, then return to idle.
    ///
    /// Save failures are logged and returned but never leave the machine stuck.
    /// Returns `None` when nothing was staged.
    pub fn confirm<S: PoseStore + ?Sized>(&mut self, store: &mut S) -> Option<Result<ArtifactId>> {
        if !matches!(self.state, State::Confirming { .. }) {
            return None;
        }
        let State::Confirming { artifact } = std::mem::replace(&mut self.state, State::Idle) else {
            return None;
        };
        self.last_score = 0;
        let outcome = store.save(*artifact);
        match &outcome {
            Ok(id) => info!("Capture saved as {}", id),
            Err(e) => warn!("Failed to save capture: {}", e),
        }
        Some(outcome)
    }

    /// Discard any staged capture and return to idle
    pub fn discard(&mut self) {
        if self.is_in_flight() {
            debug!("Discarding staged capture");
        }
        self.reset();
    }

    /// Clear all session state
    pub fn reset(&mut self) {
        self.state = State::Idle;
        self.last_score = 0;
    }

    /// Enable or disable automatic capture.
    ///
    /// Disabling cancels any pending hold or countdown. An in-flight capture is kept.
    pub fn set_enabled(&mut self, enabled: bool) -> Option<CaptureEvent> {
        self.enabled = enabled;
        if enabled {
            return None;
        }
        match self.state {
            State::Holding { .. } => {
                self.state = State::Idle;
                Some(CaptureEvent::HoldBroken)
            }
            State::Countdown { .. } => {
                self.state = State::Idle;
                Some(CaptureEvent::CountdownCancelled)
            }
            _ => None,
        }
    }
}
