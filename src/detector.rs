//! Landmark detector contract and result routing.
//!
//! The detector is an external, asynchronous capability with a single result
//! channel shared by template and live requests. Every outbound request is
//! tagged with a [`RequestToken`]; inbound results are only applied when their
//! token matches the one request still outstanding, so a late live result can
//! never land in the template slot (or the reverse).

use crate::{config::DetectorConfig, landmarks::PoseLandmarks, Result};
use image::RgbaImage;
use log::{debug, warn};

/// What a detection request is for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DetectionMode {
    Template,
    Live,
}

/// Correlation token attached to each detector request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestToken {
    mode: DetectionMode,
    seq: u64,
}

impl RequestToken {
    #[must_use]
    pub const fn mode(&self) -> DetectionMode {
        self.mode
    }

    #[must_use]
    pub const fn seq(&self) -> u64 {
        self.seq
    }
}

/// A result delivered through the detector's callback
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionResult {
    pub token: RequestToken,
    pub landmarks: Option<PoseLandmarks>,
}

/// External landmark detector.
///
/// `submit` hands an image to the detector; the detector later delivers a
/// [`DetectionResult`] carrying the same token to whoever owns the router.
pub trait LandmarkDetector {
    /// Apply detector settings before first use
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::DetectorInitFailed`] if the detector cannot be configured
    fn configure(&mut self, _config: &DetectorConfig) -> Result<()> {
        Ok(())
    }

    /// Whether initialisation has finished and requests are accepted
    fn is_ready(&self) -> bool;

    /// Submit an image for detection
    ///
    /// # Errors
    ///
    /// Returns an error if the detector rejects the request
    fn submit(&mut self, token: RequestToken, image: &RgbaImage) -> Result<()>;
}

/// A routed detector result
#[derive(Debug, Clone, PartialEq)]
pub enum Routed {
    Template(Option<PoseLandmarks>),
    Live(Option<PoseLandmarks>),
    /// Token did not match the outstanding request; the result was dropped
    Stale,
}

/// Issues tokens and validates results for a single detector instance
#[derive(Debug, Default)]
pub struct DetectorRouter {
    next_seq: u64,
    outstanding: Option<RequestToken>,
}

impl DetectorRouter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Token of the request still awaiting a result
    #[must_use]
    pub const fn outstanding(&self) -> Option<RequestToken> {
        self.outstanding
    }

    fn next_token(&mut self, mode: DetectionMode) -> RequestToken {
        self.next_seq += 1;
        RequestToken {
            mode,
            seq: self.next_seq,
        }
    }

    /// Token for a live frame, or `None` while another request is outstanding
    pub fn issue_live(&mut self) -> Option<RequestToken> {
        if self.outstanding.is_some() {
            return None;
        }
        let token = self.next_token(DetectionMode::Live);
        self.outstanding = Some(token);
        Some(token)
    }

    /// Token for a template image.
    ///
    /// Supersedes any outstanding request, whose result will then be dropped as stale.
    pub fn issue_template(&mut self) -> RequestToken {
        if let Some(previous) = self.outstanding {
            debug!("Template request supersedes outstanding {:?}", previous);
        }
        let token = self.next_token(DetectionMode::Template);
        self.outstanding = Some(token);
        token
    }

    /// Forget the outstanding request; its result will be dropped
    pub fn cancel(&mut self) {
        self.outstanding = None;
    }

    /// Validate an inbound result against the outstanding token
    pub fn accept(&mut self, result: DetectionResult) -> Routed {
        if self.outstanding != Some(result.token) {
            warn!(
                "Discarding stale {:?} detection (seq {})",
                result.token.mode, result.token.seq
            );
            return Routed::Stale;
        }
        self.outstanding = None;
        let landmarks = result.landmarks.filter(|l| !l.is_empty());
        match result.token.mode {
            DetectionMode::Template => Routed::Template(landmarks),
            DetectionMode::Live => Routed::Live(landmarks),
        }
    }
}
