//! Pose matching library: score how closely a live body pose matches a
//! reference pose and capture a still when the user holds the match.
//!
//! The pipeline consists of:
//! 1. Template acquisition: a reference image is run through the landmark
//!    detector once to produce the template skeleton
//! 2. Live detection: camera frames are run through the same detector,
//!    one request in flight at a time
//! 3. Scoring: ten body key points are compared inside the letterboxed
//!    region that matches the template's aspect ratio
//! 4. Smoothing and guidance: the raw score is smoothed and, when low,
//!    turned into a coarse positioning hint
//! 5. Auto-capture: a held score starts a countdown that ends in a capture
//!
//! The landmark detector and the camera are external collaborators, modelled
//! as the [`detector::LandmarkDetector`] and [`camera::Camera`] traits.
//!
//! # Examples
//!
//! ## Scoring two skeletons
//!
//! ```
//! use pose_match::{
//!     config::ScoringConfig,
//!     landmarks::{ImageSize, Landmark, PoseLandmarks},
//!     scorer::raw_score,
//! };
//!
//! let skeleton = PoseLandmarks::new(vec![Landmark::new(0.5, 0.5, 1.0); 33]);
//! let frame = ImageSize::new(1280, 720);
//! let score = raw_score(
//!     &ScoringConfig::default(),
//!     Some(&skeleton),
//!     Some(&skeleton),
//!     Some(frame),
//!     frame,
//! );
//! assert_eq!(score, 100);
//! ```
//!
//! ## Driving a session
//!
//! ```no_run
//! use pose_match::{config::Config, session::PoseSession};
//! use std::time::Instant;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut session = PoseSession::new(Config::selfie())?;
//!
//! // After a template has been accepted and live results are flowing:
//! let feedback = session.tick(Instant::now());
//! println!("Score: {}", feedback.score.smoothed);
//! if let Some(hint) = feedback.guidance {
//!     println!("{hint}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Smoothing
//!
//! ```
//! use pose_match::filters::{create_filter, ScoreFilter};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut filter = create_filter("exponential", 0.2)?;
//! assert!((filter.apply(100.0) - 20.0).abs() < 1e-9);
//! filter.reset();
//! # Ok(())
//! # }
//! ```

/// Pose landmark types and skeleton topology
pub mod landmarks;

/// Aspect-ratio preserving comparison region
pub mod letterbox;

/// Score smoothing filters
pub mod filters;

/// Key-point pose comparison and match scoring
pub mod scorer;

/// Positioning hints for low scores
pub mod guidance;

/// Auto-capture state machine
pub mod capture;

/// Landmark detector contract and request routing
pub mod detector;

/// Template acquisition
pub mod template;

/// Camera capability contract
pub mod camera;

/// Ghost overlay and still rendering
pub mod overlay;

/// Capture persistence
pub mod store;

/// Pose matching session orchestration
pub mod session;

/// Offline replay of recorded landmark streams
pub mod replay;

/// Configuration file support
pub mod config;

/// Common constants used throughout the library
pub mod constants;

/// Error types for the library
pub mod error;

/// Utility functions and helpers
pub mod utils;

pub use error::{Error, Result};
