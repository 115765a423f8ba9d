//! # hand_signal
//!
//! Turns noisy, scale-varying hand landmarks into one stable control value
//! in [0, 1] (0 = tree, 1 = scattered).
//!
//! ```text
//! landmarks ──► openness_ratio ──► SignalConditioner ──► ControlSignal ◄── UI request
//! ```
//!
//! ## Quick start
//!
//! ```rust
//! use glam::Vec3;
//! use hand_signal::{openness_ratio, synthetic_hand, ControlSignal, MorphState, SignalConditioner};
//!
//! let mut conditioner = SignalConditioner::default();
//! let mut control     = ControlSignal::new();
//!
//! let hand = synthetic_hand(2.1, Vec3::new(320.0, 420.0, 0.0), 80.0);
//! if let Some(ratio) = openness_ratio(&hand) {
//!     control.apply_gesture(conditioner.update(ratio));
//! }
//! assert_eq!(control.state(), MorphState::Scattered);
//! ```

pub mod landmarks;
pub mod conditioner;
pub mod control;

pub use landmarks::{openness_ratio, synthetic_hand, LandmarkError, LandmarkSet, LANDMARK_COUNT};
pub use conditioner::{ConditionerConfig, ConfigError, SignalConditioner};
pub use control::{percent, ControlSignal, ControlWriter, HandPose, MorphState, SCATTER_THRESHOLD};

// ════════════════════════════════════════════════════════════════════════════
// Tests — whole pipeline
// ════════════════════════════════════════════════════════════════════════════
