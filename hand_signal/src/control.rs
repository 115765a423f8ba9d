//! The single authoritative control value and its two writers.
//!
//! Gesture measurements and UI buttons both write the same slot; the most
//! recent write wins.  There is no precedence between the two, so a button
//! press holds only until the next gesture measurement arrives.

use std::fmt;

/// Values strictly above this classify as [`MorphState::Scattered`].
pub const SCATTER_THRESHOLD: f32 = 0.5;

// ════════════════════════════════════════════════════════════════════════════
// MorphState
// ════════════════════════════════════════════════════════════════════════════

/// Binary display state derived from (or forced onto) the control value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MorphState {
    TreeShape,
    Scattered,
}

impl MorphState {
    pub fn from_value(value: f32) -> Self {
        if value > SCATTER_THRESHOLD { MorphState::Scattered } else { MorphState::TreeShape }
    }

    /// Control value a UI request for this state writes.
    pub fn target_value(self) -> f32 {
        match self {
            MorphState::TreeShape => 0.0,
            MorphState::Scattered => 1.0,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            MorphState::TreeShape => "TREE_SHAPE",
            MorphState::Scattered => "SCATTERED",
        }
    }
}

impl fmt::Display for MorphState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.name()) }
}

// ════════════════════════════════════════════════════════════════════════════
// ControlSignal
// ════════════════════════════════════════════════════════════════════════════

/// Who wrote the control value last.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlWriter {
    Initial,
    Gesture,
    Ui,
}

/// Single-owner cell holding the control value in [0, 1].
///
/// Readers (every morph interpolator) see whatever is stored at the moment
/// they look; writes replace the value and the discrete state together.
#[derive(Clone, Debug)]
pub struct ControlSignal {
    value:    f32,
    state:    MorphState,
    writer:   ControlWriter,
    revision: u64,
}

impl Default for ControlSignal {
    fn default() -> Self { ControlSignal::new() }
}

impl ControlSignal {
    /// Starts on the tree target.
    pub fn new() -> Self {
        ControlSignal {
            value:    0.0,
            state:    MorphState::TreeShape,
            writer:   ControlWriter::Initial,
            revision: 0,
        }
    }

    pub fn value(&self)       -> f32           { self.value }
    pub fn state(&self)       -> MorphState    { self.state }
    pub fn last_writer(&self) -> ControlWriter { self.writer }
    /// Number of accepted writes so far.
    pub fn revision(&self)    -> u64           { self.revision }

    /// Continuous write from the signal conditioner.  Returns `false` (and
    /// changes nothing) for a non-finite value.
    pub fn apply_gesture(&mut self, value: f32) -> bool {
        if !value.is_finite() {
            log::warn!("control: rejected non-finite gesture value");
            return false;
        }
        let v = value.clamp(0.0, 1.0);
        self.store(v, MorphState::from_value(v), ControlWriter::Gesture);
        true
    }

    /// Discrete write from a UI button: 0 for the tree, 1 for scattered.
    pub fn request(&mut self, state: MorphState) {
        log::info!("control: UI requested {}", state);
        self.store(state.target_value(), state, ControlWriter::Ui);
    }

    fn store(&mut self, value: f32, state: MorphState, writer: ControlWriter) {
        if state != self.state {
            log::debug!("control: {} → {} ({:?})", self.state, state, writer);
        }
        self.value    = value;
        self.state    = state;
        self.writer   = writer;
        self.revision += 1;
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HandPose — coarse label for the status line
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandPose {
    Closed,
    Partial,
    Open,
}

impl HandPose {
    pub fn classify(value: f32) -> Self {
        if value < 0.2 {
            HandPose::Closed
        } else if value > 0.8 {
            HandPose::Open
        } else {
            HandPose::Partial
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            HandPose::Closed  => "Closed",
            HandPose::Partial => "Partial",
            HandPose::Open    => "Open",
        }
    }

    /// What the scene is doing in this pose.
    pub fn effect(self) -> &'static str {
        match self {
            HandPose::Closed  => "Tree",
            HandPose::Partial => "Morphing",
            HandPose::Open    => "Scattered",
        }
    }
}

/// Rounded percentage of a control value, 0–100.
pub fn percent(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 100.0).round() as u8
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_on_tree() {
        let c = ControlSignal::new();
        assert_eq!(c.value(), 0.0);
        assert_eq!(c.state(), MorphState::TreeShape);
        assert_eq!(c.last_writer(), ControlWriter::Initial);
    }

    #[test]
    fn threshold_is_inclusive_for_tree() {
        assert_eq!(MorphState::from_value(0.5), MorphState::TreeShape);
        assert_eq!(MorphState::from_value(0.5001), MorphState::Scattered);
    }

    #[test]
    fn gesture_write_derives_state() {
        let mut c = ControlSignal::new();
        assert!(c.apply_gesture(0.7));
        assert_eq!(c.state(), MorphState::Scattered);
        assert!(c.apply_gesture(0.3));
        assert_eq!(c.state(), MorphState::TreeShape);
        assert_eq!(c.last_writer(), ControlWriter::Gesture);
    }

    #[test]
    fn gesture_write_is_clamped() {
        let mut c = ControlSignal::new();
        c.apply_gesture(1.7);
        assert_eq!(c.value(), 1.0);
        c.apply_gesture(-0.2);
        assert_eq!(c.value(), 0.0);
    }

    #[test]
    fn nan_gesture_write_rejected() {
        let mut c = ControlSignal::new();
        c.apply_gesture(0.6);
        assert!(!c.apply_gesture(f32::NAN));
        assert_eq!(c.value(), 0.6);
        assert_eq!(c.revision(), 1);
    }

    #[test]
    fn ui_request_sets_exact_values() {
        let mut c = ControlSignal::new();
        c.apply_gesture(0.83);
        c.request(MorphState::TreeShape);
        assert_eq!(c.value(), 0.0);
        assert_eq!(c.state(), MorphState::TreeShape);
        c.request(MorphState::Scattered);
        assert_eq!(c.value(), 1.0);
        assert_eq!(c.last_writer(), ControlWriter::Ui);
    }

    #[test]
    fn last_write_wins() {
        let mut c = ControlSignal::new();
        c.request(MorphState::Scattered);
        c.apply_gesture(0.1);
        assert_eq!(c.value(), 0.1);
        assert_eq!(c.state(), MorphState::TreeShape);
        assert_eq!(c.revision(), 2);
    }

    #[test]
    fn hand_pose_bands() {
        assert_eq!(HandPose::classify(0.0),  HandPose::Closed);
        assert_eq!(HandPose::classify(0.19), HandPose::Closed);
        assert_eq!(HandPose::classify(0.5),  HandPose::Partial);
        assert_eq!(HandPose::classify(0.81), HandPose::Open);
    }

    #[test]
    fn percent_rounds() {
        assert_eq!(percent(0.0), 0);
        assert_eq!(percent(0.456), 46);
        assert_eq!(percent(1.3), 100);
    }
}
