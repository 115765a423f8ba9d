//! Hand landmark sets and the scale-invariant openness ratio.
//!
//! A landmark set is the 21-point hand skeleton produced by the usual
//! hand-pose models: `x`/`y` in image pixels, `z` a relative depth.  The
//! analyzer only ever reads it; nothing here keeps a set past the call.

use glam::Vec3;
use thiserror::Error;

// ════════════════════════════════════════════════════════════════════════════
// Landmark indices
// ════════════════════════════════════════════════════════════════════════════

pub const LANDMARK_COUNT: usize = 21;

pub const WRIST:      usize = 0;
pub const THUMB_CMC:  usize = 1;
pub const THUMB_MCP:  usize = 2;
pub const THUMB_IP:   usize = 3;
pub const THUMB_TIP:  usize = 4;
pub const INDEX_MCP:  usize = 5;
pub const INDEX_PIP:  usize = 6;
pub const INDEX_DIP:  usize = 7;
pub const INDEX_TIP:  usize = 8;
pub const MIDDLE_MCP: usize = 9;
pub const MIDDLE_PIP: usize = 10;
pub const MIDDLE_DIP: usize = 11;
pub const MIDDLE_TIP: usize = 12;
pub const RING_MCP:   usize = 13;
pub const RING_PIP:   usize = 14;
pub const RING_DIP:   usize = 15;
pub const RING_TIP:   usize = 16;
pub const PINKY_MCP:  usize = 17;
pub const PINKY_PIP:  usize = 18;
pub const PINKY_DIP:  usize = 19;
pub const PINKY_TIP:  usize = 20;

/// Fingertips used for the openness measure.  The thumb is left out: it
/// moves a lot on its own and says little about whether the hand is a fist.
pub const FINGERTIPS: [usize; 4] = [INDEX_TIP, MIDDLE_TIP, RING_TIP, PINKY_TIP];

/// Wrist→middle-MCP distances below this are a degenerate detection.
pub const MIN_PALM_SIZE: f32 = 1e-4;

// ════════════════════════════════════════════════════════════════════════════
// LandmarkError
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LandmarkError {
    #[error("expected 21 landmarks, got {0}")]
    WrongCount(usize),
    #[error("landmark {index} has a non-finite coordinate")]
    NonFinite { index: usize },
}

// ════════════════════════════════════════════════════════════════════════════
// LandmarkSet
// ════════════════════════════════════════════════════════════════════════════

/// One detected hand: 21 points in anatomical order.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LandmarkSet {
    points: [Vec3; LANDMARK_COUNT],
}

impl LandmarkSet {
    pub fn new(points: [Vec3; LANDMARK_COUNT]) -> Self {
        LandmarkSet { points }
    }

    /// Build a set from raw `[x, y, z]` triples as handed over by a detector.
    pub fn from_points(raw: &[[f32; 3]]) -> Result<Self, LandmarkError> {
        if raw.len() != LANDMARK_COUNT {
            return Err(LandmarkError::WrongCount(raw.len()));
        }
        let mut points = [Vec3::ZERO; LANDMARK_COUNT];
        for (index, (dst, src)) in points.iter_mut().zip(raw).enumerate() {
            let p = Vec3::from_array(*src);
            if !p.is_finite() {
                return Err(LandmarkError::NonFinite { index });
            }
            *dst = p;
        }
        Ok(LandmarkSet { points })
    }

    pub fn points(&self) -> &[Vec3; LANDMARK_COUNT] { &self.points }

    /// Uniformly scale every coordinate about the origin.
    pub fn scaled(&self, factor: f32) -> Self {
        LandmarkSet { points: self.points.map(|p| p * factor) }
    }

    pub fn translated(&self, offset: Vec3) -> Self {
        LandmarkSet { points: self.points.map(|p| p + offset) }
    }

    /// Wrist to middle-finger base: the intra-hand reference length.
    pub fn palm_size(&self) -> f32 {
        self.points[WRIST].distance(self.points[MIDDLE_MCP])
    }

    /// Mean wrist→fingertip distance over [`FINGERTIPS`].
    pub fn mean_tip_distance(&self) -> f32 {
        let wrist = self.points[WRIST];
        let sum: f32 = FINGERTIPS.iter()
            .map(|&i| wrist.distance(self.points[i]))
            .sum();
        sum / FINGERTIPS.len() as f32
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Openness ratio
// ════════════════════════════════════════════════════════════════════════════

/// Scale-invariant openness: mean wrist→tip distance over palm size.
///
/// Typical values run from about 0.4 (tight fist) to 2.5 (fully spread).
/// Returns `None` for a degenerate palm, which callers treat as "no hand"
/// for this frame.
pub fn openness_ratio(hand: &LandmarkSet) -> Option<f32> {
    let palm = hand.palm_size();
    if !(palm >= MIN_PALM_SIZE) {
        return None;
    }
    let ratio = hand.mean_tip_distance() / palm;
    ratio.is_finite().then_some(ratio)
}

// ════════════════════════════════════════════════════════════════════════════
// Synthetic hands
// ════════════════════════════════════════════════════════════════════════════

// Finger fan, radians from straight up; index → pinky.
const FINGER_ANGLES: [f32; 4] = [-0.36, -0.12, 0.12, 0.36];
const THUMB_ANGLE:   f32      = -1.05;

/// Build a plausible upright hand whose [`openness_ratio`] is exactly
/// `target_ratio`.
///
/// `wrist` is the wrist position in pixel space (y grows downward, as in an
/// image) and `palm_size` the wrist→middle-MCP length.  All four fingertips
/// sit at `target_ratio * palm_size` from the wrist; the knuckle joints are
/// spaced evenly between the MCP and the tip.
pub fn synthetic_hand(target_ratio: f32, wrist: Vec3, palm_size: f32) -> LandmarkSet {
    let mut points = [wrist; LANDMARK_COUNT];
    let tip_dist   = target_ratio.max(0.0) * palm_size;

    let dir = |angle: f32| Vec3::new(angle.sin(), -angle.cos(), 0.0);

    // MCPs sit on an arc of radius `palm_size`; the middle one is straight up.
    let mcps = [INDEX_MCP, MIDDLE_MCP, RING_MCP, PINKY_MCP];
    for (f, &mcp) in mcps.iter().enumerate() {
        let mcp_angle = if mcp == MIDDLE_MCP { 0.0 } else { FINGER_ANGLES[f] * 0.5 };
        let base = wrist + dir(mcp_angle) * palm_size;
        let tip  = wrist + dir(FINGER_ANGLES[f]) * tip_dist;
        points[mcp]     = base;
        points[mcp + 1] = base.lerp(tip, 1.0 / 3.0);
        points[mcp + 2] = base.lerp(tip, 2.0 / 3.0);
        points[mcp + 3] = tip;
    }

    let thumb = dir(THUMB_ANGLE);
    let thumb_len = palm_size * (0.6 + 0.4 * target_ratio.clamp(0.0, 2.5) / 2.5);
    for (k, idx) in [THUMB_CMC, THUMB_MCP, THUMB_IP, THUMB_TIP].into_iter().enumerate() {
        points[idx] = wrist + thumb * thumb_len * (k as f32 + 1.0) / 4.0;
    }

    LandmarkSet { points }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool { (a - b).abs() < 1e-4 }

    #[test]
    fn from_points_rejects_wrong_count() {
        let raw = vec![[0.0, 0.0, 0.0]; 20];
        assert_eq!(LandmarkSet::from_points(&raw), Err(LandmarkError::WrongCount(20)));
    }

    #[test]
    fn from_points_rejects_nan() {
        let mut raw = vec![[1.0, 2.0, 0.0]; 21];
        raw[7] = [f32::NAN, 0.0, 0.0];
        assert_eq!(
            LandmarkSet::from_points(&raw),
            Err(LandmarkError::NonFinite { index: 7 }),
        );
    }

    #[test]
    fn ratio_of_hand_built_from_raw_points() {
        // Wrist at origin, middle MCP 10 px up, every fingertip 15 px away.
        let mut raw = vec![[0.0, 0.0, 0.0]; 21];
        raw[MIDDLE_MCP] = [0.0, -10.0, 0.0];
        raw[INDEX_TIP]  = [9.0, -12.0, 0.0];
        raw[MIDDLE_TIP] = [0.0, -15.0, 0.0];
        raw[RING_TIP]   = [-9.0, -12.0, 0.0];
        raw[PINKY_TIP]  = [0.0, 0.0, 15.0];
        let hand = LandmarkSet::from_points(&raw).unwrap();
        assert!(approx(openness_ratio(&hand).unwrap(), 1.5));
    }

    #[test]
    fn thumb_does_not_affect_ratio() {
        let hand = synthetic_hand(1.2, Vec3::new(320.0, 400.0, 0.0), 80.0);
        let mut points = *hand.points();
        points[THUMB_TIP] += Vec3::new(500.0, -300.0, 20.0);
        let moved = LandmarkSet::new(points);
        assert_eq!(openness_ratio(&hand), openness_ratio(&moved));
    }

    #[test]
    fn degenerate_palm_is_skipped() {
        let hand = LandmarkSet::new([Vec3::new(5.0, 5.0, 0.0); LANDMARK_COUNT]);
        assert_eq!(openness_ratio(&hand), None);
    }

    #[test]
    fn ratio_is_deterministic() {
        let hand = synthetic_hand(1.7, Vec3::new(300.0, 420.0, -3.0), 64.0);
        let again = hand;
        assert_eq!(openness_ratio(&hand), openness_ratio(&again));
    }

    #[test]
    fn ratio_is_scale_invariant() {
        let hand = synthetic_hand(1.35, Vec3::new(310.0, 390.0, 2.0), 70.0);
        let base = openness_ratio(&hand).unwrap();
        for factor in [0.1_f32, 0.5, 2.0, 7.5, 40.0] {
            let r = openness_ratio(&hand.scaled(factor)).unwrap();
            assert!((r - base).abs() < 1e-3, "factor {} gave {} vs {}", factor, r, base);
        }
    }

    #[test]
    fn ratio_is_translation_invariant() {
        let hand = synthetic_hand(0.9, Vec3::new(200.0, 300.0, 0.0), 50.0);
        let shifted = hand.translated(Vec3::new(-150.0, 60.0, 4.0));
        assert!(approx(openness_ratio(&hand).unwrap(), openness_ratio(&shifted).unwrap()));
    }

    #[test]
    fn synthetic_hand_hits_target_ratio() {
        for target in [0.4_f32, 0.8, 1.0, 1.6, 2.2] {
            let hand = synthetic_hand(target, Vec3::new(320.0, 420.0, 0.0), 90.0);
            let r = openness_ratio(&hand).unwrap();
            assert!(approx(r, target), "target {} measured {}", target, r);
        }
    }

    #[test]
    fn synthetic_hand_points_are_finite() {
        let hand = synthetic_hand(2.0, Vec3::ZERO, 100.0);
        assert!(hand.points().iter().all(|p| p.is_finite()));
    }
}
