//! Per-element morph progress and the interpolated positions.
//!
//! Every element carries its own progress `p` and chases the shared control
//! value with a first-order filter:
//!
//! ```text
//! p += (target - p) * min(dt * rate, 1)
//! position = lerp(tree, scatter, p)
//! ```
//!
//! Progress starts at 1 (scattered), matching what is on screen before the
//! first control update.

use glam::Vec3;

use crate::layout::Layout;
use crate::ConfigError;

// ════════════════════════════════════════════════════════════════════════════
// MorphConfig
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MorphConfig {
    /// Approach rate `k`, per second.
    pub rate:   f32,
    /// Longest frame time honoured, seconds.  Longer frames (a stalled or
    /// backgrounded loop) are treated as this long.
    pub max_dt: f32,
}

impl Default for MorphConfig {
    fn default() -> Self {
        MorphConfig { rate: 3.0, max_dt: 0.1 }
    }
}

impl MorphConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [("rate", self.rate), ("max_dt", self.max_dt)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::NotPositive { name, value });
            }
        }
        let step = self.rate * self.max_dt;
        if step > 1.0 {
            return Err(ConfigError::UnstableStep(step));
        }
        Ok(())
    }

    /// Fraction of the remaining distance covered in a frame of `dt`
    /// seconds, always within [0, 1].
    pub fn step_factor(&self, dt: f32) -> f32 {
        let dt = if dt.is_finite() { dt.clamp(0.0, self.max_dt) } else { 0.0 };
        (dt * self.rate).clamp(0.0, 1.0)
    }
}

/// Advance one progress value toward `target`.
///
/// The step is proportional to the remaining distance and the factor never
/// exceeds 1, so `p` cannot cross `target`.
pub fn approach(p: f32, target: f32, dt: f32, config: &MorphConfig) -> f32 {
    p + (target - p) * config.step_factor(dt)
}

// ════════════════════════════════════════════════════════════════════════════
// MorphField — flat per-element arena
// ════════════════════════════════════════════════════════════════════════════

/// Progress and positions for every element, stored as parallel arrays
/// indexed by element id.
///
/// Nothing is allocated after construction; [`MorphField::advance`] rewrites
/// `progress` and `positions` in place.
#[derive(Clone, Debug)]
pub struct MorphField {
    config:    MorphConfig,
    tree:      Vec<Vec3>,
    scatter:   Vec<Vec3>,
    progress:  Vec<f32>,
    positions: Vec<Vec3>,
}

impl MorphField {
    pub fn new(layout: &Layout, config: MorphConfig) -> Self {
        let tree:    Vec<Vec3> = layout.elements().iter().map(|e| e.tree).collect();
        let scatter: Vec<Vec3> = layout.elements().iter().map(|e| e.scatter).collect();
        let n = tree.len();
        MorphField {
            config,
            positions: scatter.clone(),
            tree,
            scatter,
            progress:  vec![1.0; n],
        }
    }

    pub fn len(&self) -> usize { self.progress.len() }

    pub fn is_empty(&self) -> bool { self.progress.is_empty() }

    pub fn config(&self) -> &MorphConfig { &self.config }

    /// Step every element toward `target` by `dt` seconds.
    pub fn advance(&mut self, target: f32, dt: f32) {
        let target = if target.is_finite() { target.clamp(0.0, 1.0) } else { return };
        let k = self.config.step_factor(dt);
        for (((p, pos), a), b) in self.progress.iter_mut()
            .zip(self.positions.iter_mut())
            .zip(&self.tree)
            .zip(&self.scatter)
        {
            *p += (target - *p) * k;
            *pos = a.lerp(*b, *p);
        }
    }

    /// Put every element back on its scatter anchor.
    pub fn reset(&mut self) {
        self.progress.fill(1.0);
        self.positions.copy_from_slice(&self.scatter);
    }

    pub fn positions(&self) -> &[Vec3] { &self.positions }

    pub fn progress(&self, index: usize) -> f32 { self.progress[index] }

    pub fn mean_progress(&self) -> f32 {
        if self.progress.is_empty() {
            return 0.0;
        }
        self.progress.iter().sum::<f32>() / self.progress.len() as f32
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::LayoutConfig;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn field(count: usize) -> (Layout, MorphField) {
        let mut rng = StdRng::seed_from_u64(17);
        let cfg = LayoutConfig { ornament_count: count, ..Default::default() };
        let layout = Layout::generate(&cfg, &mut rng);
        let field  = MorphField::new(&layout, MorphConfig::default());
        (layout, field)
    }

    // ── config ───────────────────────────────────────────────────────────

    #[test]
    fn default_config_is_valid() {
        assert_eq!(MorphConfig::default().validate(), Ok(()));
    }

    #[test]
    fn unstable_step_rejected() {
        let cfg = MorphConfig { rate: 30.0, max_dt: 0.1 };
        assert!(matches!(cfg.validate(), Err(ConfigError::UnstableStep(_))));
    }

    #[test]
    fn step_factor_clamps_spikes() {
        let cfg = MorphConfig::default();
        assert!((cfg.step_factor(5.0) - 0.3).abs() < 1e-6);
        assert_eq!(cfg.step_factor(-1.0), 0.0);
        assert_eq!(cfg.step_factor(f32::NAN), 0.0);
    }

    // ── approach ─────────────────────────────────────────────────────────

    #[test]
    fn progress_strictly_decreases_toward_zero() {
        let cfg = MorphConfig::default();
        let mut p = 1.0_f32;
        for _ in 0..200 {
            let next = approach(p, 0.0, 1.0 / 60.0, &cfg);
            assert!(next < p, "{} did not drop below {}", next, p);
            assert!(next >= 0.0);
            p = next;
        }
        assert!(p < 1e-3);
    }

    #[test]
    fn huge_frame_does_not_overshoot() {
        let cfg = MorphConfig { rate: 3.0, max_dt: 10.0 };
        let p = approach(1.0, 0.0, 10.0, &cfg);
        assert!(p >= 0.0 && p <= 1.0);
        let q = approach(0.2, 0.9, 1e6, &cfg);
        assert!(q <= 0.9 + 1e-6);
    }

    #[test]
    fn zero_dt_is_a_no_op() {
        assert_eq!(approach(0.4, 1.0, 0.0, &MorphConfig::default()), 0.4);
    }

    // ── field ────────────────────────────────────────────────────────────

    #[test]
    fn starts_scattered() {
        let (layout, f) = field(50);
        assert_eq!(f.len(), 51);
        for (i, e) in layout.elements().iter().enumerate() {
            assert_eq!(f.progress(i), 1.0);
            assert_eq!(f.positions()[i], e.scatter);
        }
    }

    #[test]
    fn converges_onto_tree() {
        let (layout, mut f) = field(50);
        for _ in 0..600 { f.advance(0.0, 1.0 / 60.0); }
        for (i, e) in layout.elements().iter().enumerate() {
            assert!(f.positions()[i].distance(e.tree) < 1e-3);
        }
        assert!(f.mean_progress() < 1e-4);
    }

    #[test]
    fn positions_are_on_the_segment() {
        let (layout, mut f) = field(20);
        for _ in 0..10 { f.advance(0.3, 1.0 / 30.0); }
        for (i, e) in layout.elements().iter().enumerate() {
            let expected = e.tree.lerp(e.scatter, f.progress(i));
            assert!(f.positions()[i].distance(expected) < 1e-5);
        }
    }

    #[test]
    fn nan_target_ignored() {
        let (_, mut f) = field(5);
        f.advance(f32::NAN, 0.05);
        assert_eq!(f.progress(0), 1.0);
    }

    #[test]
    fn reset_returns_to_scatter() {
        let (layout, mut f) = field(10);
        for _ in 0..30 { f.advance(0.0, 0.05); }
        f.reset();
        assert_eq!(f.mean_progress(), 1.0);
        assert_eq!(f.positions()[3], layout.elements()[3].scatter);
    }
}
