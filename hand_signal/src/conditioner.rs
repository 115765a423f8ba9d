//! Raw openness ratio → bounded, smoothed control value.
//!
//! The conditioner owns exactly one piece of state, the previous smoothed
//! value.  It lives as long as the gesture subsystem does and is reset when
//! that subsystem restarts.

use thiserror::Error;

// ════════════════════════════════════════════════════════════════════════════
// ConditionerConfig
// ════════════════════════════════════════════════════════════════════════════

/// Calibration for the openness → control mapping.
///
/// All ratio fields are in "openness ratio" units (mean tip distance over
/// palm size, dimensionless); `open_dead_zone` is in normalized [0, 1]
/// units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConditionerConfig {
    /// Ratio mapped to 0 by the linear remap.
    pub min_ratio:         f32,
    /// Ratio mapped to 1 by the linear remap.
    pub max_ratio:         f32,
    /// Ratios below this are a closed fist: raw value forced to 0.
    pub closed_fist_ratio: f32,
    /// Normalized values above this snap to 1.
    pub open_dead_zone:    f32,
    /// Weight of the previous value in the exponential smoother, [0, 1).
    /// Lower is faster and noisier.
    pub alpha:             f32,
}

impl Default for ConditionerConfig {
    fn default() -> Self {
        ConditionerConfig {
            min_ratio:         0.6,
            max_ratio:         2.0,
            closed_fist_ratio: 0.8,
            open_dead_zone:    0.95,
            alpha:             0.3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("min_ratio ({min}) must be below max_ratio ({max})")]
    RatioRange { min: f32, max: f32 },
    #[error("alpha must lie in [0, 1), got {0}")]
    Alpha(f32),
    #[error("{0} must be finite")]
    NotFinite(&'static str),
}

impl ConditionerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, v) in [
            ("min_ratio",         self.min_ratio),
            ("max_ratio",         self.max_ratio),
            ("closed_fist_ratio", self.closed_fist_ratio),
            ("open_dead_zone",    self.open_dead_zone),
            ("alpha",             self.alpha),
        ] {
            if !v.is_finite() {
                return Err(ConfigError::NotFinite(name));
            }
        }
        if self.min_ratio >= self.max_ratio {
            return Err(ConfigError::RatioRange { min: self.min_ratio, max: self.max_ratio });
        }
        if !(0.0..1.0).contains(&self.alpha) {
            return Err(ConfigError::Alpha(self.alpha));
        }
        Ok(())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SignalConditioner
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub struct SignalConditioner {
    config:   ConditionerConfig,
    previous: f32,
}

impl SignalConditioner {
    pub fn new(config: ConditionerConfig) -> Self {
        SignalConditioner { config, previous: 0.0 }
    }

    pub fn config(&self) -> &ConditionerConfig { &self.config }

    /// The last smoothed value (0 before the first measurement).
    pub fn previous(&self) -> f32 { self.previous }

    /// Back to the power-on state.
    pub fn reset(&mut self) { self.previous = 0.0; }

    /// Remap, fist floor, open dead zone and clamp — no state touched.
    pub fn normalize(&self, ratio: f32) -> f32 {
        let c = &self.config;
        let mut raw = (ratio - c.min_ratio) / (c.max_ratio - c.min_ratio);
        if ratio < c.closed_fist_ratio {
            raw = 0.0;
        }
        if raw > c.open_dead_zone {
            raw = 1.0;
        }
        raw.clamp(0.0, 1.0)
    }

    /// Fold one measurement in and return the new smoothed value.
    ///
    /// A non-finite ratio is not a measurement: the state is left alone and
    /// the previous value comes back.
    pub fn update(&mut self, ratio: f32) -> f32 {
        if !ratio.is_finite() {
            log::debug!("conditioner: ignoring non-finite ratio {}", ratio);
            return self.previous;
        }
        let raw = self.normalize(ratio);
        let a   = self.config.alpha;
        // Both terms are in [0, 1] and the weights sum to 1.
        let smoothed = (self.previous * a + raw * (1.0 - a)).clamp(0.0, 1.0);
        log::trace!("conditioner: ratio={:.3} raw={:.3} smoothed={:.3}", ratio, raw, smoothed);
        self.previous = smoothed;
        smoothed
    }
}

impl Default for SignalConditioner {
    fn default() -> Self { SignalConditioner::new(ConditionerConfig::default()) }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    // ── config ───────────────────────────────────────────────────────────

    #[test]
    fn default_config_is_valid() {
        assert_eq!(ConditionerConfig::default().validate(), Ok(()));
    }

    #[test]
    fn inverted_ratio_range_rejected() {
        let cfg = ConditionerConfig { min_ratio: 2.0, max_ratio: 0.6, ..Default::default() };
        assert!(matches!(cfg.validate(), Err(ConfigError::RatioRange { .. })));
    }

    #[test]
    fn alpha_of_one_rejected() {
        let cfg = ConditionerConfig { alpha: 1.0, ..Default::default() };
        assert_eq!(cfg.validate(), Err(ConfigError::Alpha(1.0)));
    }

    #[test]
    fn nan_threshold_rejected() {
        let cfg = ConditionerConfig { open_dead_zone: f32::NAN, ..Default::default() };
        assert_eq!(cfg.validate(), Err(ConfigError::NotFinite("open_dead_zone")));
    }

    // ── normalize ────────────────────────────────────────────────────────

    #[test]
    fn linear_remap_midrange() {
        let c = SignalConditioner::default();
        // (1.3 - 0.6) / 1.4 = 0.5
        assert!((c.normalize(1.3) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn fist_floor_overrides_remap() {
        // Remap alone would give (0.75 - 0.6) / 1.4 ≈ 0.107.
        let c = SignalConditioner::default();
        assert_eq!(c.normalize(0.75), 0.0);
        assert_eq!(c.normalize(0.5), 0.0);
    }

    #[test]
    fn fist_floor_ignores_calibration_range() {
        let cfg = ConditionerConfig { min_ratio: -5.0, max_ratio: 0.9, ..Default::default() };
        let c = SignalConditioner::new(cfg);
        assert_eq!(c.normalize(0.79), 0.0);
    }

    #[test]
    fn dead_zone_snaps_to_one() {
        let c = SignalConditioner::default();
        // (1.94 - 0.6) / 1.4 ≈ 0.957
        assert_eq!(c.normalize(1.94), 1.0);
        assert_eq!(c.normalize(2.1), 1.0);
    }

    #[test]
    fn normalize_is_bounded() {
        let c = SignalConditioner::default();
        for ratio in [-100.0_f32, -1.0, 0.0, 0.79, 0.8, 1.0, 1.9, 2.0, 3.0, 1e9] {
            let raw = c.normalize(ratio);
            assert!((0.0..=1.0).contains(&raw), "ratio {} → {}", ratio, raw);
        }
    }

    // ── update ───────────────────────────────────────────────────────────

    #[test]
    fn one_step_output_is_bounded() {
        for ratio in [-3.0_f32, 0.0, 0.6, 0.8, 1.4, 2.0, 2.5, 50.0] {
            let mut c = SignalConditioner::default();
            let v = c.update(ratio);
            assert!((0.0..=1.0).contains(&v));
        }
    }

    #[test]
    fn smoothing_step_from_zero() {
        let mut c = SignalConditioner::default();
        // raw = 1, previous = 0 → 0 * 0.3 + 1 * 0.7
        assert!((c.update(2.1) - 0.7).abs() < 1e-6);
        assert!((c.previous() - 0.7).abs() < 1e-6);
    }

    #[test]
    fn constant_input_converges_monotonically_without_overshoot() {
        let mut c = SignalConditioner::default();
        let target = c.normalize(1.3);
        let mut last = c.previous();
        for _ in 0..40 {
            let v = c.update(1.3);
            assert!(v >= last, "not monotone: {} after {}", v, last);
            assert!(v <= target + 1e-6, "overshoot: {} > {}", v, target);
            last = v;
        }
        assert!((last - target).abs() < 1e-4);
    }

    #[test]
    fn constant_input_converges_downward() {
        let mut c = SignalConditioner::default();
        for _ in 0..20 { c.update(2.5); }
        let mut last = c.previous();
        for _ in 0..40 {
            let v = c.update(0.3);
            assert!(v <= last);
            assert!(v >= 0.0);
            last = v;
        }
        assert!(last < 1e-4);
    }

    #[test]
    fn non_finite_ratio_leaves_state() {
        let mut c = SignalConditioner::default();
        c.update(2.2);
        let before = c.previous();
        assert_eq!(c.update(f32::NAN), before);
        assert_eq!(c.update(f32::INFINITY), before);
        assert_eq!(c.previous(), before);
    }

    #[test]
    fn reset_restores_zero() {
        let mut c = SignalConditioner::default();
        c.update(2.2);
        c.reset();
        assert_eq!(c.previous(), 0.0);
    }
}
