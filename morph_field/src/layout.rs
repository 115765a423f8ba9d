//! One-time generation of the two target layouts.
//!
//! Every element gets a point inside the tree cone (layout A) and a point
//! inside the scatter sphere (layout B), plus its static look.  The layout
//! is built once per scene and never regenerated: a fresh draw would make
//! every running interpolation jump.

use std::f32::consts::TAU;
use std::ops::Range;

use glam::Vec3;
use rand::Rng;

use crate::ConfigError;

// ════════════════════════════════════════════════════════════════════════════
// Palette
// ════════════════════════════════════════════════════════════════════════════

/// Ornament colors, packed ARGB.
pub const PALETTE: [u32; 7] = [
    0xFF0A5F38, // deep emerald
    0xFF1B7943, // rich green
    0xFF8B0000, // dark red
    0xFFB22222, // firebrick
    0xFFDC143C, // crimson
    0xFF228B22, // forest green
    0xFFC41E3A, // cardinal red
];

pub const STAR_COLOR: u32 = 0xFFFFD700;
pub const STAR_SCALE: f32 = 0.8;

// ════════════════════════════════════════════════════════════════════════════
// ShapeKind
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    Sphere,
    Box,
    Gem,
    Star,
}

/// Ornament shape draw table: mostly boxes.
const ORNAMENT_SHAPES: [ShapeKind; 5] = [
    ShapeKind::Box, ShapeKind::Box, ShapeKind::Box, ShapeKind::Sphere, ShapeKind::Gem,
];

// ════════════════════════════════════════════════════════════════════════════
// LayoutConfig
// ════════════════════════════════════════════════════════════════════════════

/// Scene geometry, in world units (the tree is 6 units tall by default).
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutConfig {
    pub ornament_count:      usize,
    /// Cone height `H`; the cone's base sits on y = 0.
    pub cone_height:         f32,
    /// Cone base radius `R`.
    pub cone_radius:         f32,
    /// Radius of the ornament scatter sphere, centred on the origin.
    pub scatter_radius:      f32,
    /// Height of the star's tree anchor, just above the cone apex.
    pub star_height:         f32,
    /// Radius of the star's own scatter sphere.
    pub star_scatter_radius: f32,
    /// Ornament base scale is drawn uniformly from this range.
    pub scale_range:         Range<f32>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        LayoutConfig {
            ornament_count:      1125,
            cone_height:         6.0,
            cone_radius:         2.5,
            scatter_radius:      12.0,
            star_height:         6.2,
            star_scatter_radius: 14.0,
            scale_range:         0.6..1.0,
        }
    }
}

impl LayoutConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("cone_height",         self.cone_height),
            ("cone_radius",         self.cone_radius),
            ("scatter_radius",      self.scatter_radius),
            ("star_scatter_radius", self.star_scatter_radius),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::NotPositive { name, value });
            }
        }
        let Range { start, end } = self.scale_range;
        if !(start.is_finite() && end.is_finite() && start < end && start > 0.0) {
            return Err(ConfigError::EmptyScaleRange { start, end });
        }
        Ok(())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Element
// ════════════════════════════════════════════════════════════════════════════

/// One visual element: two fixed anchors plus static attributes.
#[derive(Clone, Debug, PartialEq)]
pub struct Element {
    /// Layout A — inside the tree cone.
    pub tree:        Vec3,
    /// Layout B — inside the scatter sphere.
    pub scatter:     Vec3,
    pub shape:       ShapeKind,
    pub color:       u32,
    pub scale:       f32,
    /// Phase of the idle bob, radians.
    pub float_phase: f32,
}

// ════════════════════════════════════════════════════════════════════════════
// Sampling
// ════════════════════════════════════════════════════════════════════════════

/// Uniform-by-volume point inside a cone with its base disc on y = 0 and
/// apex at y = `height`.
///
/// Height is drawn linearly; the disc radius at that height shrinks to
/// `radius * (1 - y/height)` and the in-disc radius uses `sqrt(u)` so the
/// disc is filled evenly rather than clustered at its centre.
pub fn random_in_cone<R: Rng + ?Sized>(rng: &mut R, height: f32, radius: f32) -> Vec3 {
    let y      = rng.random::<f32>() * height;
    let r_at_y = radius * (1.0 - y / height);
    let angle  = rng.random::<f32>() * TAU;
    let r      = rng.random::<f32>().sqrt() * r_at_y;
    Vec3::new(r * angle.cos(), y, r * angle.sin())
}

/// Uniform-by-volume point inside a ball of `radius` centred on the origin.
///
/// `cbrt(u)` for the radial distance, uniform direction on the sphere.
pub fn random_in_sphere<R: Rng + ?Sized>(rng: &mut R, radius: f32) -> Vec3 {
    let theta = rng.random::<f32>() * TAU;
    let phi   = (2.0 * rng.random::<f32>() - 1.0).clamp(-1.0, 1.0).acos();
    let r     = rng.random::<f32>().cbrt() * radius;
    Vec3::new(
        r * phi.sin() * theta.cos(),
        r * phi.sin() * theta.sin(),
        r * phi.cos(),
    )
}

// ════════════════════════════════════════════════════════════════════════════
// Layout
// ════════════════════════════════════════════════════════════════════════════

/// The full element population: ornaments first, the star last.
#[derive(Clone, Debug)]
pub struct Layout {
    elements: Vec<Element>,
}

impl Layout {
    /// Draw every element from `rng`.  Seed the generator to get the same
    /// layout twice.
    pub fn generate<R: Rng + ?Sized>(config: &LayoutConfig, rng: &mut R) -> Self {
        let mut elements = Vec::with_capacity(config.ornament_count + 1);

        for _ in 0..config.ornament_count {
            let shape = ORNAMENT_SHAPES[rng.random_range(0..ORNAMENT_SHAPES.len())];
            let color = PALETTE[rng.random_range(0..PALETTE.len())];
            let tree    = random_in_cone(rng, config.cone_height, config.cone_radius);
            let scatter = random_in_sphere(rng, config.scatter_radius);
            let scale   = rng.random_range(config.scale_range.clone());
            let float_phase = rng.random::<f32>() * TAU;
            elements.push(Element { tree, scatter, shape, color, scale, float_phase });
        }

        elements.push(Element {
            tree:        Vec3::new(0.0, config.star_height, 0.0),
            scatter:     random_in_sphere(rng, config.star_scatter_radius),
            shape:       ShapeKind::Star,
            color:       STAR_COLOR,
            scale:       STAR_SCALE,
            float_phase: rng.random::<f32>() * TAU,
        });

        log::info!("layout: generated {} ornaments + star", config.ornament_count);
        Layout { elements }
    }

    pub fn elements(&self) -> &[Element] { &self.elements }

    pub fn len(&self) -> usize { self.elements.len() }

    pub fn is_empty(&self) -> bool { self.elements.is_empty() }

    pub fn star_index(&self) -> usize { self.elements.len() - 1 }

    pub fn star(&self) -> &Element { &self.elements[self.star_index()] }

    pub fn ornaments(&self) -> &[Element] { &self.elements[..self.star_index()] }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn layout(seed: u64) -> Layout {
        let mut rng = StdRng::seed_from_u64(seed);
        Layout::generate(&LayoutConfig::default(), &mut rng)
    }

    #[test]
    fn default_config_is_valid() {
        assert_eq!(LayoutConfig::default().validate(), Ok(()));
    }

    #[test]
    fn negative_radius_rejected() {
        let cfg = LayoutConfig { cone_radius: -1.0, ..Default::default() };
        assert!(matches!(cfg.validate(), Err(ConfigError::NotPositive { name: "cone_radius", .. })));
    }

    #[test]
    fn empty_scale_range_rejected() {
        let cfg = LayoutConfig { scale_range: 1.0..1.0, ..Default::default() };
        assert!(matches!(cfg.validate(), Err(ConfigError::EmptyScaleRange { .. })));
    }

    #[test]
    fn population_size() {
        let l = layout(1);
        assert_eq!(l.ornaments().len(), 1125);
        assert_eq!(l.len(), 1126);
        assert_eq!(l.star().shape, ShapeKind::Star);
    }

    #[test]
    fn tree_points_inside_cone() {
        let cfg = LayoutConfig::default();
        let (h, r) = (cfg.cone_height, cfg.cone_radius);
        for e in layout(7).ornaments() {
            let p = e.tree;
            assert!(p.y >= 0.0 && p.y <= h, "y out of cone: {:?}", p);
            let radial = (p.x * p.x + p.z * p.z).sqrt();
            assert!(radial <= r * (1.0 - p.y / h) + 1e-5, "outside cone: {:?}", p);
        }
    }

    #[test]
    fn scatter_points_inside_sphere() {
        let radius = LayoutConfig::default().scatter_radius;
        for e in layout(7).ornaments() {
            assert!(e.scatter.length() <= radius + 1e-4, "outside sphere: {:?}", e.scatter);
        }
    }

    #[test]
    fn star_anchor_and_scatter() {
        let cfg = LayoutConfig::default();
        let l = layout(3);
        assert_eq!(l.star().tree, Vec3::new(0.0, 6.2, 0.0));
        assert!(l.star().scatter.length() <= cfg.star_scatter_radius + 1e-4);
        assert_eq!(l.star().color, STAR_COLOR);
    }

    #[test]
    fn same_seed_same_layout() {
        assert_eq!(layout(42).elements(), layout(42).elements());
    }

    #[test]
    fn different_seed_different_layout() {
        assert_ne!(layout(1).elements(), layout(2).elements());
    }

    #[test]
    fn attributes_drawn_from_tables() {
        for e in layout(9).ornaments() {
            assert!(PALETTE.contains(&e.color));
            assert_ne!(e.shape, ShapeKind::Star);
            assert!((0.6..=1.0).contains(&e.scale));
            assert!((0.0..TAU).contains(&e.float_phase));
        }
    }

    #[test]
    fn boxes_dominate() {
        let l = layout(11);
        let boxes = l.ornaments().iter().filter(|e| e.shape == ShapeKind::Box).count();
        // Expected 3/5 of 1125 = 675.
        assert!(boxes > 560 && boxes < 790, "boxes = {}", boxes);
    }

    #[test]
    fn sphere_scatter_is_volume_uniform() {
        // Half the volume of a ball lies beyond 0.5^(1/3) ≈ 0.794 of its radius.
        let mut rng = StdRng::seed_from_u64(5);
        let n = 4000;
        let outer = (0..n)
            .filter(|_| random_in_sphere(&mut rng, 1.0).length() > 0.5_f32.cbrt())
            .count();
        assert!(outer > n * 45 / 100 && outer < n * 55 / 100, "outer = {}", outer);
    }

    #[test]
    fn cone_disc_is_area_uniform() {
        // At any height half the disc area lies beyond 1/sqrt(2) of its radius.
        let mut rng = StdRng::seed_from_u64(6);
        let n = 4000;
        let outer = (0..n)
            .filter(|_| {
                let p = random_in_cone(&mut rng, 6.0, 2.5);
                let allowed = 2.5 * (1.0 - p.y / 6.0);
                (p.x * p.x + p.z * p.z).sqrt() > allowed * std::f32::consts::FRAC_1_SQRT_2
            })
            .count();
        assert!(outer > n * 45 / 100 && outer < n * 55 / 100, "outer = {}", outer);
    }
}
