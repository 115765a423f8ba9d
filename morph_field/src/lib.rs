//! # morph_field
//!
//! Thousands of elements, each with a fixed "tree" anchor inside a cone and
//! a fixed "scattered" anchor inside a sphere, morphing between the two as a
//! single control value moves.
//!
//! * [`layout`] — one-time, seedable generation of both anchor sets and the
//!   static look of every element.
//! * [`morph`] — the per-element progress arena advanced every frame.
//!
//! ## Quick start
//!
//! ```rust
//! use morph_field::{Layout, LayoutConfig, MorphConfig, MorphField};
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let mut rng = StdRng::seed_from_u64(2024);
//! let layout  = Layout::generate(&LayoutConfig::default(), &mut rng);
//! let mut field = MorphField::new(&layout, MorphConfig::default());
//!
//! // Control value 0 pulls everything into the tree.
//! for _ in 0..120 { field.advance(0.0, 1.0 / 60.0); }
//! assert!(field.mean_progress() < 0.01);
//! ```

use thiserror::Error;

pub mod layout;
pub mod morph;

pub use layout::{random_in_cone, random_in_sphere, Element, Layout, LayoutConfig, ShapeKind, PALETTE, STAR_COLOR};
pub use morph::{approach, MorphConfig, MorphField};

/// Invalid scene or morph configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{name} must be positive and finite, got {value}")]
    NotPositive { name: &'static str, value: f32 },
    #[error("scale range {start}..{end} is empty")]
    EmptyScaleRange { start: f32, end: f32 },
    #[error("morph rate × max_dt must stay within 1 (got {0})")]
    UnstableStep(f32),
}
