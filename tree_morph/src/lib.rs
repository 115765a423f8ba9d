//! # tree_morph
//!
//! Hand-gesture controlled morph between a Christmas tree and a scattered
//! cloud of ornaments.  Opening the hand in front of the camera scatters
//! the ornaments; closing it gathers them back into the cone with the gold
//! star on top.
//!
//! ## Gesture → Action mapping
//!
//! | Hand | Status text | Effect |
//! |---|---|---|
//! | None visible | Show your hand to camera | Last control value is held |
//! | Closed fist | Closed (n%) - Tree | Ornaments gather into the tree |
//! | Half open | Partial (n%) - Morphing | Ornaments hover in between |
//! | Fully open | Open (n%) - Scattered | Ornaments fly out to the sphere |
//!
//! The **TREE** and **GIFT** buttons force either end state at any time.
//! Gesture and buttons write the same control value; whichever wrote last
//! wins.
//!
//! ## Threads
//!
//! * **gesture** — camera frames, hand detection and signal conditioning
//!   ([`gesture`]).  Sends [`gesture::GestureEvent`]s over a channel.
//! * **main** — window input, morph integration and rendering ([`app`],
//!   [`visualizer`]).  Drains gesture events without blocking.
//!
//! ## Feature flags
//!
//! * (default) — **Simulation mode**: keyboard keys drive a synthetic hand.
//! * `leap` — **Hardware mode**: polls a real LeapMotion controller via LeapC.
//!
//! ### Keyboard shortcuts
//!
//! | Key | Action |
//! |---|---|
//! | `H` | Show / hide the simulated hand |
//! | `Up` / hold | Open the simulated hand |
//! | `Down` / hold | Close the simulated hand |
//! | `1` / `T` | TREE button |
//! | `2` / `G` | GIFT button |
//! | `R` | Restart the gesture source |
//! | `Q` / `Escape` | Quit |

pub mod error;
pub mod gesture;
pub mod visualizer;
pub mod app;

pub use error::AppError;
