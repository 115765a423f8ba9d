//! Top-level application state machine.
//!
//! `AppState` owns the [`ControlSignal`], the generated [`Layout`] and the
//! [`MorphField`] that chases the control value.  It folds
//! [`GestureEvent`]s and UI requests into the control signal and hands the
//! visualizer a [`SceneView`] each frame.

use std::sync::mpsc;
use std::time::Instant;

use hand_signal::{percent, ConditionerConfig, ControlSignal, HandPose, LandmarkSet, MorphState};
use morph_field::{Layout, LayoutConfig, MorphConfig, MorphField};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::error::AppError;
use crate::gesture::{spawn_gesture_source, GestureEvent, GestureHandle, GestureStatus, SimInput};
use crate::visualizer::{SceneView, UiCommand, ViewConfig, Visualizer};

// ════════════════════════════════════════════════════════════════════════════
// AppConfig
// ════════════════════════════════════════════════════════════════════════════

/// Configuration for the full application.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub conditioner:   ConditionerConfig,
    pub layout:        LayoutConfig,
    pub morph:         MorphConfig,
    pub view:          ViewConfig,
    /// Seed for the layout and the simulated hand's jitter.
    pub seed:          u64,
    /// Pixel jitter of the simulated hand.
    pub sim_jitter:    f32,
    /// Start the simulated camera in the "permission denied" state.
    pub deny_camera:   bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            conditioner: ConditionerConfig::default(),
            layout:      LayoutConfig::default(),
            morph:       MorphConfig::default(),
            view:        ViewConfig::default(),
            seed:        2024,
            sim_jitter:  1.5,
            deny_camera: false,
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), AppError> {
        self.conditioner.validate()?;
        self.layout.validate()?;
        self.morph.validate()?;
        Ok(())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// AppState
// ════════════════════════════════════════════════════════════════════════════

pub struct AppState {
    // ── control ──────────────────────────────────────────────────────────
    control:     ControlSignal,

    // ── scene ────────────────────────────────────────────────────────────
    layout:      Layout,
    field:       MorphField,
    /// Seconds of scene time, drives rotation, sway and bobbing.
    clock:       f32,

    // ── gesture feedback ─────────────────────────────────────────────────
    status:      GestureStatus,
    status_text: String,
    landmarks:   Option<LandmarkSet>,
}

impl AppState {
    pub fn new(cfg: &AppConfig) -> Self {
        let mut rng = StdRng::seed_from_u64(cfg.seed);
        let layout  = Layout::generate(&cfg.layout, &mut rng);
        let field   = MorphField::new(&layout, cfg.morph);
        let status  = GestureStatus::Initializing;
        AppState {
            control:     ControlSignal::new(),
            status_text: status.to_string(),
            status,
            layout,
            field,
            clock:       0.0,
            landmarks:   None,
        }
    }

    /// Apply one event from the gesture thread.
    pub fn handle_gesture(&mut self, event: GestureEvent) {
        match event {
            GestureEvent::Status(status) => {
                if status.is_degraded() {
                    log::warn!("gesture: {}", status);
                }
                if !matches!(status, GestureStatus::Tracking { .. }) {
                    self.landmarks = None;
                }
                self.set_status(status);
            }

            GestureEvent::Measurement(m) => {
                let before = self.control.state();
                if self.control.apply_gesture(m.value) {
                    self.set_status(GestureStatus::Tracking {
                        pose:    HandPose::classify(m.value),
                        percent: percent(m.value),
                    });
                    self.log_transition(before);
                }
                self.landmarks = Some(m.landmarks);
            }

            GestureEvent::HandLost => {
                self.landmarks = None;
                self.set_status(GestureStatus::AwaitingHand);
            }
        }
    }

    /// Button / key request for a target state.
    pub fn request_state(&mut self, state: MorphState) {
        let before = self.control.state();
        self.control.request(state);
        log::info!("ui: requested {}", state);
        self.log_transition(before);
    }

    /// Forget everything the old gesture source reported; used when the
    /// detection loop is restarted.
    pub fn reset_gesture(&mut self) {
        self.landmarks = None;
        self.set_status(GestureStatus::Initializing);
    }

    /// The gesture thread ended on its own.  A failure status already on
    /// screen is more useful than "stopped", so it is kept.
    pub fn gesture_stopped(&mut self) {
        if !self.status.is_degraded() {
            self.landmarks = None;
            self.set_status(GestureStatus::Stopped);
        }
    }

    /// Per-frame logic: move every element `dt` seconds toward the control
    /// value.
    pub fn tick(&mut self, dt: f32) {
        if dt.is_finite() && dt > 0.0 {
            self.clock += dt;
        }
        self.field.advance(self.control.value(), dt);
    }

    /// Borrowed snapshot for the visualizer.
    pub fn scene(&self) -> SceneView<'_> {
        SceneView {
            positions: self.field.positions(),
            elements:  self.layout.elements(),
            clock:     self.clock,
            state:     self.control.state(),
            control:   self.control.value(),
            progress:  self.field.mean_progress(),
            status:    &self.status_text,
            degraded:  self.status.is_degraded(),
            landmarks: self.landmarks.as_ref(),
        }
    }

    pub fn control(&self)   -> &ControlSignal      { &self.control }
    pub fn field(&self)     -> &MorphField         { &self.field }
    pub fn layout(&self)    -> &Layout             { &self.layout }
    pub fn status(&self)    -> &GestureStatus      { &self.status }
    pub fn landmarks(&self) -> Option<&LandmarkSet> { self.landmarks.as_ref() }

    fn set_status(&mut self, status: GestureStatus) {
        if status != self.status {
            self.status_text = status.to_string();
            self.status = status;
        }
    }

    fn log_transition(&self, before: MorphState) {
        let after = self.control.state();
        if after != before {
            log::info!("morph: {} -> {}", before, after);
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Gesture source wiring
// ════════════════════════════════════════════════════════════════════════════

/// Start (or restart) the gesture source.  `generation` varies the sim seed
/// so a restarted simulated hand does not replay the same jitter.
#[cfg(not(feature = "leap"))]
fn start_gesture(cfg: &AppConfig, vis: &mut Visualizer, generation: u64) -> GestureHandle {
    use crate::gesture::{DetectionLoop, SimCamera, SimHandDetector};

    let (sim_tx, sim_rx) = mpsc::channel::<SimInput>();
    vis.set_sim_sender(Some(sim_tx));

    let camera = if cfg.deny_camera { SimCamera::denied() } else { SimCamera::new() };
    let detector = SimHandDetector::new(sim_rx, cfg.seed.wrapping_add(generation))
        .with_jitter(cfg.sim_jitter);
    log::info!("gesture: starting simulated detection loop (generation {})", generation);
    spawn_gesture_source(DetectionLoop::new(camera, detector, cfg.conditioner))
}

#[cfg(feature = "leap")]
fn start_gesture(cfg: &AppConfig, vis: &mut Visualizer, generation: u64) -> GestureHandle {
    use crate::gesture::LeapGestureSource;

    vis.set_sim_sender(None::<mpsc::Sender<SimInput>>);
    log::info!("gesture: starting LeapMotion source (generation {})", generation);
    spawn_gesture_source(LeapGestureSource::new(cfg.conditioner))
}

// ════════════════════════════════════════════════════════════════════════════
// run() — the main application loop
// ════════════════════════════════════════════════════════════════════════════

/// Run the full application.
///
/// This is the entry point called from `main.rs`.  It creates the visualizer,
/// the gesture source (simulation by default, hardware with `--features leap`),
/// and drives the event/render loop at ~60 fps.  Rendering never waits on the
/// gesture thread: pending events are drained without blocking.
pub fn run(cfg: AppConfig) -> Result<(), AppError> {
    cfg.validate()?;

    // ── Visualizer (owns the window) ─────────────────────────────────────
    let mut vis = Visualizer::new(cfg.view)?;

    // ── App state ─────────────────────────────────────────────────────────
    let mut app = AppState::new(&cfg);

    // ── Gesture thread ───────────────────────────────────────────────────
    let mut generation = 0u64;
    let mut gesture = start_gesture(&cfg, &mut vis, generation);

    // ── Main loop ─────────────────────────────────────────────────────────
    let mut commands = Vec::new();
    let mut last = Instant::now();
    'frame: while vis.is_open() {
        // 1. Window input
        vis.poll_input(&mut commands);
        for cmd in commands.drain(..) {
            match cmd {
                UiCommand::Quit => break 'frame,
                UiCommand::Request(state) => app.request_state(state),
                UiCommand::RestartGesture => {
                    gesture.stop();
                    app.reset_gesture();
                    generation += 1;
                    gesture = start_gesture(&cfg, &mut vis, generation);
                }
            }
        }

        // 2. Drain gesture events
        for event in gesture.drain() {
            app.handle_gesture(event);
        }
        if !gesture.is_running() {
            app.gesture_stopped();
        }

        // 3. Per-frame logic
        let now = Instant::now();
        let dt  = now.duration_since(last).as_secs_f32();
        last    = now;
        app.tick(dt);

        // 4. Render
        vis.render(&app.scene())?;
    }

    gesture.stop();
    log::info!("app: window closed");
    Ok(())
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
