//! Gesture input — camera capture, hand detection and the detection loop.
//!
//! The public interface is [`GestureEvent`] delivered over a `mpsc` channel
//! held by a [`GestureHandle`].  Consumers don't need to know whether the
//! hand came from a real sensor or the keyboard-driven simulator.
//!
//! Each detection cycle is strictly sequential: grab a frame, wait for the
//! detector, measure openness, condition it, send.  The next cycle does not
//! start until the detector has answered, so a slow model never has more
//! than one request in flight.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use glam::Vec3;
use hand_signal::{
    openness_ratio, synthetic_hand, ConditionerConfig, HandPose, LandmarkSet, SignalConditioner,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

/// Resolution requested from the camera.
pub const CAPTURE_WIDTH:  u32 = 640;
pub const CAPTURE_HEIGHT: u32 = 480;

// ════════════════════════════════════════════════════════════════════════════
// Errors and status
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GestureError {
    #[error("camera unavailable: {0}")]
    CameraUnavailable(String),
    #[error("camera stopped delivering frames: {0}")]
    CameraLost(String),
    #[error("hand model failed to load: {0}")]
    ModelLoad(String),
    #[error("hand detection failed: {0}")]
    Detection(String),
}

/// User-visible state of the gesture subsystem.
#[derive(Clone, Debug, PartialEq)]
pub enum GestureStatus {
    Initializing,
    LoadingModel,
    AwaitingHand,
    Tracking { pose: HandPose, percent: u8 },
    /// Carries the rendered [`GestureError`].
    CameraUnavailable(String),
    /// Carries the rendered [`GestureError`].
    ModelFailed(String),
    /// The detector is erroring on every frame; carries the first error.
    DetectionFailed(String),
    Stopped,
}

impl GestureStatus {
    /// True for the failure states that leave only the UI buttons working.
    pub fn is_degraded(&self) -> bool {
        matches!(
            self,
            GestureStatus::CameraUnavailable(_)
                | GestureStatus::ModelFailed(_)
                | GestureStatus::DetectionFailed(_)
        )
    }
}

impl fmt::Display for GestureStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GestureStatus::Initializing          => write!(f, "Initializing..."),
            GestureStatus::LoadingModel          => write!(f, "Loading hand detection model..."),
            GestureStatus::AwaitingHand          => write!(f, "Show your hand to camera"),
            GestureStatus::Tracking { pose, percent } =>
                write!(f, "{} ({}%) - {}", pose.label(), percent, pose.effect()),
            GestureStatus::CameraUnavailable(m)
            | GestureStatus::ModelFailed(m)
            | GestureStatus::DetectionFailed(m)  => f.write_str(m),
            GestureStatus::Stopped               => write!(f, "Gesture input stopped"),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// GestureEvent
// ════════════════════════════════════════════════════════════════════════════

/// One conditioned openness reading.
#[derive(Clone, Debug, PartialEq)]
pub struct Measurement {
    /// Raw openness ratio from the landmark geometry.
    pub ratio:     f32,
    /// Smoothed control value in [0, 1].
    pub value:     f32,
    pub landmarks: LandmarkSet,
}

#[derive(Clone, Debug, PartialEq)]
pub enum GestureEvent {
    Status(GestureStatus),
    Measurement(Measurement),
    /// The hand that was being tracked is gone.
    HandLost,
}

// ════════════════════════════════════════════════════════════════════════════
// Collaborator traits
// ════════════════════════════════════════════════════════════════════════════

/// A captured video frame.  Pixel layout is whatever the detector expects.
#[derive(Clone, Debug, Default)]
pub struct VideoFrame {
    pub width:    u32,
    pub height:   u32,
    pub sequence: u64,
    pub data:     Vec<u8>,
}

/// Anything that can deliver video frames.
pub trait CameraSource: Send + 'static {
    fn open(&mut self, width: u32, height: u32) -> Result<(), GestureError>;
    /// Blocks until the next frame is available.
    fn next_frame(&mut self) -> Result<VideoFrame, GestureError>;
    fn stop(&mut self);
}

/// A hand-landmark model.  Only the first returned hand is used.
pub trait HandDetector: Send + 'static {
    fn load(&mut self) -> Result<(), GestureError>;
    fn estimate_hands(&mut self, frame: &VideoFrame) -> Result<Vec<LandmarkSet>, GestureError>;
}

// ════════════════════════════════════════════════════════════════════════════
// HandTracker — analyzer + conditioner
// ════════════════════════════════════════════════════════════════════════════

/// Turns per-frame detections into [`GestureEvent`]s.
///
/// Owns the conditioner's smoothing state; a new tracker starts from zero.
#[derive(Debug)]
pub struct HandTracker {
    conditioner:  SignalConditioner,
    hand_visible: bool,
}

impl HandTracker {
    pub fn new(config: ConditionerConfig) -> Self {
        HandTracker { conditioner: SignalConditioner::new(config), hand_visible: false }
    }

    pub fn conditioner(&self) -> &SignalConditioner { &self.conditioner }

    /// Forget the smoothing history and the last hand; used whenever the
    /// camera is (re)acquired.
    pub fn reset(&mut self) {
        self.conditioner.reset();
        self.hand_visible = false;
    }

    /// Feed this cycle's hand (if any).
    ///
    /// A missing hand or a degenerate one (zero palm size) does not touch the
    /// conditioner; it yields [`GestureEvent::HandLost`] once, on the
    /// transition, and nothing afterwards.
    pub fn observe(&mut self, hand: Option<&LandmarkSet>) -> Option<GestureEvent> {
        let Some((hand, ratio)) = hand.and_then(|h| openness_ratio(h).map(|r| (h, r))) else {
            return self.lose();
        };
        if !self.hand_visible {
            log::info!("gesture: hand acquired");
        }
        self.hand_visible = true;
        let value = self.conditioner.update(ratio);
        Some(GestureEvent::Measurement(Measurement { ratio, value, landmarks: *hand }))
    }

    fn lose(&mut self) -> Option<GestureEvent> {
        if !self.hand_visible {
            return None;
        }
        log::info!("gesture: hand lost");
        self.hand_visible = false;
        Some(GestureEvent::HandLost)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// GestureSource trait — unified interface for hw and sim
// ════════════════════════════════════════════════════════════════════════════

/// Shared cancellation flag between a [`GestureHandle`] and its thread.
#[derive(Clone, Debug, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self { StopSignal::default() }
    pub fn set(&self) { self.0.store(true, Ordering::SeqCst); }
    pub fn is_set(&self) -> bool { self.0.load(Ordering::SeqCst) }
}

/// Anything that can deliver [`GestureEvent`]s over a channel until told to
/// stop.
pub trait GestureSource: Send + 'static {
    fn run(self: Box<Self>, tx: Sender<GestureEvent>, stop: StopSignal);
}

// ════════════════════════════════════════════════════════════════════════════
// GestureHandle / spawn helper
// ════════════════════════════════════════════════════════════════════════════

/// Owning handle to a running gesture source.
pub struct GestureHandle {
    rx:     Option<Receiver<GestureEvent>>,
    stop:   StopSignal,
    thread: Option<JoinHandle<()>>,
}

impl GestureHandle {
    /// Pending events, without blocking.  Empty once stopped.
    pub fn drain(&self) -> impl Iterator<Item = GestureEvent> + '_ {
        self.rx.iter().flat_map(|rx| rx.try_iter())
    }

    /// Block up to `timeout` for the next event.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<GestureEvent> {
        self.rx.as_ref()?.recv_timeout(timeout).ok()
    }

    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Cancel the source and wait for its thread.
    ///
    /// The receiver is dropped first, so nothing sent afterwards is ever
    /// observed, and the thread's next send fails and ends it.
    pub fn stop(&mut self) {
        self.stop.set();
        self.rx = None;
        if let Some(t) = self.thread.take() {
            if t.join().is_err() {
                log::warn!("gesture: source thread panicked");
            }
            log::debug!("gesture: source stopped");
        }
    }
}

impl Drop for GestureHandle {
    fn drop(&mut self) { self.stop(); }
}

/// Spawn a gesture source on its own thread.
pub fn spawn_gesture_source<G: GestureSource>(source: G) -> GestureHandle {
    let (tx, rx) = mpsc::channel();
    let stop     = StopSignal::new();
    let flag     = stop.clone();
    let thread   = thread::Builder::new()
        .name("gesture".into())
        .spawn(move || Box::new(source).run(tx, flag));
    match thread {
        Ok(t) => GestureHandle { rx: Some(rx), stop, thread: Some(t) },
        Err(e) => {
            log::warn!("gesture: could not spawn source thread: {}", e);
            GestureHandle { rx: None, stop, thread: None }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// DetectionLoop — camera + detector
// ════════════════════════════════════════════════════════════════════════════

/// The camera → detector → tracker pipeline, run as a [`GestureSource`].
pub struct DetectionLoop<C: CameraSource, D: HandDetector> {
    camera:   C,
    detector: D,
    tracker:  HandTracker,
}

impl<C: CameraSource, D: HandDetector> DetectionLoop<C, D> {
    pub fn new(camera: C, detector: D, config: ConditionerConfig) -> Self {
        DetectionLoop { camera, detector, tracker: HandTracker::new(config) }
    }
}

impl<C: CameraSource, D: HandDetector> GestureSource for DetectionLoop<C, D> {
    fn run(self: Box<Self>, tx: Sender<GestureEvent>, stop: StopSignal) {
        let DetectionLoop { mut camera, mut detector, mut tracker } = *self;
        let status = |s: GestureStatus| {
            log::info!("gesture: {}", s);
            let _ = tx.send(GestureEvent::Status(s));
        };

        status(GestureStatus::Initializing);
        if let Err(e) = camera.open(CAPTURE_WIDTH, CAPTURE_HEIGHT) {
            log::warn!("gesture: {}", e);
            status(GestureStatus::CameraUnavailable(e.to_string()));
            return;
        }

        status(GestureStatus::LoadingModel);
        if let Err(e) = detector.load() {
            log::warn!("gesture: {}", e);
            status(GestureStatus::ModelFailed(e.to_string()));
            camera.stop();
            return;
        }
        tracker.reset();
        status(GestureStatus::AwaitingHand);

        // Set while the detector keeps erroring; the status goes out once.
        let mut failing = false;
        while !stop.is_set() {
            let frame = match camera.next_frame() {
                Ok(f)  => f,
                Err(e) => {
                    log::warn!("gesture: {}", e);
                    status(GestureStatus::CameraUnavailable(e.to_string()));
                    break;
                }
            };

            let hands = match detector.estimate_hands(&frame) {
                Ok(h)  => h,
                Err(e) => {
                    log::debug!("gesture: frame {} skipped: {}", frame.sequence, e);
                    if !failing {
                        failing = true;
                        log::warn!("gesture: {}", e);
                        status(GestureStatus::DetectionFailed(e.to_string()));
                    }
                    continue;
                }
            };
            // Cancelled while the detector was busy: drop the result.
            if stop.is_set() { break; }

            if failing {
                failing = false;
                log::info!("gesture: detector recovered");
                status(GestureStatus::AwaitingHand);
            }

            if let Some(event) = tracker.observe(hands.first()) {
                if tx.send(event).is_err() { break; }
            }
        }

        camera.stop();
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Simulation — keyboard-driven synthetic hand (always available)
// ════════════════════════════════════════════════════════════════════════════

/// Raw input from the visualizer window that drives the simulated hand.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimInput {
    /// Spread the fingers a little further.
    Open,
    /// Curl the fingers a little further.
    Close,
    /// Put the hand in front of / take it away from the camera.
    ToggleHand,
}

/// Camera stand-in: blank frames at a fixed cadence.
pub struct SimCamera {
    interval: Duration,
    size:     Option<(u32, u32)>,
    sequence: u64,
    deny:     bool,
}

impl SimCamera {
    /// ~30 fps.
    pub fn new() -> Self {
        SimCamera { interval: Duration::from_millis(33), size: None, sequence: 0, deny: false }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// A camera whose permission request is always refused.
    pub fn denied() -> Self {
        SimCamera { deny: true, ..SimCamera::new() }
    }
}

impl Default for SimCamera {
    fn default() -> Self { SimCamera::new() }
}

impl CameraSource for SimCamera {
    fn open(&mut self, width: u32, height: u32) -> Result<(), GestureError> {
        if self.deny {
            return Err(GestureError::CameraUnavailable("access denied".into()));
        }
        self.size = Some((width, height));
        Ok(())
    }

    fn next_frame(&mut self) -> Result<VideoFrame, GestureError> {
        let (width, height) = self.size
            .ok_or_else(|| GestureError::CameraLost("camera not open".into()))?;
        thread::sleep(self.interval);
        self.sequence += 1;
        Ok(VideoFrame { width, height, sequence: self.sequence, data: Vec::new() })
    }

    fn stop(&mut self) { self.size = None; }
}

/// Openness ratio at simulated openness 0 and 1.
const SIM_RATIO_RANGE: (f32, f32) = (0.5, 2.2);
const SIM_STEP:        f32        = 0.05;
const SIM_PALM_PX:     f32        = 90.0;

/// Detector stand-in: builds a synthetic hand from the window's key state,
/// with a little pixel jitter like a real model.
pub struct SimHandDetector {
    rx:       Receiver<SimInput>,
    openness: f32,
    present:  bool,
    jitter:   f32,
    rng:      StdRng,
}

impl SimHandDetector {
    /// Starts with no hand in view.
    pub fn new(rx: Receiver<SimInput>, seed: u64) -> Self {
        SimHandDetector {
            rx,
            openness: 0.0,
            present:  false,
            jitter:   1.5,
            rng:      StdRng::seed_from_u64(seed),
        }
    }

    pub fn with_jitter(mut self, px: f32) -> Self {
        self.jitter = px.max(0.0);
        self
    }

    pub fn openness(&self) -> f32 { self.openness }

    fn apply(&mut self, input: SimInput) {
        match input {
            SimInput::Open       => self.openness = (self.openness + SIM_STEP).min(1.0),
            SimInput::Close      => self.openness = (self.openness - SIM_STEP).max(0.0),
            SimInput::ToggleHand => self.present = !self.present,
        }
    }

    fn hand(&mut self, frame: &VideoFrame) -> LandmarkSet {
        let (lo, hi) = SIM_RATIO_RANGE;
        let ratio = lo + (hi - lo) * self.openness;
        let wrist = Vec3::new(frame.width as f32 * 0.5, frame.height as f32 * 0.85, 0.0);
        let hand  = synthetic_hand(ratio, wrist, SIM_PALM_PX);
        if self.jitter <= 0.0 {
            return hand;
        }
        let j = self.jitter;
        let rng = &mut self.rng;
        LandmarkSet::new(hand.points().map(|p| {
            p + Vec3::new(rng.random_range(-j..=j), rng.random_range(-j..=j), 0.0)
        }))
    }
}

impl HandDetector for SimHandDetector {
    fn load(&mut self) -> Result<(), GestureError> {
        log::info!("gesture: simulated hand model ready");
        Ok(())
    }

    fn estimate_hands(&mut self, frame: &VideoFrame) -> Result<Vec<LandmarkSet>, GestureError> {
        while let Ok(input) = self.rx.try_recv() {
            self.apply(input);
        }
        if !self.present {
            return Ok(Vec::new());
        }
        Ok(vec![self.hand(frame)])
    }
}

/// Simulated camera + detector, wired to a [`SimInput`] channel.
pub fn sim_detection_loop(
    rx:     Receiver<SimInput>,
    seed:   u64,
    config: ConditionerConfig,
) -> DetectionLoop<SimCamera, SimHandDetector> {
    DetectionLoop::new(SimCamera::new(), SimHandDetector::new(rx, seed), config)
}

// ════════════════════════════════════════════════════════════════════════════
// LeapGestureSource — real hardware (feature = "leap")
// ════════════════════════════════════════════════════════════════════════════

/// Hand tracking from a LeapMotion controller.
///
/// The Leap does capture and inference itself, so this source skips the
/// camera/detector split and converts the first tracked hand's joints
/// straight into a landmark set.
///
/// Requires the `leap` feature flag and the LeapC shared library installed.
#[cfg(feature = "leap")]
pub struct LeapGestureSource {
    tracker: HandTracker,
}

#[cfg(feature = "leap")]
impl LeapGestureSource {
    pub fn new(config: ConditionerConfig) -> Self {
        LeapGestureSource { tracker: HandTracker::new(config) }
    }
}

#[cfg(feature = "leap")]
impl GestureSource for LeapGestureSource {
    fn run(self: Box<Self>, tx: Sender<GestureEvent>, stop: StopSignal) {
        use leaprs::*;

        let mut tracker = self.tracker;
        let status = |s: GestureStatus| {
            log::info!("gesture: {}", s);
            let _ = tx.send(GestureEvent::Status(s));
        };

        status(GestureStatus::Initializing);
        let mut connection = match Connection::create(ConnectionConfig::default()) {
            Ok(c)  => c,
            Err(e) => {
                let e = GestureError::CameraUnavailable(format!("LeapC connection: {:?}", e));
                status(GestureStatus::CameraUnavailable(e.to_string()));
                return;
            }
        };
        if let Err(e) = connection.open() {
            let e = GestureError::CameraUnavailable(format!("LeapMotion device: {:?}", e));
            status(GestureStatus::CameraUnavailable(e.to_string()));
            return;
        }
        tracker.reset();
        status(GestureStatus::AwaitingHand);

        while !stop.is_set() {
            let msg = match connection.poll(100) {
                Ok(m)  => m,
                Err(_) => continue,
            };

            if let Event::Tracking(frame) = msg.event() {
                let hands: Vec<_> = frame.hands().collect();
                let landmarks = hands.first().and_then(|h| leap_landmarks(h));
                if let Some(event) = tracker.observe(landmarks.as_ref()) {
                    if tx.send(event).is_err() { return; }
                }
            }
        }
    }
}

/// Map Leap joints onto the 21-point layout.
///
/// Per digit (thumb first) the four landmarks are the proximal, intermediate
/// and distal bone bases plus the distal tip; the wrist is the base of the
/// middle metacarpal.  Leap millimetres (y up) are flipped into a
/// 640×480-ish image frame so the landmark inset stays readable.
#[cfg(feature = "leap")]
fn leap_landmarks(hand: &leaprs::Hand) -> Option<LandmarkSet> {
    use hand_signal::landmarks::WRIST;

    let digits: Vec<_> = hand.digits().collect();
    if digits.len() < 5 { return None; }

    let to_px = |x: f32, y: f32, z: f32| [CAPTURE_WIDTH as f32 * 0.5 + x, CAPTURE_HEIGHT as f32 - y, z];

    let mut raw = [[0.0_f32; 3]; hand_signal::LANDMARK_COUNT];
    let w = digits[2].metacarpal().prev_joint();
    raw[WRIST] = to_px(w.x, w.y, w.z);

    for (f, digit) in digits.iter().take(5).enumerate() {
        let joints = [
            digit.proximal().prev_joint(),
            digit.intermediate().prev_joint(),
            digit.distal().prev_joint(),
            digit.distal().next_joint(),
        ];
        for (k, j) in joints.iter().enumerate() {
            raw[1 + f * 4 + k] = to_px(j.x, j.y, j.z);
        }
    }

    LandmarkSet::from_points(&raw).ok()
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
