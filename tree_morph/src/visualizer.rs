//! Software-rendered visualizer using `minifb`.
//!
//! Layout:
//!
//! ```text
//! ┌────────────┬──────────────────────────────────────┬────────────────────┐
//! │ hand inset │                                      │  gesture status    │
//! │ (landmarks)│          ornaments + star            │  control value     │
//! └────────────┘        (perspective, painter's)      └────────────────────┘
//! │                                                                        │
//! │                    [ TREE ]        [ GIFT ]                            │
//! │  key legend                                                            │
//! └────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The visualizer never waits on gesture input: it draws whatever
//! [`SceneView`] it is handed and reports window input back as
//! [`UiCommand`]s and [`SimInput`]s.
//!
//! Dragging with the left mouse button orbits the camera; the ornament
//! under the cursor is drawn larger and in yellow.

use std::f32::consts::FRAC_PI_2;
use std::sync::mpsc::Sender;

use glam::{Mat4, Vec3, Vec4Swizzles};
use hand_signal::{LandmarkSet, MorphState};
use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};
use morph_field::{Element, ShapeKind};

use crate::error::AppError;
use crate::gesture::{SimInput, CAPTURE_HEIGHT, CAPTURE_WIDTH};

// ════════════════════════════════════════════════════════════════════════════
// Layout constants
// ════════════════════════════════════════════════════════════════════════════

pub const WIN_W:       usize = 960;
pub const WIN_H:       usize = 640;
const INSET_W:         usize = 160;
const INSET_H:         usize = 120;
const PANEL_W:         usize = 300;
const PANEL_H:         usize = 64;
const BUTTON_W:        usize = 150;
const BUTTON_H:        usize = 34;
const BUTTON_GAP:      usize = 20;
const BUTTON_Y:        usize = WIN_H - 90;
const BG_COLOR:        u32   = 0xFF050505;
const PANEL_BG:        u32   = 0xFF101010;
const GOLD:            u32   = 0xFFFFD700;
const DIM_GOLD:        u32   = 0xFF806B00;
const LEGEND_COLOR:    u32   = 0xFF888888;
const HOVER_COLOR:     u32   = 0xFFFFEB3B;
const HOVER_SCALE:     f32   = 1.5;
/// Camera orbit per dragged pixel, radians.
const ORBIT_SPEED:     f32   = 0.005;

/// World radius of each shape at scale 1.
fn shape_radius(shape: ShapeKind) -> f32 {
    match shape {
        ShapeKind::Sphere => 0.15,
        ShapeKind::Box    => 0.125,
        ShapeKind::Gem    => 0.2,
        ShapeKind::Star   => 0.6,
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ViewConfig / Projector
// ════════════════════════════════════════════════════════════════════════════

/// Camera and idle-motion settings.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewConfig {
    pub eye:             Vec3,
    pub fov_y_deg:       f32,
    /// Scene translation; lowers the tree so it sits in the middle of frame.
    pub scene_offset:    Vec3,
    /// Slow orbit around the y axis, rad/s.
    pub auto_rotate:     f32,
    /// Sway amplitude (rad) and frequency (rad/s) on top of the orbit.
    pub sway_amplitude:  f32,
    pub sway_frequency:  f32,
    /// Idle bob of every element, world units and rad/s.
    pub float_amplitude: f32,
    pub float_speed:     f32,
}

impl Default for ViewConfig {
    fn default() -> Self {
        ViewConfig {
            eye:             Vec3::new(0.0, 2.0, 10.0),
            fov_y_deg:       45.0,
            scene_offset:    Vec3::new(0.0, -3.0, 0.0),
            auto_rotate:     0.2,
            sway_amplitude:  0.1,
            sway_frequency:  0.1,
            float_amplitude: 0.06,
            float_speed:     2.0,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// OrbitCamera — mouse-dragged viewpoint
// ════════════════════════════════════════════════════════════════════════════

const MIN_POLAR: f32 = 1e-3;

/// Camera on a sphere around the origin, moved by dragging.  The polar
/// angle (from +y) stays within (0, π/2], so the camera never goes below
/// the ground plane.  Auto-rotation spins the scene, not this camera.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrbitCamera {
    azimuth: f32,
    polar:   f32,
    radius:  f32,
}

impl OrbitCamera {
    pub fn from_eye(eye: Vec3) -> Self {
        let radius = eye.length().max(NEAR);
        OrbitCamera {
            azimuth: eye.x.atan2(eye.z),
            polar:   (eye.y / radius).clamp(-1.0, 1.0).acos().clamp(MIN_POLAR, FRAC_PI_2),
            radius,
        }
    }

    /// Apply a mouse drag of `(dx, dy)` pixels.
    pub fn drag(&mut self, dx: f32, dy: f32) {
        self.azimuth -= dx * ORBIT_SPEED;
        self.polar = (self.polar - dy * ORBIT_SPEED).clamp(MIN_POLAR, FRAC_PI_2);
    }

    pub fn polar(&self) -> f32 { self.polar }

    pub fn eye(&self) -> Vec3 {
        let ring = self.radius * self.polar.sin();
        Vec3::new(
            ring * self.azimuth.sin(),
            self.radius * self.polar.cos(),
            ring * self.azimuth.cos(),
        )
    }
}

/// World → screen for one frame.
#[derive(Clone, Debug)]
pub struct Projector {
    mvp:    Mat4,
    focal:  f32,
    width:  f32,
    height: f32,
}

const NEAR: f32 = 0.1;
const FAR:  f32 = 100.0;

impl Projector {
    pub fn new(
        view:   &ViewConfig,
        orbit:  &OrbitCamera,
        clock:  f32,
        width:  usize,
        height: usize,
    ) -> Self {
        let fov    = view.fov_y_deg.to_radians();
        let aspect = width as f32 / height.max(1) as f32;
        let spin   = view.auto_rotate * clock
                   + (clock * view.sway_frequency).sin() * view.sway_amplitude;
        let model  = Mat4::from_translation(view.scene_offset) * Mat4::from_rotation_y(spin);
        let cam    = Mat4::look_at_rh(orbit.eye(), Vec3::ZERO, Vec3::Y);
        let proj   = Mat4::perspective_rh(fov, aspect, NEAR, FAR);
        Projector {
            mvp:    proj * cam * model,
            focal:  height as f32 * 0.5 / (fov * 0.5).tan(),
            width:  width as f32,
            height: height as f32,
        }
    }

    /// Screen x, screen y and view depth; `None` behind the camera.
    pub fn project(&self, p: Vec3) -> Option<(f32, f32, f32)> {
        let clip = self.mvp * p.extend(1.0);
        if clip.w <= NEAR {
            return None;
        }
        let ndc = clip.xyz() / clip.w;
        let x = (ndc.x * 0.5 + 0.5) * self.width;
        let y = (0.5 - ndc.y * 0.5) * self.height;
        Some((x, y, clip.w))
    }

    /// On-screen radius of a sphere of `radius` at `depth`.
    pub fn pixel_radius(&self, radius: f32, depth: f32) -> f32 {
        radius * self.focal / depth.max(NEAR)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Frame inputs and outputs
// ════════════════════════════════════════════════════════════════════════════

/// Everything the visualizer needs for one frame, borrowed from the app.
pub struct SceneView<'a> {
    pub positions:  &'a [Vec3],
    pub elements:   &'a [Element],
    pub clock:      f32,
    pub state:      MorphState,
    pub control:    f32,
    pub progress:   f32,
    pub status:     &'a str,
    pub degraded:   bool,
    pub landmarks:  Option<&'a LandmarkSet>,
}

/// Window input that affects the app rather than the simulated hand.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UiCommand {
    Request(MorphState),
    RestartGesture,
    Quit,
}

/// Screen rectangle of the button for `state`.
pub fn button_rect(state: MorphState) -> (usize, usize, usize, usize) {
    let total = BUTTON_W * 2 + BUTTON_GAP;
    let left  = (WIN_W - total) / 2;
    let x = match state {
        MorphState::TreeShape => left,
        MorphState::Scattered => left + BUTTON_W + BUTTON_GAP,
    };
    (x, BUTTON_Y, BUTTON_W, BUTTON_H)
}

/// Which button, if any, covers pixel `(x, y)`.
pub fn button_at(x: f32, y: f32) -> Option<MorphState> {
    [MorphState::TreeShape, MorphState::Scattered].into_iter().find(|&s| {
        let (bx, by, bw, bh) = button_rect(s);
        x >= bx as f32 && x < (bx + bw) as f32 && y >= by as f32 && y < (by + bh) as f32
    })
}

fn button_label(state: MorphState) -> &'static str {
    match state {
        MorphState::TreeShape => "TREE",
        MorphState::Scattered => "GIFT",
    }
}

#[derive(Clone, Copy, Debug)]
struct Sprite {
    depth: f32,
    x:     f32,
    y:     f32,
    r:     f32,
    index: u32,
}

/// The ornament under `(x, y)`, if any.  `sprites` is sorted far to near,
/// so the nearest hit wins; the star blocks but is never highlighted.
fn pick_sprite(sprites: &[Sprite], elements: &[Element], x: f32, y: f32) -> Option<u32> {
    sprites.iter().rev()
        .find(|s| {
            let (dx, dy) = (s.x - x, s.y - y);
            dx * dx + dy * dy <= s.r * s.r
        })
        .filter(|s| elements[s.index as usize].shape != ShapeKind::Star)
        .map(|s| s.index)
}

// ════════════════════════════════════════════════════════════════════════════
// Visualizer
// ════════════════════════════════════════════════════════════════════════════

pub struct Visualizer {
    window:     Window,
    buf:        Vec<u32>,
    view:       ViewConfig,
    sim_tx:     Option<Sender<SimInput>>,
    orbit:      OrbitCamera,
    /// Reused every frame for depth sorting.
    sprites:    Vec<Sprite>,
    /// Cursor position for hover, `None` while dragging or outside.
    cursor:     Option<(f32, f32)>,
    /// Last cursor position of an orbit drag in progress.
    drag_from:  Option<(f32, f32)>,
    mouse_was_down: bool,
}

impl Visualizer {
    pub fn new(view: ViewConfig) -> Result<Self, AppError> {
        let mut window = Window::new(
            "Tree Morph - gesture controlled",
            WIN_W, WIN_H,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        )?;

        window.limit_update_rate(Some(std::time::Duration::from_millis(16))); // ~60fps

        Ok(Visualizer {
            window,
            buf: vec![BG_COLOR; WIN_W * WIN_H],
            orbit: OrbitCamera::from_eye(view.eye),
            view,
            sim_tx: None,
            sprites: Vec::new(),
            cursor: None,
            drag_from: None,
            mouse_was_down: false,
        })
    }

    /// Route simulated-hand keys to a (new) sim detector.
    pub fn set_sim_sender(&mut self, tx: Option<Sender<SimInput>>) { self.sim_tx = tx; }

    /// Returns false when the window should close.
    pub fn is_open(&self) -> bool { self.window.is_open() }

    /// Poll keyboard and mouse.  Sim-hand keys go straight to the sim
    /// channel; everything else is pushed onto `out`.
    pub fn poll_input(&mut self, out: &mut Vec<UiCommand>) {
        if !self.window.is_open() {
            out.push(UiCommand::Quit);
            return;
        }

        // Keys that trigger on first press only
        let one_shot = |k: Key| self.window.is_key_pressed(k, KeyRepeat::No);
        // Keys that repeat while held
        let held     = |k: Key| self.window.is_key_pressed(k, KeyRepeat::Yes);

        if one_shot(Key::Q) || one_shot(Key::Escape) {
            out.push(UiCommand::Quit);
            return;
        }
        if one_shot(Key::Key1) || one_shot(Key::T) {
            out.push(UiCommand::Request(MorphState::TreeShape));
        }
        if one_shot(Key::Key2) || one_shot(Key::G) {
            out.push(UiCommand::Request(MorphState::Scattered));
        }
        if one_shot(Key::R) {
            out.push(UiCommand::RestartGesture);
        }

        let mut sim = Vec::new();
        if one_shot(Key::H)  { sim.push(SimInput::ToggleHand); }
        if held(Key::Up)     { sim.push(SimInput::Open); }
        if held(Key::Down)   { sim.push(SimInput::Close); }
        if let Some(tx) = &self.sim_tx {
            for input in sim {
                let _ = tx.send(input);
            }
        }

        // Buttons fire on press, not while held; a press anywhere else
        // starts an orbit drag.
        let cursor = self.window.get_mouse_pos(MouseMode::Discard);
        let down   = self.window.get_mouse_down(MouseButton::Left);
        if down && !self.mouse_was_down {
            match cursor.and_then(|(x, y)| button_at(x, y)) {
                Some(state) => out.push(UiCommand::Request(state)),
                None        => self.drag_from = cursor,
            }
        }
        if !down {
            self.drag_from = None;
        }
        if let (Some((x0, y0)), Some((x, y))) = (self.drag_from, cursor) {
            self.orbit.drag(x - x0, y - y0);
            self.drag_from = Some((x, y));
        }
        self.cursor = if self.drag_from.is_some() { None } else { cursor };
        self.mouse_was_down = down;
    }

    /// Render one frame.
    pub fn render(&mut self, scene: &SceneView<'_>) -> Result<(), AppError> {
        self.buf.fill(BG_COLOR);

        self.draw_elements(scene);
        self.draw_hand_inset(scene.landmarks);
        self.draw_status_panel(scene);
        for state in [MorphState::TreeShape, MorphState::Scattered] {
            self.draw_button(state, state == scene.state);
        }

        self.draw_label(
            "1/T=tree  2/G=gift  click buttons  drag=orbit  Up/Down=open/close hand  H=show hand  R=restart  Q=quit",
            10, WIN_H - 16, LEGEND_COLOR, 1,
        );

        self.window.update_with_buffer(&self.buf, WIN_W, WIN_H)?;
        Ok(())
    }

    // ── Ornaments ─────────────────────────────────────────────────────────

    fn draw_elements(&mut self, scene: &SceneView<'_>) {
        let projector = Projector::new(&self.view, &self.orbit, scene.clock, WIN_W, WIN_H);
        let (amp, speed) = (self.view.float_amplitude, self.view.float_speed);

        self.sprites.clear();
        for (i, (pos, e)) in scene.positions.iter().zip(scene.elements).enumerate() {
            let bob = (scene.clock * speed + e.float_phase).sin() * amp;
            let Some((x, y, depth)) = projector.project(*pos + Vec3::Y * bob) else { continue };
            let r = projector.pixel_radius(shape_radius(e.shape) * e.scale, depth).max(1.0);
            self.sprites.push(Sprite { depth, x, y, r, index: i as u32 });
        }
        // Far to near.
        self.sprites.sort_unstable_by(|a, b| b.depth.total_cmp(&a.depth));

        let hovered = self.cursor
            .and_then(|(x, y)| pick_sprite(&self.sprites, scene.elements, x, y));

        let sprites = std::mem::take(&mut self.sprites);
        for s in &sprites {
            let e = &scene.elements[s.index as usize];
            let (color, radius) = if hovered == Some(s.index) {
                (HOVER_COLOR, s.r * HOVER_SCALE)
            } else {
                // Distance haze: far elements fade toward the background.
                let haze = ((s.depth - 6.0) / 20.0).clamp(0.0, 0.7);
                (blend(e.color, BG_COLOR, haze), s.r)
            };
            let (cx, cy, r) = (s.x as isize, s.y as isize, radius as isize);
            match e.shape {
                ShapeKind::Sphere => {
                    self.fill_circle(cx, cy, r, color);
                    self.set_pixel_i(cx - r / 3, cy - r / 3, blend(color, 0xFFFFFFFF, 0.6));
                }
                ShapeKind::Box => {
                    self.fill_rect_i(cx - r, cy - r, 2 * r + 1, 2 * r + 1, color);
                    if r >= 2 {
                        self.draw_border_i(cx - r, cy - r, 2 * r + 1, 2 * r + 1,
                                           blend(color, 0xFF000000, 0.4));
                    }
                }
                ShapeKind::Gem => self.fill_diamond(cx, cy, r, blend(color, 0xFFFFFFFF, 0.15)),
                ShapeKind::Star => {
                    self.fill_diamond(cx, cy, r, color);
                    self.fill_rect_i(cx - 2 * r, cy, 4 * r + 1, 1, color);
                    self.fill_rect_i(cx, cy - 2 * r, 1, 4 * r + 1, color);
                }
            }
        }
        self.sprites = sprites;
    }

    // ── Hand inset ────────────────────────────────────────────────────────

    fn draw_hand_inset(&mut self, landmarks: Option<&LandmarkSet>) {
        let (x0, y0) = (10usize, 10usize);
        self.fill_rect(x0, y0, INSET_W, INSET_H, PANEL_BG);
        self.draw_border(x0, y0, INSET_W, INSET_H, DIM_GOLD);

        let Some(hand) = landmarks else {
            self.draw_label("NO HAND", x0 + 52, y0 + INSET_H / 2 - 4, DIM_GOLD, 1);
            return;
        };
        let sx = INSET_W as f32 / CAPTURE_WIDTH as f32;
        let sy = INSET_H as f32 / CAPTURE_HEIGHT as f32;
        for p in hand.points() {
            let px = x0 as isize + (p.x * sx) as isize;
            let py = y0 as isize + (p.y * sy) as isize;
            if px > x0 as isize && py > y0 as isize
                && px < (x0 + INSET_W) as isize && py < (y0 + INSET_H) as isize
            {
                self.fill_circle(px, py, 1, GOLD);
            }
        }
    }

    // ── Status panel ──────────────────────────────────────────────────────

    fn draw_status_panel(&mut self, scene: &SceneView<'_>) {
        let x0 = WIN_W - PANEL_W - 10;
        let y0 = 10;
        self.fill_rect(x0, y0, PANEL_W, PANEL_H, PANEL_BG);
        self.draw_border(x0, y0, PANEL_W, PANEL_H, GOLD);

        let status_color = if scene.degraded { 0xFFFF6060 } else { GOLD };
        self.draw_label(scene.status, x0 + 8, y0 + 8, status_color, 1);

        let line = format!("{}  control {:.2}  morph {:.2}", scene.state, scene.control, scene.progress);
        self.draw_label(&line, x0 + 8, y0 + 24, 0xFFEEEEEE, 1);

        // Control bar: 0 = tree (left), 1 = scattered (right).
        let bar_w = PANEL_W - 16;
        self.fill_rect(x0 + 8, y0 + 42, bar_w, 10, 0xFF303030);
        let filled = (bar_w as f32 * scene.control.clamp(0.0, 1.0)) as usize;
        self.fill_rect(x0 + 8, y0 + 42, filled, 10, GOLD);
    }

    // ── Buttons ───────────────────────────────────────────────────────────

    fn draw_button(&mut self, state: MorphState, active: bool) {
        let (x, y, w, h) = button_rect(state);
        let (bg, fg) = if active { (GOLD, 0xFF000000) } else { (PANEL_BG, GOLD) };
        self.fill_rect(x, y, w, h, bg);
        self.draw_border(x, y, w, h, GOLD);
        let label = button_label(state);
        let text_w = label.len() * 4 * 2;
        self.draw_label(label, x + (w - text_w) / 2, y + h / 2 - 5, fg, 2);
    }

    // ── Primitive drawing helpers ─────────────────────────────────────────

    fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        for row in y..(y+h).min(WIN_H) {
            for col in x..(x+w).min(WIN_W) {
                self.buf[row * WIN_W + col] = color;
            }
        }
    }

    fn fill_rect_i(&mut self, x: isize, y: isize, w: isize, h: isize, color: u32) {
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = (x + w).min(WIN_W as isize);
        let y1 = (y + h).min(WIN_H as isize);
        if x1 <= x0 || y1 <= y0 { return; }
        self.fill_rect(x0 as usize, y0 as usize, (x1 - x0) as usize, (y1 - y0) as usize, color);
    }

    fn draw_border(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        if w == 0 || h == 0 { return; }
        for col in x..(x+w).min(WIN_W) {
            if y < WIN_H           { self.buf[y           * WIN_W + col] = color; }
            if y+h-1 < WIN_H       { self.buf[(y+h-1)     * WIN_W + col] = color; }
        }
        for row in y..(y+h).min(WIN_H) {
            if x < WIN_W           { self.buf[row * WIN_W + x    ] = color; }
            if x+w-1 < WIN_W       { self.buf[row * WIN_W + x+w-1] = color; }
        }
    }

    fn draw_border_i(&mut self, x: isize, y: isize, w: isize, h: isize, color: u32) {
        self.fill_rect_i(x, y, w, 1, color);
        self.fill_rect_i(x, y + h - 1, w, 1, color);
        self.fill_rect_i(x, y, 1, h, color);
        self.fill_rect_i(x + w - 1, y, 1, h, color);
    }

    fn set_pixel(&mut self, x: usize, y: usize, color: u32) {
        if x < WIN_W && y < WIN_H {
            self.buf[y * WIN_W + x] = color;
        }
    }

    fn set_pixel_i(&mut self, x: isize, y: isize, color: u32) {
        if x >= 0 && y >= 0 {
            self.set_pixel(x as usize, y as usize, color);
        }
    }

    fn fill_circle(&mut self, cx: isize, cy: isize, r: isize, color: u32) {
        for dy in -r..=r {
            let half = ((r * r - dy * dy) as f32).sqrt() as isize;
            self.fill_rect_i(cx - half, cy + dy, 2 * half + 1, 1, color);
        }
    }

    fn fill_diamond(&mut self, cx: isize, cy: isize, r: isize, color: u32) {
        for dy in -r..=r {
            let half = r - dy.abs();
            self.fill_rect_i(cx - half, cy + dy, 2 * half + 1, 1, color);
        }
    }

    /// Minimal bitmap font — 3×5 characters, drawn at integer `scale`.
    fn draw_label(&mut self, text: &str, x: usize, y: usize, color: u32, scale: usize) {
        let scale = scale.max(1);
        let mut cx = x;
        for ch in text.chars() {
            let glyph = char_glyph(ch);
            for (row, &bits) in glyph.iter().enumerate() {
                for col in 0..3usize {
                    if bits & (1 << (2 - col)) != 0 {
                        self.fill_rect(cx + col * scale, y + row * scale, scale, scale, color);
                    }
                }
            }
            cx += 4 * scale; // 3 wide + 1 gap
            if cx + 4 * scale > WIN_W { break; }
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Minimal 3×5 bitmap font
// ────────────────────────────────────────────────────────────────────────────

fn char_glyph(c: char) -> [u8; 5] {
    match c.to_ascii_uppercase() {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        'A' => [0b111, 0b101, 0b111, 0b101, 0b101],
        'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'C' => [0b111, 0b100, 0b100, 0b100, 0b111],
        'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'E' => [0b111, 0b100, 0b111, 0b100, 0b111],
        'F' => [0b111, 0b100, 0b111, 0b100, 0b100],
        'G' => [0b111, 0b100, 0b101, 0b101, 0b111],
        'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'J' => [0b001, 0b001, 0b001, 0b101, 0b111],
        'K' => [0b101, 0b101, 0b110, 0b101, 0b101],
        'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'M' => [0b101, 0b111, 0b101, 0b101, 0b101],
        'N' => [0b111, 0b101, 0b101, 0b101, 0b101],
        'O' => [0b111, 0b101, 0b101, 0b101, 0b111],
        'P' => [0b111, 0b101, 0b111, 0b100, 0b100],
        'Q' => [0b111, 0b101, 0b101, 0b111, 0b001],
        'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        'S' => [0b111, 0b100, 0b111, 0b001, 0b111],
        'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'V' => [0b101, 0b101, 0b101, 0b010, 0b010],
        'W' => [0b101, 0b101, 0b101, 0b111, 0b101],
        'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'Y' => [0b101, 0b101, 0b111, 0b010, 0b010],
        'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        '/' => [0b001, 0b001, 0b010, 0b100, 0b100],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '_' => [0b000, 0b000, 0b000, 0b000, 0b111],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ',' => [0b000, 0b000, 0b000, 0b010, 0b100],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '=' => [0b000, 0b111, 0b000, 0b111, 0b000],
        '%' => [0b101, 0b001, 0b010, 0b100, 0b101],
        '(' => [0b001, 0b010, 0b010, 0b010, 0b001],
        ')' => [0b100, 0b010, 0b010, 0b010, 0b100],
        ' ' => [0b000, 0b000, 0b000, 0b000, 0b000],
        _   => [0b000, 0b000, 0b010, 0b000, 0b000], // fallback dot
    }
}

/// Alpha-blend two ARGB colors. `t` = 0.0 → all `a`, `t` = 1.0 → all `b`.
fn blend(a: u32, b: u32, t: f32) -> u32 {
    let t = t.clamp(0.0, 1.0);
    let lerp = |ca: u32, cb: u32| (ca as f32 * (1.0-t) + cb as f32 * t) as u32;
    let ar = (a >> 16) & 0xFF; let br = (b >> 16) & 0xFF;
    let ag = (a >>  8) & 0xFF; let bg = (b >>  8) & 0xFF;
    let ab =  a        & 0xFF; let bb =  b        & 0xFF;
    0xFF000000 | (lerp(ar,br) << 16) | (lerp(ag,bg) << 8) | lerp(ab,bb)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn projector(view: &ViewConfig) -> Projector {
        Projector::new(view, &OrbitCamera::from_eye(view.eye), 0.0, WIN_W, WIN_H)
    }

    fn element(shape: ShapeKind) -> Element {
        Element {
            tree: Vec3::ZERO, scatter: Vec3::ZERO, shape,
            color: 0xFF228B22, scale: 1.0, float_phase: 0.0,
        }
    }

    fn sprite(index: u32, depth: f32, x: f32, y: f32, r: f32) -> Sprite {
        Sprite { depth, x, y, r, index }
    }

    #[test]
    fn scene_centre_projects_near_screen_centre() {
        let view = ViewConfig::default();
        let p = projector(&view);
        // Middle of the tree in world space, after the -3 offset lands near y = 0.
        let (x, y, depth) = p.project(Vec3::new(0.0, 3.0, 0.0)).unwrap();
        assert!((x - WIN_W as f32 / 2.0).abs() < 1.0);
        assert!(y > WIN_H as f32 * 0.4 && y < WIN_H as f32 * 0.7, "y = {}", y);
        assert!(depth > 9.0 && depth < 11.0);
    }

    #[test]
    fn points_behind_camera_are_culled() {
        let p = projector(&ViewConfig::default());
        assert!(p.project(Vec3::new(0.0, 5.0, 20.0)).is_none());
    }

    #[test]
    fn closer_things_look_bigger() {
        let p = projector(&ViewConfig::default());
        assert!(p.pixel_radius(0.2, 5.0) > p.pixel_radius(0.2, 15.0));
    }

    // ── orbit ────────────────────────────────────────────────────────────

    #[test]
    fn orbit_starts_at_configured_eye() {
        let eye = ViewConfig::default().eye;
        assert!(OrbitCamera::from_eye(eye).eye().distance(eye) < 1e-4);
    }

    #[test]
    fn orbit_never_goes_below_ground() {
        let mut orbit = OrbitCamera::from_eye(ViewConfig::default().eye);
        orbit.drag(0.0, -5000.0);
        assert!((orbit.polar() - FRAC_PI_2).abs() < 1e-6);
        assert!(orbit.eye().y.abs() < 1e-4);

        orbit.drag(0.0, 5000.0);
        assert!(orbit.polar() > 0.0);
        assert!(orbit.eye().y > 10.0);
    }

    #[test]
    fn horizontal_drag_keeps_distance_and_target() {
        let view  = ViewConfig::default();
        let mut orbit = OrbitCamera::from_eye(view.eye);
        orbit.drag(200.0, 0.0);
        assert!((orbit.eye().length() - view.eye.length()).abs() < 1e-4);
        assert!(orbit.eye().x.abs() > 1.0);
        // Still looking at the origin: the scene centre stays mid-screen.
        let p = Projector::new(&view, &orbit, 0.0, WIN_W, WIN_H);
        let (x, _, _) = p.project(Vec3::new(0.0, 3.0, 0.0)).unwrap();
        assert!((x - WIN_W as f32 / 2.0).abs() < 1.0);
    }

    // ── hover ────────────────────────────────────────────────────────────

    #[test]
    fn hover_picks_nearest_ornament() {
        let elements = vec![element(ShapeKind::Box), element(ShapeKind::Sphere)];
        // Far to near, overlapping at (100, 100).
        let sprites = vec![sprite(0, 12.0, 100.0, 100.0, 10.0), sprite(1, 8.0, 104.0, 100.0, 6.0)];
        assert_eq!(pick_sprite(&sprites, &elements, 100.0, 100.0), Some(1));
        assert_eq!(pick_sprite(&sprites, &elements, 92.0, 100.0), Some(0));
        assert_eq!(pick_sprite(&sprites, &elements, 300.0, 300.0), None);
    }

    #[test]
    fn star_is_never_highlighted() {
        let elements = vec![element(ShapeKind::Gem), element(ShapeKind::Star)];
        let sprites = vec![sprite(0, 12.0, 50.0, 50.0, 5.0), sprite(1, 6.0, 50.0, 50.0, 20.0)];
        assert_eq!(pick_sprite(&sprites, &elements, 50.0, 50.0), None);
    }

    #[test]
    fn buttons_do_not_overlap() {
        let (tx, _, tw, _) = button_rect(MorphState::TreeShape);
        let (gx, _, _, _)  = button_rect(MorphState::Scattered);
        assert!(tx + tw <= gx);
    }

    #[test]
    fn hit_test_buttons() {
        let (x, y, w, h) = button_rect(MorphState::Scattered);
        let cx = (x + w / 2) as f32;
        let cy = (y + h / 2) as f32;
        assert_eq!(button_at(cx, cy), Some(MorphState::Scattered));
        let (x, y, _, _) = button_rect(MorphState::TreeShape);
        assert_eq!(button_at(x as f32 + 1.0, y as f32 + 1.0), Some(MorphState::TreeShape));
        assert_eq!(button_at(5.0, 5.0), None);
    }

    #[test]
    fn blend_endpoints() {
        assert_eq!(blend(0xFF102030, 0xFFFFFFFF, 0.0), 0xFF102030);
        assert_eq!(blend(0xFF102030, 0xFFFFFFFF, 1.0), 0xFFFFFFFF);
    }

    #[test]
    fn glyphs_are_case_insensitive() {
        assert_eq!(char_glyph('a'), char_glyph('A'));
        assert_ne!(char_glyph('%'), char_glyph('?'));
    }
}
