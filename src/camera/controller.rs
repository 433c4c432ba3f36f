use std::f32::consts::PI;

use glam::{Vec2, Vec3};

use crate::camera::core::PerspectiveCamera;
use crate::input::MouseButton;
use crate::options::ControlsOptions;

/// Residual rotation below which damping counts as settled.
const SETTLE_EPSILON: f32 = 1e-4;
/// Keeps the polar angle off the exact poles where `look_at` degenerates.
const POLE_EPSILON: f32 = 1e-6;
/// Dolly factor per unit of scroll at zoom speed 1.
const ZOOM_BASE: f32 = 0.95;

/// What the controller is doing this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InteractionState {
    /// No input and no residual motion.
    #[default]
    Idle,
    /// A rotate button is held.
    Dragging,
    /// Released, still coasting toward rest.
    Damping,
}

/// Spherical coordinates of the eye around the target. `polar` is measured
/// from +Y, `azimuth` around +Y starting at +Z.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Spherical {
    radius: f32,
    polar: f32,
    azimuth: f32,
}

impl Spherical {
    fn from_offset(offset: Vec3) -> Self {
        let radius = offset.length();
        if radius == 0.0 {
            return Self {
                radius,
                polar: 0.0,
                azimuth: 0.0,
            };
        }
        Self {
            radius,
            polar: (offset.y / radius).clamp(-1.0, 1.0).acos(),
            azimuth: offset.x.atan2(offset.z),
        }
    }

    fn to_offset(self) -> Vec3 {
        let sin_polar = self.polar.sin();
        Vec3::new(
            self.radius * sin_polar * self.azimuth.sin(),
            self.radius * self.polar.cos(),
            self.radius * sin_polar * self.azimuth.cos(),
        )
    }
}

/// Orbit camera controller: rotate about a fixed target and dolly within
/// distance bounds. Panning is not supported.
///
/// Input only queues motion; [`update`](Self::update) applies it to the
/// camera and must run every frame so damping can settle.
pub struct OrbitController {
    target: Vec3,
    state: InteractionState,
    /// Pending (azimuth, polar) rotation in radians.
    rotate_delta: Vec2,
    /// Pending multiplicative radius change.
    zoom_scale: f32,
    active_button: Option<MouseButton>,
    last_pointer: Option<Vec2>,
    viewport_height: f32,

    enable_damping: bool,
    damping_factor: f32,
    min_distance: f32,
    max_distance: f32,
    min_polar: f32,
    max_polar: f32,
    rotate_speed: f32,
    zoom_speed: f32,
}

impl OrbitController {
    /// Controller orbiting `target` with the given limits.
    ///
    /// Options are normalised first, so inverted bounds are swapped rather
    /// than producing an empty range.
    pub fn new(
        options: &ControlsOptions,
        target: Vec3,
        viewport_height: u32,
    ) -> Self {
        let options = options.clone().normalized();
        Self {
            target,
            state: InteractionState::Idle,
            rotate_delta: Vec2::ZERO,
            zoom_scale: 1.0,
            active_button: None,
            last_pointer: None,
            viewport_height: viewport_height.max(1) as f32,
            enable_damping: options.enable_damping,
            damping_factor: options.damping_factor,
            min_distance: options.min_distance,
            max_distance: options.max_distance,
            min_polar: options.min_polar_deg.to_radians(),
            max_polar: options.max_polar_deg.to_radians(),
            rotate_speed: options.rotate_speed,
            zoom_speed: options.zoom_speed,
        }
    }

    // -- Accessors --

    /// Current interaction state.
    pub fn state(&self) -> InteractionState {
        self.state
    }

    /// Orbit target.
    pub fn target(&self) -> Vec3 {
        self.target
    }

    /// `(min, max)` eye distance.
    pub fn distance_bounds(&self) -> (f32, f32) {
        (self.min_distance, self.max_distance)
    }

    /// Polar ceiling in radians.
    pub fn max_polar(&self) -> f32 {
        self.max_polar
    }

    /// Keep rotation speed consistent with the window height.
    pub fn set_viewport_height(&mut self, height: u32) {
        if height > 0 {
            self.viewport_height = height as f32;
        }
    }

    // -- Input --

    /// Left and right buttons rotate; the middle button is unbound.
    pub fn pointer_down(&mut self, button: MouseButton) {
        if matches!(button, MouseButton::Left | MouseButton::Right) {
            self.active_button = Some(button);
            self.state = InteractionState::Dragging;
        }
    }

    /// Release the rotate button, if it is the one held.
    pub fn pointer_up(&mut self, button: MouseButton) {
        if self.active_button == Some(button) {
            self.active_button = None;
            self.state = if self.enable_damping {
                InteractionState::Damping
            } else {
                InteractionState::Idle
            };
        }
    }

    /// Cursor moved to absolute screen position `(x, y)`.
    pub fn pointer_move(&mut self, x: f32, y: f32) {
        let pos = Vec2::new(x, y);
        if let Some(last) = self.last_pointer {
            if self.state == InteractionState::Dragging {
                self.rotate_by_pixels(pos - last);
            }
        }
        self.last_pointer = Some(pos);
    }

    /// Forget the last cursor position so re-entry does not jump.
    pub fn pointer_leave(&mut self) {
        self.last_pointer = None;
    }

    /// Queue a rotation for a pointer displacement in pixels. A drag the
    /// full window height turns a full circle.
    pub fn rotate_by_pixels(&mut self, delta: Vec2) {
        let per_pixel = 2.0 * PI * self.rotate_speed / self.viewport_height;
        self.rotate_delta -= delta * per_pixel;
    }

    /// Queue a dolly. Positive `delta` moves closer.
    pub fn zoom(&mut self, delta: f32) {
        if delta.is_finite() {
            self.zoom_scale *= ZOOM_BASE.powf(delta * self.zoom_speed);
        }
    }

    // -- Per-frame --

    /// Apply queued motion to `camera`, enforce the distance and polar
    /// bounds, and decay the residual rotation.
    ///
    /// Returns `true` when the eye moved.
    pub fn update(&mut self, camera: &mut PerspectiveCamera) -> bool {
        let before = camera.eye;
        let mut spherical = Spherical::from_offset(camera.eye - self.target);

        let step = if self.enable_damping {
            self.rotate_delta * self.damping_factor
        } else {
            self.rotate_delta
        };
        spherical.azimuth += step.x;
        spherical.polar += step.y;

        spherical.polar = spherical
            .polar
            .clamp(self.min_polar, self.max_polar)
            .clamp(POLE_EPSILON, PI - POLE_EPSILON);
        spherical.radius = (spherical.radius * self.zoom_scale)
            .clamp(self.min_distance, self.max_distance);

        camera.target = self.target;
        camera.eye = self.target + spherical.to_offset();
        camera.up = Vec3::Y;

        if self.enable_damping {
            self.rotate_delta *= 1.0 - self.damping_factor;
        } else {
            self.rotate_delta = Vec2::ZERO;
        }
        self.zoom_scale = 1.0;

        if self.state == InteractionState::Damping
            && self.rotate_delta.length() < SETTLE_EPSILON
        {
            self.rotate_delta = Vec2::ZERO;
            self.state = InteractionState::Idle;
        }

        camera.eye.distance_squared(before) > f32::EPSILON
    }

    /// Current polar angle of `camera` around the target.
    pub fn polar_of(&self, camera: &PerspectiveCamera) -> f32 {
        Spherical::from_offset(camera.eye - self.target).polar
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> PerspectiveCamera {
        PerspectiveCamera {
            eye: Vec3::new(-3.0, 3.0, 9.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            aspect: 1.0,
            fovy: 75.0,
            znear: 0.1,
            zfar: 100.0,
        }
    }

    fn wide_controls() -> ControlsOptions {
        ControlsOptions {
            min_distance: 2.0,
            max_distance: 20.0,
            ..ControlsOptions::default()
        }
    }

    #[test]
    fn spherical_round_trip() {
        let offset = Vec3::new(-3.0, 3.0, 9.0);
        let back = Spherical::from_offset(offset).to_offset();
        assert!((back - offset).length() < 1e-4);
    }

    #[test]
    fn zoom_sequences_stay_within_bounds() {
        let mut cam = camera();
        let mut ctl = OrbitController::new(&wide_controls(), Vec3::ZERO, 720);
        let inputs = [50.0, -3.0, -400.0, 7.5, 1000.0, -0.1, 0.0, -25.0];
        for delta in inputs {
            ctl.zoom(delta);
            let _ = ctl.update(&mut cam);
            let d = cam.distance();
            assert!((2.0 - 1e-4..=20.0 + 1e-4).contains(&d), "distance {d}");
        }
    }

    #[test]
    fn first_update_clamps_initial_placement() {
        // Start at ~9.95 with default bounds 6.3..6.5 and a 72° polar.
        let mut cam = camera();
        let mut ctl =
            OrbitController::new(&ControlsOptions::default(), Vec3::ZERO, 720);
        let _ = ctl.update(&mut cam);
        assert!((cam.distance() - 6.5).abs() < 1e-4);
        assert!(ctl.polar_of(&cam) <= 70f32.to_radians() + 1e-5);
    }

    #[test]
    fn inverted_bounds_are_swapped() {
        let opts = ControlsOptions {
            min_distance: 6.5,
            max_distance: 6.3,
            ..ControlsOptions::default()
        };
        let ctl = OrbitController::new(&opts, Vec3::ZERO, 720);
        assert_eq!(ctl.distance_bounds(), (6.3, 6.5));
    }

    #[test]
    fn polar_never_exceeds_ceiling() {
        let mut cam = camera();
        let mut ctl = OrbitController::new(&wide_controls(), Vec3::ZERO, 720);
        ctl.pointer_down(MouseButton::Left);
        ctl.pointer_move(0.0, 0.0);
        for step in 0..60 {
            // Drag downward hard: pushes the eye below the horizon.
            ctl.pointer_move(0.0, -40.0 * (step + 1) as f32);
            let _ = ctl.update(&mut cam);
            assert!(ctl.polar_of(&cam) <= ctl.max_polar() + 1e-5);
        }
    }

    #[test]
    fn middle_button_does_not_rotate() {
        let mut cam = camera();
        let mut ctl = OrbitController::new(&wide_controls(), Vec3::ZERO, 720);
        let _ = ctl.update(&mut cam);
        let settled = cam.eye;
        ctl.pointer_down(MouseButton::Middle);
        ctl.pointer_move(0.0, 0.0);
        ctl.pointer_move(200.0, 0.0);
        assert_eq!(ctl.state(), InteractionState::Idle);
        assert!(!ctl.update(&mut cam));
        assert!(cam.eye.distance(settled) < 1e-4);
    }

    #[test]
    fn drag_release_damps_back_to_idle() {
        let mut cam = camera();
        let mut ctl = OrbitController::new(&wide_controls(), Vec3::ZERO, 720);
        ctl.pointer_down(MouseButton::Right);
        assert_eq!(ctl.state(), InteractionState::Dragging);
        ctl.pointer_move(100.0, 100.0);
        ctl.pointer_move(160.0, 100.0);
        ctl.pointer_up(MouseButton::Right);
        assert_eq!(ctl.state(), InteractionState::Damping);

        let mut moved_after_release = false;
        for _ in 0..500 {
            moved_after_release |= ctl.update(&mut cam);
            if ctl.state() == InteractionState::Idle {
                break;
            }
        }
        assert!(moved_after_release);
        assert_eq!(ctl.state(), InteractionState::Idle);
    }

    #[test]
    fn damping_decelerates() {
        let mut cam = camera();
        let mut ctl = OrbitController::new(&wide_controls(), Vec3::ZERO, 720);
        let _ = ctl.update(&mut cam);
        ctl.rotate_by_pixels(Vec2::new(120.0, 0.0));
        let mut last_step = f32::INFINITY;
        for _ in 0..10 {
            let before = cam.eye;
            let _ = ctl.update(&mut cam);
            let step = cam.eye.distance(before);
            assert!(step <= last_step + 1e-6);
            last_step = step;
        }
    }

    #[test]
    fn without_damping_rotation_applies_at_once() {
        let opts = ControlsOptions {
            enable_damping: false,
            ..wide_controls()
        };
        let mut cam = camera();
        let mut ctl = OrbitController::new(&opts, Vec3::ZERO, 720);
        let _ = ctl.update(&mut cam);
        ctl.rotate_by_pixels(Vec2::new(50.0, 0.0));
        assert!(ctl.update(&mut cam));
        assert!(!ctl.update(&mut cam));
    }
}
