use std::f32::consts::PI;

use glam::{Vec2, Vec3};

use crate::config::OrbitSettings;
use crate::editor::input::{Input, PointerButton};
use crate::scene::transform::Transform;

const REFERENCE_FPS: f32 = 60.0;
/// Keeps the polar angle off the poles, where `look_at` degenerates.
const POLE_MARGIN: f32 = 1e-4;

/// Orbit camera navigation around a target point.
///
/// Primary button rotates, secondary pans, the wheel zooms. While
/// `enabled` is false, pointer input is ignored entirely.
pub struct OrbitControls {
    enabled: bool,

    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub damping_factor: f32,
    pub enable_damping: bool,
    pub min_distance: f32,
    pub max_distance: f32,

    pub center: Vec3,
    pub radius: f32,
    /// Azimuth around +Y, measured from +Z.
    pub theta: f32,
    /// Polar angle from +Y.
    pub phi: f32,

    rotate_delta: Vec2,
}

impl OrbitControls {
    #[must_use]
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self {
            enabled: true,
            rotate_speed: 1.0,
            zoom_speed: 0.05,
            pan_speed: 1.0,
            damping_factor: 0.05,
            enable_damping: true,
            min_distance: 1.0,
            max_distance: 1000.0,

            center,
            radius,
            theta: 0.0,
            phi: PI / 2.0,

            rotate_delta: Vec2::ZERO,
        }
    }

    /// Places the orbit so the camera sits at `position` looking at `center`.
    #[must_use]
    pub fn looking_from(position: Vec3, center: Vec3, settings: &OrbitSettings) -> Self {
        let offset = position - center;
        let radius = offset.length().max(f32::EPSILON);
        let mut controls = Self::new(center, radius);
        controls.theta = offset.x.atan2(offset.z);
        controls.phi = (offset.y / radius).clamp(-1.0, 1.0).acos();

        controls.enable_damping = settings.enable_damping;
        controls.damping_factor = settings.damping_factor;
        controls.rotate_speed = settings.rotate_speed;
        controls.zoom_speed = settings.zoom_speed;
        controls.pan_speed = settings.pan_speed;
        controls.min_distance = settings.min_distance;
        controls.max_distance = settings.max_distance.max(radius);
        controls
    }

    #[inline]
    #[must_use]
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Disabling also drops any rotation still decaying from damping.
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled != enabled {
            log::trace!("Orbit controls {}", if enabled { "enabled" } else { "disabled" });
        }
        self.enabled = enabled;
        if !enabled {
            self.rotate_delta = Vec2::ZERO;
        }
    }

    /// Whether damped motion is still pending.
    #[must_use]
    pub fn is_settling(&self) -> bool {
        self.rotate_delta.length_squared() > 1e-10
    }

    /// Advances one frame and writes the camera pose into `transform`.
    pub fn update(&mut self, transform: &mut Transform, input: &Input, fov_radians: f32, dt: f32) {
        let viewport_height = input.screen_size.y.max(1.0);
        if self.enabled {
            self.accumulate_rotation(input, viewport_height);
            self.zoom(input.scroll_delta.y);
            if input.is_button_pressed(PointerButton::Secondary) {
                self.pan(input.cursor_delta, fov_radians, viewport_height);
            }
        }
        self.settle_rotation(dt);

        transform.position = self.center + self.offset_direction() * self.radius;
        transform.look_at(self.center, Vec3::Y);
    }

    fn accumulate_rotation(&mut self, input: &Input, viewport_height: f32) {
        if input.is_button_pressed(PointerButton::Primary) {
            // A full-height drag is one turn
            let radians_per_pixel = 2.0 * PI / viewport_height * self.rotate_speed;
            self.rotate_delta -= input.cursor_delta * radians_per_pixel;
        }
    }

    /// Applies pending rotation, all at once or decaying with frame-rate
    /// independent damping.
    fn settle_rotation(&mut self, dt: f32) {
        let applied = if self.enable_damping {
            let keep = (1.0 - self.damping_factor).powf(dt * REFERENCE_FPS);
            let applied = self.rotate_delta * (1.0 - keep);
            self.rotate_delta *= keep;
            applied
        } else {
            std::mem::take(&mut self.rotate_delta)
        };
        self.theta += applied.x;
        self.phi = (self.phi + applied.y).clamp(POLE_MARGIN, PI - POLE_MARGIN);
    }

    /// Positive `lines` move towards the center.
    fn zoom(&mut self, lines: f32) {
        if lines == 0.0 {
            return;
        }
        let step = (1.0 - self.zoom_speed).powf(lines.abs());
        let radius = if lines > 0.0 { self.radius * step } else { self.radius / step };
        self.radius = radius.clamp(self.min_distance, self.max_distance);
    }

    /// Moves the center so the point under the cursor follows it.
    fn pan(&mut self, cursor_delta: Vec2, fov_radians: f32, viewport_height: f32) {
        let world_per_pixel = 2.0 * self.radius * (fov_radians * 0.5).tan() / viewport_height;
        let forward = -self.offset_direction();
        let right = forward.cross(Vec3::Y).normalize();
        let up = right.cross(forward).normalize();
        self.center += (up * cursor_delta.y - right * cursor_delta.x) * world_per_pixel * self.pan_speed;
    }

    fn offset_direction(&self) -> Vec3 {
        let (sin_phi, cos_phi) = self.phi.sin_cos();
        let (sin_theta, cos_theta) = self.theta.sin_cos();
        Vec3::new(sin_phi * sin_theta, cos_phi, sin_phi * cos_theta)
    }
}
