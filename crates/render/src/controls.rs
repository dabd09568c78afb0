//! Orbit camera controls.
//!
//! Input handlers only accumulate deltas; [`OrbitControls::update`] applies
//! them to the camera once per frame. With damping enabled each update
//! applies `damping_factor` of the pending delta and keeps the rest, so the
//! camera eases to a stop after the pointer is released.

use glam::{Vec2, Vec3};
use std::f32::consts::{PI, TAU};

use crate::camera::PerspectiveCamera;

const EPS: f32 = 1e-6;

/// Spherical coordinates around the Y axis: `theta` is the azimuth from +Z,
/// `phi` the polar angle from +Y.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Spherical {
    radius: f32,
    theta: f32,
    phi: f32,
}

impl Spherical {
    fn from_offset(v: Vec3) -> Self {
        let radius = v.length();
        if radius == 0.0 {
            return Self::default();
        }
        Self {
            radius,
            theta: v.x.atan2(v.z),
            phi: (v.y / radius).clamp(-1.0, 1.0).acos(),
        }
    }

    fn to_offset(self) -> Vec3 {
        let sin_phi = self.phi.sin();
        Vec3::new(
            self.radius * sin_phi * self.theta.sin(),
            self.radius * self.phi.cos(),
            self.radius * sin_phi * self.theta.cos(),
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrbitControls {
    pub target: Vec3,
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,
    pending: Spherical,
    scale: f32,
    pan_offset: Vec3,
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            enable_damping: false,
            damping_factor: 0.05,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            min_polar_angle: 0.0,
            max_polar_angle: PI,
            pending: Spherical::default(),
            scale: 1.0,
            pan_offset: Vec3::ZERO,
        }
    }
}

impl OrbitControls {
    pub fn new(enable_damping: bool) -> Self {
        Self {
            enable_damping,
            ..Self::default()
        }
    }

    /// Drag to rotate. A drag across the full viewport height is one turn.
    pub fn rotate(&mut self, delta: Vec2, viewport_height: f32) {
        let h = viewport_height.max(1.0);
        self.pending.theta -= TAU * delta.x / h * self.rotate_speed;
        self.pending.phi -= TAU * delta.y / h * self.rotate_speed;
    }

    /// Scroll to dolly; positive steps move towards the target.
    pub fn dolly(&mut self, steps: f32) {
        let zoom_scale = 0.95f32.powf(self.zoom_speed);
        self.scale *= zoom_scale.powf(steps);
    }

    /// Drag to pan in the camera's screen plane, scaled so the target point
    /// tracks the pointer.
    pub fn pan(&mut self, delta: Vec2, camera: &PerspectiveCamera, viewport_height: f32) {
        let h = viewport_height.max(1.0);
        let distance = (camera.position - self.target).length() * (camera.fov.to_radians() / 2.0).tan();
        let m = camera.world_matrix();
        let right = m.x_axis.truncate();
        let up = m.y_axis.truncate();
        let dx = 2.0 * delta.x * distance / h * self.pan_speed;
        let dy = 2.0 * delta.y * distance / h * self.pan_speed;
        self.pan_offset += -right * dx + up * dy;
    }

    /// Apply pending input to the camera. Returns true if the camera moved.
    pub fn update(&mut self, camera: &mut PerspectiveCamera) -> bool {
        let before = camera.position;
        let mut s = Spherical::from_offset(camera.position - self.target);

        let f = if self.enable_damping {
            self.damping_factor
        } else {
            1.0
        };
        s.theta += self.pending.theta * f;
        s.phi += self.pending.phi * f;
        s.phi = s
            .phi
            .clamp(self.min_polar_angle, self.max_polar_angle)
            .clamp(EPS, PI - EPS);
        s.radius = (s.radius * self.scale).clamp(self.min_distance, self.max_distance);
        self.target += self.pan_offset * f;

        camera.position = self.target + s.to_offset();
        camera.look_at(self.target);

        if self.enable_damping {
            let keep = 1.0 - self.damping_factor;
            self.pending.theta *= keep;
            self.pending.phi *= keep;
            self.pan_offset *= keep;
        } else {
            self.pending = Spherical::default();
            self.pan_offset = Vec3::ZERO;
        }
        self.scale = 1.0;

        camera.position.distance_squared(before) > EPS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> PerspectiveCamera {
        PerspectiveCamera::default().with_position(Vec3::new(0.0, 0.0, 4.0))
    }

    #[test]
    fn idle_update_keeps_camera() {
        let mut cam = camera();
        let mut controls = OrbitControls::new(true);
        assert!(!controls.update(&mut cam));
        assert!(cam.position.abs_diff_eq(Vec3::new(0.0, 0.0, 4.0), 1e-5));
        assert_eq!(cam.target, Vec3::ZERO);
    }

    #[test]
    fn undamped_rotation_applies_at_once() {
        let mut cam = camera();
        let mut controls = OrbitControls::new(false);
        // Quarter of the viewport height is a quarter turn.
        controls.rotate(Vec2::new(-100.0, 0.0), 400.0);
        assert!(controls.update(&mut cam));
        assert!(cam.position.abs_diff_eq(Vec3::new(4.0, 0.0, 0.0), 1e-4));
        assert!(!controls.update(&mut cam));
    }

    #[test]
    fn damped_rotation_eases_in() {
        let mut cam = camera();
        let mut controls = OrbitControls::new(true);
        controls.rotate(Vec2::new(-100.0, 0.0), 400.0);
        controls.update(&mut cam);
        let first = cam.position.x.atan2(cam.position.z);
        assert!((first - PI / 2.0 * 0.05).abs() < 1e-4);

        for _ in 0..400 {
            controls.update(&mut cam);
        }
        let settled = cam.position.x.atan2(cam.position.z);
        assert!((settled - PI / 2.0).abs() < 1e-3);
        assert!((cam.position.length() - 4.0).abs() < 1e-4);
    }

    #[test]
    fn polar_angle_is_clamped() {
        let mut cam = camera();
        let mut controls = OrbitControls::new(false);
        controls.rotate(Vec2::new(0.0, 10_000.0), 100.0);
        controls.update(&mut cam);
        assert!(cam.position.y > 3.99);
        assert!(cam.position.y.is_finite());
    }

    #[test]
    fn dolly_in_and_out() {
        let mut cam = camera();
        let mut controls = OrbitControls::new(false);
        controls.dolly(1.0);
        controls.update(&mut cam);
        assert!((cam.position.length() - 3.8).abs() < 1e-4);
        controls.dolly(-1.0);
        controls.update(&mut cam);
        assert!((cam.position.length() - 4.0).abs() < 1e-4);
    }

    #[test]
    fn pan_moves_target_and_camera_together() {
        let mut cam = camera();
        let mut controls = OrbitControls::new(false);
        controls.update(&mut cam);
        controls.pan(Vec2::new(-50.0, 0.0), &cam, 500.0);
        controls.update(&mut cam);
        assert!(controls.target.x > 0.0);
        assert!((cam.position.x - controls.target.x).abs() < 1e-5);
        assert!((cam.position.z - 4.0).abs() < 1e-4);
    }
}
