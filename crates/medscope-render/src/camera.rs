//! Orbit camera.

use glam::{Mat4, Vec3};
use medscope_core::CameraMatrices;

/// Perspective camera orbiting a target point.
///
/// The eye sits on a sphere of radius `distance` around `target`, placed by
/// `yaw` (about +Y) and `pitch` (elevation) in radians.
#[derive(Debug, Clone)]
pub struct Camera {
    /// Point the camera is looking at.
    pub target: Vec3,
    /// Eye distance from the target.
    pub distance: f32,
    /// Azimuth around +Y.
    pub yaw: f32,
    /// Elevation above the XZ plane.
    pub pitch: f32,
    /// Vertical field of view in radians.
    pub fov: f32,
    /// Aspect ratio (width / height).
    pub aspect_ratio: f32,
    /// Near clipping plane.
    pub near: f32,
    /// Far clipping plane.
    pub far: f32,
}

const PITCH_LIMIT: f32 = std::f32::consts::FRAC_PI_2 - 0.01;

impl Camera {
    /// Creates a camera three units in front of the origin.
    #[must_use]
    pub fn new(aspect_ratio: f32) -> Self {
        Self {
            target: Vec3::ZERO,
            distance: 3.0,
            yaw: 0.0,
            pitch: 0.0,
            fov: std::f32::consts::FRAC_PI_4, // 45 degrees
            aspect_ratio,
            near: 0.01,
            far: 1000.0,
        }
    }

    /// Sets the aspect ratio.
    pub fn set_aspect_ratio(&mut self, aspect_ratio: f32) {
        self.aspect_ratio = aspect_ratio;
    }

    /// Returns the eye position in world space.
    #[must_use]
    pub fn position(&self) -> Vec3 {
        let (sy, cy) = self.yaw.sin_cos();
        let (sp, cp) = self.pitch.sin_cos();
        self.target + self.distance * Vec3::new(cp * sy, sp, cp * cy)
    }

    /// Orbits around the target.
    pub fn orbit(&mut self, delta_yaw: f32, delta_pitch: f32) {
        self.yaw -= delta_yaw;
        self.pitch = (self.pitch + delta_pitch).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Moves the eye toward (positive) or away from the target.
    pub fn zoom(&mut self, delta: f32) {
        self.distance = (self.distance - delta).max(0.1);
    }

    /// Frames the given bounding box.
    pub fn look_at_box(&mut self, min: Vec3, max: Vec3) {
        let size = (max - min).length().max(1e-3);
        self.target = (min + max) * 0.5;
        self.distance = size * 1.5;
        self.near = size * 0.001;
        self.far = size * 100.0;
    }
}

impl CameraMatrices for Camera {
    fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect_ratio, self.near, self.far)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(16.0 / 9.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_default_eye_on_positive_z() {
        let camera = Camera::new(1.0);
        assert!((camera.position() - Vec3::new(0.0, 0.0, 3.0)).length() < 1e-6);
    }

    #[test]
    fn test_target_projects_to_center() {
        let mut camera = Camera::new(1.5);
        camera.target = Vec3::new(1.0, -2.0, 0.5);
        camera.orbit(0.7, 0.3);
        let ndc = camera.project(camera.target).unwrap();
        assert!(ndc.x.abs() < 1e-4 && ndc.y.abs() < 1e-4);
    }

    #[test]
    fn test_pitch_is_clamped() {
        let mut camera = Camera::new(1.0);
        camera.orbit(0.0, 10.0);
        assert!(camera.pitch < std::f32::consts::FRAC_PI_2);
        camera.orbit(0.0, -20.0);
        assert!(camera.pitch > -std::f32::consts::FRAC_PI_2);
    }

    #[test]
    fn test_zoom_keeps_minimum_distance() {
        let mut camera = Camera::new(1.0);
        camera.zoom(100.0);
        assert!((camera.distance - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_look_at_box_centers_target() {
        let mut camera = Camera::new(1.0);
        camera.look_at_box(Vec3::splat(-1.0), Vec3::new(3.0, 1.0, 1.0));
        assert_eq!(camera.target, Vec3::new(1.0, 0.0, 0.0));
        assert!(camera.distance > 0.0);
    }

    proptest! {
        #[test]
        fn prop_orbit_keeps_eye_at_distance(
            yaw in -10.0f32..10.0,
            pitch in -10.0f32..10.0,
        ) {
            let mut camera = Camera::new(1.0);
            camera.orbit(yaw, pitch);
            prop_assert!(camera.pitch.abs() <= PITCH_LIMIT);
            let d = (camera.position() - camera.target).length();
            prop_assert!((d - camera.distance).abs() < 1e-4);
        }
    }
}
