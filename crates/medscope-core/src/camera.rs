//! Camera contract consumed by the drawing side.

use glam::{Mat4, Vec3, Vec4};

/// Source of view and projection matrices.
pub trait CameraMatrices {
    /// World to view transform.
    fn view_matrix(&self) -> Mat4;

    /// View to clip transform.
    fn projection_matrix(&self) -> Mat4;

    /// Combined world to clip transform.
    fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Projects a world point into normalized device coordinates.
    ///
    /// Returns `None` for points behind the eye.
    fn project(&self, point: Vec3) -> Option<Vec3> {
        let clip = self.view_projection_matrix() * Vec4::from((point, 1.0));
        if clip.w <= 0.0 {
            return None;
        }
        Some(clip.truncate() / clip.w)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed;

    impl CameraMatrices for Fixed {
        fn view_matrix(&self) -> Mat4 {
            Mat4::look_at_rh(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y)
        }

        fn projection_matrix(&self) -> Mat4 {
            Mat4::perspective_rh(1.0, 1.0, 0.1, 100.0)
        }
    }

    #[test]
    fn test_target_projects_to_center() {
        let ndc = Fixed.project(Vec3::ZERO).unwrap();
        assert!(ndc.x.abs() < 1e-6 && ndc.y.abs() < 1e-6);
        assert!((0.0..=1.0).contains(&ndc.z));
    }

    #[test]
    fn test_point_behind_eye_is_rejected() {
        assert!(Fixed.project(Vec3::new(0.0, 0.0, 10.0)).is_none());
    }
}
