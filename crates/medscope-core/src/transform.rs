//! Per-frame transform composition.
//!
//! Every entity's final matrix is rebuilt from scratch each frame out of its
//! immutable base placement, its pivot, the animation clock and the
//! user-driven offsets. The same matrices feed both the identity pass and the
//! regular pass of a frame.

use glam::{Mat4, Vec3};

use crate::entity::{Axis, Category, Entity};
use crate::registry::Registry;

/// Shared rotation frame driven by widgets and the spin animation.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RotationFrame {
    /// Accumulated rotation about X (radians).
    pub x: f32,
    /// Accumulated rotation about Y (radians).
    pub y: f32,
    /// Accumulated rotation about Z (radians).
    pub z: f32,
}

impl RotationFrame {
    /// Returns the accumulator for `axis`.
    #[must_use]
    pub fn angle(&self, axis: Axis) -> f32 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    /// Returns the accumulator for `axis`, mutably.
    pub fn angle_mut(&mut self, axis: Axis) -> &mut f32 {
        match axis {
            Axis::X => &mut self.x,
            Axis::Y => &mut self.y,
            Axis::Z => &mut self.z,
        }
    }

    /// Returns the combined rotation `Rx · Ry · Rz`.
    #[must_use]
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_rotation_x(self.x) * Mat4::from_rotation_y(self.y) * Mat4::from_rotation_z(self.z)
    }
}

/// Breathing pulse parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Breathing {
    /// Whether the pulse is applied.
    pub enabled: bool,
    /// Amplitude `k`.
    pub amplitude: f32,
    /// Angular frequency `ω` in radians per second.
    pub frequency: f32,
}

impl Breathing {
    /// Returns the uniform scale factor at `time_s` seconds.
    ///
    /// `1 - k·(0.5 + 0.5·sin(t·ω))`, or `1` while disabled.
    #[must_use]
    pub fn scale(&self, time_s: f32) -> f32 {
        if !self.enabled {
            return 1.0;
        }
        1.0 - self.amplitude * (0.5 + 0.5 * (time_s * self.frequency).sin())
    }
}

/// Inputs shared by every entity's composition in one frame.
#[derive(Debug, Clone, Copy)]
pub struct ComposeParams {
    /// Animation time in seconds.
    pub time_s: f32,
    /// Breathing pulse.
    pub breathing: Breathing,
    /// Shared rotation frame.
    pub rotation: RotationFrame,
}

/// Returns `T(pivot) · m · T(-pivot)`.
fn about_pivot(pivot: Vec3, m: Mat4) -> Mat4 {
    Mat4::from_translation(pivot) * m * Mat4::from_translation(-pivot)
}

/// Composes one entity's final transform.
#[must_use]
pub fn compose(entity: &Entity, params: &ComposeParams) -> Mat4 {
    let base = entity.base_transform();
    let pivot = entity.pivot();

    match entity.category() {
        Category::Surface => {
            let scale = Mat4::from_scale(Vec3::splat(params.breathing.scale(params.time_s)));
            about_pivot(pivot, params.rotation.matrix() * scale) * base
        }
        Category::ClipPlane { axis } => {
            base * Mat4::from_translation(axis.direction() * entity.user_offset())
        }
        Category::RotationWidget { axis } => {
            about_pivot(pivot, axis.rotation(params.rotation.angle(axis))) * base
        }
    }
}

/// Recomputes `final_transform` for every entity.
pub fn compose_all(registry: &mut Registry, params: &ComposeParams) {
    for entity in registry.iter_mut() {
        let transform = compose(entity, params);
        entity.set_final_transform(transform);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityDesc;
    use std::f32::consts::FRAC_PI_2;

    fn params() -> ComposeParams {
        ComposeParams {
            time_s: 0.0,
            breathing: Breathing {
                enabled: false,
                amplitude: 0.1,
                frequency: 1.0,
            },
            rotation: RotationFrame::default(),
        }
    }

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-5
    }

    #[test]
    fn test_breathing_scale_range() {
        let b = Breathing {
            enabled: true,
            amplitude: 0.1,
            frequency: 2.0,
        };
        for i in 0..100 {
            let s = b.scale(i as f32 * 0.1);
            assert!((0.9 - 1e-6..=1.0 + 1e-6).contains(&s));
        }
        let off = Breathing { enabled: false, ..b };
        assert_eq!(off.scale(1.234), 1.0);
    }

    #[test]
    fn test_surface_pivot_is_fixed_point() {
        let mut registry = Registry::new();
        let pivot = Vec3::new(1.0, 2.0, 3.0);
        let id = registry
            .register(EntityDesc::new("liver", Category::Surface).with_pivot(pivot))
            .unwrap();

        let mut p = params();
        p.breathing.enabled = true;
        p.time_s = 0.7;
        p.rotation = RotationFrame { x: 0.3, y: 1.1, z: -0.4 };
        compose_all(&mut registry, &p);

        let m = registry.get(id).unwrap().final_transform();
        assert!(close(m.transform_point3(pivot), pivot));
    }

    #[test]
    fn test_clip_plane_slides_along_axis() {
        let mut registry = Registry::new();
        let base = Mat4::from_scale(Vec3::new(2.0, 4.0, 8.0));
        let id = registry
            .register(
                EntityDesc::new("axial", Category::ClipPlane { axis: Axis::Z })
                    .with_base_transform(base),
            )
            .unwrap();
        registry.get_mut(id).unwrap().set_user_offset(0.5);
        compose_all(&mut registry, &params());

        let m = registry.get(id).unwrap().final_transform();
        // Half of the 8-unit extent along Z.
        assert!(close(m.transform_point3(Vec3::ZERO), Vec3::new(0.0, 0.0, 4.0)));
    }

    #[test]
    fn test_widget_uses_only_its_axis() {
        let mut registry = Registry::new();
        let id = registry
            .register(EntityDesc::new(
                "pitch",
                Category::RotationWidget { axis: Axis::X },
            ))
            .unwrap();

        let mut p = params();
        p.rotation = RotationFrame { x: FRAC_PI_2, y: 1.0, z: 1.0 };
        compose_all(&mut registry, &p);

        let m = registry.get(id).unwrap().final_transform();
        assert!(close(m.transform_point3(Vec3::Y), Vec3::Z));
        assert!(close(m.transform_point3(Vec3::X), Vec3::X));
    }

    #[test]
    fn test_composition_is_deterministic() {
        let mut registry = Registry::new();
        let id = registry
            .register(EntityDesc::new("heart", Category::Surface))
            .unwrap();
        let mut p = params();
        p.breathing.enabled = true;
        p.time_s = 3.0;
        compose_all(&mut registry, &p);
        let first = registry.get(id).unwrap().final_transform();
        compose_all(&mut registry, &p);
        assert_eq!(first, registry.get(id).unwrap().final_transform());
    }
}
