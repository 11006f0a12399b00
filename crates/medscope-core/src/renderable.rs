//! Contracts toward the drawing side.
//!
//! The core never issues draw calls. It hands each visible entity's final
//! transform to a [`Renderable`] twice per frame: once with the identity
//! value for the pick pass, once with material uniforms for the regular pass.

use std::collections::HashMap;

use glam::{Mat4, Vec3};

use crate::entity::{Entity, EntityId};
use crate::pick;
use crate::registry::Registry;

/// Something that can draw one entity's geometry.
pub trait Renderable {
    /// Draws with a flat identity value instead of the material.
    fn submit_for_identity_pass(&mut self, transform: Mat4, encoded: f32);

    /// Draws with the regular material.
    fn submit_for_regular_pass(&mut self, transform: Mat4, material: &MaterialUniforms);
}

/// GPU-compatible per-entity material uniforms.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
#[allow(clippy::pub_underscore_fields)]
pub struct MaterialUniforms {
    /// Display tint.
    pub color: [f32; 3],
    /// 1.0 while hovered.
    pub hovering: f32,
    /// 1.0 while selected.
    pub selected: f32,
    /// Padding for alignment.
    pub _padding: [f32; 3],
}

impl Default for MaterialUniforms {
    fn default() -> Self {
        Self {
            color: [1.0, 1.0, 1.0],
            hovering: 0.0,
            selected: 0.0,
            _padding: [0.0; 3],
        }
    }
}

impl From<&Entity> for MaterialUniforms {
    fn from(entity: &Entity) -> Self {
        Self {
            color: entity.color().to_array(),
            hovering: if entity.hovering { 1.0 } else { 0.0 },
            selected: if entity.selected { 1.0 } else { 0.0 },
            _padding: [0.0; 3],
        }
    }
}

impl MaterialUniforms {
    /// Returns the tint brightened for hover/selection feedback.
    #[must_use]
    pub fn display_color(&self) -> Vec3 {
        let base = Vec3::from_array(self.color);
        let boost = 0.25 * self.hovering + 0.35 * self.selected;
        base.lerp(Vec3::ONE, boost.min(1.0))
    }
}

/// Submits every visible entity that has geometry to the identity pass.
pub fn submit_identity_pass<R: Renderable>(
    registry: &Registry,
    renderables: &mut HashMap<EntityId, R>,
) {
    for entity in registry.iter().filter(|e| e.visible) {
        if let Some(renderable) = renderables.get_mut(&entity.id()) {
            renderable.submit_for_identity_pass(entity.final_transform(), pick::encode(entity.id()));
        }
    }
}

/// Submits every visible entity that has geometry to the regular pass.
pub fn submit_regular_pass<R: Renderable>(
    registry: &Registry,
    renderables: &mut HashMap<EntityId, R>,
) {
    for entity in registry.iter().filter(|e| e.visible) {
        if let Some(renderable) = renderables.get_mut(&entity.id()) {
            renderable.submit_for_regular_pass(
                entity.final_transform(),
                &MaterialUniforms::from(entity),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::entity::{Axis, Category, EntityDesc};

    #[derive(Default)]
    struct Recorder {
        identity: Vec<(Mat4, f32)>,
        regular: Vec<MaterialUniforms>,
    }

    impl Renderable for Recorder {
        fn submit_for_identity_pass(&mut self, transform: Mat4, encoded: f32) {
            self.identity.push((transform, encoded));
        }

        fn submit_for_regular_pass(&mut self, _transform: Mat4, material: &MaterialUniforms) {
            self.regular.push(*material);
        }
    }

    #[test]
    fn test_hidden_entities_are_not_submitted() {
        let mut registry = Registry::new();
        let liver = registry
            .register(EntityDesc::new("liver", Category::Surface).with_color(Vec3::X))
            .unwrap();
        let yaw = registry
            .register(EntityDesc::new("yaw", Category::RotationWidget { axis: Axis::Y }))
            .unwrap();
        registry.get_mut(yaw).unwrap().visible = false;

        let mut renderables = HashMap::from([(liver, Recorder::default()), (yaw, Recorder::default())]);
        submit_identity_pass(&registry, &mut renderables);
        submit_regular_pass(&registry, &mut renderables);

        let liver_rec = &renderables[&liver];
        assert_eq!(liver_rec.identity.len(), 1);
        assert!((liver_rec.identity[0].1 - 10.0 / 255.0).abs() < 1e-6);
        assert_eq!(liver_rec.regular[0].color, [1.0, 0.0, 0.0]);
        assert!(renderables[&yaw].identity.is_empty());
        assert!(renderables[&yaw].regular.is_empty());
    }

    #[test]
    fn test_material_uniform_layout() {
        assert_eq!(std::mem::size_of::<MaterialUniforms>(), 32);
    }

    #[test]
    fn test_display_color_brightens() {
        let mut m = MaterialUniforms {
            color: [0.0, 0.0, 0.0],
            ..MaterialUniforms::default()
        };
        assert_eq!(m.display_color(), Vec3::ZERO);
        m.selected = 1.0;
        assert!(m.display_color().x > 0.3);
    }
}
