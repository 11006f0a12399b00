//! Builds a small anatomical scene with meshes for every entity.
//!
//! Organs are ellipsoids placed inside a normalized volume box, with one
//! clip plane per axis slicing that box and one rotation ring per axis
//! around the volume center.

use glam::{Mat4, Vec3};
use medscope_core::{Axis, Category, EntityDesc, EntityId, Options, Result, Scene};
use medscope_render::MeshData;

/// Geometry to upload for one registered entity.
#[derive(Debug, Clone)]
pub struct EntityMesh {
    /// Entity the mesh belongs to.
    pub id: EntityId,
    /// Object-space geometry.
    pub mesh: MeshData,
    /// Regular-pass opacity.
    pub opacity: f32,
}

/// An organ to place in the volume.
#[derive(Debug, Clone)]
pub struct Organ {
    /// Display name.
    pub name: String,
    /// Ellipsoid center in volume space.
    pub center: Vec3,
    /// Ellipsoid radii.
    pub radii: Vec3,
    /// Tint.
    pub color: Vec3,
}

impl Organ {
    /// Creates an organ description.
    pub fn new(name: impl Into<String>, center: Vec3, radii: Vec3, color: Vec3) -> Self {
        Self {
            name: name.into(),
            center,
            radii,
            color,
        }
    }
}

/// Opacity of clip planes in the regular pass.
const PLANE_OPACITY: f32 = 0.35;

/// Assembles a [`Scene`] and its meshes.
#[derive(Debug)]
pub struct AnatomyBuilder {
    scene: Scene,
    meshes: Vec<EntityMesh>,
    volume_min: Vec3,
    volume_max: Vec3,
}

impl AnatomyBuilder {
    /// Starts an empty scene whose volume spans `[min, max]`.
    pub fn new(options: Options, volume_min: Vec3, volume_max: Vec3) -> Self {
        Self {
            scene: Scene::new(options),
            meshes: Vec::new(),
            volume_min,
            volume_max,
        }
    }

    /// Returns the volume center.
    pub fn center(&self) -> Vec3 {
        (self.volume_min + self.volume_max) * 0.5
    }

    /// Adds an ellipsoidal organ surface pivoting about its center of mass.
    pub fn organ(&mut self, organ: &Organ) -> Result<EntityId> {
        let mesh = MeshData::uv_sphere(1.0, 16, 24);
        let base = Mat4::from_translation(organ.center) * Mat4::from_scale(organ.radii);
        let id = self.scene.register(
            EntityDesc::new(organ.name.clone(), Category::Surface)
                .with_base_transform(base)
                .with_local_center_of_mass(mesh.center_of_mass())
                .with_color(organ.color),
        )?;
        self.meshes.push(EntityMesh {
            id,
            mesh,
            opacity: 1.0,
        });
        Ok(id)
    }

    /// Adds a clip plane normal to `axis`, starting halfway through the volume.
    pub fn clip_plane(&mut self, name: &str, axis: Axis) -> Result<EntityId> {
        let size = self.volume_max - self.volume_min;
        let base = Mat4::from_translation(self.volume_min) * Mat4::from_scale(size);
        let id = self.scene.register(
            EntityDesc::new(name, Category::ClipPlane { axis })
                .with_base_transform(base)
                .with_initial_offset(0.5)
                .with_color(axis.color()),
        )?;
        self.meshes.push(EntityMesh {
            id,
            mesh: MeshData::unit_quad(axis),
            opacity: PLANE_OPACITY,
        });
        Ok(id)
    }

    /// Adds a rotation ring around `axis` through the volume center.
    pub fn rotation_widget(&mut self, name: &str, axis: Axis) -> Result<EntityId> {
        let size = self.volume_max - self.volume_min;
        let radius = 0.5 * size.max_element() * 1.2;
        let center = self.center();
        let id = self.scene.register(
            EntityDesc::new(name, Category::RotationWidget { axis })
                .with_base_transform(Mat4::from_translation(center))
                .with_pivot(center)
                .with_color(axis.color()),
        )?;
        self.meshes.push(EntityMesh {
            id,
            mesh: MeshData::ring(axis, radius, radius * 0.03, 64),
            opacity: 1.0,
        });
        Ok(id)
    }

    /// Returns the volume bounds.
    pub fn bounds(&self) -> (Vec3, Vec3) {
        (self.volume_min, self.volume_max)
    }

    /// Finishes the scene.
    pub fn build(self) -> (Scene, Vec<EntityMesh>) {
        (self.scene, self.meshes)
    }
}

/// A torso with a few organs, three clip planes and three rotation rings.
pub fn standard_scene(options: Options) -> Result<(Scene, Vec<EntityMesh>)> {
    let mut builder = AnatomyBuilder::new(options, Vec3::splat(-1.0), Vec3::splat(1.0));

    for organ in [
        Organ::new(
            "liver",
            Vec3::new(-0.3, 0.1, 0.0),
            Vec3::new(0.5, 0.25, 0.35),
            Vec3::new(0.55, 0.2, 0.15),
        ),
        Organ::new(
            "stomach",
            Vec3::new(0.35, 0.15, 0.05),
            Vec3::new(0.25, 0.2, 0.2),
            Vec3::new(0.85, 0.6, 0.55),
        ),
        Organ::new(
            "kidney_left",
            Vec3::new(0.35, -0.35, -0.25),
            Vec3::new(0.12, 0.22, 0.1),
            Vec3::new(0.6, 0.25, 0.25),
        ),
        Organ::new(
            "kidney_right",
            Vec3::new(-0.35, -0.4, -0.25),
            Vec3::new(0.12, 0.22, 0.1),
            Vec3::new(0.6, 0.25, 0.25),
        ),
        Organ::new(
            "heart",
            Vec3::new(0.05, 0.65, 0.1),
            Vec3::new(0.22, 0.25, 0.2),
            Vec3::new(0.75, 0.1, 0.12),
        ),
    ] {
        builder.organ(&organ)?;
    }

    builder.clip_plane("sagittal", Axis::X)?;
    builder.clip_plane("coronal", Axis::Y)?;
    builder.clip_plane("axial", Axis::Z)?;

    builder.rotation_widget("pitch", Axis::X)?;
    builder.rotation_widget("yaw", Axis::Y)?;
    builder.rotation_widget("roll", Axis::Z)?;

    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use medscope_core::Group;

    #[test]
    fn test_standard_scene_layout() {
        let (scene, meshes) = standard_scene(Options::default()).unwrap();
        let registry = scene.registry();
        assert_eq!(registry.group(Group::Surfaces).count(), 5);
        assert_eq!(registry.group(Group::Planes).count(), 3);
        assert_eq!(registry.group(Group::Widgets).count(), 3);
        assert_eq!(meshes.len(), registry.len());
        assert!(meshes.iter().all(|m| registry.contains(m.id)));
    }

    #[test]
    fn test_organ_pivot_is_its_center() {
        let mut builder = AnatomyBuilder::new(Options::default(), Vec3::splat(-1.0), Vec3::ONE);
        let organ = Organ::new("spleen", Vec3::new(0.4, 0.2, -0.1), Vec3::splat(0.2), Vec3::ONE);
        let id = builder.organ(&organ).unwrap();
        let (scene, _) = builder.build();
        let pivot = scene.registry().get(id).unwrap().pivot();
        assert!((pivot - organ.center).length() < 1e-4);
    }

    #[test]
    fn test_clip_plane_starts_mid_volume() {
        let mut builder = AnatomyBuilder::new(Options::default(), Vec3::splat(-1.0), Vec3::ONE);
        let id = builder.clip_plane("axial", Axis::Z).unwrap();
        let (mut scene, _) = builder.build();
        scene.compose(0);
        let m = scene.registry().get(id).unwrap().final_transform();
        assert!(m.transform_point3(Vec3::ZERO).z.abs() < 1e-5);
    }

    #[test]
    fn test_duplicate_names_are_rejected() {
        let mut builder = AnatomyBuilder::new(Options::default(), Vec3::splat(-1.0), Vec3::ONE);
        builder.clip_plane("axial", Axis::Z).unwrap();
        assert!(builder.clip_plane("axial", Axis::Y).is_err());
    }
}
