//! Pickable scene entities.
//!
//! An [`Entity`] is anything the user can hover, select or drag: an
//! anatomical surface, an orthogonal clip plane, or one of the rotation
//! widgets. Identity, category, base placement and tint are fixed at
//! registration; the interaction flags and the drag offset change every frame.

use std::fmt;

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// Identity code of a pickable entity, as written into the identity buffer.
///
/// Valid codes live in `[1, 254]`; see [`crate::pick`] for the encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(u8);

impl EntityId {
    /// Wraps a raw code. Returns `None` for `0` and for the background sentinel.
    #[must_use]
    pub fn new(raw: u8) -> Option<Self> {
        (raw != 0 && raw != crate::pick::BACKGROUND_CODE).then_some(Self(raw))
    }

    /// Returns the raw code.
    #[must_use]
    pub fn get(self) -> u8 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A principal axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    /// X axis (red).
    X,
    /// Y axis (green).
    Y,
    /// Z axis (blue).
    Z,
}

impl Axis {
    /// Returns the unit vector for this axis.
    #[must_use]
    pub fn direction(self) -> Vec3 {
        match self {
            Axis::X => Vec3::X,
            Axis::Y => Vec3::Y,
            Axis::Z => Vec3::Z,
        }
    }

    /// Returns the conventional display color for this axis.
    #[must_use]
    pub fn color(self) -> Vec3 {
        match self {
            Axis::X => Vec3::new(1.0, 0.2, 0.2),
            Axis::Y => Vec3::new(0.2, 1.0, 0.2),
            Axis::Z => Vec3::new(0.2, 0.2, 1.0),
        }
    }

    /// Returns the rotation of `angle` radians about this axis.
    #[must_use]
    pub fn rotation(self, angle: f32) -> Mat4 {
        match self {
            Axis::X => Mat4::from_rotation_x(angle),
            Axis::Y => Mat4::from_rotation_y(angle),
            Axis::Z => Mat4::from_rotation_z(angle),
        }
    }
}

/// What kind of object an entity is, with the data only that kind needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    /// An anatomical surface extracted from the scan.
    Surface,
    /// An orthogonal clipping plane that slides along `axis`.
    ClipPlane { axis: Axis },
    /// A rotation handle that spins the scene about `axis`.
    RotationWidget { axis: Axis },
}

impl Category {
    /// Returns the mutual-exclusion group this category belongs to.
    #[must_use]
    pub fn group(self) -> Group {
        match self {
            Category::Surface => Group::Surfaces,
            Category::ClipPlane { .. } => Group::Planes,
            Category::RotationWidget { .. } => Group::Widgets,
        }
    }

    /// Returns the type name used in logs and status text.
    #[must_use]
    pub fn type_name(self) -> &'static str {
        match self {
            Category::Surface => "Surface",
            Category::ClipPlane { .. } => "ClipPlane",
            Category::RotationWidget { .. } => "RotationWidget",
        }
    }
}

/// Registry partition used for the one-selection-per-group rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Group {
    /// Anatomical surfaces.
    Surfaces,
    /// Clip planes.
    Planes,
    /// Rotation widgets.
    Widgets,
}

/// A pickable scene object.
#[derive(Debug, Clone)]
pub struct Entity {
    id: EntityId,
    name: String,
    category: Category,
    base_transform: Mat4,
    pivot: Vec3,
    color: Vec3,
    /// Drag offset; only clip planes use it (normalized, `[0, 1]`).
    user_offset: f32,
    initial_offset: f32,
    /// Whether the entity is drawn and pickable.
    pub visible: bool,
    /// Whether the cursor currently resolves to this entity.
    pub hovering: bool,
    /// Whether this entity is the active target of drags in its group.
    pub selected: bool,
    final_transform: Mat4,
}

impl Entity {
    pub(crate) fn new(id: EntityId, desc: EntityDesc) -> Self {
        let initial_offset = match desc.category {
            Category::ClipPlane { .. } => desc.initial_offset.clamp(0.0, 1.0),
            _ => 0.0,
        };
        Self {
            id,
            name: desc.name,
            category: desc.category,
            base_transform: desc.base_transform,
            pivot: desc.pivot,
            color: desc.color,
            user_offset: initial_offset,
            initial_offset,
            visible: true,
            hovering: false,
            selected: false,
            final_transform: desc.base_transform,
        }
    }

    /// Returns the identity code.
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Returns the display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the category.
    pub fn category(&self) -> Category {
        self.category
    }

    /// Returns the placement matrix set at load time.
    pub fn base_transform(&self) -> Mat4 {
        self.base_transform
    }

    /// Returns the scale/rotation anchor in world space.
    pub fn pivot(&self) -> Vec3 {
        self.pivot
    }

    /// Returns the display tint.
    pub fn color(&self) -> Vec3 {
        self.color
    }

    /// Returns the drag offset (clip planes only, in `[0, 1]`).
    pub fn user_offset(&self) -> f32 {
        self.user_offset
    }

    /// Adds `delta` to the drag offset, clamping planes to `[0, 1]`.
    ///
    /// Non-plane entities ignore the call; their rotation lives in the
    /// shared rotation frame.
    pub fn apply_offset_delta(&mut self, delta: f32) {
        if let Category::ClipPlane { .. } = self.category {
            self.user_offset = (self.user_offset + delta).clamp(0.0, 1.0);
        }
    }

    /// Sets the drag offset directly, with the same clamping rules.
    pub fn set_user_offset(&mut self, offset: f32) {
        if let Category::ClipPlane { .. } = self.category {
            self.user_offset = offset.clamp(0.0, 1.0);
        }
    }

    /// Puts a plane back where it was registered.
    pub fn reset_offset(&mut self) {
        self.user_offset = self.initial_offset;
    }

    /// Returns the transform composed for the current frame.
    pub fn final_transform(&self) -> Mat4 {
        self.final_transform
    }

    pub(crate) fn set_final_transform(&mut self, transform: Mat4) {
        self.final_transform = transform;
    }
}

/// Everything needed to register an entity; the id is assigned by the registry.
#[derive(Debug, Clone)]
pub struct EntityDesc {
    /// Display name, unique within the registry.
    pub name: String,
    /// Category and category-specific data.
    pub category: Category,
    /// Placement matrix.
    pub base_transform: Mat4,
    /// Scale/rotation anchor (center of mass) in world space.
    pub pivot: Vec3,
    /// Display tint.
    pub color: Vec3,
    /// Starting drag offset for clip planes.
    pub initial_offset: f32,
}

impl EntityDesc {
    /// Creates a description with identity placement, pivot at the origin and a white tint.
    pub fn new(name: impl Into<String>, category: Category) -> Self {
        Self {
            name: name.into(),
            category,
            base_transform: Mat4::IDENTITY,
            pivot: Vec3::ZERO,
            color: Vec3::ONE,
            initial_offset: 0.0,
        }
    }

    /// Sets the placement matrix.
    #[must_use]
    pub fn with_base_transform(mut self, transform: Mat4) -> Self {
        self.base_transform = transform;
        self
    }

    /// Sets the pivot.
    #[must_use]
    pub fn with_pivot(mut self, pivot: Vec3) -> Self {
        self.pivot = pivot;
        self
    }

    /// Sets the pivot from an object-space center of mass and the base transform.
    #[must_use]
    pub fn with_local_center_of_mass(mut self, center: Vec3) -> Self {
        self.pivot = self.base_transform.transform_point3(center);
        self
    }

    /// Sets the tint.
    #[must_use]
    pub fn with_color(mut self, color: Vec3) -> Self {
        self.color = color;
        self
    }

    /// Sets where a clip plane starts and returns to on reset.
    #[must_use]
    pub fn with_initial_offset(mut self, offset: f32) -> Self {
        self.initial_offset = offset;
        self
    }
}
