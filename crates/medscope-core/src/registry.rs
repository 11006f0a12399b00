//! Entity registry.

use crate::entity::{Entity, EntityDesc, EntityId, Group};
use crate::error::{MedscopeError, Result};
use crate::pick::IdAllocator;

/// Owns every pickable entity of a scene.
///
/// Entities are kept in registration order so iteration is deterministic.
/// The registry is logically partitioned into [`Group`]s for the
/// one-selection-per-group rule.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    entities: Vec<Entity>,
    ids: IdAllocator,
}

impl Registry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an entity and returns its freshly assigned id.
    ///
    /// Returns an error if the name is taken or the identity space is exhausted.
    pub fn register(&mut self, desc: EntityDesc) -> Result<EntityId> {
        if self.entities.iter().any(|e| e.name() == desc.name) {
            return Err(MedscopeError::DuplicateName(desc.name));
        }

        let id = self.ids.allocate()?;
        log::debug!(
            "registered {} '{}' as {id}",
            desc.category.type_name(),
            desc.name
        );
        self.entities.push(Entity::new(id, desc));
        Ok(id)
    }

    /// Gets an entity by id.
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id() == id)
    }

    /// Gets a mutable entity by id.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.id() == id)
    }

    /// Gets an entity by name.
    pub fn get_by_name(&self, name: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.name() == name)
    }

    /// Looks up the id registered under `name`.
    pub fn id_of(&self, name: &str) -> Result<EntityId> {
        self.get_by_name(name)
            .map(Entity::id)
            .ok_or_else(|| MedscopeError::EntityNotFound(name.to_string()))
    }

    /// Checks whether `id` belongs to a live entity.
    pub fn contains(&self, id: EntityId) -> bool {
        self.get(id).is_some()
    }

    /// Returns an iterator over all entities in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    /// Returns a mutable iterator over all entities in registration order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.entities.iter_mut()
    }

    /// Returns the entities of one group.
    pub fn group(&self, group: Group) -> impl Iterator<Item = &Entity> {
        self.entities
            .iter()
            .filter(move |e| e.category().group() == group)
    }

    /// Returns the entities of one group, mutably.
    pub fn group_mut(&mut self, group: Group) -> impl Iterator<Item = &mut Entity> {
        self.entities
            .iter_mut()
            .filter(move |e| e.category().group() == group)
    }

    /// Returns the selected entity of a group, if any.
    pub fn selected_in(&self, group: Group) -> Option<&Entity> {
        self.group(group).find(|e| e.selected)
    }

    /// Returns the entity currently under the cursor, if any.
    pub fn hovered(&self) -> Option<&Entity> {
        self.entities.iter().find(|e| e.hovering)
    }

    /// Returns the name of the most specific current selection.
    ///
    /// Widgets win over planes, planes over surfaces, matching what a drag
    /// would act on.
    pub fn selected_name(&self) -> Option<&str> {
        [Group::Widgets, Group::Planes, Group::Surfaces]
            .into_iter()
            .find_map(|g| self.selected_in(g))
            .map(Entity::name)
    }

    /// Returns the total number of registered entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns true if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Axis, Category};

    fn scene() -> Registry {
        let mut r = Registry::new();
        r.register(EntityDesc::new("liver", Category::Surface)).unwrap();
        r.register(EntityDesc::new("axial", Category::ClipPlane { axis: Axis::Z }))
            .unwrap();
        r.register(EntityDesc::new(
            "yaw",
            Category::RotationWidget { axis: Axis::Y },
        ))
        .unwrap();
        r
    }

    #[test]
    fn test_ids_follow_registration_order() {
        let r = scene();
        let ids: Vec<u8> = r.iter().map(|e| e.id().get()).collect();
        assert_eq!(ids, vec![10, 20, 30]);
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut r = scene();
        let err = r.register(EntityDesc::new("liver", Category::Surface));
        assert!(matches!(err, Err(MedscopeError::DuplicateName(n)) if n == "liver"));
        assert_eq!(r.len(), 3);
    }

    #[test]
    fn test_lookup_by_name() {
        let r = scene();
        assert_eq!(r.id_of("axial").unwrap().get(), 20);
        assert!(matches!(
            r.id_of("spleen"),
            Err(MedscopeError::EntityNotFound(_))
        ));
    }

    #[test]
    fn test_groups_partition_registry() {
        let r = scene();
        assert_eq!(r.group(Group::Surfaces).count(), 1);
        assert_eq!(r.group(Group::Planes).count(), 1);
        assert_eq!(r.group(Group::Widgets).count(), 1);
    }

    #[test]
    fn test_selected_name_prefers_widgets() {
        let mut r = scene();
        assert_eq!(r.selected_name(), None);
        for e in r.iter_mut() {
            e.selected = true;
        }
        assert_eq!(r.selected_name(), Some("yaw"));
    }
}
