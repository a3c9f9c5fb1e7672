//! # Managers
//!
//! Managers are world-scoped observers of entity lifecycle events,
//! used for auxiliary indices that do not belong in the component
//! model - tags, groups, teams, player ownership. On every drained
//! queue entry the world notifies managers *before* systems, in
//! registration order, so side-effecting managers see the entity
//! before any system decides membership.

use std::any::Any;
use std::collections::HashMap;

use super::entity::Entity;
use super::world::WorldState;

/// Observer of entity lifecycle events.
///
/// All hooks default to no-ops; implement the ones the index cares
/// about. `deleted` is where reverse indices must forget the entity -
/// its id is recycled after the tick's cleanup.
pub trait Manager: Any {
    /// One-time setup when the world initializes.
    fn initialize(&mut self, _world: &mut WorldState) {}

    /// An entity was activated this tick.
    fn added(&mut self, _world: &mut WorldState, _entity: Entity) {}

    /// An entity's component set changed this tick.
    fn changed(&mut self, _world: &mut WorldState, _entity: Entity) {}

    /// An entity is being deleted this tick.
    fn deleted(&mut self, _world: &mut WorldState, _entity: Entity) {}

    /// An entity was re-enabled this tick.
    fn enabled(&mut self, _world: &mut WorldState, _entity: Entity) {}

    /// An entity was disabled this tick.
    fn disabled(&mut self, _world: &mut WorldState, _entity: Entity) {}
}

/// Associates at most one entity with each unique string tag.
///
/// Typical use: singling out "player" or "boss" entities without
/// inventing a component kind for each. Deleted entities are
/// unregistered automatically.
#[derive(Debug, Default)]
pub struct TagManager {
    /// tag -> the entity carrying it.
    tags: HashMap<String, Entity>,
}

impl TagManager {
    /// Creates an empty tag index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `entity` under `tag`, replacing any previous holder.
    pub fn register(&mut self, tag: impl Into<String>, entity: Entity) {
        self.tags.insert(tag.into(), entity);
    }

    /// Drops `tag` from the index.
    pub fn unregister(&mut self, tag: &str) {
        self.tags.remove(tag);
    }

    /// Checks whether `tag` currently names an entity.
    #[must_use]
    pub fn is_registered(&self, tag: &str) -> bool {
        self.tags.contains_key(tag)
    }

    /// Returns the entity registered under `tag`.
    #[must_use]
    pub fn entity(&self, tag: &str) -> Option<Entity> {
        self.tags.get(tag).copied()
    }
}

impl Manager for TagManager {
    fn deleted(&mut self, _world: &mut WorldState, entity: Entity) {
        self.tags.retain(|_, tagged| *tagged != entity);
    }
}

/// Associates entities with any number of named groups.
///
/// Typical use: "enemies", "projectiles", broad iteration sets that
/// cut across component combinations. Deleted entities leave all
/// their groups automatically.
#[derive(Debug, Default)]
pub struct GroupManager {
    /// group name -> member entities, in insertion order.
    groups: HashMap<String, Vec<Entity>>,
}

impl GroupManager {
    /// Creates an empty group index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `entity` to `group`. Re-adding a member is a no-op.
    pub fn add(&mut self, group: impl Into<String>, entity: Entity) {
        let members = self.groups.entry(group.into()).or_default();
        if !members.contains(&entity) {
            members.push(entity);
        }
    }

    /// Removes `entity` from `group`.
    pub fn remove(&mut self, group: &str, entity: Entity) {
        if let Some(members) = self.groups.get_mut(group) {
            members.retain(|member| *member != entity);
        }
    }

    /// Returns the members of `group`, in insertion order.
    #[must_use]
    pub fn entities(&self, group: &str) -> &[Entity] {
        self.groups.get(group).map_or(&[], Vec::as_slice)
    }

    /// Checks whether `entity` belongs to `group`.
    #[must_use]
    pub fn is_in_group(&self, group: &str, entity: Entity) -> bool {
        self.entities(group).contains(&entity)
    }

    /// Returns the names of every group `entity` belongs to.
    #[must_use]
    pub fn groups_of(&self, entity: Entity) -> Vec<&str> {
        self.groups
            .iter()
            .filter(|(_, members)| members.contains(&entity))
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

impl Manager for GroupManager {
    fn deleted(&mut self, _world: &mut WorldState, entity: Entity) {
        for members in self.groups.values_mut() {
            members.retain(|member| *member != entity);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(id: u32) -> Entity {
        Entity::new(id)
    }

    #[test]
    fn test_tag_register_and_lookup() {
        let mut tags = TagManager::new();
        tags.register("player", entity(4));

        assert!(tags.is_registered("player"));
        assert_eq!(tags.entity("player"), Some(entity(4)));
        assert_eq!(tags.entity("boss"), None);
    }

    #[test]
    fn test_tag_replacement_and_unregister() {
        let mut tags = TagManager::new();
        tags.register("boss", entity(1));
        tags.register("boss", entity(2));
        assert_eq!(tags.entity("boss"), Some(entity(2)));

        tags.unregister("boss");
        assert!(!tags.is_registered("boss"));
    }

    #[test]
    fn test_group_membership() {
        let mut groups = GroupManager::new();
        groups.add("enemies", entity(1));
        groups.add("enemies", entity(2));
        groups.add("enemies", entity(1));
        groups.add("fliers", entity(1));

        assert_eq!(groups.entities("enemies"), &[entity(1), entity(2)]);
        assert!(groups.is_in_group("fliers", entity(1)));

        let mut memberships = groups.groups_of(entity(1));
        memberships.sort_unstable();
        assert_eq!(memberships, vec!["enemies", "fliers"]);
    }

    #[test]
    fn test_group_remove() {
        let mut groups = GroupManager::new();
        groups.add("enemies", entity(1));
        groups.remove("enemies", entity(1));
        assert!(groups.entities("enemies").is_empty());
    }
}
