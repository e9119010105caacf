//! ECS World implementation

use std::any::TypeId;
use std::collections::HashMap;

use super::storage::{ComponentStorage, ErasedStorage};
use super::{Component, Entity};

#[derive(Debug, Clone, Copy)]
struct EntitySlot {
    generation: u32,
    alive: bool,
}

/// ECS World containing all entities and components
#[derive(Default)]
pub struct World {
    slots: Vec<EntitySlot>,
    free_slots: Vec<u32>,
    storages: HashMap<TypeId, Box<dyn ErasedStorage>>,
}

impl World {
    /// Create a new world
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new entity, reusing a free slot when one exists
    pub fn spawn(&mut self) -> Entity {
        if let Some(index) = self.free_slots.pop() {
            let slot = &mut self.slots[index as usize];
            slot.alive = true;
            return Entity::new(index, slot.generation);
        }

        let index = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
        self.slots.push(EntitySlot { generation: 0, alive: true });
        Entity::new(index, 0)
    }

    /// Destroy an entity and all of its components
    ///
    /// Returns false when the entity was already dead.
    pub fn despawn(&mut self, entity: Entity) -> bool {
        if !self.is_alive(entity) {
            return false;
        }

        let slot = &mut self.slots[entity.index() as usize];
        slot.alive = false;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_slots.push(entity.index());

        for storage in self.storages.values_mut() {
            storage.remove_index(entity.index());
        }
        true
    }

    /// Whether the handle still refers to a live entity
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.slots
            .get(entity.index() as usize)
            .is_some_and(|slot| slot.alive && slot.generation == entity.generation())
    }

    /// Live entity currently occupying a slot index
    pub fn entity_at(&self, index: u32) -> Option<Entity> {
        self.slots
            .get(index as usize)
            .filter(|slot| slot.alive)
            .map(|slot| Entity::new(index, slot.generation))
    }

    /// Number of live entities
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.alive).count()
    }

    /// Whether the world has no live entities
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate all live entities in slot order
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.slots.iter().enumerate().filter(|(_, slot)| slot.alive).map(|(index, slot)| {
            // Slot count is bounded by u32 in spawn
            Entity::new(index as u32, slot.generation)
        })
    }

    /// Add or replace a component; returns the previous value
    ///
    /// Inserting on a dead entity is ignored and returns `None`.
    pub fn insert<T: Component>(&mut self, entity: Entity, component: T) -> Option<T> {
        if !self.is_alive(entity) {
            log::debug!("Ignoring component insert on dead entity {:?}", entity);
            return None;
        }
        self.storage_mut::<T>().items.insert(entity.index(), component)
    }

    /// Remove a component and return it
    pub fn remove<T: Component>(&mut self, entity: Entity) -> Option<T> {
        if !self.is_alive(entity) {
            return None;
        }
        self.storages
            .get_mut(&TypeId::of::<T>())
            .and_then(|s| s.as_any_mut().downcast_mut::<ComponentStorage<T>>())
            .and_then(|s| s.items.remove(&entity.index()))
    }

    /// Get a component from an entity
    pub fn get<T: Component>(&self, entity: Entity) -> Option<&T> {
        if !self.is_alive(entity) {
            return None;
        }
        self.storage::<T>().and_then(|s| s.items.get(&entity.index()))
    }

    /// Get a mutable component from an entity
    pub fn get_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        if !self.is_alive(entity) {
            return None;
        }
        self.storages
            .get_mut(&TypeId::of::<T>())
            .and_then(|s| s.as_any_mut().downcast_mut::<ComponentStorage<T>>())
            .and_then(|s| s.items.get_mut(&entity.index()))
    }

    /// Whether an entity has a component
    pub fn has<T: Component>(&self, entity: Entity) -> bool {
        self.get::<T>(entity).is_some()
    }

    /// Iterate every entity that has a `T`
    pub fn query<T: Component>(&self) -> impl Iterator<Item = (Entity, &T)> + '_ {
        self.storage::<T>()
            .into_iter()
            .flat_map(|s| s.items.iter())
            .filter_map(|(index, component)| self.entity_at(*index).map(|e| (e, component)))
    }

    /// Iterate every entity that has both an `A` and a `B`
    pub fn query2<A: Component, B: Component>(&self) -> impl Iterator<Item = (Entity, &A, &B)> + '_ {
        self.query::<A>()
            .filter_map(|(entity, a)| self.get::<B>(entity).map(|b| (entity, a, b)))
    }

    fn storage<T: Component>(&self) -> Option<&ComponentStorage<T>> {
        self.storages
            .get(&TypeId::of::<T>())
            .and_then(|s| s.as_any().downcast_ref::<ComponentStorage<T>>())
    }

    fn storage_mut<T: Component>(&mut self) -> &mut ComponentStorage<T> {
        let storage = self
            .storages
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(ComponentStorage::<T>::default()));

        // The map is keyed by TypeId, so the downcast cannot fail
        match storage.as_any_mut().downcast_mut::<ComponentStorage<T>>() {
            Some(typed) => typed,
            None => unreachable!("component storage registered under the wrong TypeId"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Health(i32);
    impl Component for Health {}

    #[derive(Debug, PartialEq)]
    struct Name(&'static str);
    impl Component for Name {}

    #[test]
    fn test_insert_get_remove() {
        let mut world = World::new();
        let e = world.spawn();

        assert!(world.insert(e, Health(10)).is_none());
        assert_eq!(world.insert(e, Health(5)), Some(Health(10)));
        assert_eq!(world.get::<Health>(e), Some(&Health(5)));

        world.get_mut::<Health>(e).unwrap().0 = 7;
        assert_eq!(world.remove::<Health>(e), Some(Health(7)));
        assert!(!world.has::<Health>(e));
    }

    #[test]
    fn test_despawn_invalidates_handle_and_components() {
        let mut world = World::new();
        let old = world.spawn();
        world.insert(old, Health(1));

        assert!(world.despawn(old));
        assert!(!world.despawn(old));

        let reused = world.spawn();
        assert_eq!(reused.index(), old.index());
        assert_ne!(reused, old);
        assert!(!world.is_alive(old));
        assert!(world.get::<Health>(reused).is_none());
        assert!(world.get::<Health>(old).is_none());
    }

    #[test]
    fn test_query2_requires_both_components() {
        let mut world = World::new();
        let a = world.spawn();
        let b = world.spawn();
        world.insert(a, Health(1));
        world.insert(a, Name("a"));
        world.insert(b, Health(2));

        let matched: Vec<_> = world.query2::<Health, Name>().map(|(e, _, _)| e).collect();
        assert_eq!(matched, vec![a]);
        assert_eq!(world.query::<Health>().count(), 2);
    }
}
