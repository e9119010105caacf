//! Scene management
//!
//! A [`Scene`] wraps the ECS [`World`] with the editor's conventions: every
//! entity carries a [`TagComponent`] and a [`TransformComponent`], drawables
//! are entities with a mesh, a mesh renderer and a transform, and lights are
//! entities with a [`LightComponent`] positioned by their transform.
//!
//! [`SceneRenderer`] walks a scene and drives the shadow, main and outline
//! passes through the [`Renderer`](crate::render::Renderer).

mod scene_renderer;

pub use scene_renderer::{SceneRenderer, SceneRendererConfig};

use crate::ecs::{
    Entity, LightComponent, LightKind, MeshComponent, MeshRendererComponent, TagComponent, TransformComponent,
    World,
};
use crate::foundation::collections::{GeometryHandle, ShaderHandle};
use crate::foundation::math::Mat4;
use crate::render::{DirectionalLight, PickId, PointLight, SpotLight};

/// Bits of a pick id holding the entity slot index
const PICK_INDEX_BITS: u32 = 20;
const PICK_INDEX_MASK: u32 = (1 << PICK_INDEX_BITS) - 1;
/// Bits of a pick id holding the low generation bits (the sign bit stays clear)
const PICK_GENERATION_MASK: u32 = 0x7FF;

/// One entity ready to be drawn
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Drawable {
    /// Source entity
    pub entity: Entity,
    /// Program to draw with
    pub shader: ShaderHandle,
    /// Geometry to draw
    pub geometry: GeometryHandle,
    /// World transform
    pub transform: Mat4,
}

/// Light records gathered from a scene for one frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneLights {
    /// Point lights in entity order
    pub points: Vec<PointLight>,
    /// Spot lights in entity order
    pub spots: Vec<SpotLight>,
    /// Directional lights in entity order
    pub directionals: Vec<DirectionalLight>,
    /// First directional light, when it casts shadows
    pub shadow_directional: Option<DirectionalLight>,
    /// First shadow-casting point light
    pub shadow_point: Option<PointLight>,
}

/// Editor scene
#[derive(Default)]
pub struct Scene {
    world: World,
}

impl Scene {
    /// Create an empty scene
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn an entity with a name tag and an identity transform
    pub fn add_entity(&mut self, name: &str) -> Entity {
        let entity = self.world.spawn();
        self.world.insert(entity, TagComponent::new(name));
        self.world.insert(entity, TransformComponent::default());
        log::debug!("Added entity '{}' ({:?})", name, entity);
        entity
    }

    /// Despawn an entity; returns false if it was already gone
    pub fn destroy_entity(&mut self, entity: Entity) -> bool {
        self.world.despawn(entity)
    }

    /// Underlying world
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Underlying world, mutably
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// First entity whose tag matches `name`
    pub fn find_by_name(&self, name: &str) -> Option<Entity> {
        self.world
            .query::<TagComponent>()
            .find(|(_, tag)| tag.name == name)
            .map(|(entity, _)| entity)
    }

    /// Tag name of an entity
    pub fn name(&self, entity: Entity) -> Option<&str> {
        self.world.get::<TagComponent>(entity).map(|tag| tag.name.as_str())
    }

    /// Id written to the pick attachment for `entity`
    ///
    /// The slot index fills the low 20 bits and the low 11 generation bits
    /// sit above it, so a stale id does not resolve to the slot's new
    /// occupant. Entities past the index range get [`PickId::NONE`].
    pub fn pick_id(&self, entity: Entity) -> PickId {
        if entity.index() > PICK_INDEX_MASK || !self.world.is_alive(entity) {
            return PickId::NONE;
        }
        let generation = entity.generation() & PICK_GENERATION_MASK;
        i32::try_from((generation << PICK_INDEX_BITS) | entity.index()).map_or(PickId::NONE, PickId)
    }

    /// Resolve a value read from the pick attachment
    ///
    /// [`PickId::NONE`], malformed ids and ids of despawned entities give `None`.
    pub fn entity_from_pick_id(&self, id: PickId) -> Option<Entity> {
        let raw = u32::try_from(id.raw()).ok()?;
        let entity = self.world.entity_at(raw & PICK_INDEX_MASK)?;
        let generation = raw >> PICK_INDEX_BITS;
        (entity.generation() & PICK_GENERATION_MASK == generation).then_some(entity)
    }

    /// Drawable view of one entity
    pub fn drawable(&self, entity: Entity) -> Option<Drawable> {
        let mesh = self.world.get::<MeshComponent>(entity)?;
        let renderer = self.world.get::<MeshRendererComponent>(entity)?;
        let transform = self.world.get::<TransformComponent>(entity)?;
        Some(Drawable {
            entity,
            shader: renderer.shader,
            geometry: mesh.geometry,
            transform: transform.to_matrix(),
        })
    }

    /// Every entity with a mesh, a mesh renderer and a transform
    pub fn drawables(&self) -> impl Iterator<Item = Drawable> + '_ {
        self.world
            .query2::<MeshComponent, MeshRendererComponent>()
            .filter_map(|(entity, _, _)| self.drawable(entity))
    }

    /// Convert every light component into a light record
    ///
    /// Lights without a transform sit at the origin.
    pub fn collect_lights(&self) -> SceneLights {
        let mut lights = SceneLights::default();

        for (entity, light) in self.world.query::<LightComponent>() {
            let position = self
                .world
                .get::<TransformComponent>(entity)
                .map(|t| t.position)
                .unwrap_or_default();

            match light.kind {
                LightKind::Point => {
                    let record = PointLight {
                        position,
                        color: light.color,
                        intensity: light.intensity,
                        range: light.range,
                    };
                    if light.cast_shadows && lights.shadow_point.is_none() {
                        lights.shadow_point = Some(record);
                    }
                    lights.points.push(record);
                }
                LightKind::Spot => lights.spots.push(SpotLight {
                    position,
                    direction: light.direction,
                    color: light.color,
                    intensity: light.intensity,
                    range: light.range,
                    inner_cutoff: light.inner_cutoff_deg,
                    outer_cutoff: light.outer_cutoff_deg,
                }),
                LightKind::Directional => {
                    let record = DirectionalLight {
                        position,
                        direction: light.direction,
                        color: light.color,
                        intensity: light.intensity,
                    };
                    if lights.directionals.is_empty() && light.cast_shadows {
                        lights.shadow_directional = Some(record);
                    }
                    lights.directionals.push(record);
                }
            }
        }

        log::trace!(
            "Collected {} point, {} spot, {} directional lights",
            lights.points.len(),
            lights.spots.len(),
            lights.directionals.len()
        );
        lights
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;

    #[test]
    fn test_add_entity_has_tag_and_transform() {
        let mut scene = Scene::new();
        let cube = scene.add_entity("Cube");

        assert_eq!(scene.name(cube), Some("Cube"));
        assert!(scene.world().has::<TransformComponent>(cube));
        assert_eq!(scene.find_by_name("Cube"), Some(cube));
        assert_eq!(scene.find_by_name("Floor"), None);
    }

    #[test]
    fn test_pick_id_roundtrip() {
        let mut scene = Scene::new();
        let first = scene.add_entity("A");
        let second = scene.add_entity("B");

        assert_eq!(scene.entity_from_pick_id(scene.pick_id(first)), Some(first));
        assert_eq!(scene.entity_from_pick_id(scene.pick_id(second)), Some(second));
        assert_eq!(scene.entity_from_pick_id(PickId::NONE), None);
        assert!(!scene.pick_id(first).is_none());
    }

    #[test]
    fn test_stale_pick_id_is_rejected() {
        let mut scene = Scene::new();
        let old = scene.add_entity("Old");
        let old_id = scene.pick_id(old);
        scene.destroy_entity(old);
        let reused = scene.add_entity("New");

        assert_eq!(reused.index(), old.index());
        assert_eq!(scene.entity_from_pick_id(old_id), None);
        assert_eq!(scene.entity_from_pick_id(scene.pick_id(reused)), Some(reused));
        assert_eq!(scene.pick_id(old), PickId::NONE);
    }

    #[test]
    fn test_collect_lights_uses_transform_position() {
        let mut scene = Scene::new();
        let lamp = scene.add_entity("Light");
        scene.world_mut().insert(lamp, TransformComponent::from_position(Vec3::new(-1.0, 2.0, 1.5)));
        scene.world_mut().insert(lamp, LightComponent::default());
        let sun = scene.add_entity("Sun");
        scene
            .world_mut()
            .insert(sun, LightComponent::directional(Vec3::new(0.0, -1.0, 0.0), Vec3::new(1.0, 1.0, 1.0), 0.8));

        let lights = scene.collect_lights();
        assert_eq!(lights.points.len(), 1);
        assert_eq!(lights.points[0].position, Vec3::new(-1.0, 2.0, 1.5));
        assert_eq!(lights.shadow_point, Some(lights.points[0]));
        assert_eq!(lights.directionals.len(), 1);
        assert_eq!(lights.shadow_directional, Some(lights.directionals[0]));
        assert!(lights.spots.is_empty());
    }

    #[test]
    fn test_only_complete_entities_are_drawable() {
        let mut scene = Scene::new();
        let bare = scene.add_entity("Empty");
        assert_eq!(scene.drawables().count(), 0);
        assert!(scene.drawable(bare).is_none());
    }
}
