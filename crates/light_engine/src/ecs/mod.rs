//! Entity-Component System
//!
//! A minimal ECS that the scene is built on. Entities are generational
//! handles; components are plain data stored per type.

pub mod entity;
pub mod component;
pub mod world;
pub mod components;
mod storage;

pub use entity::Entity;
pub use component::Component;
pub use world::World;
pub use components::{
    LightComponent, LightKind, MeshComponent, MeshRendererComponent, TagComponent, TransformComponent,
};
