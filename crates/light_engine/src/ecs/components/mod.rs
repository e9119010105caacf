//! Scene components
//!
//! Pure data components attached to scene entities. Logic that turns them
//! into draw calls lives in the scene renderer.

pub mod tag;
pub mod transform;
pub mod mesh;
pub mod light;

pub use tag::TagComponent;
pub use transform::TransformComponent;
pub use mesh::{MeshComponent, MeshRendererComponent};
pub use light::{LightComponent, LightKind};
