//! Rendering primitives: cameras and meshes

pub mod camera;
pub mod editor_camera;
pub mod mesh;

pub use camera::{Camera, Projection, ProjectionKind};
pub use editor_camera::EditorCamera;
pub use mesh::{cube_mesh, MeshData, MeshLibrary, Vertex};
