//! Mesh and material binding components

use crate::ecs::Component;
use crate::foundation::collections::{GeometryHandle, ShaderHandle};

/// Geometry an entity draws with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshComponent {
    /// Uploaded geometry
    pub geometry: GeometryHandle,
}

impl MeshComponent {
    /// Bind geometry to an entity
    pub fn new(geometry: GeometryHandle) -> Self {
        Self { geometry }
    }
}

impl Component for MeshComponent {}

/// Shader program an entity draws with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshRendererComponent {
    /// Surface shader
    pub shader: ShaderHandle,
}

impl MeshRendererComponent {
    /// Bind a shader to an entity
    pub fn new(shader: ShaderHandle) -> Self {
        Self { shader }
    }
}

impl Component for MeshRendererComponent {}
