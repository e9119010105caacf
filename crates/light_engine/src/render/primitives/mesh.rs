//! Mesh data and the named mesh library
//!
//! Meshes are uploaded once and referred to by [`GeometryHandle`]. The
//! editor registers `"None"` (empty) and `"Cube"` at start-up.

use std::collections::BTreeMap;

use bytemuck::{Pod, Zeroable};

use crate::foundation::collections::GeometryHandle;
use crate::foundation::math::{Vec3, Vec4};
use crate::render::{RenderCommand, RenderError, RenderResult};

/// Interleaved vertex as laid out in the vertex buffer
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    /// Object-space position
    pub position: [f32; 3],
    /// Linear RGBA color
    pub color: [f32; 4],
    /// Object-space normal
    pub normal: [f32; 3],
}

impl Vertex {
    /// Position as a vector
    pub fn position(&self) -> Vec3 {
        Vec3::from(self.position)
    }

    /// Normal as a vector
    pub fn normal(&self) -> Vec3 {
        Vec3::from(self.normal)
    }

    /// Color as a vector
    pub fn color(&self) -> Vec4 {
        Vec4::from(self.color)
    }
}

/// CPU-side mesh: separate attribute streams plus triangle indices
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    /// Vertex positions
    pub positions: Vec<Vec3>,
    /// Vertex colors
    pub colors: Vec<Vec4>,
    /// Vertex normals
    pub normals: Vec<Vec3>,
    /// Triangle list indices
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Check attribute lengths and index ranges
    pub fn validate(&self) -> RenderResult<()> {
        let count = self.positions.len();
        if self.colors.len() != count || self.normals.len() != count {
            return Err(RenderError::ResourceCreationFailed(format!(
                "attribute length mismatch: {} positions, {} colors, {} normals",
                count,
                self.colors.len(),
                self.normals.len()
            )));
        }
        if self.indices.len() % 3 != 0 {
            return Err(RenderError::ResourceCreationFailed(format!(
                "index count {} is not a multiple of 3",
                self.indices.len()
            )));
        }
        if let Some(bad) = self.indices.iter().find(|i| **i as usize >= count) {
            return Err(RenderError::ResourceCreationFailed(format!(
                "index {bad} out of range for {count} vertices"
            )));
        }
        Ok(())
    }

    /// Interleave the attribute streams
    pub fn vertices(&self) -> Vec<Vertex> {
        self.positions
            .iter()
            .zip(&self.colors)
            .zip(&self.normals)
            .map(|((p, c), n)| Vertex {
                position: [p.x, p.y, p.z],
                color: [c.x, c.y, c.z, c.w],
                normal: [n.x, n.y, n.z],
            })
            .collect()
    }
}

/// Unit cube centered at the origin: 24 vertices (4 per face), 36 indices
pub fn cube_mesh(color: Vec4) -> MeshData {
    // Face normal, then the four corners counter-clockwise seen from outside
    let faces: [(Vec3, [[f32; 3]; 4]); 6] = [
        (Vec3::new(0.0, 0.0, 1.0), [[-0.5, -0.5, 0.5], [0.5, -0.5, 0.5], [0.5, 0.5, 0.5], [-0.5, 0.5, 0.5]]),
        (Vec3::new(-1.0, 0.0, 0.0), [[-0.5, -0.5, 0.5], [-0.5, 0.5, 0.5], [-0.5, 0.5, -0.5], [-0.5, -0.5, -0.5]]),
        (Vec3::new(1.0, 0.0, 0.0), [[0.5, -0.5, 0.5], [0.5, -0.5, -0.5], [0.5, 0.5, -0.5], [0.5, 0.5, 0.5]]),
        (Vec3::new(0.0, 1.0, 0.0), [[-0.5, 0.5, 0.5], [0.5, 0.5, 0.5], [0.5, 0.5, -0.5], [-0.5, 0.5, -0.5]]),
        (Vec3::new(0.0, -1.0, 0.0), [[-0.5, -0.5, 0.5], [-0.5, -0.5, -0.5], [0.5, -0.5, -0.5], [0.5, -0.5, 0.5]]),
        (Vec3::new(0.0, 0.0, -1.0), [[-0.5, -0.5, -0.5], [-0.5, 0.5, -0.5], [0.5, 0.5, -0.5], [0.5, -0.5, -0.5]]),
    ];

    let mut mesh = MeshData::default();
    for (face, (normal, corners)) in (0u32..).zip(faces) {
        for corner in corners {
            mesh.positions.push(Vec3::from(corner));
            mesh.colors.push(color);
            mesh.normals.push(normal);
        }
        let base = face * 4;
        mesh.indices.extend([base, base + 1, base + 2, base + 2, base + 3, base]);
    }
    mesh
}

/// Meshes by name
#[derive(Debug, Default)]
pub struct MeshLibrary {
    meshes: BTreeMap<String, GeometryHandle>,
}

impl MeshLibrary {
    /// Create an empty library
    pub fn new() -> Self {
        Self::default()
    }

    /// Upload a mesh and register it under `name`
    ///
    /// An existing mesh with the same name is destroyed and replaced.
    pub fn add(
        &mut self,
        command: &mut RenderCommand,
        name: &str,
        positions: &[Vec3],
        colors: &[Vec4],
        normals: &[Vec3],
        indices: &[u32],
    ) -> RenderResult<GeometryHandle> {
        let data = MeshData {
            positions: positions.to_vec(),
            colors: colors.to_vec(),
            normals: normals.to_vec(),
            indices: indices.to_vec(),
        };
        self.add_data(command, name, &data)
    }

    /// Upload prepared mesh data and register it under `name`
    pub fn add_data(&mut self, command: &mut RenderCommand, name: &str, data: &MeshData) -> RenderResult<GeometryHandle> {
        data.validate()
            .map_err(|e| RenderError::ResourceCreationFailed(format!("mesh '{name}': {e}")))?;

        let handle = command.create_geometry(&data.vertices(), &data.indices)?;
        if let Some(previous) = self.meshes.insert(name.to_string(), handle) {
            command.destroy_geometry(previous)?;
        }
        log::debug!(
            "Added mesh '{}' ({} vertices, {} indices)",
            name,
            data.positions.len(),
            data.indices.len()
        );
        Ok(handle)
    }

    /// Register the built-in `"None"` and `"Cube"` meshes
    pub fn add_default_meshes(&mut self, command: &mut RenderCommand) -> RenderResult<()> {
        self.add_data(command, "None", &MeshData::default())?;
        self.add_data(command, "Cube", &cube_mesh(Vec4::new(0.8, 0.8, 0.8, 1.0)))?;
        Ok(())
    }

    /// Look up a mesh
    pub fn get(&self, name: &str) -> Option<GeometryHandle> {
        self.meshes.get(name).copied()
    }

    /// Registered names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.meshes.keys().map(String::as_str)
    }

    /// Reverse lookup for the inspector
    pub fn name_of(&self, geometry: GeometryHandle) -> Option<&str> {
        self.meshes.iter().find(|(_, h)| **h == geometry).map(|(n, _)| n.as_str())
    }
}
