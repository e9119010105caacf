//! Device-side storage of the software backend

use std::collections::{BTreeSet, HashMap};

use super::programs::ProgramKind;
use crate::foundation::math::Vec4;
use crate::render::framebuffer::{FramebufferSpec, FramebufferTextureFormat};
use crate::render::primitives::Vertex;
use crate::render::shader::{UniformSlot, UniformValue};

/// Cleared depth value (far plane)
pub(crate) const CLEAR_DEPTH: f32 = 1.0;

/// Depth comparison used by a program
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DepthFunc {
    Less,
    LessEqual,
}

impl DepthFunc {
    fn passes(self, incoming: f32, stored: f32) -> bool {
        match self {
            Self::Less => incoming < stored,
            Self::LessEqual => incoming <= stored,
        }
    }
}

/// Storage of one attachment; row 0 is the bottom row
#[derive(Debug, Clone)]
pub(crate) enum AttachmentStorage {
    Color(Vec<[u8; 4]>),
    Integer(Vec<i32>),
    DepthStencil { depth: Vec<f32>, stencil: Vec<u8> },
    DepthCube(Vec<Vec<f32>>),
}

impl AttachmentStorage {
    fn allocate(format: FramebufferTextureFormat, texels: usize) -> Self {
        match format {
            FramebufferTextureFormat::Rgba8 => Self::Color(vec![[0, 0, 0, 0]; texels]),
            FramebufferTextureFormat::RedInteger => Self::Integer(vec![0; texels]),
            FramebufferTextureFormat::Depth24Stencil8 => Self::DepthStencil {
                depth: vec![CLEAR_DEPTH; texels],
                stencil: vec![0; texels],
            },
            FramebufferTextureFormat::DepthCubemap => Self::DepthCube(vec![vec![CLEAR_DEPTH; texels]; 6]),
        }
    }
}

/// A framebuffer's spec plus attachment storage
#[derive(Debug, Clone)]
pub(crate) struct FramebufferStorage {
    pub spec: FramebufferSpec,
    pub attachments: Vec<AttachmentStorage>,
}

impl FramebufferStorage {
    pub fn new(spec: FramebufferSpec) -> Self {
        let texels = spec.width as usize * spec.height as usize;
        let attachments = spec
            .attachments
            .iter()
            .map(|a| AttachmentStorage::allocate(a.format, texels))
            .collect();
        Self { spec, attachments }
    }

    /// Reallocate at a new size; formats and order are unchanged
    pub fn resize(&mut self, width: u32, height: u32) {
        self.spec.width = width;
        self.spec.height = height;
        *self = Self::new(self.spec.clone());
    }

    pub fn width(&self) -> u32 {
        self.spec.width
    }

    pub fn height(&self) -> u32 {
        self.spec.height
    }

    pub fn texel_index(&self, x: u32, y: u32) -> usize {
        y as usize * self.spec.width as usize + x as usize
    }

    pub fn first_color(&self) -> Option<usize> {
        self.attachments.iter().position(|a| matches!(a, AttachmentStorage::Color(_)))
    }

    pub fn first_integer(&self) -> Option<usize> {
        self.attachments.iter().position(|a| matches!(a, AttachmentStorage::Integer(_)))
    }

    pub fn depth_stencil(&self) -> Option<usize> {
        self.attachments
            .iter()
            .position(|a| matches!(a, AttachmentStorage::DepthStencil { .. }))
    }

    pub fn depth_cube(&self) -> Option<usize> {
        self.attachments.iter().position(|a| matches!(a, AttachmentStorage::DepthCube(_)))
    }

    /// Depth test against a 2D depth attachment, writing on pass when `write`
    ///
    /// With no depth attachment every fragment passes.
    pub fn depth_test(&mut self, attachment: Option<usize>, texel: usize, depth: f32, func: DepthFunc, write: bool) -> bool {
        let Some(AttachmentStorage::DepthStencil { depth: buffer, .. }) = attachment.and_then(|i| self.attachments.get_mut(i)) else {
            return true;
        };
        if !func.passes(depth, buffer[texel]) {
            return false;
        }
        if write {
            buffer[texel] = depth;
        }
        true
    }

    /// Depth test against one layer of a cube attachment
    pub fn depth_test_layer(&mut self, attachment: usize, layer: usize, texel: usize, depth: f32, write: bool) -> bool {
        let Some(AttachmentStorage::DepthCube(layers)) = self.attachments.get_mut(attachment) else {
            return false;
        };
        let stored = &mut layers[layer][texel];
        if depth >= *stored {
            return false;
        }
        if write {
            *stored = depth;
        }
        true
    }

    /// Write (optionally alpha-blend) a color texel
    pub fn write_color(&mut self, attachment: usize, texel: usize, color: Vec4, blend: bool) {
        if let Some(AttachmentStorage::Color(buffer)) = self.attachments.get_mut(attachment) {
            let out = if blend {
                let dst = unpack_color(buffer[texel]);
                let a = color.w.clamp(0.0, 1.0);
                Vec4::new(
                    color.x * a + dst.x * (1.0 - a),
                    color.y * a + dst.y * (1.0 - a),
                    color.z * a + dst.z * (1.0 - a),
                    a + dst.w * (1.0 - a),
                )
            } else {
                color
            };
            buffer[texel] = pack_color(out);
        }
    }

    pub fn write_int(&mut self, attachment: usize, texel: usize, value: i32) {
        if let Some(AttachmentStorage::Integer(buffer)) = self.attachments.get_mut(attachment) {
            buffer[texel] = value;
        }
    }
}

pub(crate) fn pack_color(color: Vec4) -> [u8; 4] {
    let channel = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
    [channel(color.x), channel(color.y), channel(color.z), channel(color.w)]
}

pub(crate) fn unpack_color(texel: [u8; 4]) -> Vec4 {
    Vec4::new(
        f32::from(texel[0]) / 255.0,
        f32::from(texel[1]) / 255.0,
        f32::from(texel[2]) / 255.0,
        f32::from(texel[3]) / 255.0,
    )
}

/// Uploaded geometry
#[derive(Debug, Clone)]
pub(crate) struct GeometryBuffers {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

/// Compiled program: its kind, declared interface and current uniform values
///
/// Uniform values persist across binds, as GL program state does.
#[derive(Debug, Clone)]
pub(crate) struct ShaderProgram {
    pub name: String,
    pub kind: ProgramKind,
    pub declared: BTreeSet<UniformSlot>,
    pub values: HashMap<UniformSlot, UniformValue>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::framebuffer::FramebufferSpec;

    #[test]
    fn test_resize_keeps_attachment_roles() {
        let mut fb = FramebufferStorage::new(FramebufferSpec::editor_viewport(4, 4));
        fb.resize(8, 2);

        assert_eq!(fb.first_color(), Some(0));
        assert_eq!(fb.first_integer(), Some(1));
        assert_eq!(fb.depth_stencil(), Some(2));
        match &fb.attachments[1] {
            AttachmentStorage::Integer(ids) => assert_eq!(ids.len(), 16),
            other => panic!("unexpected attachment {other:?}"),
        }
    }

    #[test]
    fn test_depth_funcs() {
        let mut fb = FramebufferStorage::new(FramebufferSpec::editor_viewport(1, 1));
        let depth = fb.depth_stencil();

        assert!(fb.depth_test(depth, 0, 0.5, DepthFunc::Less, true));
        assert!(!fb.depth_test(depth, 0, 0.5, DepthFunc::Less, false));
        assert!(fb.depth_test(depth, 0, 0.5, DepthFunc::LessEqual, false));
    }

    #[test]
    fn test_blend() {
        let mut fb = FramebufferStorage::new(FramebufferSpec::editor_viewport(1, 1));
        fb.write_color(0, 0, Vec4::new(0.0, 0.0, 1.0, 1.0), false);
        fb.write_color(0, 0, Vec4::new(1.0, 0.0, 0.0, 0.5), true);

        match &fb.attachments[0] {
            AttachmentStorage::Color(c) => assert_eq!(c[0], [128, 0, 128, 255]),
            other => panic!("unexpected attachment {other:?}"),
        }
    }
}
