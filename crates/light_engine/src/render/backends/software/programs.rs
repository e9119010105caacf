//! Program execution for the software device
//!
//! GLSL is not interpreted. A program's kind is recognized from the uniform
//! interface it declares, and each kind runs a fixed vertex/fragment stage
//! written against the same uniforms the GLSL stage reads. The surface
//! program lights per vertex (diffuse only) and tests the directional
//! shadow map per fragment.

use std::collections::HashMap;

use super::rasterizer::{draw_triangle, ClipVertex, Fragment, Varyings, Viewport};
use super::storage::{AttachmentStorage, DepthFunc, FramebufferStorage, GeometryBuffers};
use crate::foundation::math::{Mat3, Mat4, Vec3, Vec4};
use crate::render::lighting::{MAX_DIRECTIONAL_LIGHTS, MAX_POINT_LIGHTS, MAX_SPOT_LIGHTS};
use crate::render::shader::{
    DirectionalLightField, PointLightField, ShaderSource, SpotLightField, UniformSlot, UniformValue,
};
use crate::render::{RenderError, RenderResult};

const AMBIENT: f32 = 0.15;
const SHADOW_BIAS: f32 = 0.005;
const SKY_HORIZON: [f32; 3] = [0.55, 0.6, 0.7];
const SKY_ZENITH: [f32; 3] = [0.15, 0.3, 0.6];

/// What a compiled program does when drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProgramKind {
    /// Lit surface writing color, pick id and depth
    Surface,
    /// Cube drawn at the far plane behind everything
    Skybox,
    /// Depth-only pass into a 2D shadow map
    DirectionalDepth,
    /// Depth-only pass into the six layers of a shadow cube
    PointDepth,
    /// Screen-space silhouette outline
    Outline,
}

/// Recognize a program from its declared uniforms
pub(crate) fn classify(source: &ShaderSource) -> RenderResult<ProgramKind> {
    let kind = if source.declares(UniformSlot::OutlineColor) {
        ProgramKind::Outline
    } else if source.declares(UniformSlot::ShadowMatrix(0)) {
        ProgramKind::PointDepth
    } else if source.declares(UniformSlot::ShadowLightSpace) {
        ProgramKind::DirectionalDepth
    } else if source.declares(UniformSlot::Cubemap) {
        ProgramKind::Skybox
    } else if source.declares(UniformSlot::ViewProjection) && source.declares(UniformSlot::Transform) {
        ProgramKind::Surface
    } else {
        return Err(RenderError::ResourceCreationFailed(format!(
            "shader '{}' has no interface the software device can run",
            source.name()
        )));
    };
    Ok(kind)
}

/// Typed reads of a program's uniform values, with GL's zero defaults
struct Uniforms<'a>(&'a HashMap<UniformSlot, UniformValue>);

impl Uniforms<'_> {
    fn mat4(&self, slot: UniformSlot) -> Mat4 {
        self.0.get(&slot).and_then(UniformValue::as_mat4).unwrap_or_else(Mat4::identity)
    }

    fn vec3(&self, slot: UniformSlot) -> Vec3 {
        self.0.get(&slot).and_then(UniformValue::as_vec3).unwrap_or_else(Vec3::zeros)
    }

    fn vec4(&self, slot: UniformSlot) -> Vec4 {
        self.0.get(&slot).and_then(UniformValue::as_vec4).unwrap_or_else(Vec4::zeros)
    }

    fn float(&self, slot: UniformSlot) -> f32 {
        self.0.get(&slot).and_then(UniformValue::as_float).unwrap_or(0.0)
    }

    fn int(&self, slot: UniformSlot) -> i32 {
        self.0.get(&slot).and_then(UniformValue::as_int).unwrap_or(0)
    }

    fn count(&self, slot: UniformSlot, max: usize) -> u8 {
        let count = usize::try_from(self.int(slot)).unwrap_or(0).min(max);
        u8::try_from(count).unwrap_or(0)
    }
}

/// Copy of a directional shadow map and the matrix that projects into it
#[derive(Debug, Clone)]
pub(crate) struct ShadowSampler {
    depth: Vec<f32>,
    width: u32,
    height: u32,
    light_space: Mat4,
}

impl ShadowSampler {
    /// Snapshot the depth attachment `attachment` of `source`
    pub fn capture(source: &FramebufferStorage, attachment: usize, light_space: Mat4) -> Option<Self> {
        match source.attachments.get(attachment)? {
            AttachmentStorage::DepthStencil { depth, .. } => Some(Self {
                depth: depth.clone(),
                width: source.width(),
                height: source.height(),
                light_space,
            }),
            _ => None,
        }
    }

    /// Whether `world` is behind the stored occluder depth
    ///
    /// Points projecting outside the map sample the border and are lit.
    fn occluded(&self, world: &Vec3) -> bool {
        let clip = self.light_space * world.push(1.0);
        if clip.w.abs() <= f32::EPSILON {
            return false;
        }
        let proj = clip.xyz() / clip.w * 0.5 + Vec3::repeat(0.5);
        if proj.z > 1.0 || !(0.0..1.0).contains(&proj.x) || !(0.0..1.0).contains(&proj.y) {
            return false;
        }

        // Truncation picks the nearest texel below the sample point
        let x = ((proj.x * self.width as f32) as u32).min(self.width - 1);
        let y = ((proj.y * self.height as f32) as u32).min(self.height - 1);
        let closest = self.depth[y as usize * self.width as usize + x as usize];
        proj.z - SHADOW_BIAS > closest
    }
}

/// Fixed-function state a draw runs under
#[derive(Debug, Clone, Copy)]
pub(crate) struct Pipeline {
    pub viewport: Viewport,
    pub depth_mask: bool,
}

/// Run one indexed draw; returns the number of fragments written
pub(crate) fn execute(
    kind: ProgramKind,
    values: &HashMap<UniformSlot, UniformValue>,
    geometry: &GeometryBuffers,
    target: &mut FramebufferStorage,
    pipeline: Pipeline,
    shadow: Option<&ShadowSampler>,
) -> u64 {
    let uniforms = Uniforms(values);
    match kind {
        ProgramKind::Surface => draw_surface(&uniforms, geometry, target, pipeline, shadow),
        ProgramKind::Skybox => draw_skybox(&uniforms, geometry, target, pipeline),
        ProgramKind::DirectionalDepth => draw_directional_depth(&uniforms, geometry, target, pipeline),
        ProgramKind::PointDepth => draw_point_depth(&uniforms, geometry, target, pipeline),
        ProgramKind::Outline => draw_outline(&uniforms, geometry, target, pipeline),
    }
}

/// Run `vertex` over every indexed triangle and rasterize the result
fn for_each_fragment<V, F>(geometry: &GeometryBuffers, viewport: Viewport, size: (u32, u32), mut vertex: V, mut fragment: F)
where
    V: FnMut(usize) -> ClipVertex,
    F: FnMut(&Fragment),
{
    for triangle in geometry.indices.chunks_exact(3) {
        let corners = [
            vertex(triangle[0] as usize),
            vertex(triangle[1] as usize),
            vertex(triangle[2] as usize),
        ];
        draw_triangle(corners, viewport, size, &mut fragment);
    }
}

fn position(geometry: &GeometryBuffers, index: usize) -> Vec4 {
    geometry
        .vertices
        .get(index)
        .map_or_else(|| Vec4::new(0.0, 0.0, 0.0, 1.0), |v| Vec3::from(v.position).push(1.0))
}

/// Per-vertex diffuse lighting; the first directional light is kept apart
/// so the fragment stage can shadow it
struct SceneLighting<'a> {
    uniforms: &'a Uniforms<'a>,
    points: u8,
    spots: u8,
    directionals: u8,
}

impl<'a> SceneLighting<'a> {
    fn new(uniforms: &'a Uniforms<'a>) -> Self {
        Self {
            uniforms,
            points: uniforms.count(UniformSlot::PointLightCount, MAX_POINT_LIGHTS),
            spots: uniforms.count(UniformSlot::SpotLightCount, MAX_SPOT_LIGHTS),
            directionals: uniforms.count(UniformSlot::DirectionalLightCount, MAX_DIRECTIONAL_LIGHTS),
        }
    }

    /// Returns `(unshadowed, shadowable)` light
    fn light(&self, world: &Vec3, normal: &Vec3) -> (Vec3, Vec3) {
        let u = self.uniforms;
        let diffuse = |dir: Vec3| normal.dot(&dir).max(0.0);
        let mut lit = Vec3::repeat(AMBIENT);
        let mut shadowable = Vec3::zeros();

        for i in 0..self.directionals {
            let dir = -u.vec3(UniformSlot::DirectionalLight(i, DirectionalLightField::Direction));
            let Some(dir) = dir.try_normalize(f32::EPSILON) else { continue };
            let color = u.vec3(UniformSlot::DirectionalLight(i, DirectionalLightField::Color));
            let intensity = u.float(UniformSlot::DirectionalLight(i, DirectionalLightField::Intensity));
            let contribution = color * (intensity * diffuse(dir));
            if i == 0 {
                shadowable += contribution;
            } else {
                lit += contribution;
            }
        }

        for i in 0..self.points {
            let to_light = u.vec3(UniformSlot::PointLight(i, PointLightField::Position)) - world;
            let range = u.float(UniformSlot::PointLight(i, PointLightField::Range));
            let distance = to_light.norm();
            if range <= 0.0 || distance <= f32::EPSILON {
                continue;
            }
            let attenuation = (1.0 - distance / range).clamp(0.0, 1.0);
            let color = u.vec3(UniformSlot::PointLight(i, PointLightField::Color));
            let intensity = u.float(UniformSlot::PointLight(i, PointLightField::Intensity));
            lit += color * (attenuation * intensity * diffuse(to_light / distance));
        }

        for i in 0..self.spots {
            let Some(dir) = (u.vec3(UniformSlot::SpotLight(i, SpotLightField::Position)) - world).try_normalize(f32::EPSILON)
            else {
                continue;
            };
            let Some(axis) = (-u.vec3(UniformSlot::SpotLight(i, SpotLightField::Direction))).try_normalize(f32::EPSILON)
            else {
                continue;
            };
            let inner = u.float(UniformSlot::SpotLight(i, SpotLightField::CutOff));
            let outer = u.float(UniformSlot::SpotLight(i, SpotLightField::OuterCutOff));
            let epsilon = (inner - outer).max(f32::EPSILON);
            let cone = ((dir.dot(&axis) - outer) / epsilon).clamp(0.0, 1.0);
            let color = u.vec3(UniformSlot::SpotLight(i, SpotLightField::Color));
            let intensity = u.float(UniformSlot::SpotLight(i, SpotLightField::Intensity));
            lit += color * (cone * intensity * diffuse(dir));
        }

        (lit, shadowable)
    }
}

fn normal_matrix(transform: &Mat4) -> Mat3 {
    let linear: Mat3 = transform.fixed_view::<3, 3>(0, 0).into_owned();
    linear.try_inverse().map_or(linear, |inverse| inverse.transpose())
}

fn draw_surface(
    u: &Uniforms<'_>,
    geometry: &GeometryBuffers,
    target: &mut FramebufferStorage,
    pipeline: Pipeline,
    shadow: Option<&ShadowSampler>,
) -> u64 {
    let view_projection = u.mat4(UniformSlot::ViewProjection);
    let transform = u.mat4(UniformSlot::Transform);
    let normals = normal_matrix(&transform);
    let id = u.int(UniformSlot::EntityId);
    let lighting = SceneLighting::new(u);
    let shadow = shadow.filter(|_| lighting.directionals > 0);

    let color_attachment = target.first_color();
    let id_attachment = target.first_integer();
    let depth_attachment = target.depth_stencil();
    let size = (target.width(), target.height());
    let mut written = 0;

    let vertex = |index: usize| {
        let world = transform * position(geometry, index);
        let (base, normal) = geometry.vertices.get(index).map_or((Vec4::zeros(), Vec3::zeros()), |v| {
            (Vec4::from(v.color), Vec3::from(v.normal))
        });
        let normal = (normals * normal).try_normalize(f32::EPSILON).unwrap_or_else(Vec3::zeros);
        let (lit, shadowable) = lighting.light(&world.xyz(), &normal);

        ClipVertex {
            clip: view_projection * world,
            varyings: Varyings {
                color: base.xyz().component_mul(&lit).push(base.w),
                shadowable: base.xyz().component_mul(&shadowable),
                world: world.xyz(),
            },
        }
    };

    for_each_fragment(geometry, pipeline.viewport, size, vertex, |f| {
        let texel = target.texel_index(f.x, f.y);
        if !target.depth_test(depth_attachment, texel, f.depth, DepthFunc::Less, pipeline.depth_mask) {
            return;
        }

        let v = &f.varyings;
        let occluded = shadow.is_some_and(|s| s.occluded(&v.world));
        let rgb = if occluded { v.color.xyz() } else { v.color.xyz() + v.shadowable };
        if let Some(attachment) = color_attachment {
            target.write_color(attachment, texel, rgb.push(v.color.w), false);
        }
        if let Some(attachment) = id_attachment {
            target.write_int(attachment, texel, id);
        }
        written += 1;
    });
    written
}

fn draw_skybox(u: &Uniforms<'_>, geometry: &GeometryBuffers, target: &mut FramebufferStorage, pipeline: Pipeline) -> u64 {
    let view_projection = u.mat4(UniformSlot::ViewProjection);
    let color_attachment = target.first_color();
    let depth_attachment = target.depth_stencil();
    let size = (target.width(), target.height());
    let mut written = 0;

    let vertex = |index: usize| {
        let local = position(geometry, index);
        let mut clip = view_projection * local;
        // Pin to the far plane
        clip.z = clip.w;
        ClipVertex {
            clip,
            varyings: Varyings { world: local.xyz(), ..Varyings::default() },
        }
    };

    for_each_fragment(geometry, pipeline.viewport, size, vertex, |f| {
        let texel = target.texel_index(f.x, f.y);
        if !target.depth_test(depth_attachment, texel, f.depth, DepthFunc::LessEqual, pipeline.depth_mask) {
            return;
        }
        let height = f.varyings.world.try_normalize(f32::EPSILON).map_or(0.0, |d| d.y.clamp(0.0, 1.0));
        let sky = Vec3::from(SKY_HORIZON).lerp(&Vec3::from(SKY_ZENITH), height);
        if let Some(attachment) = color_attachment {
            target.write_color(attachment, texel, sky.push(1.0), false);
        }
        written += 1;
    });
    written
}

fn draw_directional_depth(
    u: &Uniforms<'_>,
    geometry: &GeometryBuffers,
    target: &mut FramebufferStorage,
    pipeline: Pipeline,
) -> u64 {
    let light_space = u.mat4(UniformSlot::ShadowLightSpace) * u.mat4(UniformSlot::Transform);
    let depth_attachment = target.depth_stencil();
    let size = (target.width(), target.height());
    let mut written = 0;

    let vertex = |index: usize| ClipVertex {
        clip: light_space * position(geometry, index),
        varyings: Varyings::default(),
    };

    for_each_fragment(geometry, pipeline.viewport, size, vertex, |f| {
        let texel = target.texel_index(f.x, f.y);
        if target.depth_test(depth_attachment, texel, f.depth, DepthFunc::Less, pipeline.depth_mask) {
            written += 1;
        }
    });
    written
}

fn draw_point_depth(u: &Uniforms<'_>, geometry: &GeometryBuffers, target: &mut FramebufferStorage, pipeline: Pipeline) -> u64 {
    let Some(cube) = target.depth_cube() else {
        log::debug!("Point shadow draw into a target without a depth cube");
        return 0;
    };
    let transform = u.mat4(UniformSlot::Transform);
    let light_position = u.vec3(UniformSlot::LightPosition);
    let far_plane = u.float(UniformSlot::FarPlane);
    let size = (target.width(), target.height());
    let mut written = 0;

    for face in 0..6u8 {
        let face_matrix = u.mat4(UniformSlot::ShadowMatrix(face));
        let vertex = |index: usize| {
            let world = transform * position(geometry, index);
            ClipVertex {
                clip: face_matrix * world,
                varyings: Varyings { world: world.xyz(), ..Varyings::default() },
            }
        };

        for_each_fragment(geometry, pipeline.viewport, size, vertex, |f| {
            let distance = (f.varyings.world - light_position).norm();
            let depth = if far_plane > 0.0 { (distance / far_plane).min(1.0) } else { 1.0 };
            let texel = target.texel_index(f.x, f.y);
            if target.depth_test_layer(cube, usize::from(face), texel, depth, pipeline.depth_mask) {
                written += 1;
            }
        });
    }
    written
}

/// Mark the silhouette, then paint a ring `ceil(width)` pixels wide around it
///
/// The silhouette is also written to the stencil of the depth attachment.
/// The ring is blended into the first color attachment; depth and ids are
/// untouched.
fn draw_outline(u: &Uniforms<'_>, geometry: &GeometryBuffers, target: &mut FramebufferStorage, pipeline: Pipeline) -> u64 {
    let clip_matrix = u.mat4(UniformSlot::ViewProjection) * u.mat4(UniformSlot::Transform);
    let color = u.vec4(UniformSlot::OutlineColor);
    let radius = u.float(UniformSlot::OutlineWidth).max(0.0).ceil() as i64;
    let (width, height) = (target.width(), target.height());

    let mut mask = vec![false; width as usize * height as usize];
    let mut bounds: Option<(u32, u32, u32, u32)> = None;
    let vertex = |index: usize| ClipVertex {
        clip: clip_matrix * position(geometry, index),
        varyings: Varyings::default(),
    };
    for_each_fragment(geometry, pipeline.viewport, (width, height), vertex, |f| {
        mask[f.y as usize * width as usize + f.x as usize] = true;
        bounds = Some(match bounds {
            None => (f.x, f.y, f.x, f.y),
            Some((x0, y0, x1, y1)) => (x0.min(f.x), y0.min(f.y), x1.max(f.x), y1.max(f.y)),
        });
    });

    let Some((x0, y0, x1, y1)) = bounds else { return 0 };
    if let Some(index) = target.depth_stencil() {
        if let Some(AttachmentStorage::DepthStencil { stencil, .. }) = target.attachments.get_mut(index) {
            for (s, inside) in stencil.iter_mut().zip(&mask) {
                if *inside {
                    *s = 1;
                }
            }
        }
    }
    let Some(color_attachment) = target.first_color() else { return 0 };
    if radius == 0 {
        return 0;
    }

    let inside = |x: i64, y: i64| {
        x >= 0 && y >= 0 && x < i64::from(width) && y < i64::from(height) && mask[y as usize * width as usize + x as usize]
    };
    let grow = |lo: u32, hi: u32, limit: u32| {
        (i64::from(lo) - radius).max(0)..=(i64::from(hi) + radius).min(i64::from(limit) - 1)
    };

    let mut written = 0;
    for y in grow(y0, y1, height) {
        for x in grow(x0, x1, width) {
            if inside(x, y) {
                continue;
            }
            let near_silhouette = (-radius..=radius).any(|dy| {
                (-radius..=radius).any(|dx| dx * dx + dy * dy <= radius * radius && inside(x + dx, y + dy))
            });
            if near_silhouette {
                let texel = y as usize * width as usize + x as usize;
                target.write_color(color_attachment, texel, color, true);
                written += 1;
            }
        }
    }
    written
}
