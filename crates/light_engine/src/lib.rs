//! # Light Engine
//!
//! Rendering core of the Light scene editor.
//!
//! ## Features
//!
//! - **Scene submission**: a frame-scoped [`render::Renderer`] that uploads
//!   camera, light and transform state and issues one draw per submission
//! - **Shadows**: directional shadow maps and omnidirectional depth cubes
//! - **Picking**: an integer attachment holding per-pixel entity ids
//! - **Editor camera**: orbit, pan and zoom around a focal point
//! - **Software device**: a CPU rasterizer implementing the backend trait,
//!   used headless and in tests
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use light_engine::prelude::*;
//! use light_engine::render::backends::SoftwareBackend;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let renderer = Renderer::new(Box::new(SoftwareBackend::new()), RendererConfig::default());
//!     let mut scene_renderer = SceneRenderer::new(renderer, SceneRendererConfig::default())?;
//!
//!     let command = scene_renderer.renderer_mut().command_mut();
//!     let target = Framebuffer::create(command, FramebufferSpec::editor_viewport(1280, 720))?;
//!     scene_renderer.set_target_framebuffer(target);
//!
//!     let scene = Scene::new();
//!     let camera = EditorCamera::new(45.0, 1280.0 / 720.0, 0.1, 100.0);
//!     scene_renderer.render_editor(&scene, &camera)?;
//!     let id = scene_renderer.pick(640, 360)?;
//!     assert_eq!(scene.entity_from_pick_id(id), None);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod foundation;
pub mod config;
pub mod events;
pub mod input;
pub mod ecs;
pub mod render;
pub mod scene;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        config::{Config, ConfigError},
        ecs::{
            Entity, LightComponent, LightKind, MeshComponent, MeshRendererComponent, TagComponent,
            TransformComponent, World,
        },
        events::{Event, EventDispatcher},
        foundation::{
            math::{Mat4, Mat4Ext, Vec2, Vec3, Vec4},
            time::{Timer, Timestep},
        },
        input::{InputState, KeyCode, MouseButton},
        render::{
            EditorCamera, Framebuffer, FramebufferSpec, FramebufferTextureFormat, PickId, RenderError, Renderer,
            RendererConfig,
        },
        scene::{Scene, SceneRenderer, SceneRendererConfig},
    };
}
