//! Shader programs and their uniform interface
//!
//! A program's uniforms are resolved once, when the source is parsed, into a
//! set of typed [`UniformSlot`]s. Draw code then uploads through slots and
//! never builds uniform names at draw time.

mod library;
mod source;
mod uniform;

pub use library::{ShaderLibrary, BUILTIN_SHADERS};
pub use source::{ShaderSource, ShaderStage};
pub use uniform::{
    DirectionalLightField, PointLightField, SpotLightField, UniformSlot, UniformValue,
};
