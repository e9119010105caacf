//! Named shader registry with the built-in programs

use std::collections::HashMap;

use super::ShaderSource;
use crate::foundation::collections::ShaderHandle;
use crate::render::{RenderCommand, RenderError, RenderResult};

/// Built-in shader sources, embedded at compile time
pub const BUILTIN_SHADERS: [(&str, &str); 5] = [
    ("phong", include_str!("../../../assets/shaders/phong.glsl")),
    ("skybox", include_str!("../../../assets/shaders/skybox.glsl")),
    ("shadow_directional", include_str!("../../../assets/shaders/shadow_directional.glsl")),
    ("shadow_point", include_str!("../../../assets/shaders/shadow_point.glsl")),
    ("outline", include_str!("../../../assets/shaders/outline.glsl")),
];

/// Shaders by name
///
/// Handles are owned by the backend; the library only remembers them.
#[derive(Debug, Default)]
pub struct ShaderLibrary {
    shaders: HashMap<String, ShaderHandle>,
}

impl ShaderLibrary {
    /// Create an empty library
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a library holding every built-in shader
    pub fn with_builtins(command: &mut RenderCommand) -> RenderResult<Self> {
        let mut library = Self::new();
        for (name, source) in BUILTIN_SHADERS {
            library.add(command, name, source)?;
        }
        Ok(library)
    }

    /// Compile `source` and register it under `name`
    ///
    /// A shader already registered under the name is destroyed and replaced.
    pub fn add(&mut self, command: &mut RenderCommand, name: &str, source: &str) -> RenderResult<ShaderHandle> {
        let parsed = ShaderSource::parse(name, source)?;
        let handle = command.create_shader(&parsed)?;

        if let Some(previous) = self.shaders.insert(name.to_string(), handle) {
            log::debug!("Replacing shader '{}'", name);
            command.destroy_shader(previous)?;
        }
        Ok(handle)
    }

    /// Look up a shader
    pub fn get(&self, name: &str) -> Option<ShaderHandle> {
        self.shaders.get(name).copied()
    }

    /// Look up a shader that must exist
    pub fn require(&self, name: &str) -> RenderResult<ShaderHandle> {
        self.get(name)
            .ok_or_else(|| RenderError::InvalidArgument(format!("no shader named '{name}'")))
    }

    /// Whether a shader is registered
    pub fn contains(&self, name: &str) -> bool {
        self.shaders.contains_key(name)
    }

    /// Number of registered shaders
    pub fn len(&self) -> usize {
        self.shaders.len()
    }

    /// Whether the library is empty
    pub fn is_empty(&self) -> bool {
        self.shaders.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::shader::{DirectionalLightField, UniformSlot};

    #[test]
    fn test_builtin_interfaces() {
        let parse = |name: &str| {
            let (_, src) = BUILTIN_SHADERS.iter().find(|(n, _)| *n == name).unwrap();
            ShaderSource::parse(name, src).unwrap()
        };

        let phong = parse("phong");
        assert!(phong.declares(UniformSlot::EntityId));
        assert!(phong.declares(UniformSlot::LightSpaceMatrix));
        assert!(phong.declares(UniformSlot::DirectionalLight(3, DirectionalLightField::LightSpaceMatrix)));
        assert!(phong.unresolved().is_empty());

        let point = parse("shadow_point");
        assert!(point.declares(UniformSlot::ShadowMatrix(5)));
        assert!(point.declares(UniformSlot::FarPlane));
        assert!(point.declares(UniformSlot::LightPosition));

        assert!(parse("skybox").declares(UniformSlot::Cubemap));
        assert!(parse("shadow_directional").declares(UniformSlot::ShadowLightSpace));
        assert!(parse("outline").declares(UniformSlot::OutlineWidth));
    }
}
