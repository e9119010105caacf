//! Typed uniform slots
//!
//! Each variant corresponds to one GLSL uniform location. Array elements and
//! struct-array fields carry their index, so `u_pointLights[3].color` is
//! `UniformSlot::PointLight(3, PointLightField::Color)`.

use std::fmt;

use crate::foundation::math::{Mat3, Mat4, Vec3, Vec4};

/// Fields of the `PointLight` uniform struct
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PointLightField {
    /// `position`
    Position,
    /// `color`
    Color,
    /// `intensity`
    Intensity,
    /// `range`
    Range,
}

impl PointLightField {
    const ALL: [Self; 4] = [Self::Position, Self::Color, Self::Intensity, Self::Range];

    fn glsl_name(self) -> &'static str {
        match self {
            Self::Position => "position",
            Self::Color => "color",
            Self::Intensity => "intensity",
            Self::Range => "range",
        }
    }
}

/// Fields of the `SpotLight` uniform struct
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SpotLightField {
    /// `position`
    Position,
    /// `direction`
    Direction,
    /// `color`
    Color,
    /// `intensity`
    Intensity,
    /// `cutOff`, cosine of the inner cone angle
    CutOff,
    /// `outerCutOff`, cosine of the outer cone angle
    OuterCutOff,
}

impl SpotLightField {
    const ALL: [Self; 6] = [
        Self::Position,
        Self::Direction,
        Self::Color,
        Self::Intensity,
        Self::CutOff,
        Self::OuterCutOff,
    ];

    fn glsl_name(self) -> &'static str {
        match self {
            Self::Position => "position",
            Self::Direction => "direction",
            Self::Color => "color",
            Self::Intensity => "intensity",
            Self::CutOff => "cutOff",
            Self::OuterCutOff => "outerCutOff",
        }
    }
}

/// Fields of the `DirectionalLight` uniform struct
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DirectionalLightField {
    /// `direction`
    Direction,
    /// `color`
    Color,
    /// `intensity`
    Intensity,
    /// `lightSpaceMatrix`
    LightSpaceMatrix,
}

impl DirectionalLightField {
    const ALL: [Self; 4] = [Self::Direction, Self::Color, Self::Intensity, Self::LightSpaceMatrix];

    fn glsl_name(self) -> &'static str {
        match self {
            Self::Direction => "direction",
            Self::Color => "color",
            Self::Intensity => "intensity",
            Self::LightSpaceMatrix => "lightSpaceMatrix",
        }
    }
}

/// A uniform location the renderer knows how to fill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum UniformSlot {
    /// `u_viewProjectionMatrix`
    ViewProjection,
    /// `u_transform`
    Transform,
    /// `u_id`, the pick id written to the integer attachment
    EntityId,
    /// `u_cubemap` sampler unit
    Cubemap,
    /// `depthMap` sampler unit
    DepthMap,
    /// `lightSpaceMatrix` used by the surface shader for shadow lookups
    LightSpaceMatrix,
    /// `u_lightSpaceMatrix` used by the directional depth pass
    ShadowLightSpace,
    /// `shadowMatrices[i]`, one per cube face
    ShadowMatrix(u8),
    /// `far_plane`
    FarPlane,
    /// `lightPos`
    LightPosition,
    /// `u_cameraPosition`
    CameraPosition,
    /// `u_pointLightCount`
    PointLightCount,
    /// `u_spotLightCount`
    SpotLightCount,
    /// `u_directionalLightCount`
    DirectionalLightCount,
    /// `u_pointLights[i].<field>`
    PointLight(u8, PointLightField),
    /// `u_spotLights[i].<field>`
    SpotLight(u8, SpotLightField),
    /// `u_directionalLights[i].<field>`
    DirectionalLight(u8, DirectionalLightField),
    /// `u_outlineColor`
    OutlineColor,
    /// `u_outlineWidth`
    OutlineWidth,
}

impl UniformSlot {
    /// Resolve a plain (non-struct) uniform, optionally an array element
    pub fn from_glsl(name: &str, index: Option<u8>) -> Option<Self> {
        let slot = match (name, index) {
            ("u_viewProjectionMatrix", None) => Self::ViewProjection,
            ("u_transform", None) => Self::Transform,
            ("u_id", None) => Self::EntityId,
            ("u_cubemap", None) => Self::Cubemap,
            ("depthMap", None) => Self::DepthMap,
            ("lightSpaceMatrix", None) => Self::LightSpaceMatrix,
            ("u_lightSpaceMatrix", None) => Self::ShadowLightSpace,
            ("shadowMatrices", Some(i)) if i < 6 => Self::ShadowMatrix(i),
            ("far_plane", None) => Self::FarPlane,
            ("lightPos", None) => Self::LightPosition,
            ("u_cameraPosition", None) => Self::CameraPosition,
            ("u_pointLightCount", None) => Self::PointLightCount,
            ("u_spotLightCount", None) => Self::SpotLightCount,
            ("u_directionalLightCount", None) => Self::DirectionalLightCount,
            ("u_outlineColor", None) => Self::OutlineColor,
            ("u_outlineWidth", None) => Self::OutlineWidth,
            _ => return None,
        };
        Some(slot)
    }

    /// Resolve a field of a light struct array element
    pub fn from_glsl_field(array: &str, index: u8, field: &str) -> Option<Self> {
        match array {
            "u_pointLights" => PointLightField::ALL
                .into_iter()
                .find(|f| f.glsl_name() == field)
                .map(|f| Self::PointLight(index, f)),
            "u_spotLights" => SpotLightField::ALL
                .into_iter()
                .find(|f| f.glsl_name() == field)
                .map(|f| Self::SpotLight(index, f)),
            "u_directionalLights" => DirectionalLightField::ALL
                .into_iter()
                .find(|f| f.glsl_name() == field)
                .map(|f| Self::DirectionalLight(index, f)),
            _ => None,
        }
    }

    /// Whether an array base name is one of the light struct arrays
    pub fn is_light_array(name: &str) -> bool {
        matches!(name, "u_pointLights" | "u_spotLights" | "u_directionalLights")
    }
}

impl fmt::Display for UniformSlot {
    /// Formats the slot as the GLSL name it was resolved from
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ViewProjection => f.write_str("u_viewProjectionMatrix"),
            Self::Transform => f.write_str("u_transform"),
            Self::EntityId => f.write_str("u_id"),
            Self::Cubemap => f.write_str("u_cubemap"),
            Self::DepthMap => f.write_str("depthMap"),
            Self::LightSpaceMatrix => f.write_str("lightSpaceMatrix"),
            Self::ShadowLightSpace => f.write_str("u_lightSpaceMatrix"),
            Self::ShadowMatrix(i) => write!(f, "shadowMatrices[{i}]"),
            Self::FarPlane => f.write_str("far_plane"),
            Self::LightPosition => f.write_str("lightPos"),
            Self::CameraPosition => f.write_str("u_cameraPosition"),
            Self::PointLightCount => f.write_str("u_pointLightCount"),
            Self::SpotLightCount => f.write_str("u_spotLightCount"),
            Self::DirectionalLightCount => f.write_str("u_directionalLightCount"),
            Self::PointLight(i, field) => write!(f, "u_pointLights[{i}].{}", field.glsl_name()),
            Self::SpotLight(i, field) => write!(f, "u_spotLights[{i}].{}", field.glsl_name()),
            Self::DirectionalLight(i, field) => {
                write!(f, "u_directionalLights[{i}].{}", field.glsl_name())
            }
            Self::OutlineColor => f.write_str("u_outlineColor"),
            Self::OutlineWidth => f.write_str("u_outlineWidth"),
        }
    }
}

/// A value uploaded to a uniform slot
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    /// `int` or sampler unit
    Int(i32),
    /// `float`
    Float(f32),
    /// `vec3`
    Vec3(Vec3),
    /// `vec4`
    Vec4(Vec4),
    /// `mat3`
    Mat3(Mat3),
    /// `mat4`
    Mat4(Mat4),
}

impl UniformValue {
    /// Integer payload, if this is an `Int`
    pub fn as_int(&self) -> Option<i32> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Float payload, if this is a `Float`
    pub fn as_float(&self) -> Option<f32> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Vector payload, if this is a `Vec3`
    pub fn as_vec3(&self) -> Option<Vec3> {
        match self {
            Self::Vec3(v) => Some(*v),
            _ => None,
        }
    }

    /// Vector payload, if this is a `Vec4`
    pub fn as_vec4(&self) -> Option<Vec4> {
        match self {
            Self::Vec4(v) => Some(*v),
            _ => None,
        }
    }

    /// Matrix payload, if this is a `Mat4`
    pub fn as_mat4(&self) -> Option<Mat4> {
        match self {
            Self::Mat4(v) => Some(*v),
            _ => None,
        }
    }
}
