//! Lighting component for ECS
//!
//! Pure data: the light's position comes from the entity's
//! [`TransformComponent`](super::TransformComponent). The scene turns these
//! into per-kind light records at the start of each frame.

use crate::ecs::Component;
use crate::foundation::math::Vec3;

/// Types of lights supported by the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LightKind {
    /// Omnidirectional light with a falloff range
    #[default]
    Point,
    /// Cone light
    Spot,
    /// Sun-like light with parallel rays
    Directional,
}

/// Pure data component for lights
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightComponent {
    /// The type of light
    pub kind: LightKind,
    /// RGB color values for the light (0.0 to 1.0 range)
    pub color: Vec3,
    /// Light intensity multiplier
    pub intensity: f32,
    /// Direction for directional/spot lights in world space
    pub direction: Vec3,
    /// Maximum distance for point/spot lights
    pub range: f32,
    /// Inner cone angle for spot lights in degrees
    pub inner_cutoff_deg: f32,
    /// Outer cone angle for spot lights in degrees
    pub outer_cutoff_deg: f32,
    /// Whether this light should cast shadows
    pub cast_shadows: bool,
}

impl Default for LightComponent {
    fn default() -> Self {
        Self {
            kind: LightKind::Point,
            color: Vec3::new(1.0, 1.0, 1.0),
            intensity: 1.0,
            direction: Vec3::new(0.0, -1.0, 0.0),
            range: 20.0,
            inner_cutoff_deg: 12.5,
            outer_cutoff_deg: 17.5,
            cast_shadows: true,
        }
    }
}

impl LightComponent {
    /// Directional light with the given world-space direction
    pub fn directional(direction: Vec3, color: Vec3, intensity: f32) -> Self {
        Self {
            kind: LightKind::Directional,
            color,
            intensity,
            direction: direction.normalize(),
            ..Default::default()
        }
    }

    /// Spot light aimed along `direction`
    pub fn spot(direction: Vec3, color: Vec3, intensity: f32, inner_deg: f32, outer_deg: f32) -> Self {
        Self {
            kind: LightKind::Spot,
            color,
            intensity,
            direction: direction.normalize(),
            inner_cutoff_deg: inner_deg,
            outer_cutoff_deg: outer_deg,
            ..Default::default()
        }
    }
}

impl Component for LightComponent {}
