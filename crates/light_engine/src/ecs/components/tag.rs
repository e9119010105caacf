//! Display name component

use crate::ecs::Component;

/// Human-readable entity name shown in the hierarchy panel
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TagComponent {
    /// Entity name
    pub name: String,
}

impl TagComponent {
    /// Create a tag
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Component for TagComponent {}
