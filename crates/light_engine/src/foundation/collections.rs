//! Specialized collection types
//!
//! GPU resources are owned by arenas inside the active backend and referred
//! to everywhere else through generational handles (index + version), so a
//! handle that outlives its resource is detected instead of aliasing a new one.

pub use slotmap::{SlotMap, SecondaryMap, Key};

slotmap::new_key_type! {
    /// Handle to a compiled shader program
    pub struct ShaderHandle;

    /// Handle to uploaded indexed geometry (vertex array + index buffer)
    pub struct GeometryHandle;

    /// Handle to an off-screen render target
    pub struct FramebufferHandle;
}

/// Arena keyed by a generational handle
pub type Arena<K, V> = SlotMap<K, V>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stale_handle_is_rejected() {
        let mut arena: Arena<ShaderHandle, &str> = Arena::with_key();
        let first = arena.insert("phong");
        arena.remove(first);
        let second = arena.insert("skybox");

        assert!(arena.get(first).is_none());
        assert_eq!(arena.get(second), Some(&"skybox"));
        assert_ne!(first, second);
    }

    #[test]
    fn test_default_handle_is_null() {
        assert!(GeometryHandle::default().is_null());
    }
}
