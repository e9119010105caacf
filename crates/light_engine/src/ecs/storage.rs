//! Type-erased per-component storage

use std::any::Any;
use std::collections::BTreeMap;

use super::Component;

/// Operations the world needs without knowing the component type
pub(crate) trait ErasedStorage: Any {
    /// Drop whatever component lives at the slot
    fn remove_index(&mut self, index: u32);

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Dense-by-index storage for one component type
///
/// Ordered by slot index so iteration (and therefore draw order) is stable.
pub(crate) struct ComponentStorage<T: Component> {
    pub(crate) items: BTreeMap<u32, T>,
}

impl<T: Component> Default for ComponentStorage<T> {
    fn default() -> Self {
        Self { items: BTreeMap::new() }
    }
}

impl<T: Component> ErasedStorage for ComponentStorage<T> {
    fn remove_index(&mut self, index: u32) {
        self.items.remove(&index);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
