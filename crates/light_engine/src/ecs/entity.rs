//! Entity implementation

/// Entity identifier
///
/// The generation distinguishes an entity from a later one that reuses the
/// same slot after a despawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Entity {
    index: u32,
    generation: u32,
}

impl Entity {
    pub(crate) fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot index of the entity
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Generation of the slot at the time the entity was spawned
    pub fn generation(&self) -> u32 {
        self.generation
    }
}
