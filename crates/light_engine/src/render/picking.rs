//! Pick ids written to the integer attachment

/// Integer identifying an entity in the pick attachment
///
/// [`PickId::NONE`] (-1) is written wherever no entity was drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PickId(pub i32);

impl PickId {
    /// No entity under the pixel
    pub const NONE: Self = Self(-1);

    /// Whether this is the "no entity" sentinel
    pub fn is_none(self) -> bool {
        self.0 < 0
    }

    /// Raw value as written to the attachment
    pub fn raw(self) -> i32 {
        self.0
    }
}

impl Default for PickId {
    fn default() -> Self {
        Self::NONE
    }
}

impl From<i32> for PickId {
    fn from(value: i32) -> Self {
        Self(value)
    }
}
