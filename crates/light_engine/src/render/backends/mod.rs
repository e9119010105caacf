//! Rendering backend implementations

pub mod software;

pub use software::{DrawRecord, SoftwareBackend};
