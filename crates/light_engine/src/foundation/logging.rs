//! Logging utilities and structured logging support

pub use log::{debug, info, warn, error, trace};

/// Initialize the logging system
///
/// Safe to call more than once; later calls are ignored so that tests and
/// the editor binary can both initialize freely.
pub fn init() {
    if env_logger::try_init().is_err() {
        log::trace!("Logger already initialized");
    }
}
