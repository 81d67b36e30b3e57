//! Tracing/logging setup shared by the library binaries.

pub mod logging;

pub use logging::{LOG_FORMAT_ENV, LogFormat};

/// Initialize process-wide logging.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    logging::init(LogFormat::from_env());
}
