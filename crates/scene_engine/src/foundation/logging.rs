//! Logging utilities
//!
//! The engine logs through the `log` facade; binaries pick the sink. These
//! helpers install `env_logger`, honouring `RUST_LOG` when it is set.

pub use log::{debug, info, warn, error, trace};

/// Initialize the logging system from `RUST_LOG`
pub fn init() {
    env_logger::init();
}

/// Initialize logging with a default level that `RUST_LOG` can override.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_with_level(level: log::LevelFilter) {
    let _ = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .try_init();
}
