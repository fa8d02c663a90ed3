//! Logging setup

pub use log::{debug, error, info, trace, warn};

/// Initialize the logging system
///
/// `level` is the default filter; directives in `RUST_LOG` take precedence.
pub fn init(level: log::LevelFilter) -> Result<(), log::SetLoggerError> {
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .try_init()
}
