//! Logging utilities and structured logging support

pub use log::{debug, info, warn, error, trace};

use log::LevelFilter;

/// Level used until a configuration says otherwise
pub const DEFAULT_LEVEL: &str = "info";

/// Initialize the logging system
///
/// `default_level` applies when `RUST_LOG` is not set (e.g. `"info"`). The
/// level can be changed later with [`apply_level`]. Calling this twice is
/// harmless; the second installation attempt is ignored.
pub fn init(default_level: &str) {
    let installed = if env_override() {
        env_logger::Builder::from_default_env().try_init()
    } else {
        env_logger::Builder::new().filter_level(LevelFilter::Trace).try_init()
    };
    if installed.is_err() {
        log::debug!("Logger already installed");
        return;
    }
    apply_level(default_level);
}

/// Switch the maximum log level to `level` (e.g. from a loaded config).
///
/// Does nothing while `RUST_LOG` is set. Unknown level names are reported
/// and leave the current level in place.
pub fn apply_level(level: &str) {
    if env_override() {
        return;
    }
    match level.parse::<LevelFilter>() {
        Ok(filter) => log::set_max_level(filter),
        Err(_) => log::warn!("Unknown log level '{}', keeping {}", level, log::max_level()),
    }
}

fn env_override() -> bool {
    std::env::var_os(env_logger::DEFAULT_FILTER_ENV).is_some()
}
