//!
//! Console logger for the binaries, tests and benches of the workspace.
//!
//! Library crates only use the re-exported `log` macros; installing a logger is left to the
//! final executable, which calls [`init_logger`] or [`try_init_logger`] once.
//!

pub use log::{debug, error, info, trace, warn};

mod appender;
mod consts;
mod logger;

use appender::AppenderSpec;
use consts::{CONSOLE_APPENDER, DEFAULT_LOGGER_ENV};
use log4rs::{Config, config::Root};
use logger::Builder;

pub use logger::LogError;

/// Builds a console configuration from a filters expression such as `"info,chunked_list=trace"`.
/// Specs found in the `RUST_LOG` environment variable are applied on top of `filters`.
fn build_config(filters: &str) -> Result<Config, LogError> {
    let loggers = Builder::new().parse_expression(filters).parse_env(DEFAULT_LOGGER_ENV).build();
    for rejected in loggers.rejected() {
        eprintln!("Ignoring invalid logging spec '{}'", rejected);
    }

    let root = Root::builder().appender(CONSOLE_APPENDER).build(loggers.root_level());
    Config::builder()
        .appender(AppenderSpec::console(CONSOLE_APPENDER, None).appender())
        .loggers(loggers.specs().iter().map(|x| x.logger(CONSOLE_APPENDER)))
        .build(root)
        .map_err(|err| LogError::ConfigError(err.to_string()))
}

/// Installs the console logger as the global `log` backend.
///
/// Fails if the expression produces an invalid configuration or if a global logger is already installed.
pub fn init_logger(filters: &str) -> Result<(), LogError> {
    let config = build_config(filters)?;
    log4rs::init_config(config).map_err(|err| LogError::InstallError(err.to_string()))?;
    Ok(())
}

/// Same as [`init_logger`] but silently keeps the already installed logger, so that every test
/// of a binary can call it.
pub fn try_init_logger(filters: &str) {
    let _ = init_logger(filters);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_init_logger_is_idempotent() {
        try_init_logger("info,chunked_core=trace");
        try_init_logger("debug");
        trace!("logger initialized twice");
        assert!(init_logger("info").is_err());
    }
}
