//! Structured logging for netpulse
//!
//! This module provides a small, ergonomic logging API with:
//! - Standard log levels (Error/Warning/Info/Debug/Verbose)
//! - Per-subsystem debug control via `--debug <tag>` flags
//! - Dual output: colored console (stdout or stderr) + optional file persistence
//!
//! ## Usage
//!
//! ```rust
//! use netpulse::logger::{self, LogTag};
//!
//! logger::warning(LogTag::Store, "Connection lost");
//! logger::info(LogTag::Monitor, "Monitor started");
//! logger::debug(LogTag::Prober, "Probe finished in 42ms"); // Only with --debug prober
//! logger::verbose(LogTag::Store, "Discarded stale result"); // Only with --verbose
//! ```
//!
//! ## Initialization
//!
//! Call once at startup with the config built from the command line:
//! ```rust,no_run
//! use netpulse::logger::{self, LoggerConfig};
//!
//! logger::init(LoggerConfig::default());
//! ```
//! Without `init` the defaults apply (info level, console only).

mod config;
mod core;
mod file;
mod format;
mod levels;
mod special;
mod tags;

pub use config::{get_logger_config, set_logger_config, ConsoleStream, LoggerConfig};
pub use levels::LogLevel;
pub use special::log_state_transition;
pub use tags::LogTag;

/// Initialize the logger system
///
/// Installs the configuration and opens the file sink when one is set.
/// A file sink that cannot be opened is reported and skipped; console
/// logging keeps working.
pub fn init(config: LoggerConfig) {
    let log_file = config.log_file.clone();
    set_logger_config(config);

    if let Some(path) = log_file {
        if let Err(e) = file::init_file_logging(&path) {
            error(
                LogTag::System,
                &format!("Failed to open log file '{}': {}", path.display(), e),
            );
        }
    }
}

/// Log at ERROR level (always shown)
pub fn error(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Error, message);
}

/// Log at WARNING level (shown unless --quiet)
pub fn warning(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Warning, message);
}

/// Log at INFO level (standard operations)
pub fn info(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Info, message);
}

/// Log at DEBUG level
///
/// Only shown when `--debug <tag>` names this tag (or `--verbose` is set).
pub fn debug(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Debug, message);
}

/// Log at VERBOSE level (very detailed tracing, `--verbose` only)
pub fn verbose(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Verbose, message);
}

/// Force flush all pending log writes
///
/// Call this during shutdown to ensure all logs are written to disk.
pub fn flush() {
    file::flush_file_logging();
}
