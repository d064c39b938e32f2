/// Logger configuration shared by every logging call
///
/// Built once at startup from parsed command-line arguments and stored in a
/// process-wide slot. Reads clone a small struct, so logging never blocks
/// on configuration updates for long.
use super::levels::LogLevel;
use super::tags::LogTag;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::collections::HashSet;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// Messages above this level are dropped (Error is always kept)
    pub min_level: LogLevel,

    /// Tags with debug output enabled
    pub debug_tags: HashSet<LogTag>,

    /// Optional file sink
    pub log_file: Option<PathBuf>,

    /// Colorize console output
    pub colors: bool,

    /// Where console lines go
    pub console: ConsoleStream,
}

/// Console destination for log lines
///
/// `Stderr` keeps stdout free for machine-readable output such as `--json`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleStream {
    Stdout,
    Stderr,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            min_level: LogLevel::Info,
            debug_tags: HashSet::new(),
            log_file: None,
            colors: true,
            console: ConsoleStream::Stdout,
        }
    }
}

impl LoggerConfig {
    /// Build a config from `--debug` values and the verbosity switches
    ///
    /// Unknown tag names are returned so the caller can report them.
    pub fn from_flags(
        debug: &[String],
        verbose: bool,
        quiet: bool,
    ) -> (Self, Vec<String>) {
        let mut config = Self::default();
        let mut unknown = Vec::new();

        for key in debug {
            if key.eq_ignore_ascii_case("all") {
                config.debug_tags.extend(LogTag::ALL);
                continue;
            }
            match LogTag::from_debug_key(key) {
                Some(tag) => {
                    config.debug_tags.insert(tag);
                }
                None => unknown.push(key.clone()),
            }
        }

        if !config.debug_tags.is_empty() {
            config.min_level = LogLevel::Debug;
        }
        if verbose {
            config.min_level = LogLevel::Verbose;
        }
        if quiet {
            config.min_level = LogLevel::Error;
        }

        (config, unknown)
    }
}

static LOGGER_CONFIG: Lazy<RwLock<LoggerConfig>> =
    Lazy::new(|| RwLock::new(LoggerConfig::default()));

pub fn get_logger_config() -> LoggerConfig {
    LOGGER_CONFIG.read().clone()
}

pub fn set_logger_config(config: LoggerConfig) {
    *LOGGER_CONFIG.write() = config;
}

impl LoggerConfig {
    pub fn is_debug_enabled_for_tag(&self, tag: &LogTag) -> bool {
        self.min_level == LogLevel::Verbose || self.debug_tags.contains(tag)
    }
}
