/// Command-line arguments for the netpulse binary
///
/// Flags override values from the config file; logging flags are merged
/// with the `[logging]` section.
use crate::config::{Config, LoggingConfig, CONFIG_FILE_PATH};
use crate::logger::{ConsoleStream, LogLevel, LoggerConfig};
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "netpulse",
    version,
    about = "Watch connectivity to a backend health endpoint",
    long_about = "Watch connectivity to a backend health endpoint.\n\n\
        Interactive commands on stdin: online, offline, visible, hidden, \
        recheck, status, help, quit"
)]
pub struct Arguments {
    /// Path to the TOML config file
    #[arg(short, long, default_value = CONFIG_FILE_PATH)]
    pub config: PathBuf,

    /// Origin relative ping URLs are resolved against
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Health-check path or absolute URL
    #[arg(long, value_name = "URL")]
    pub ping_url: Option<String>,

    /// Periodic check interval in milliseconds
    #[arg(long, value_name = "MS")]
    pub interval_ms: Option<u64>,

    /// Per-probe timeout in milliseconds
    #[arg(long, value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Disable periodic checks
    #[arg(long)]
    pub no_periodic: bool,

    /// Run a single check, print it and exit (status 0 if the endpoint answered, 1 otherwise)
    #[arg(long)]
    pub once: bool,

    /// Print state snapshots as JSON
    #[arg(long)]
    pub json: bool,

    /// Enable debug logs for a subsystem (repeatable, or "all")
    #[arg(long = "debug", value_name = "TAG")]
    pub debug: Vec<String>,

    /// Show every log level
    #[arg(short, long)]
    pub verbose: bool,

    /// Only show errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Append logs to this file
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

impl Arguments {
    /// Apply command-line overrides on top of the loaded config
    pub fn apply_overrides(&self, config: &mut Config) {
        let monitor = &mut config.monitor;
        if let Some(base_url) = &self.base_url {
            monitor.base_url = base_url.clone();
        }
        if let Some(ping_url) = &self.ping_url {
            monitor.ping_url = ping_url.clone();
        }
        if let Some(interval_ms) = self.interval_ms {
            monitor.check_interval_ms = interval_ms;
        }
        if let Some(timeout_ms) = self.timeout_ms {
            monitor.timeout_ms = timeout_ms;
        }
        if self.no_periodic || self.once {
            monitor.enable_periodic_check = false;
        }
        if self.once {
            // The explicit recheck is the only probe in one-shot mode
            monitor.check_on_start = false;
        }
    }

    /// Build the logger config; returns warnings for values that were ignored
    pub fn logger_config(&self, logging: &LoggingConfig) -> (LoggerConfig, Vec<String>) {
        let mut debug = logging.debug.clone();
        debug.extend(self.debug.iter().cloned());

        let (mut config, unknown) = LoggerConfig::from_flags(&debug, self.verbose, self.quiet);
        let mut warnings: Vec<String> = unknown
            .into_iter()
            .map(|tag| format!("Unknown debug tag '{}' ignored", tag))
            .collect();

        if !self.verbose && !self.quiet {
            match LogLevel::from_str(&logging.level) {
                Some(level) if config.debug_tags.is_empty() => config.min_level = level,
                Some(level) => config.min_level = level.max(LogLevel::Debug),
                None => warnings.push(format!(
                    "Unknown log level '{}', using {}",
                    logging.level, config.min_level
                )),
            }
        }

        config.log_file = self
            .log_file
            .clone()
            .or_else(|| logging.file.as_ref().map(PathBuf::from));
        config.colors = logging.colors && !self.no_color;
        if self.json {
            // stdout carries only JSON snapshots
            config.console = ConsoleStream::Stderr;
        }

        (config, warnings)
    }
}
