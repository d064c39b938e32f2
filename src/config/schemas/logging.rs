use crate::config_struct;

config_struct! {
    /// Logging configuration, overridden by command-line flags
    pub struct LoggingConfig {
        /// Minimum level: error, warning, info, debug, verbose
        level: String = "info".to_string(),

        /// Tags with debug output enabled (e.g. ["prober", "scheduler"])
        debug: Vec<String> = Vec::new(),

        /// Optional log file path
        file: Option<String> = None,

        /// Colorize console output
        colors: bool = true,
    }
}
