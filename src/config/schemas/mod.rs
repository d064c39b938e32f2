// Config schema submodule - one file per section

use crate::config_struct;

mod connectivity;
mod logging;

pub use connectivity::*;
pub use logging::*;

// ============================================================================
// ROOT CONFIGURATION
// ============================================================================

config_struct! {
    /// Root configuration structure containing all sub-configurations
    pub struct Config {
        /// Connectivity monitor configuration
        monitor: MonitorConfig = MonitorConfig::default(),

        /// Logging configuration
        logging: LoggingConfig = LoggingConfig::default(),
    }
}
