//! Configuration: schemas with embedded defaults plus TOML loading

mod macros;
pub mod schemas;
pub mod utils;

pub use schemas::{Config, LoggingConfig, MonitorConfig};
pub use utils::{load_config_from_path, parse_config, CONFIG_FILE_PATH};
