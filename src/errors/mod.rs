/// Error types for netpulse
///
/// Only construction can fail. Probe failures are ordinary values
/// (`FailureReason`) folded into the connectivity state and never reach
/// callers as errors.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MonitorError {
    /// Health-check or base URL cannot be used
    #[error("Invalid health-check URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// A configuration value is out of range
    #[error("Invalid monitor configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to read config file '{path}': {source}")]
    ConfigRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    ConfigParse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    /// The HTTP client backing the prober could not be built
    #[error("Failed to create HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}
