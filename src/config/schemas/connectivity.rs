use crate::config_struct;
use crate::errors::MonitorError;
use std::time::Duration;
use url::Url;

// ============================================================================
// CONNECTIVITY MONITOR CONFIGURATION
// ============================================================================

config_struct! {
    /// Connectivity monitor configuration
    pub struct MonitorConfig {
        /// Scheduler tick period while online, in milliseconds
        check_interval_ms: u64 = 30_000,

        /// Health-check path, or an absolute http(s) URL
        ping_url: String = "/api/health".to_string(),

        /// Origin that a relative ping_url is resolved against
        base_url: String = "http://127.0.0.1:8080".to_string(),

        /// Per-probe timeout in milliseconds
        timeout_ms: u64 = 5_000,

        /// Run the periodic scheduler at all
        enable_periodic_check: bool = true,

        /// Issue one silent probe at start when the host reports online
        check_on_start: bool = true,
    }
}

impl MonitorConfig {
    pub fn check_interval(&self) -> Duration {
        Duration::from_millis(self.check_interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Resolve the health-check URL
    ///
    /// An absolute `ping_url` is used as-is; anything else is joined onto
    /// `base_url`. Only http and https are accepted.
    pub fn probe_url(&self) -> Result<Url, MonitorError> {
        let invalid = |url: &str, reason: String| MonitorError::InvalidUrl {
            url: url.to_string(),
            reason,
        };

        let ping_url = self.ping_url.trim();
        if ping_url.is_empty() {
            return Err(invalid(ping_url, "empty health-check URL".to_string()));
        }

        let url = match Url::parse(ping_url) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                let base = Url::parse(self.base_url.trim())
                    .map_err(|e| invalid(&self.base_url, e.to_string()))?;
                if base.cannot_be_a_base() {
                    return Err(invalid(&self.base_url, "not a base URL".to_string()));
                }
                base.join(ping_url).map_err(|e| invalid(ping_url, e.to_string()))?
            }
            Err(e) => return Err(invalid(ping_url, e.to_string())),
        };

        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(invalid(
                url.as_str(),
                format!("unsupported scheme '{}'", other),
            )),
        }
    }

    /// Check every value the monitor depends on
    ///
    /// Returns the resolved probe URL so construction does not parse twice.
    pub fn validate(&self) -> Result<Url, MonitorError> {
        if self.timeout_ms == 0 {
            return Err(MonitorError::InvalidConfig(
                "timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.enable_periodic_check && self.check_interval_ms == 0 {
            return Err(MonitorError::InvalidConfig(
                "check_interval_ms must be greater than zero when periodic checks are enabled"
                    .to_string(),
            ));
        }
        self.probe_url()
    }
}
