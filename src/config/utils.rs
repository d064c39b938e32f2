use super::schemas::Config;
/// Configuration utilities - loading and parsing
///
/// The monitor takes its configuration by value at construction; there is
/// no global config slot. These helpers only turn a TOML file into a
/// `Config`.
use crate::errors::MonitorError;
use crate::logger::{self, LogTag};
use std::path::Path;

/// Default configuration file path
pub const CONFIG_FILE_PATH: &str = "netpulse.toml";

/// Load configuration from a specific file path
///
/// A missing file is not an error: defaults are used and a warning is
/// logged. A file that exists but cannot be read or parsed is an error.
pub fn load_config_from_path(path: impl AsRef<Path>) -> Result<Config, MonitorError> {
    let path = path.as_ref();

    if !path.exists() {
        logger::warning(
            LogTag::Config,
            &format!("Config file '{}' not found, using default values", path.display()),
        );
        return Ok(Config::default());
    }

    let contents = std::fs::read_to_string(path).map_err(|source| MonitorError::ConfigRead {
        path: path.display().to_string(),
        source,
    })?;

    let config = parse_config(&contents).map_err(|source| MonitorError::ConfigParse {
        path: path.display().to_string(),
        source,
    })?;

    logger::debug(
        LogTag::Config,
        &format!("Loaded config from '{}'", path.display()),
    );

    Ok(config)
}

/// Parse configuration from TOML text
pub fn parse_config(contents: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(contents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = parse_config(
            r#"
            [monitor]
            ping_url = "/healthz"
            timeout_ms = 1500
            "#,
        )
        .unwrap();

        assert_eq!(config.monitor.ping_url, "/healthz");
        assert_eq!(config.monitor.timeout_ms, 1500);
        assert_eq!(config.monitor.check_interval_ms, 30_000);
        assert!(config.monitor.enable_periodic_check);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[monitor]\nenable_periodic_check = false\n\n[logging]\ndebug = [\"prober\"]"
        )
        .unwrap();

        let config = load_config_from_path(file.path()).unwrap();
        assert!(!config.monitor.enable_periodic_check);
        assert_eq!(config.logging.debug, vec!["prober".to_string()]);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from_path(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[monitor]\ntimeout_ms = \"soon\"").unwrap();

        let err = load_config_from_path(file.path()).unwrap_err();
        assert!(matches!(err, MonitorError::ConfigParse { .. }));
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
