//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports TOML and JSON formats
//!
//! ## Environment Variables
//! - `TERRASYNC_FTP_HOST`: target FTP server
//! - `TERRASYNC_FTP_PORT`: control port (default 21)
//! - `TERRASYNC_FTP_USERNAME`: credentials (falls back to `FTP_USERNAME`)
//! - `TERRASYNC_FTP_PASSWORD`: credentials (falls back to `FTP_PASSWORD`)
//! - `TERRASYNC_FTP_PASSIVE`: passive-mode transfers (true/false)
//! - `TERRASYNC_PROBE_PORT`: reachability probe port (default 443)
//! - `TERRASYNC_CONNECT_TIMEOUT_MS`: probe handshake timeout
//! - `TERRASYNC_PROBE_ATTEMPTS`: connectivity polling bound
//! - `TERRASYNC_PROBE_INTERVAL_SECS`: fixed polling interval
//! - `TERRASYNC_MAX_ATTEMPTS`: per-step retry bound
//! - `TERRASYNC_BASE_DELAY_SECS`: backoff base delay
//! - `TERRASYNC_REMOTE_DATA_DIR`: remote directory with property data
//! - `TERRASYNC_REMOTE_EXPORT_PATH`: remote destination of the export
//! - `TERRASYNC_DATA_DIR`: local data directory
//!
//! ## File Locations
//! The loader probes `./config.toml`, `./config.json`,
//! `./terrasync.toml`, `./terrasync.json` in the current working
//! directory.

use std::path::{Path, PathBuf};

use terrasync_domain::{
    Config, FtpConfig, PathsConfig, ProbeConfig, Result, RetrySettings, SyncError,
};

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If the required
/// variables are missing, falls back to loading from a config file.
///
/// # Errors
/// Returns `SyncError::Config` if configuration cannot be loaded from
/// either source.
pub fn load() -> Result<Config> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "environment incomplete, trying config file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables.
///
/// Host and credentials are required; everything else falls back to the
/// documented defaults.
///
/// # Errors
/// Returns `SyncError::Config` if a required variable is missing or a
/// value fails to parse.
pub fn load_from_env() -> Result<Config> {
    let host = env_var("TERRASYNC_FTP_HOST")?;
    let username = env_var_with_fallback("TERRASYNC_FTP_USERNAME", "FTP_USERNAME")?;
    let password = env_var_with_fallback("TERRASYNC_FTP_PASSWORD", "FTP_PASSWORD")?;

    let defaults = Config {
        ftp: FtpConfig { host, port: 21, username, password, passive: true },
        probe: ProbeConfig::default(),
        retry: RetrySettings::default(),
        paths: PathsConfig::default(),
    };

    Ok(Config {
        ftp: FtpConfig {
            port: env_parsed("TERRASYNC_FTP_PORT", defaults.ftp.port)?,
            passive: env_bool("TERRASYNC_FTP_PASSIVE", defaults.ftp.passive),
            ..defaults.ftp
        },
        probe: ProbeConfig {
            port: env_parsed("TERRASYNC_PROBE_PORT", defaults.probe.port)?,
            timeout_ms: env_parsed("TERRASYNC_CONNECT_TIMEOUT_MS", defaults.probe.timeout_ms)?,
            max_attempts: env_parsed("TERRASYNC_PROBE_ATTEMPTS", defaults.probe.max_attempts)?,
            interval_secs: env_parsed(
                "TERRASYNC_PROBE_INTERVAL_SECS",
                defaults.probe.interval_secs,
            )?,
        },
        retry: RetrySettings {
            max_attempts: env_parsed("TERRASYNC_MAX_ATTEMPTS", defaults.retry.max_attempts)?,
            base_delay_secs: env_parsed(
                "TERRASYNC_BASE_DELAY_SECS",
                defaults.retry.base_delay_secs,
            )?,
        },
        paths: PathsConfig {
            remote_data_dir: env_or("TERRASYNC_REMOTE_DATA_DIR", &defaults.paths.remote_data_dir),
            remote_export_path: env_or(
                "TERRASYNC_REMOTE_EXPORT_PATH",
                &defaults.paths.remote_export_path,
            ),
            data_dir: env_or("TERRASYNC_DATA_DIR", &defaults.paths.data_dir),
        },
    })
}

/// Load configuration from a file, probing the default locations when
/// `path` is `None`.
///
/// # Errors
/// Returns `SyncError::Config` when no file is found or the contents do
/// not parse.
pub fn load_from_file(path: Option<&Path>) -> Result<Config> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => probe_default_paths().ok_or_else(|| {
            SyncError::Config("no configuration file found in the working directory".to_string())
        })?,
    };

    let contents = std::fs::read_to_string(&path)
        .map_err(|e| SyncError::Config(format!("cannot read {}: {e}", path.display())))?;

    let config = match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => toml::from_str(&contents)
            .map_err(|e| SyncError::Config(format!("invalid TOML in {}: {e}", path.display())))?,
        Some("json") => serde_json::from_str(&contents)
            .map_err(|e| SyncError::Config(format!("invalid JSON in {}: {e}", path.display())))?,
        _ => {
            return Err(SyncError::Config(format!(
                "unsupported config format: {}",
                path.display()
            )))
        }
    };

    tracing::info!(path = %path.display(), "configuration loaded from file");
    Ok(config)
}

fn probe_default_paths() -> Option<PathBuf> {
    ["config.toml", "config.json", "terrasync.toml", "terrasync.json"]
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
}

fn env_var(name: &str) -> Result<String> {
    std::env::var(name)
        .map_err(|_| SyncError::Config(format!("missing environment variable {name}")))
}

fn env_var_with_fallback(name: &str, fallback: &str) -> Result<String> {
    std::env::var(name).or_else(|_| std::env::var(fallback)).map_err(|_| {
        SyncError::Config(format!("missing environment variable {name} (or {fallback})"))
    })
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_bool(name: &str, default: bool) -> bool {
    match std::env::var(name) {
        Ok(value) => matches!(value.to_lowercase().as_str(), "1" | "true" | "yes"),
        Err(_) => default,
    }
}

fn env_parsed<T: std::str::FromStr>(name: &str, default: T) -> Result<T> {
    match std::env::var(name) {
        Ok(value) => value
            .parse::<T>()
            .map_err(|_| SyncError::Config(format!("invalid value for {name}: {value:?}"))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_loading_parses_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
                [ftp]
                host = "ftp.spatialest.com"
                username = "county"
                password = "secret"
                passive = false

                [retry]
                max_attempts = 5
                base_delay_secs = 2
            "#,
        )
        .unwrap();

        let config = load_from_file(Some(&path)).unwrap();
        assert_eq!(config.ftp.host, "ftp.spatialest.com");
        assert!(!config.ftp.passive);
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.probe.port, 443);
    }

    #[test]
    fn file_loading_parses_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"ftp": {"host": "h", "username": "u", "password": "p"}}"#,
        )
        .unwrap();

        let config = load_from_file(Some(&path)).unwrap();
        assert_eq!(config.ftp.port, 21);
        assert_eq!(config.paths.remote_export_path, "/export.csv");
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "ftp:\n").unwrap();
        assert!(matches!(
            load_from_file(Some(&path)),
            Err(SyncError::Config(_))
        ));
    }
}
