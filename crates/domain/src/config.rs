//! Configuration structures
//!
//! Values are loaded by the infra config loader from environment
//! variables with a file fallback; nothing here reads the environment
//! itself.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_FTP_PORT, DEFAULT_PROBE_PORT};

/// Top-level application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub ftp: FtpConfig,
    #[serde(default)]
    pub probe: ProbeConfig,
    #[serde(default)]
    pub retry: RetrySettings,
    #[serde(default)]
    pub paths: PathsConfig,
}

/// Remote endpoint coordinates and credentials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FtpConfig {
    pub host: String,
    #[serde(default = "default_ftp_port")]
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Passive-mode transfers; the common choice behind NAT.
    #[serde(default = "default_true")]
    pub passive: bool,
}

/// Connectivity probe tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeConfig {
    #[serde(default = "default_probe_port")]
    pub port: u16,
    /// Connection handshake timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Fixed-interval polling bound while waiting for connectivity.
    #[serde(default = "default_probe_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_probe_interval")]
    pub interval_secs: u64,
}

impl ProbeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PROBE_PORT,
            timeout_ms: default_timeout_ms(),
            max_attempts: default_probe_attempts(),
            interval_secs: default_probe_interval(),
        }
    }
}

/// Retry bounds applied to each transfer step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrySettings {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_base_delay")]
    pub base_delay_secs: u64,
}

impl RetrySettings {
    pub fn base_delay(&self) -> Duration {
        Duration::from_secs(self.base_delay_secs)
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self { max_attempts: default_max_attempts(), base_delay_secs: default_base_delay() }
    }
}

/// Local and remote paths used by a synchronization run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Remote directory scanned for property data files.
    #[serde(default = "default_remote_data_dir")]
    pub remote_data_dir: String,
    /// Remote destination of the record export.
    #[serde(default = "default_remote_export_path")]
    pub remote_export_path: String,
    /// Local directory receiving downloaded data files and the manifest.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            remote_data_dir: default_remote_data_dir(),
            remote_export_path: default_remote_export_path(),
            data_dir: default_data_dir(),
        }
    }
}

fn default_ftp_port() -> u16 {
    DEFAULT_FTP_PORT
}

fn default_probe_port() -> u16 {
    DEFAULT_PROBE_PORT
}

fn default_true() -> bool {
    true
}

fn default_timeout_ms() -> u64 {
    5_000
}

fn default_probe_attempts() -> u32 {
    5
}

fn default_probe_interval() -> u64 {
    1
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay() -> u64 {
    5
}

fn default_remote_data_dir() -> String {
    "/".to_string()
}

fn default_remote_export_path() -> String {
    "/export.csv".to_string()
}

fn default_data_dir() -> String {
    "data/benton-county".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let retry = RetrySettings::default();
        assert_eq!(retry.max_attempts, 3);
        assert_eq!(retry.base_delay(), Duration::from_secs(5));

        let probe = ProbeConfig::default();
        assert_eq!(probe.port, 443);
        assert_eq!(probe.timeout(), Duration::from_millis(5_000));
    }

    #[test]
    fn config_deserializes_with_partial_sections() {
        let toml = r#"
            [ftp]
            host = "ftp.spatialest.com"
            username = "county"
            password = "secret"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.ftp.port, 21);
        assert!(config.ftp.passive);
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.paths.remote_export_path, "/export.csv");
    }
}
