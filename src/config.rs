//! Configuration management for Proofchain

use crate::error::ChainError;
use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub miner: MinerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_api_port")]
    pub api_port: u16,
    /// Host this node registers itself under.
    #[serde(default = "default_advertised_host")]
    pub advertised_host: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MinerConfig {
    /// How long a mine request waits for the proof search. Unset means
    /// wait as long as it takes.
    #[serde(default)]
    pub max_duration_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            api_port: default_api_port(),
            advertised_host: default_advertised_host(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl NetworkConfig {
    /// `host:port` the node advertises for itself.
    pub fn advertised_address(&self) -> String {
        format!("{}:{}", self.advertised_host, self.api_port)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.api_port)
    }
}

impl MinerConfig {
    pub fn max_duration(&self) -> Option<Duration> {
        self.max_duration_secs.map(Duration::from_secs)
    }
}

impl LoggingConfig {
    pub fn max_level(&self) -> Result<tracing::Level, ChainError> {
        tracing::Level::from_str(&self.level)
            .map_err(|_| ChainError::Config(format!("unknown logging.level {:?}", self.level)))
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ChainError> {
        if self.network.api_port == 0 {
            return Err(ChainError::Config("network.api_port must be non-zero".into()));
        }
        if self.network.bind_address.is_empty() {
            return Err(ChainError::Config("network.bind_address must be set".into()));
        }
        if self.network.advertised_host.is_empty() {
            return Err(ChainError::Config("network.advertised_host must be set".into()));
        }
        if self.miner.max_duration_secs == Some(0) {
            return Err(ChainError::Config(
                "miner.max_duration_secs must be positive when set".into(),
            ));
        }
        self.logging.max_level()?;
        Ok(())
    }
}

/// Load `config.toml` from the working directory.
pub fn load_config() -> Result<Config, ChainError> {
    load_config_from(DEFAULT_CONFIG_PATH)
}

/// Load and validate a config file. A missing file yields the defaults.
pub fn load_config_from(path: impl AsRef<Path>) -> Result<Config, ChainError> {
    let path = path.as_ref();
    let config = match fs::read_to_string(path) {
        Ok(contents) => toml::from_str(&contents)
            .map_err(|e| ChainError::Config(format!("{}: {}", path.display(), e)))?,
        Err(e) if e.kind() == ErrorKind::NotFound => Config::default(),
        Err(e) => return Err(e.into()),
    };

    config.validate()?;
    Ok(config)
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_api_port() -> u16 {
    8181
}

fn default_advertised_host() -> String {
    "127.0.0.1".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(dir.path().join("absent.toml")).unwrap();

        assert_eq!(config.network.api_port, 8181);
        assert_eq!(config.network.bind_addr(), "0.0.0.0:8181");
        assert_eq!(config.network.advertised_address(), "127.0.0.1:8181");
        assert_eq!(config.miner.max_duration(), None);
        assert_eq!(config.logging.max_level().unwrap(), tracing::Level::INFO);
    }

    #[test]
    fn test_partial_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[network]\napi_port = 9000\n\n[miner]\nmax_duration_secs = 30\n\n[logging]\nlevel = \"debug\""
        )
        .unwrap();

        let config = load_config_from(file.path()).unwrap();
        assert_eq!(config.network.api_port, 9000);
        assert_eq!(config.network.bind_address, "0.0.0.0");
        assert_eq!(config.miner.max_duration(), Some(Duration::from_secs(30)));
        assert_eq!(config.logging.max_level().unwrap(), tracing::Level::DEBUG);
    }

    #[test]
    fn test_invalid_values_rejected() {
        for body in [
            "[network]\napi_port = 0",
            "[network]\nadvertised_host = \"\"",
            "[miner]\nmax_duration_secs = 0",
            "[logging]\nlevel = \"loud\"",
            "[network]\napi_port = \"eighty\"",
        ] {
            let mut file = NamedTempFile::new().unwrap();
            write!(file, "{}", body).unwrap();
            let result = load_config_from(file.path());
            assert!(
                matches!(result, Err(ChainError::Config(_))),
                "{:?} should be rejected",
                body
            );
        }
    }
}
