//! Client Configuration
//!
//! Settings are layered, later sources overriding earlier ones:
//! - built-in defaults
//! - an optional TOML file (`~/.voicejudge/config.toml` or `--config`)
//! - environment variables and command-line flags (collected by the binary
//!   into a [`ConfigOverrides`])

use alloy::primitives::Address;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::DEFAULT_MODEL_NAME;

const CONFIG_DIR_NAME: &str = ".voicejudge";
const CONFIG_FILE_NAME: &str = "config.toml";

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:5000";
pub const DEFAULT_ACCOUNT_POLL_SECS: u64 = 2;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config from {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid {field} URL '{value}': {reason}")]
    InvalidUrl {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("Invalid {field} address '{value}'")]
    InvalidAddress { field: &'static str, value: String },

    #[error("Model name must not be empty")]
    EmptyModelName,
}

/// Complete client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the proving backend
    pub backend_url: String,
    /// Model name sent with every backend request
    pub model_name: String,
    /// Chain RPC URL, used for contract reads and passed to `/verifyproof`
    pub network_url: Option<String>,
    /// Marketplace contract exposing `getModel`
    pub marketplace_address: Option<String>,
    /// Verifier used when the model descriptor carries none
    pub verifier_address: Option<String>,
    /// Per-request timeout; requests may wait indefinitely when unset or 0
    pub request_timeout_secs: Option<u64>,
    pub wallet: WalletConfig,
}

/// Wallet provider selection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WalletConfig {
    /// JSON-RPC wallet endpoint
    pub url: Option<String>,
    /// Fixed account; takes precedence over `url`
    pub account: Option<String>,
    /// Interval between `eth_accounts` polls
    pub poll_interval_secs: u64,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            url: None,
            account: None,
            poll_interval_secs: DEFAULT_ACCOUNT_POLL_SECS,
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            model_name: DEFAULT_MODEL_NAME.to_string(),
            network_url: None,
            marketplace_address: None,
            verifier_address: None,
            request_timeout_secs: None,
            wallet: WalletConfig::default(),
        }
    }
}

/// Values supplied through the environment or the command line
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub backend_url: Option<String>,
    pub model_name: Option<String>,
    pub network_url: Option<String>,
    pub marketplace_address: Option<String>,
    pub verifier_address: Option<String>,
    pub wallet_url: Option<String>,
    pub account: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub account_poll_secs: Option<u64>,
}

/// `~/.voicejudge/config.toml`, if a home directory can be determined
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

impl ClientConfig {
    /// Load from an explicit file, or from the default location when it
    /// exists. An explicit path that cannot be read is an error; a missing
    /// default file yields the built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => match default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => {
                    debug!("No config file found, using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Apply environment/CLI values on top of the file values
    pub fn apply(&mut self, overrides: ConfigOverrides) {
        if let Some(v) = overrides.backend_url {
            self.backend_url = v;
        }
        if let Some(v) = overrides.model_name {
            self.model_name = v;
        }
        if overrides.network_url.is_some() {
            self.network_url = overrides.network_url;
        }
        if overrides.marketplace_address.is_some() {
            self.marketplace_address = overrides.marketplace_address;
        }
        if overrides.verifier_address.is_some() {
            self.verifier_address = overrides.verifier_address;
        }
        if overrides.wallet_url.is_some() {
            self.wallet.url = overrides.wallet_url;
        }
        if overrides.account.is_some() {
            self.wallet.account = overrides.account;
        }
        if overrides.request_timeout_secs.is_some() {
            self.request_timeout_secs = overrides.request_timeout_secs;
        }
        if let Some(v) = overrides.account_poll_secs {
            self.wallet.poll_interval_secs = v;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model_name.trim().is_empty() {
            return Err(ConfigError::EmptyModelName);
        }
        self.backend_url()?;
        if let Some(url) = &self.network_url {
            parse_url("network", url)?;
        }
        if let Some(url) = &self.wallet.url {
            parse_url("wallet", url)?;
        }
        if let Some(addr) = &self.marketplace_address {
            parse_address("marketplace", addr)?;
        }
        if let Some(addr) = &self.verifier_address {
            parse_address("verifier", addr)?;
        }
        if let Some(account) = &self.wallet.account {
            parse_address("account", account)?;
        }
        Ok(())
    }

    pub fn backend_url(&self) -> Result<Url, ConfigError> {
        parse_url("backend", &self.backend_url)
    }

    pub fn marketplace_address(&self) -> Result<Option<Address>, ConfigError> {
        self.marketplace_address
            .as_deref()
            .map(|addr| parse_address("marketplace", addr))
            .transpose()
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs
            .filter(|&secs| secs > 0)
            .map(Duration::from_secs)
    }

    pub fn account_poll_interval(&self) -> Duration {
        Duration::from_secs(self.wallet.poll_interval_secs.max(1))
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

fn parse_url(field: &'static str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|e| ConfigError::InvalidUrl {
        field,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

fn parse_address(field: &'static str, value: &str) -> Result<Address, ConfigError> {
    Address::from_str(value).map_err(|_| ConfigError::InvalidAddress {
        field,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDR: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.model_name, "VoiceJudge3");
        assert_eq!(config.backend_url, DEFAULT_BACKEND_URL);
        assert!(config.request_timeout().is_none());
        assert_eq!(config.account_poll_interval(), Duration::from_secs(2));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ClientConfig::from_toml(
            r#"
            backend_url = "https://prover.example.com"

            [wallet]
            account = "0x5FbDB2315678afecb367f032d93F642f64180aa3"
            "#,
        )
        .unwrap();
        assert_eq!(config.backend_url, "https://prover.example.com");
        assert_eq!(config.model_name, "VoiceJudge3");
        assert_eq!(config.wallet.account.as_deref(), Some(ADDR));
        assert_eq!(config.wallet.poll_interval_secs, DEFAULT_ACCOUNT_POLL_SECS);
    }

    #[test]
    fn test_overrides_win() {
        let mut config = ClientConfig::default();
        config.network_url = Some("http://file-rpc:8545".to_string());
        config.apply(ConfigOverrides {
            backend_url: Some("http://other:5000".to_string()),
            network_url: Some("http://cli-rpc:8545".to_string()),
            request_timeout_secs: Some(30),
            ..Default::default()
        });
        assert_eq!(config.backend_url, "http://other:5000");
        assert_eq!(config.network_url.as_deref(), Some("http://cli-rpc:8545"));
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.model_name, "VoiceJudge3");
    }

    #[test]
    fn test_zero_timeout_means_none() {
        let mut config = ClientConfig::default();
        config.apply(ConfigOverrides {
            request_timeout_secs: Some(0),
            ..Default::default()
        });
        assert_eq!(config.request_timeout(), None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = ClientConfig::default();
        config.backend_url = "not a url".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidUrl { field: "backend", .. })
        ));

        let mut config = ClientConfig::default();
        config.marketplace_address = Some("0x1234".to_string());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidAddress {
                field: "marketplace",
                ..
            })
        ));

        let mut config = ClientConfig::default();
        config.model_name = "  ".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::EmptyModelName)));
    }

    #[test]
    fn test_marketplace_address_parsed() {
        let mut config = ClientConfig::default();
        assert!(config.marketplace_address().unwrap().is_none());
        config.marketplace_address = Some(ADDR.to_string());
        let addr = config.marketplace_address().unwrap().unwrap();
        assert_eq!(addr, Address::from_str(ADDR).unwrap());
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "model_name = \"OtherModel\"\n").unwrap();
        let config = ClientConfig::load(Some(&path)).unwrap();
        assert_eq!(config.model_name, "OtherModel");

        let missing = dir.path().join("missing.toml");
        assert!(matches!(
            ClientConfig::load(Some(&missing)),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn test_toml_roundtrip_preserves_wallet() {
        let mut config = ClientConfig::default();
        config.wallet.url = Some("http://127.0.0.1:1248".to_string());
        let text = config.to_toml().unwrap();
        let parsed = ClientConfig::from_toml(&text).unwrap();
        assert_eq!(parsed.wallet.url, config.wallet.url);
    }

    #[test]
    fn test_poll_interval_floor() {
        let mut config = ClientConfig::default();
        config.wallet.poll_interval_secs = 0;
        assert_eq!(config.account_poll_interval(), Duration::from_secs(1));
    }
}
