//! Configuration file management.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Complete daemon configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Storage settings.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Rewards program settings.
    #[serde(default)]
    pub rewards: RewardsConfig,
    /// Identity provider settings.
    #[serde(default)]
    pub identity: IdentityConfig,
    /// Advanced settings.
    #[serde(default)]
    pub advanced: AdvancedConfig,
}

/// Storage configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Data directory. Empty = platform default.
    #[serde(default)]
    pub data_dir: String,
}

/// Rewards program configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardsConfig {
    /// Base URL referral links are built from.
    #[serde(default = "default_referral_link_base")]
    pub referral_link_base: String,
    /// UTC offset in minutes used to resolve "today" when a request
    /// does not carry one. 0 = UTC day boundaries.
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

/// Identity provider configuration.
///
/// v1 resolves bearer tokens against this static table; a production
/// deployment would point at the provider's verification endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Known tokens and the principals they resolve to.
    #[serde(default)]
    pub tokens: Vec<TokenEntry>,
}

/// One `[[identity.tokens]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenEntry {
    /// Bearer token presented in `auth_token`.
    pub token: String,
    /// Stable user identifier the token resolves to.
    pub user_id: String,
    /// Email recorded on the profile at first access.
    #[serde(default)]
    pub email: String,
}

/// Advanced configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvancedConfig {
    /// Log level: "debug" | "info" | "warn" | "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Log file path. Empty = stderr.
    #[serde(default)]
    pub log_file: String,
}

// Default value functions

fn default_referral_link_base() -> String {
    "https://tally.app".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for RewardsConfig {
    fn default() -> Self {
        Self {
            referral_link_base: default_referral_link_base(),
            utc_offset_minutes: 0,
        }
    }
}

impl Default for AdvancedConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_file: String::new(),
        }
    }
}

impl DaemonConfig {
    /// Load configuration from the default config file location.
    ///
    /// Falls back to defaults if file does not exist.
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();
        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: DaemonConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Get the data directory path.
    pub fn data_dir(&self) -> PathBuf {
        if self.storage.data_dir.is_empty() {
            Self::default_data_dir()
        } else {
            PathBuf::from(&self.storage.data_dir)
        }
    }

    /// Get the config file path.
    fn config_path() -> PathBuf {
        // Check env var override first
        if let Ok(dir) = std::env::var("TALLY_DATA_DIR") {
            return PathBuf::from(dir).join("config.toml");
        }
        Self::default_data_dir().join("config.toml")
    }

    /// Platform-specific default data directory.
    fn default_data_dir() -> PathBuf {
        if let Ok(dir) = std::env::var("TALLY_DATA_DIR") {
            return PathBuf::from(dir);
        }
        #[cfg(target_os = "macos")]
        {
            dirs_fallback("Library/Application Support/Tally")
        }
        #[cfg(target_os = "linux")]
        {
            dirs_fallback(".tally")
        }
        #[cfg(target_os = "windows")]
        {
            dirs_fallback("Tally")
        }
        #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
        {
            dirs_fallback(".tally")
        }
    }
}

/// Fallback home directory resolution.
fn dirs_fallback(subpath: &str) -> PathBuf {
    std::env::var("HOME")
        .map(|h| PathBuf::from(h).join(subpath))
        .unwrap_or_else(|_| PathBuf::from("/tmp/tally"))
}
