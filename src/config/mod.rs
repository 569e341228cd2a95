//! Configuration and token persistence
//!
//! Settings live in `config.toml`; captured tokens live in `tokens.json`
//! (the flat platform-to-credential mapping the browser extension also
//! understands). Both sit in the platform config directory.

use anyhow::{bail, Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::auth::{PersistenceError, TokenPersistence, TokenSnapshot};

/// Default port for the local extension bridge.
pub const DEFAULT_BRIDGE_PORT: u16 = 5847;

/// Keys accepted by `fitbridge config set/get`.
pub const CONFIG_KEYS: &[&str] = &[
    "intervals.apikey",
    "intervals.athleteid",
    "mywhoosh.riderid",
    "bridge.port",
];

/// Application configuration
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub intervals: IntervalsConfig,
    #[serde(default)]
    pub mywhoosh: MyWhooshConfig,
    #[serde(default)]
    pub bridge: BridgeConfig,
}

/// Intervals.icu credentials
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct IntervalsConfig {
    /// API key from https://intervals.icu/settings
    pub api_key: Option<String>,
    /// Athlete ID as shown on the profile (e.g. i12345)
    pub athlete_id: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct MyWhooshConfig {
    /// The rider's whoosh_uuid, pasted during login
    pub rider_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BridgeConfig {
    pub port: u16,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_BRIDGE_PORT,
        }
    }
}

impl Config {
    /// Get config directory path
    fn config_dir() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "fitbridge", "fitbridge")
            .context("Could not determine config directory")?;
        Ok(proj_dirs.config_dir().to_path_buf())
    }

    /// Get config file path
    fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from disk
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path).context("Failed to read config file")?;
        toml::from_str(&content).context("Failed to parse config file")
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let dir = Self::config_dir()?;
        fs::create_dir_all(&dir).context("Failed to create config directory")?;

        let path = Self::config_path()?;
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&path, content).context("Failed to write config file")?;

        // Set restrictive permissions on config file (contains API keys)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = fs::Permissions::from_mode(0o600);
            fs::set_permissions(&path, perms).context("Failed to set config permissions")?;
        }

        Ok(())
    }

    /// Set a value by its flat CLI key.
    pub fn set_key(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "intervals.apikey" => self.intervals.api_key = Some(value.to_string()),
            "intervals.athleteid" => self.intervals.athlete_id = Some(value.to_string()),
            "mywhoosh.riderid" => self.mywhoosh.rider_id = Some(value.to_string()),
            "bridge.port" => {
                self.bridge.port = value
                    .parse()
                    .with_context(|| format!("Invalid port: {}", value))?;
            }
            _ => bail!("Unknown config key '{}'. Keys: {}", key, CONFIG_KEYS.join(", ")),
        }
        Ok(())
    }

    /// Get a value by its flat CLI key.
    pub fn get_key(&self, key: &str) -> Result<Option<String>> {
        let value = match key {
            "intervals.apikey" => self.intervals.api_key.clone(),
            "intervals.athleteid" => self.intervals.athlete_id.clone(),
            "mywhoosh.riderid" => self.mywhoosh.rider_id.clone(),
            "bridge.port" => Some(self.bridge.port.to_string()),
            _ => bail!("Unknown config key '{}'. Keys: {}", key, CONFIG_KEYS.join(", ")),
        };
        Ok(value)
    }

    /// All key/value pairs for display, with secrets masked.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        CONFIG_KEYS
            .iter()
            .map(|&key| {
                let value = self.get_key(key).unwrap_or_default();
                let display = match value {
                    Some(v) if key.contains("apikey") => mask(&v),
                    Some(v) => v,
                    None => "(not set)".to_string(),
                };
                (key, display)
            })
            .collect()
    }
}

/// Mask a secret, keeping the last few characters so the user can tell
/// which key is configured.
fn mask(value: &str) -> String {
    if value.chars().count() <= 4 {
        return "****".to_string();
    }
    let suffix: String = value.chars().skip(value.chars().count() - 4).collect();
    format!("****{}", suffix)
}

/// JSON file backend for the token store.
pub struct TokenFile {
    path: PathBuf,
}

impl TokenFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Token file in the standard config directory.
    pub fn open_default() -> Result<Self> {
        Ok(Self::new(Config::config_dir()?.join("tokens.json")))
    }
}

impl TokenPersistence for TokenFile {
    fn load(&self) -> Result<TokenSnapshot, PersistenceError> {
        if !self.path.exists() {
            return Ok(TokenSnapshot::default());
        }
        let content =
            fs::read_to_string(&self.path).map_err(|e| PersistenceError::Io(e.to_string()))?;
        serde_json::from_str(&content).map_err(|e| PersistenceError::Serialization(e.to_string()))
    }

    fn save(&self, tokens: &TokenSnapshot) -> Result<(), PersistenceError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(|e| PersistenceError::Io(e.to_string()))?;
        }
        let content = serde_json::to_string_pretty(tokens)
            .map_err(|e| PersistenceError::Serialization(e.to_string()))?;
        fs::write(&self.path, content).map_err(|e| PersistenceError::Io(e.to_string()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = fs::Permissions::from_mode(0o600);
            fs::set_permissions(&self.path, perms)
                .map_err(|e| PersistenceError::Io(e.to_string()))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get_keys() {
        let mut config = Config::default();
        config.set_key("intervals.apikey", "secret-key").unwrap();
        config.set_key("intervals.athleteid", "i12345").unwrap();
        config.set_key("bridge.port", "6000").unwrap();

        assert_eq!(
            config.get_key("intervals.apikey").unwrap().as_deref(),
            Some("secret-key")
        );
        assert_eq!(
            config.get_key("intervals.athleteid").unwrap().as_deref(),
            Some("i12345")
        );
        assert_eq!(config.bridge.port, 6000);
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let mut config = Config::default();
        assert!(config.set_key("nope", "x").is_err());
        assert!(config.get_key("nope").is_err());
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let mut config = Config::default();
        assert!(config.set_key("bridge.port", "not-a-port").is_err());
    }

    #[test]
    fn test_default_bridge_port() {
        let config = Config::default();
        assert_eq!(config.bridge.port, DEFAULT_BRIDGE_PORT);
    }

    #[test]
    fn test_entries_mask_api_key() {
        let mut config = Config::default();
        config.set_key("intervals.apikey", "secret-key").unwrap();

        let entries = config.entries();
        let (_, apikey) = entries
            .iter()
            .find(|(key, _)| *key == "intervals.apikey")
            .unwrap();
        assert_eq!(apikey, "****-key");
        let (_, rider) = entries
            .iter()
            .find(|(key, _)| *key == "mywhoosh.riderid")
            .unwrap();
        assert_eq!(rider, "(not set)");
    }

    #[test]
    fn test_mask_keeps_recognizable_suffix() {
        assert_eq!(mask("abcdefgh1234"), "****1234");
        assert_eq!(mask("abc"), "****");
        assert_eq!(mask(""), "****");
    }

    #[test]
    fn test_token_file_roundtrip() {
        use crate::auth::Credential;

        let dir = std::env::temp_dir().join(format!("fitbridge-test-{}", std::process::id()));
        let file = TokenFile::new(dir.join("tokens.json"));

        let mut tokens = TokenSnapshot::default();
        tokens.insert(
            "mywhoosh".to_string(),
            Credential {
                token: "roundtrip-token-value".to_string(),
                captured_at: chrono::Utc::now(),
                expires_at: None,
            },
        );
        file.save(&tokens).unwrap();
        let loaded = file.load().unwrap();
        assert_eq!(loaded.get("mywhoosh").unwrap().token, "roundtrip-token-value");

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_token_file_missing_is_empty() {
        let file = TokenFile::new(PathBuf::from("/nonexistent/fitbridge/tokens.json"));
        assert!(file.load().unwrap().is_empty());
    }
}
