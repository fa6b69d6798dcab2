use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crm_client::HttpBackendConfig;
use crm_format::NumberFormat;
use crm_meta::{DisplayDefaults, FALLBACK_CURRENCY};
use crm_views::{FileStorage, LocalStorage, MemoryStorage};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Points at a TOML file read before the individual variables below.
pub const CONFIG_PATH_VAR: &str = "CRM_DESK_CONFIG";

const ENV_BASE_URL: &str = "CRM_BASE_URL";
const ENV_API_KEY: &str = "CRM_API_KEY";
const ENV_API_SECRET: &str = "CRM_API_SECRET";
const ENV_DEFAULT_CURRENCY: &str = "CRM_DEFAULT_CURRENCY";
const ENV_NUMBER_FORMAT: &str = "CRM_NUMBER_FORMAT";
const ENV_TIMEOUT_SECS: &str = "CRM_TIMEOUT_SECS";
const ENV_STORAGE_PATH: &str = "CRM_STORAGE_PATH";
const ENV_USER: &str = "CRM_USER";

/// Session user when none is configured.
pub const GUEST_USER: &str = "Guest";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeskConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    /// Email of the logged-in user.
    pub user: String,
    pub default_currency: String,
    pub number_format: String,
    pub timeout_secs: u64,
    /// Where default open views are kept between sessions. Falls back to the
    /// platform data directory.
    pub storage_path: Option<PathBuf>,
    /// Keep local storage in memory only.
    pub ephemeral_storage: bool,
}

impl Default for DeskConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            api_key: None,
            api_secret: None,
            user: GUEST_USER.to_string(),
            default_currency: FALLBACK_CURRENCY.to_string(),
            number_format: NumberFormat::WESTERN.pattern().to_string(),
            timeout_secs: 30,
            storage_path: None,
            ephemeral_storage: false,
        }
    }
}

impl DeskConfig {
    /// Defaults, then the file named by `CRM_DESK_CONFIG`, then individual
    /// `CRM_*` variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = match std::env::var(CONFIG_PATH_VAR) {
            Ok(path) => Self::load_from(Path::new(&path))?,
            Err(_) => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&content)?)
    }

    /// Override fields from `lookup`, a stand-in for the process environment.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = lookup(ENV_BASE_URL) {
            self.base_url = url;
        }
        if let Some(key) = lookup(ENV_API_KEY) {
            self.api_key = Some(key);
        }
        if let Some(secret) = lookup(ENV_API_SECRET) {
            self.api_secret = Some(secret);
        }
        if let Some(user) = lookup(ENV_USER) {
            self.user = user.trim().to_string();
        }
        if let Some(currency) = lookup(ENV_DEFAULT_CURRENCY) {
            self.default_currency = currency.trim().to_uppercase();
        }
        if let Some(pattern) = lookup(ENV_NUMBER_FORMAT) {
            self.number_format = pattern;
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            self.timeout_secs = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: ENV_TIMEOUT_SECS,
                value: raw.clone(),
            })?;
        }
        if let Some(path) = lookup(ENV_STORAGE_PATH) {
            self.storage_path = Some(PathBuf::from(path));
        }
        Ok(())
    }

    pub fn backend_config(&self) -> HttpBackendConfig {
        let mut config = HttpBackendConfig::new(self.base_url.clone());
        config.api_key = self.api_key.clone();
        config.api_secret = self.api_secret.clone();
        config.timeout = Duration::from_secs(self.timeout_secs);
        config
    }

    pub fn display_defaults(&self) -> DisplayDefaults {
        DisplayDefaults {
            currency: self.default_currency.clone(),
            number_format: NumberFormat::parse(&self.number_format),
        }
    }

    /// Explicit storage path, else `<data dir>/crm-desk/storage.json`.
    pub fn resolved_storage_path(&self) -> Option<PathBuf> {
        self.storage_path
            .clone()
            .or_else(|| dirs::data_dir().map(|dir| dir.join("crm-desk").join("storage.json")))
    }

    pub fn open_storage(&self) -> Arc<dyn LocalStorage> {
        if self.ephemeral_storage {
            return Arc::new(MemoryStorage::new());
        }
        match self.resolved_storage_path() {
            Some(path) => Arc::new(FileStorage::new(path)),
            None => {
                tracing::warn!("no data directory, keeping local storage in memory");
                Arc::new(MemoryStorage::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn overrides_from_environment() {
        let mut config = DeskConfig::default();
        config
            .apply_overrides(env(&[
                ("CRM_BASE_URL", "https://crm.example.com"),
                ("CRM_API_KEY", "key"),
                ("CRM_API_SECRET", "secret"),
                ("CRM_DEFAULT_CURRENCY", " inr "),
                ("CRM_NUMBER_FORMAT", "#,##,###.##"),
                ("CRM_TIMEOUT_SECS", "5"),
                ("CRM_STORAGE_PATH", "/tmp/desk.json"),
                ("CRM_USER", "jane@example.com"),
            ]))
            .unwrap();

        assert_eq!(config.base_url, "https://crm.example.com");
        assert_eq!(config.default_currency, "INR");
        assert_eq!(config.user, "jane@example.com");
        assert_eq!(config.display_defaults().number_format, NumberFormat::INDIAN);
        assert_eq!(config.backend_config().timeout, Duration::from_secs(5));
        assert_eq!(config.backend_config().api_key.as_deref(), Some("key"));
        assert_eq!(config.resolved_storage_path(), Some(PathBuf::from("/tmp/desk.json")));
    }

    #[test]
    fn blank_variables_are_ignored() {
        let mut config = DeskConfig::default();
        config
            .apply_overrides(env(&[("CRM_BASE_URL", "  "), ("CRM_DEFAULT_CURRENCY", "")]))
            .unwrap();
        assert_eq!(config, DeskConfig::default());
    }

    #[test]
    fn bad_timeout_is_rejected() {
        let mut config = DeskConfig::default();
        let err = config
            .apply_overrides(env(&[("CRM_TIMEOUT_SECS", "soon")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "CRM_TIMEOUT_SECS", .. }));
    }

    #[test]
    fn toml_file_with_partial_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("desk.toml");
        std::fs::write(
            &path,
            "base_url = \"https://crm.example.com\"\ndefault_currency = \"EUR\"\nephemeral_storage = true\n",
        )
        .unwrap();

        let config = DeskConfig::load_from(&path).unwrap();
        assert_eq!(config.base_url, "https://crm.example.com");
        assert_eq!(config.default_currency, "EUR");
        assert_eq!(config.timeout_secs, 30);
        assert!(config.ephemeral_storage);
    }

    #[test]
    fn missing_or_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            DeskConfig::load_from(&dir.path().join("nope.toml")),
            Err(ConfigError::Read { .. })
        ));

        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "timeout_secs = \"x\"").unwrap();
        assert!(matches!(DeskConfig::load_from(&path), Err(ConfigError::Parse(_))));
    }
}
