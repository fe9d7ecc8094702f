//! Configuration management for Vigia.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides.

use crate::error::{ConfigError, ConfigResult};
use crate::types::CredentialSourceKind;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Longest allowed session lifetime, in days.
pub const MAX_SESSION_TTL_DAYS: u32 = 3650;

/// Longest allowed in-memory credential lifetime, in minutes.
pub const MAX_SESSION_MANAGER_TTL_MINUTES: u64 = 7 * 24 * 60;

/// Main application configuration.
///
/// This is loaded from `~/.config/vigia/config.toml` (or platform equivalent).
/// If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Persistence settings
    pub database: DatabaseConfig,
    /// Key material for the session cipher
    pub vault: VaultConfig,
    /// Session lifecycle settings
    pub sessions: SessionConfig,
    /// Credential cascade settings
    pub credentials: CredentialConfig,
    /// Browser automation settings
    pub browser: BrowserConfig,
}

impl AppConfig {
    /// Load configuration from disk, falling back to defaults if not found.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML
    pub fn load() -> ConfigResult<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            tracing::debug!("Loading config from {}", config_path.display());
            let contents = fs::read_to_string(&config_path)?;
            let config: Self = toml::from_str(&contents)?;
            config.validate()?;
            Ok(config)
        } else {
            tracing::debug!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration with environment variable overrides.
    ///
    /// Supports the following environment variables:
    /// - `VIGIA_DATABASE_PATH`: Override the SQLite database path
    /// - `VIGIA_SESSION_TTL_DAYS`: Override the session lifetime
    /// - `VIGIA_SECRET_DIR`: Override the host secret-file directory
    /// - `VIGIA_HEADLESS`: Override browser headless mode (true/false)
    pub fn load_with_env() -> ConfigResult<Self> {
        let mut config = Self::load()?;
        config.apply_env_overrides(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup (normally the process environment).
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup("VIGIA_DATABASE_PATH") {
            tracing::debug!("Override database.path from env: {}", val);
            self.database.path = Some(PathBuf::from(val));
        }

        if let Some(val) = lookup("VIGIA_SESSION_TTL_DAYS") {
            if let Ok(days) = val.parse() {
                self.sessions.ttl_days = days;
                tracing::debug!("Override sessions.ttl_days from env: {}", days);
            }
        }

        if let Some(val) = lookup("VIGIA_SECRET_DIR") {
            tracing::debug!("Override credentials.secret_dir from env: {}", val);
            self.credentials.secret_dir = Some(PathBuf::from(val));
        }

        if let Some(val) = lookup("VIGIA_HEADLESS") {
            if let Ok(headless) = val.parse() {
                self.browser.headless = headless;
                tracing::debug!("Override browser.headless from env: {}", headless);
            }
        }
    }

    /// Check cross-field constraints that serde cannot express.
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidValue` for the first offending field.
    pub fn validate(&self) -> ConfigResult<()> {
        if !(1..=MAX_SESSION_TTL_DAYS).contains(&self.sessions.ttl_days) {
            return Err(ConfigError::InvalidValue {
                field: "sessions.ttl_days".to_string(),
                reason: format!("must be between 1 and {MAX_SESSION_TTL_DAYS}"),
            });
        }

        if !(1..=MAX_SESSION_MANAGER_TTL_MINUTES)
            .contains(&self.credentials.session_manager_ttl_minutes)
        {
            return Err(ConfigError::InvalidValue {
                field: "credentials.session_manager_ttl_minutes".to_string(),
                reason: format!("must be between 1 and {MAX_SESSION_MANAGER_TTL_MINUTES}"),
            });
        }

        if self.credentials.order.contains(&CredentialSourceKind::Anonymous) {
            return Err(ConfigError::InvalidValue {
                field: "credentials.order".to_string(),
                reason: "anonymous access is always the final step and cannot be listed"
                    .to_string(),
            });
        }

        for (i, kind) in self.credentials.order.iter().enumerate() {
            if self.credentials.order[..i].contains(kind) {
                return Err(ConfigError::InvalidValue {
                    field: "credentials.order".to_string(),
                    reason: format!("source '{kind}' listed more than once"),
                });
            }
        }

        if self.vault.keys.iter().any(|k| k.version == 0) {
            return Err(ConfigError::InvalidValue {
                field: "vault.keys".to_string(),
                reason: "key versions start at 1".to_string(),
            });
        }

        Ok(())
    }

    /// Save configuration to disk.
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> ConfigResult<()> {
        let config_path = Self::config_path()?;
        let config_dir = config_path
            .parent()
            .ok_or_else(|| ConfigError::InvalidValue {
                field: "config_path".to_string(),
                reason: "no parent directory".to_string(),
            })?;

        fs::create_dir_all(config_dir)?;
        tracing::debug!("Saving config to {}", config_path.display());

        let contents = toml::to_string_pretty(self)?;
        fs::write(config_path, contents)?;
        Ok(())
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/vigia/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        let dirs = ProjectDirs::from("com", "vigia", "vigia").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Get the data directory path.
    ///
    /// Uses XDG base directories: `~/.local/share/vigia`
    pub fn data_dir() -> ConfigResult<PathBuf> {
        let dirs = ProjectDirs::from("com", "vigia", "vigia").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.data_dir().to_path_buf())
    }

    /// Resolve the database path, defaulting to `<data_dir>/vigia.db`.
    pub fn database_path(&self) -> ConfigResult<PathBuf> {
        match &self.database.path {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::data_dir()?.join("vigia.db")),
        }
    }
}

/// Persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite file path (`:memory:` for an ephemeral store). Defaults to the data dir.
    pub path: Option<PathBuf>,
    /// Maximum pooled connections
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: None,
            max_connections: 5,
        }
    }
}

/// One versioned key reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyReference {
    /// Key version recorded alongside every blob it seals
    pub version: u32,
    /// Environment variable holding the key (64 hex chars or base64 of 32 bytes)
    pub env: String,
}

/// Key material settings for the session cipher.
///
/// Secrets are never written to the config file, only the names of the
/// variables that carry them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    /// Versioned keys; the highest version present in the environment is current
    pub keys: Vec<KeyReference>,
    /// Passphrase variable used when no raw key is present
    pub passphrase_env: String,
    /// Version assigned to the passphrase-derived key
    pub passphrase_version: u32,
    /// Salt file for passphrase derivation. Defaults to `<data_dir>/.session_salt`.
    pub salt_path: Option<PathBuf>,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            keys: vec![KeyReference {
                version: 1,
                env: "VIGIA_SESSION_KEY".to_string(),
            }],
            passphrase_env: "VIGIA_SESSION_PASSPHRASE".to_string(),
            passphrase_version: 1,
            salt_path: None,
        }
    }
}

/// Session lifecycle settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Days an uploaded session stays valid
    pub ttl_days: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { ttl_days: 30 }
    }
}

/// Credential cascade settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialConfig {
    /// Order in which sources are tried before falling back to anonymous
    pub order: Vec<CredentialSourceKind>,
    /// Directory holding host-provisioned storage-state files
    pub secret_dir: Option<PathBuf>,
    /// Prefix of the base64 storage-state variables (`<prefix>_<SITE>`, then `<prefix>`)
    pub env_prefix: String,
    /// Minutes a cached credential stays in the in-memory session manager
    pub session_manager_ttl_minutes: u64,
}

impl Default for CredentialConfig {
    fn default() -> Self {
        Self {
            order: vec![
                CredentialSourceKind::Db,
                CredentialSourceKind::SecretFile,
                CredentialSourceKind::Env,
                CredentialSourceKind::SessionManager,
            ],
            secret_dir: None,
            env_prefix: "VIGIA_STORAGE_STATE".to_string(),
            session_manager_ttl_minutes: 60,
        }
    }
}

/// Browser automation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Run browser in headless mode
    pub headless: bool,
    /// Browser window width when the site does not randomize the viewport
    pub window_width: u32,
    /// Browser window height when the site does not randomize the viewport
    pub window_height: u32,
    /// Chromium executable; auto-detected when unset
    pub executable: Option<PathBuf>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            window_width: 1920,
            window_height: 1080,
            executable: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.sessions.ttl_days, 30);
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.credentials.order.len(), 4);
        assert_eq!(config.credentials.order[0], CredentialSourceKind::Db);
        assert!(config.browser.headless);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("[sessions]"));
        assert!(toml_str.contains("[credentials]"));
        assert!(toml_str.contains("[[vault.keys]]"));

        let parsed: AppConfig = toml::from_str(&toml_str).expect("parse serialized config");
        assert_eq!(parsed.credentials.order, config.credentials.order);
        assert_eq!(parsed.vault.keys, config.vault.keys);
    }

    #[test]
    fn test_config_save_load() {
        let tmp = TempDir::new().expect("create temp dir");
        let config_path = tmp.path().join("config.toml");

        let mut config = AppConfig::default();
        config.sessions.ttl_days = 7;
        config.credentials.order = vec![CredentialSourceKind::Env, CredentialSourceKind::Db];

        let contents = toml::to_string_pretty(&config).expect("serialize config");
        fs::write(&config_path, contents).expect("write config file");

        let loaded_contents = fs::read_to_string(&config_path).expect("read config file");
        let loaded: AppConfig = toml::from_str(&loaded_contents).expect("parse loaded config");

        assert_eq!(loaded.sessions.ttl_days, 7);
        assert_eq!(
            loaded.credentials.order,
            vec![CredentialSourceKind::Env, CredentialSourceKind::Db]
        );
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("VIGIA_DATABASE_PATH", "/tmp/vigia-test.db"),
            ("VIGIA_SESSION_TTL_DAYS", "10"),
            ("VIGIA_SECRET_DIR", "/run/secrets/vigia"),
            ("VIGIA_HEADLESS", "false"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config.apply_env_overrides(|name| env.get(name).map(ToString::to_string));

        assert_eq!(
            config.database.path,
            Some(PathBuf::from("/tmp/vigia-test.db"))
        );
        assert_eq!(config.sessions.ttl_days, 10);
        assert_eq!(
            config.credentials.secret_dir,
            Some(PathBuf::from("/run/secrets/vigia"))
        );
        assert!(!config.browser.headless);
    }

    #[test]
    fn test_env_override_ignores_garbage() {
        let mut config = AppConfig::default();
        config.apply_env_overrides(|name| {
            (name == "VIGIA_SESSION_TTL_DAYS").then(|| "thirty".to_string())
        });
        assert_eq!(config.sessions.ttl_days, 30);
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[sessions]
ttl_days = 14

[credentials]
order = ["db", "session_manager"]
"#;

        let config: AppConfig = toml::from_str(toml_str).expect("parse partial config");
        assert_eq!(config.sessions.ttl_days, 14);
        assert_eq!(
            config.credentials.order,
            vec![CredentialSourceKind::Db, CredentialSourceKind::SessionManager]
        );
        // These should be defaults
        assert_eq!(config.credentials.env_prefix, "VIGIA_STORAGE_STATE");
        assert!(config.browser.headless);
    }

    #[test]
    fn test_validate_rejects_anonymous_in_order() {
        let mut config = AppConfig::default();
        config.credentials.order.push(CredentialSourceKind::Anonymous);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_duplicate_sources() {
        let mut config = AppConfig::default();
        config.credentials.order = vec![CredentialSourceKind::Db, CredentialSourceKind::Db];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_ttl() {
        let mut config = AppConfig::default();
        config.sessions.ttl_days = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_oversized_ttl_from_env() {
        let mut config = AppConfig::default();
        config.apply_env_overrides(|name| {
            (name == "VIGIA_SESSION_TTL_DAYS").then(|| "200000000".to_string())
        });
        assert_eq!(config.sessions.ttl_days, 200_000_000);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field, .. }) if field == "sessions.ttl_days"
        ));

        config.sessions.ttl_days = MAX_SESSION_TTL_DAYS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_bounds_session_manager_ttl() {
        let mut config = AppConfig::default();
        config.credentials.session_manager_ttl_minutes = u64::MAX;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field, .. })
                if field == "credentials.session_manager_ttl_minutes"
        ));

        config.credentials.session_manager_ttl_minutes = 0;
        assert!(config.validate().is_err());
    }
}
