//! Application configuration.
//!
//! Configuration is loaded from a TOML file at:
//! 1. `$MAILDEPOT_CONFIG` (environment variable)
//! 2. `~/.config/maildepot/config.toml` (Linux/macOS)
//!    `%APPDATA%\maildepot\config.toml` (Windows)
//! 3. Built-in defaults

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::handler::private_files::SiteSettings;
use crate::model::user::User;
use crate::security::policy::{Grants, StaticAccess};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General behavior settings.
    pub general: GeneralConfig,
    /// Storage backend settings.
    pub storage: StorageConfig,
    /// Quota settings.
    pub quota: QuotaConfig,
    /// Site-wide defaults stamped onto stored files.
    pub site: SiteConfig,
    /// Known users and their grants.
    pub users: Vec<UserEntry>,
}

/// General behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub log_level: String,
}

/// Storage backend settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root directory for file areas. Defaults to the platform data dir.
    pub root: Option<PathBuf>,
}

/// Quota settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuotaConfig {
    /// Per-user private area ceiling in bytes (default: 104857600 = 100 MiB).
    pub user_quota_bytes: u64,
}

/// Site-wide defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// License recorded on stored files.
    pub default_license: String,
}

/// One user row, feeding the static directory and access policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserEntry {
    pub id: u64,
    pub username: String,
    pub full_name: String,
    pub email: String,
    /// May store files in the own private area.
    #[serde(default = "default_true")]
    pub can_manage_files: bool,
    /// Exempt from the quota ceiling.
    #[serde(default)]
    pub ignore_quota: bool,
}

fn default_true() -> bool {
    true
}

// ── Default implementations ─────────────────────────────────────

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
        }
    }
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            user_quota_bytes: 100 * 1024 * 1024, // 100 MiB
        }
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            default_license: "all-rights-reserved".to_string(),
        }
    }
}

impl Config {
    /// Build the static user store from the `[[users]]` table.
    pub fn static_access(&self) -> StaticAccess {
        let mut access = StaticAccess::new();
        for entry in &self.users {
            access.insert(
                User {
                    id: entry.id,
                    username: entry.username.clone(),
                    full_name: entry.full_name.clone(),
                    email: entry.email.clone(),
                },
                Grants {
                    manage_own_files: entry.can_manage_files,
                    ignore_quota: entry.ignore_quota,
                },
            );
        }
        access
    }

    /// Site settings for the private-files handler.
    pub fn site_settings(&self) -> SiteSettings {
        SiteSettings {
            default_license: self.site.default_license.clone(),
            user_quota_bytes: self.quota.user_quota_bytes,
        }
    }
}

// ── Load / paths ────────────────────────────────────────────────

/// Load configuration, searching standard locations.
///
/// Returns the default configuration if no file is found or on parse error.
pub fn load_config() -> Config {
    if let Some(path) = config_file_path() {
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(contents) => match toml::from_str::<Config>(&contents) {
                    Ok(cfg) => {
                        tracing::info!(path = %path.display(), "Loaded config");
                        return cfg;
                    }
                    Err(e) => {
                        tracing::warn!(
                            path = %path.display(),
                            error = %e,
                            "Failed to parse config, using defaults"
                        );
                    }
                },
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Failed to read config file, using defaults"
                    );
                }
            }
        }
    }
    Config::default()
}

/// Determine the config file path (checking env var first, then standard dirs).
pub fn config_file_path() -> Option<PathBuf> {
    // 1. Environment variable override
    if let Ok(env_path) = std::env::var("MAILDEPOT_CONFIG") {
        return Some(PathBuf::from(env_path));
    }

    // 2. Standard config directory
    dirs::config_dir().map(|d| d.join("maildepot").join("config.toml"))
}

/// Root directory for stored file areas.
pub fn storage_root(config: &Config) -> PathBuf {
    if let Some(ref root) = config.storage.root {
        return root.clone();
    }
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("maildepot")
        .join("files")
}

/// Directory for log files.
pub fn log_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("maildepot")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = Config::default();
        assert_eq!(cfg.general.log_level, "warn");
        assert_eq!(cfg.quota.user_quota_bytes, 100 * 1024 * 1024);
        assert_eq!(cfg.site.default_license, "all-rights-reserved");
        assert!(cfg.storage.root.is_none());
        assert!(cfg.users.is_empty());
    }

    #[test]
    fn test_serialize_deserialize_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).expect("serialize");
        let parsed: Config = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.general.log_level, cfg.general.log_level);
        assert_eq!(parsed.quota.user_quota_bytes, cfg.quota.user_quota_bytes);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let partial = r#"
[quota]
user_quota_bytes = 1024

[[users]]
id = 1
username = "alice"
full_name = "Alice Archer"
email = "alice@example.com"
"#;
        let cfg: Config = toml::from_str(partial).expect("parse partial");
        assert_eq!(cfg.quota.user_quota_bytes, 1024);
        // Other fields use defaults
        assert_eq!(cfg.general.log_level, "warn");
        assert_eq!(cfg.site.default_license, "all-rights-reserved");
        // User flags use their per-field defaults
        assert!(cfg.users[0].can_manage_files);
        assert!(!cfg.users[0].ignore_quota);
    }

    #[test]
    fn test_static_access_from_users_table() {
        let toml_str = r#"
[[users]]
id = 1
username = "alice"
full_name = "Alice Archer"
email = "alice@example.com"

[[users]]
id = 2
username = "bob"
full_name = "Bob Brick"
email = "bob@example.com"
can_manage_files = false
ignore_quota = true
"#;
        let cfg: Config = toml::from_str(toml_str).unwrap();
        let access = cfg.static_access();
        assert_eq!(access.len(), 2);

        use crate::security::policy::{AccessPolicy, UserDirectory};
        use crate::security::{Capability, UserContext};
        let bob = access.user(2).unwrap();
        let context = UserContext::for_user(&bob);
        assert!(!access.has_capability(&bob, Capability::ManageOwnFiles, &context));
        assert!(access.has_capability(&bob, Capability::IgnoreQuota, &context));
    }
}
