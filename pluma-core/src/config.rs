use figment::{Figment, providers::{Env, Format, Yaml}};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Top-level registry configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlumaConfig {
    #[serde(default)]
    pub admin: AdminConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub log: LogConfig,
}

/// Admin API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    #[serde(default = "default_admin_addr")]
    pub addr: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Admin API key for authentication (optional).
    pub api_key: Option<String>,
}

/// Record store settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    /// JSON snapshot file. `None` keeps plugins in memory only.
    #[serde(default)]
    pub state_file: Option<PathBuf>,
}

/// Static domain-administration table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// user → ids of the domains that user administers
    #[serde(default)]
    pub domain_admins: HashMap<String, Vec<i64>>,
    #[serde(default)]
    pub super_admins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

// ── Defaults ──────────────────────────────────────────────────

fn default_admin_addr() -> String { "0.0.0.0:9280".into() }
fn default_true() -> bool { true }
fn default_log_level() -> String { "info".into() }

// ── Impls ─────────────────────────────────────────────────────

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            addr: default_admin_addr(),
            enabled: true,
            api_key: None,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl PlumaConfig {
    /// Load configuration from YAML file + env overrides.
    ///
    /// Env keys nest on a double underscore: `PLUMA_ADMIN__API_KEY` sets
    /// `admin.api_key`, `PLUMA_STORE__STATE_FILE` sets `store.state_file`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let config: PlumaConfig = Figment::new()
            .merge(Yaml::file(path))
            .merge(Env::prefixed("PLUMA_").split("__"))
            .extract()?;
        Ok(config)
    }
}
