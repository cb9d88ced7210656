use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Storage representation of a plugin.
///
/// The domain list is denormalized into `domain` (comma-joined ids) and the
/// parse mode is kept as its wire string. Only the codec converts between
/// this form and [`crate::plugin::Plugin`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginRecord {
    /// Assigned by the store on insert.
    #[serde(default)]
    pub id: Option<i64>,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(rename = "type")]
    pub plugin_type: String,

    #[serde(default)]
    pub domain: String,

    pub pattern: String,

    pub parse_mode: String,

    #[serde(default)]
    pub parse_mode_config: Option<String>,

    #[serde(default)]
    pub contains_all_domain: bool,

    #[serde(default)]
    pub config: Option<String>,

    #[serde(default)]
    pub comment: Option<String>,

    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_by: String,
    pub updated_at: DateTime<Utc>,
}
