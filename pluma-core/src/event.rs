use crate::plugin::Plugin;
use serde::{Deserialize, Serialize};

/// Snapshot published after a plugin mutation has been committed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PluginEvent {
    Added { plugin: Plugin },
    Updated { old: Plugin, new: Plugin },
    Deleted { plugin: Plugin },
}

impl PluginEvent {
    /// Id of the plugin the event is about.
    pub fn plugin_id(&self) -> i64 {
        match self {
            PluginEvent::Added { plugin } | PluginEvent::Deleted { plugin } => plugin.id,
            PluginEvent::Updated { new, .. } => new.id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            PluginEvent::Added { .. } => "added",
            PluginEvent::Updated { .. } => "updated",
            PluginEvent::Deleted { .. } => "deleted",
        }
    }
}
