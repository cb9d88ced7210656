//! JSON snapshot persistence for [`crate::MemoryStore`].
//!
//! After every committed mutation the full record set is serialized to a JSON
//! file. On startup the file is loaded back so plugins survive restarts.
//!
//! The file is written atomically: first to a `.tmp` sibling, then renamed
//! over the final path, so a crash mid-write never corrupts the stored state.

use pluma_core::error::StoreError;
use pluma_core::record::PluginRecord;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// The shape serialized to / deserialized from the snapshot file.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Snapshot {
    /// Next id the store will hand out.
    #[serde(default)]
    pub next_id: i64,
    #[serde(default)]
    pub plugins: Vec<PluginRecord>,
}

/// Write `snapshot` to `path` atomically.
pub fn save_snapshot(path: &Path, snapshot: &Snapshot) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(snapshot)?;

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, &json)?;
    std::fs::rename(&tmp, path)?;

    tracing::debug!(path = %path.display(), plugins = snapshot.plugins.len(), "persist: snapshot saved");
    Ok(())
}

/// Load a previously saved snapshot.
///
/// * If the file does not exist            → `None` (first run).
/// * If the file exists but is malformed   → logs a warning, `None`.
pub fn load_snapshot(path: &Path) -> Option<Snapshot> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "persist: no snapshot found, starting fresh");
        return None;
    }

    let data = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!(error = %e, path = %path.display(), "persist: failed to read snapshot");
            return None;
        }
    };

    match serde_json::from_str::<Snapshot>(&data) {
        Ok(snapshot) => {
            tracing::info!(
                plugins = snapshot.plugins.len(),
                path = %path.display(),
                "persist: snapshot restored from file"
            );
            Some(snapshot)
        }
        Err(e) => {
            tracing::warn!(error = %e, path = %path.display(), "persist: snapshot is malformed, ignoring");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::tempdir;

    fn make_record(id: i64) -> PluginRecord {
        let now = Utc::now();
        PluginRecord {
            id: Some(id),
            name: Some(format!("plugin-{id}")),
            plugin_type: "DSL".into(),
            domain: "1,2".into(),
            pattern: "p".into(),
            parse_mode: "RULE".into(),
            parse_mode_config: None,
            contains_all_domain: false,
            config: None,
            comment: None,
            created_by: "admin".into(),
            created_at: now,
            updated_by: "admin".into(),
            updated_at: now,
        }
    }

    #[test]
    fn round_trip_snapshot() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("plugins.json");
        let snapshot = Snapshot {
            next_id: 3,
            plugins: vec![make_record(1), make_record(2)],
        };
        save_snapshot(&path, &snapshot).unwrap();

        let loaded = load_snapshot(&path).unwrap();
        assert_eq!(loaded.next_id, 3);
        assert_eq!(loaded.plugins, snapshot.plugins);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn save_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/deeper/plugins.json");
        save_snapshot(&path, &Snapshot::default()).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn load_missing_file_is_none() {
        let dir = tempdir().unwrap();
        assert!(load_snapshot(&dir.path().join("nonexistent.json")).is_none());
    }

    #[test]
    fn load_malformed_file_is_none() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "not valid json {{{{").unwrap();
        assert!(load_snapshot(&path).is_none());
    }
}
