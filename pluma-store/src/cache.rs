use crossbeam_channel::Receiver;
use dashmap::DashMap;
use pluma_core::event::PluginEvent;
use pluma_core::plugin::Plugin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::JoinHandle;
use tracing::debug;

/// In-memory mirror of the plugin registry, kept in sync from change events.
///
/// The cache is primed from a full listing on startup and then follows the
/// registry's event stream, so readers never hit the record store.
#[derive(Clone)]
pub struct PluginCache {
    plugins: Arc<DashMap<i64, Plugin>>,
    applied: Arc<AtomicU64>,
}

impl PluginCache {
    pub fn new() -> Self {
        Self {
            plugins: Arc::new(DashMap::new()),
            applied: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Replace the cache contents with a full listing.
    pub fn prime(&self, plugins: Vec<Plugin>) {
        self.plugins.clear();
        for plugin in plugins {
            self.plugins.insert(plugin.id, plugin);
        }
        debug!(plugins = self.plugins.len(), "Cache primed");
    }

    /// Apply a change event from the registry.
    pub fn apply(&self, event: &PluginEvent) {
        match event {
            PluginEvent::Added { plugin } => {
                self.plugins.insert(plugin.id, plugin.clone());
                debug!(plugin_id = plugin.id, "Cache added");
            }
            PluginEvent::Updated { old, new } => {
                if old.id != new.id {
                    self.plugins.remove(&old.id);
                }
                self.plugins.insert(new.id, new.clone());
                debug!(plugin_id = new.id, "Cache updated");
            }
            PluginEvent::Deleted { plugin } => {
                self.plugins.remove(&plugin.id);
                debug!(plugin_id = plugin.id, "Cache removed");
            }
        }
        self.applied.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self, id: i64) -> Option<Plugin> {
        self.plugins.get(&id).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Drain `events` on a dedicated thread until every sender is dropped.
    pub fn spawn_listener(&self, events: Receiver<PluginEvent>) -> std::io::Result<JoinHandle<()>> {
        let cache = self.clone();
        std::thread::Builder::new()
            .name("pluma-cache".to_string())
            .spawn(move || {
                for event in events.iter() {
                    cache.apply(&event);
                }
                debug!("Cache listener stopped");
            })
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            plugins: self.plugins.len(),
            events_applied: self.applied.load(Ordering::Relaxed),
        }
    }
}

impl Default for PluginCache {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub plugins: usize,
    pub events_applied: u64,
}

impl std::fmt::Display for CacheStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "plugins={}, events_applied={}", self.plugins, self.events_applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pluma_core::plugin::ParseMode;

    fn make_plugin(id: i64, plugin_type: &str) -> Plugin {
        let now = Utc::now();
        Plugin {
            id,
            name: Some(format!("p{id}")),
            plugin_type: plugin_type.to_string(),
            pattern: "p".into(),
            parse_mode: ParseMode::Rule,
            parse_mode_config: None,
            domain_list: vec![],
            contains_all_domain: false,
            config: None,
            comment: None,
            created_by: "admin".into(),
            created_at: now,
            updated_by: "admin".into(),
            updated_at: now,
        }
    }

    // ── apply ───────────────────────────────────────────────────

    #[test]
    fn added_inserts_plugin() {
        let cache = PluginCache::new();
        cache.apply(&PluginEvent::Added { plugin: make_plugin(1, "A") });
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(1).unwrap().plugin_type, "A");
    }

    #[test]
    fn updated_replaces_plugin() {
        let cache = PluginCache::new();
        cache.apply(&PluginEvent::Added { plugin: make_plugin(1, "A") });
        cache.apply(&PluginEvent::Updated {
            old: make_plugin(1, "A"),
            new: make_plugin(1, "B"),
        });
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(1).unwrap().plugin_type, "B");
    }

    #[test]
    fn deleted_removes_plugin() {
        let cache = PluginCache::new();
        cache.apply(&PluginEvent::Added { plugin: make_plugin(1, "A") });
        cache.apply(&PluginEvent::Deleted { plugin: make_plugin(1, "A") });
        assert!(cache.is_empty());
    }

    #[test]
    fn deleting_unknown_plugin_is_noop() {
        let cache = PluginCache::new();
        cache.apply(&PluginEvent::Added { plugin: make_plugin(1, "A") });
        cache.apply(&PluginEvent::Deleted { plugin: make_plugin(2, "A") });
        assert_eq!(cache.len(), 1);
    }

    // ── prime / stats ───────────────────────────────────────────

    #[test]
    fn prime_replaces_contents() {
        let cache = PluginCache::new();
        cache.apply(&PluginEvent::Added { plugin: make_plugin(9, "old") });
        cache.prime(vec![make_plugin(1, "A"), make_plugin(2, "B")]);
        assert_eq!(cache.len(), 2);
        assert!(cache.get(9).is_none());
    }

    #[test]
    fn stats_count_applied_events() {
        let cache = PluginCache::new();
        cache.apply(&PluginEvent::Added { plugin: make_plugin(1, "A") });
        cache.apply(&PluginEvent::Added { plugin: make_plugin(2, "A") });
        cache.apply(&PluginEvent::Deleted { plugin: make_plugin(1, "A") });
        let stats = cache.stats();
        assert_eq!(stats, CacheStats { plugins: 1, events_applied: 3 });
        assert_eq!(stats.to_string(), "plugins=1, events_applied=3");
    }

    // ── listener ────────────────────────────────────────────────

    #[test]
    fn listener_drains_until_senders_drop() {
        let cache = PluginCache::new();
        let (tx, rx) = crossbeam_channel::unbounded();
        let handle = cache.spawn_listener(rx).unwrap();

        tx.send(PluginEvent::Added { plugin: make_plugin(1, "A") }).unwrap();
        tx.send(PluginEvent::Updated {
            old: make_plugin(1, "A"),
            new: make_plugin(1, "B"),
        })
        .unwrap();
        drop(tx);
        handle.join().unwrap();

        assert_eq!(cache.get(1).unwrap().plugin_type, "B");
        assert_eq!(cache.stats().events_applied, 2);
    }
}
