use crate::notifier::EventPublisher;
use chrono::Utc;
use pluma_core::auth::{self, DomainAuthority};
use pluma_core::codec;
use pluma_core::error::{PlumaError, Result};
use pluma_core::event::PluginEvent;
use pluma_core::plugin::{Caller, Plugin, PluginSpec};
use pluma_core::query::{self, Criteria, Criterion, Field, PluginQuery};
use pluma_store::RecordStore;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Registry service: plugin CRUD, authorized lookup and change events.
///
/// All mutations run under one registry-wide lock spanning the store write,
/// the read-back and the publish, so subscribers observe events in the order
/// writes committed on this instance. Reads take no lock.
pub struct PluginService {
    store: Arc<dyn RecordStore>,
    publisher: Arc<dyn EventPublisher>,
    authority: Arc<dyn DomainAuthority>,
    write_lock: Mutex<()>,
}

impl PluginService {
    pub fn new(
        store: Arc<dyn RecordStore>,
        publisher: Arc<dyn EventPublisher>,
        authority: Arc<dyn DomainAuthority>,
    ) -> Self {
        Self {
            store,
            publisher,
            authority,
            write_lock: Mutex::new(()),
        }
    }

    // ── Mutations ───────────────────────────────────────────────

    /// Persist a new plugin and publish `Added` with its stored state.
    pub async fn create(&self, spec: PluginSpec, caller: &Caller) -> Result<Plugin> {
        let record = codec::to_storage(&spec, caller, Utc::now());

        let _guard = self.write_lock.lock().await;
        let id = self.store.insert(record).await?;
        let plugin = self.load(id).await?;

        info!(plugin_id = id, caller = %caller.name, "Plugin created");
        self.publisher.publish(PluginEvent::Added {
            plugin: plugin.clone(),
        });
        Ok(plugin)
    }

    /// Overwrite every mutable field of plugin `id` and publish `Updated`.
    pub async fn update(&self, id: i64, spec: PluginSpec, caller: &Caller) -> Result<Plugin> {
        let _guard = self.write_lock.lock().await;
        let existing = self
            .store
            .get_by_id(id)
            .await?
            .ok_or(PlumaError::PluginNotFound(id))?;
        let old = codec::to_domain(&existing)?;

        let record = codec::apply_update(existing, &spec, caller, Utc::now());
        if !self.store.update_by_id(record).await? {
            return Err(PlumaError::PluginNotFound(id));
        }
        let new = self.load(id).await?;

        info!(plugin_id = id, caller = %caller.name, "Plugin updated");
        self.publisher.publish(PluginEvent::Updated {
            old,
            new: new.clone(),
        });
        Ok(new)
    }

    /// Remove plugin `id`. Absent ids are a silent no-op.
    ///
    /// A malformed record is still removed, but publishes no event since
    /// there is no valid prior state to carry.
    pub async fn delete(&self, id: i64) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let Some(existing) = self.store.get_by_id(id).await? else {
            debug!(plugin_id = id, "Delete of absent plugin ignored");
            return Ok(());
        };

        if !self.store.delete_by_id(id).await? {
            return Ok(());
        }
        match codec::to_domain(&existing) {
            Ok(plugin) => {
                info!(plugin_id = id, "Plugin deleted");
                self.publisher.publish(PluginEvent::Deleted { plugin });
            }
            Err(e) => {
                warn!(plugin_id = id, error = %e, "Deleted malformed plugin record without event");
            }
        }
        Ok(())
    }

    // ── Reads ───────────────────────────────────────────────────

    pub async fn get(&self, id: i64) -> Result<Option<Plugin>> {
        match self.store.get_by_id(id).await? {
            Some(record) => Ok(Some(codec::to_domain(&record)?)),
            None => Ok(None),
        }
    }

    /// All plugins in store order.
    pub async fn list(&self) -> Result<Vec<Plugin>> {
        let records = self.store.list_all().await?;
        codec::to_domain_list(&records)
    }

    /// Store-phase criteria scan followed by in-memory pattern refinement.
    pub async fn query(&self, request: &PluginQuery) -> Result<Vec<Plugin>> {
        let criteria = query::criteria_for(request);
        let scanned = self.store.scan(&criteria).await?;
        let refined = query::refine(scanned, request);
        debug!(clauses = criteria.clauses().len(), matched = refined.len(), "Plugin query");
        codec::to_domain_list(&refined)
    }

    /// [`Self::query`] narrowed to the plugins `caller` may see.
    pub async fn query_with_auth_check(
        &self,
        request: &PluginQuery,
        caller: &Caller,
    ) -> Result<Vec<Plugin>> {
        let plugins = self.query(request).await?;
        auth::authorize(plugins, self.authority.as_ref(), caller).await
    }

    /// First plugin whose parse-mode config declares `name`, ignoring case.
    pub async fn get_by_name(&self, name: &str) -> Result<Option<Plugin>> {
        info!(name, "Plugin lookup by function name");
        Ok(self
            .list()
            .await?
            .into_iter()
            .find(|plugin| plugin.has_function_name(name)))
    }

    /// Plugins whose pattern or name contains `text`, optionally of one type.
    pub async fn fetch_by_text(&self, text: &str, plugin_type: Option<&str>) -> Result<Vec<Plugin>> {
        let mut criteria = Criteria::new();
        if let Some(t) = plugin_type.filter(|t| !t.trim().is_empty()) {
            criteria = criteria.and(Criterion::Equals(Field::Type, t.to_string()));
        }
        let records: Vec<_> = self
            .store
            .scan(&criteria)
            .await?
            .into_iter()
            .filter(|record| {
                record.pattern.contains(text)
                    || record.name.as_deref().is_some_and(|name| name.contains(text))
            })
            .collect();
        codec::to_domain_list(&records)
    }

    async fn load(&self, id: i64) -> Result<Plugin> {
        let record = self
            .store
            .get_by_id(id)
            .await?
            .ok_or(PlumaError::PluginNotFound(id))?;
        codec::to_domain(&record)
    }
}
