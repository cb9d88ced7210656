use crate::RecordStore;
use crate::persist::{self, Snapshot};
use async_trait::async_trait;
use pluma_core::error::StoreError;
use pluma_core::query::Criteria;
use pluma_core::record::PluginRecord;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::info;

/// In-memory record store with optional JSON snapshot persistence.
///
/// Records are kept in id order, which is also insertion order since ids are
/// handed out from a monotonically increasing counter. When a state file is
/// configured, every mutation rewrites the snapshot before it is reported as
/// committed; a failed snapshot rolls the mutation back.
pub struct MemoryStore {
    inner: RwLock<Inner>,
    state_file: Option<PathBuf>,
}

struct Inner {
    records: BTreeMap<i64, PluginRecord>,
    next_id: i64,
}

impl Inner {
    fn snapshot(&self) -> Snapshot {
        Snapshot {
            next_id: self.next_id,
            plugins: self.records.values().cloned().collect(),
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                records: BTreeMap::new(),
                next_id: 1,
            }),
            state_file: None,
        }
    }

    /// Open a store backed by `path`, restoring any existing snapshot.
    pub fn with_state_file(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut records = BTreeMap::new();
        let mut next_id = 1;

        if let Some(snapshot) = persist::load_snapshot(&path) {
            for record in snapshot.plugins {
                match record.id {
                    Some(id) => {
                        next_id = next_id.max(id + 1);
                        records.insert(id, record);
                    }
                    None => tracing::warn!("persist: skipping snapshot record without id"),
                }
            }
            next_id = next_id.max(snapshot.next_id);
        }

        info!(plugins = records.len(), path = %path.display(), "Opened plugin store");
        Self {
            inner: RwLock::new(Inner { records, next_id }),
            state_file: Some(path),
        }
    }

    pub fn len(&self) -> usize {
        self.read().map(|inner| inner.records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Inner>, StoreError> {
        self.inner
            .read()
            .map_err(|_| StoreError::Unavailable("plugin store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Inner>, StoreError> {
        self.inner
            .write()
            .map_err(|_| StoreError::Unavailable("plugin store lock poisoned".into()))
    }

    fn persist(&self, inner: &Inner) -> Result<(), StoreError> {
        match &self.state_file {
            Some(path) => persist::save_snapshot(path, &inner.snapshot()),
            None => Ok(()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn insert(&self, mut record: PluginRecord) -> Result<i64, StoreError> {
        let mut inner = self.write()?;
        let id = inner.next_id;
        record.id = Some(id);
        inner.records.insert(id, record);
        inner.next_id += 1;

        if let Err(e) = self.persist(&inner) {
            inner.records.remove(&id);
            inner.next_id -= 1;
            return Err(e);
        }
        Ok(id)
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<PluginRecord>, StoreError> {
        Ok(self.read()?.records.get(&id).cloned())
    }

    async fn update_by_id(&self, record: PluginRecord) -> Result<bool, StoreError> {
        let Some(id) = record.id else {
            return Ok(false);
        };
        let mut inner = self.write()?;
        let Some(previous) = inner.records.get(&id).cloned() else {
            return Ok(false);
        };
        inner.records.insert(id, record);

        if let Err(e) = self.persist(&inner) {
            inner.records.insert(id, previous);
            return Err(e);
        }
        Ok(true)
    }

    async fn delete_by_id(&self, id: i64) -> Result<bool, StoreError> {
        let mut inner = self.write()?;
        let Some(previous) = inner.records.remove(&id) else {
            return Ok(false);
        };

        if let Err(e) = self.persist(&inner) {
            inner.records.insert(id, previous);
            return Err(e);
        }
        Ok(true)
    }

    async fn scan(&self, criteria: &Criteria) -> Result<Vec<PluginRecord>, StoreError> {
        Ok(self
            .read()?
            .records
            .values()
            .filter(|record| criteria.matches(record))
            .cloned()
            .collect())
    }

    async fn list_all(&self) -> Result<Vec<PluginRecord>, StoreError> {
        Ok(self.read()?.records.values().cloned().collect())
    }
}
