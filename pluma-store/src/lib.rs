pub mod cache;
pub mod memory;
pub mod persist;

use async_trait::async_trait;
use pluma_core::error::StoreError;
use pluma_core::query::Criteria;
use pluma_core::record::PluginRecord;

pub use cache::PluginCache;
pub use memory::MemoryStore;

/// Durable mapping from plugin id to plugin record.
///
/// Point mutations must be atomic. Implementations own their timeout and
/// retry policy; failures surface unchanged as [`StoreError`].
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Persist a new record and return the id the store generated for it.
    async fn insert(&self, record: PluginRecord) -> Result<i64, StoreError>;

    async fn get_by_id(&self, id: i64) -> Result<Option<PluginRecord>, StoreError>;

    /// Overwrite the record with `record.id`. Returns `false` when absent.
    async fn update_by_id(&self, record: PluginRecord) -> Result<bool, StoreError>;

    /// Returns `false` when absent.
    async fn delete_by_id(&self, id: i64) -> Result<bool, StoreError>;

    /// Records matching every clause of `criteria`, in store order.
    async fn scan(&self, criteria: &Criteria) -> Result<Vec<PluginRecord>, StoreError>;

    async fn list_all(&self) -> Result<Vec<PluginRecord>, StoreError>;
}
