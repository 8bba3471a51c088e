use crate::model::Table;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;

/// The single process-wide dataset, replaced wholesale by uploads.
///
/// Readers take an [`Arc`] snapshot, so an upload can never mutate a table an
/// in-flight analysis is reading. The table and its load timestamp change
/// together under the write lock.
pub struct DatasetCache {
    inner: RwLock<Option<CacheEntry>>,
}

struct CacheEntry {
    table: Arc<Table>,
    loaded_at: DateTime<Utc>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(None),
        }
    }

    pub async fn get(&self) -> Option<Arc<Table>> {
        self.inner.read().await.as_ref().map(|entry| entry.table.clone())
    }

    pub async fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.inner.read().await.as_ref().map(|entry| entry.loaded_at)
    }

    /// Swaps in a freshly loaded table.
    pub async fn replace(&self, table: Table) {
        let entry = CacheEntry {
            table: Arc::new(table),
            loaded_at: Utc::now(),
        };
        *self.inner.write().await = Some(entry);
    }
}

impl Default for DatasetCache {
    fn default() -> Self {
        Self::new()
    }
}
