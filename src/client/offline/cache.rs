//! Snapshot of the last successful full fetch, read back when the hosted
//! store cannot be reached.

use std::sync::Arc;

use crate::client::local_db::{KeyValueStore, StoreError, CACHED_ITEMS_KEY};
use crate::shared::EquipmentRecord;

#[derive(Clone)]
pub struct ItemCache {
    store: Arc<dyn KeyValueStore>,
}

impl ItemCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Overwrite the snapshot
    pub async fn save(&self, items: &[EquipmentRecord]) -> Result<(), StoreError> {
        let raw = serde_json::to_string(items)?;
        self.store.set(CACHED_ITEMS_KEY, &raw).await
    }

    /// The snapshot, or `None` when it is missing or unreadable
    pub async fn load(&self) -> Option<Vec<EquipmentRecord>> {
        let raw = match self.store.get(CACHED_ITEMS_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::error!("Failed to read item cache: {}", e);
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(items) => Some(items),
            Err(e) => {
                tracing::error!("Ignoring corrupt item cache: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::local_db::MemoryStore;
    use crate::shared::NewEquipment;
    use chrono::Utc;

    #[tokio::test]
    async fn test_save_then_load() {
        let cache = ItemCache::new(Arc::new(MemoryStore::new()));
        assert!(cache.load().await.is_none());

        let item = EquipmentRecord::new_pending(
            NewEquipment::default(),
            "COMETZ25/00001".into(),
            "Admin",
            Utc::now(),
        );
        cache.save(std::slice::from_ref(&item)).await.unwrap();

        assert_eq!(cache.load().await, Some(vec![item]));
    }

    #[tokio::test]
    async fn test_corrupt_cache_reads_as_missing() {
        let store = Arc::new(MemoryStore::new());
        store.set(CACHED_ITEMS_KEY, "[{\"id\":").await.unwrap();

        assert!(ItemCache::new(store).load().await.is_none());
    }
}
