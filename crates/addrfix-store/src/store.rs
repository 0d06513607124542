use addrfix_core::{OrderId, StoreRecord};

use crate::backend::{MemoryBackend, StorageBackend};
use crate::error::StoreError;
use crate::key::{parse_record_key, record_key};

/// Namespaced record store with failure containment.
///
/// No method returns an error: storage, serialization and parse failures are
/// logged and reported as "no record" (`get`) or "write skipped" (`set`).
pub struct PersistenceStore {
    namespace: String,
    backend: Box<dyn StorageBackend>,
}

impl std::fmt::Debug for PersistenceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceStore")
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

impl PersistenceStore {
    pub fn new(namespace: impl Into<String>, backend: impl StorageBackend + 'static) -> Self {
        Self {
            namespace: namespace.into(),
            backend: Box::new(backend),
        }
    }

    pub fn in_memory(namespace: impl Into<String>) -> Self {
        Self::new(namespace, MemoryBackend::new())
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    #[must_use]
    pub fn key(&self, order_id: &OrderId) -> String {
        record_key(&self.namespace, order_id)
    }

    /// Loads the record for `order_id`.
    ///
    /// Unreadable, unparseable and label-less values all read as `None`.
    #[must_use]
    pub fn get(&self, order_id: &OrderId) -> Option<StoreRecord> {
        let key = self.key(order_id);
        match self.try_get(&key) {
            Ok(Some(mut record)) => {
                if record.store_label.trim().is_empty() {
                    tracing::warn!(%key, "stored record has an empty label; ignoring");
                    return None;
                }
                record.order_id = order_id.clone();
                Some(record)
            }
            Ok(None) => None,
            Err(e) => {
                tracing::error!(%key, error = %e, "failed to load address record");
                None
            }
        }
    }

    /// Writes `record` under its order's key, replacing any previous one.
    ///
    /// Returns `false` on failure, leaving the previous value intact.
    pub fn set(&self, record: &StoreRecord) -> bool {
        let key = self.key(&record.order_id);
        match self.try_set(&key, record) {
            Ok(()) => {
                tracing::debug!(%key, label = %record.store_label, "address record saved");
                true
            }
            Err(e) => {
                tracing::error!(%key, error = %e, "failed to save address record");
                false
            }
        }
    }

    pub fn remove(&self, order_id: &OrderId) {
        let key = self.key(order_id);
        if let Err(e) = self.backend.remove_item(&key) {
            tracing::error!(%key, error = %e, "failed to remove address record");
        }
    }

    /// The stored value exactly as persisted.
    #[must_use]
    pub fn raw(&self, order_id: &OrderId) -> Option<String> {
        let key = self.key(order_id);
        self.backend
            .get_item(&key)
            .map_err(|e| tracing::error!(%key, error = %e, "failed to read raw address record"))
            .ok()
            .flatten()
    }

    /// Every readable record in this namespace, ordered by key.
    #[must_use]
    pub fn records(&self) -> Vec<StoreRecord> {
        let keys = match self.backend.keys() {
            Ok(keys) => keys,
            Err(e) => {
                tracing::error!(namespace = %self.namespace, error = %e, "failed to list storage keys");
                return Vec::new();
            }
        };
        keys.iter()
            .filter_map(|key| parse_record_key(&self.namespace, key))
            .filter_map(|order_id| self.get(&order_id))
            .collect()
    }

    fn try_get(&self, key: &str) -> Result<Option<StoreRecord>, StoreError> {
        let Some(raw) = self.backend.get_item(key)? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| StoreError::Deserialize {
                key: key.to_string(),
                source,
            })
    }

    fn try_set(&self, key: &str, record: &StoreRecord) -> Result<(), StoreError> {
        let value = serde_json::to_string(record).map_err(|source| StoreError::Serialize {
            key: key.to_string(),
            source,
        })?;
        self.backend.set_item(key, &value)
    }
}
