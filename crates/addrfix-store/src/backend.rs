//! String-keyed storage backends.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::StoreError;

/// A `localStorage`-shaped key/value backend.
///
/// Methods take `&self`; implementations synchronize internally so one
/// backend can be shared between the capture and restore paths.
pub trait StorageBackend: Send + Sync {
    /// # Errors
    ///
    /// Returns [`StoreError`] if the underlying medium cannot be read.
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Writes `value` under `key`. A failed write leaves any previous value
    /// in place.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::QuotaExceeded`] or an I/O error.
    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// # Errors
    ///
    /// Returns [`StoreError`] if the underlying medium cannot be written.
    fn remove_item(&self, key: &str) -> Result<(), StoreError>;

    /// # Errors
    ///
    /// Returns [`StoreError`] if the underlying medium cannot be read.
    fn keys(&self) -> Result<Vec<String>, StoreError>;
}

/// In-process backend with an optional byte quota over keys plus values.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    items: Mutex<BTreeMap<String, String>>,
    quota_bytes: Option<usize>,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            items: Mutex::default(),
            quota_bytes: Some(quota_bytes),
        }
    }

    fn items(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl StorageBackend for MemoryBackend {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.items().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut items = self.items();
        if let Some(quota) = self.quota_bytes {
            let used: usize = items
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let needed = used + key.len() + value.len();
            if needed > quota {
                return Err(StoreError::QuotaExceeded {
                    key: key.to_string(),
                    needed,
                    quota,
                });
            }
        }
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StoreError> {
        self.items().remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.items().keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_backend_round_trips_items() {
        let backend = MemoryBackend::new();
        backend.set_item("a", "1").unwrap();
        assert_eq!(backend.get_item("a").unwrap().as_deref(), Some("1"));
        backend.remove_item("a").unwrap();
        assert!(backend.get_item("a").unwrap().is_none());
    }

    #[test]
    fn quota_overflow_keeps_previous_value() {
        let backend = MemoryBackend::with_quota(10);
        backend.set_item("k", "short").unwrap();
        let err = backend.set_item("k", "much too long").unwrap_err();
        assert!(matches!(err, StoreError::QuotaExceeded { quota: 10, .. }));
        assert_eq!(backend.get_item("k").unwrap().as_deref(), Some("short"));
    }

    #[test]
    fn quota_counts_replacement_not_duplicate() {
        let backend = MemoryBackend::with_quota(6);
        backend.set_item("k", "12345").unwrap();
        backend.set_item("k", "54321").unwrap();
        assert_eq!(backend.get_item("k").unwrap().as_deref(), Some("54321"));
    }

    #[test]
    fn keys_are_sorted() {
        let backend = MemoryBackend::new();
        backend.set_item("b", "2").unwrap();
        backend.set_item("a", "1").unwrap();
        assert_eq!(backend.keys().unwrap(), vec!["a", "b"]);
    }
}
