//! Detail-view capture of the displayed address.

use std::sync::Arc;
use std::time::Duration;

use addrfix_core::{OrderId, StoreRecord};
use addrfix_store::PersistenceStore;
use chrono::Utc;

use crate::page::AddressLabelSource;

#[derive(Debug, Clone)]
pub struct Capturer {
    store: Arc<PersistenceStore>,
}

impl Capturer {
    #[must_use]
    pub fn new(store: Arc<PersistenceStore>) -> Self {
        Self { store }
    }

    /// Reads the label and stores a fresh suggested record for `order_id`,
    /// replacing any earlier one.
    ///
    /// Returns `true` only if a record was written.
    pub fn capture<S>(&self, order_id: &OrderId, source: &S) -> bool
    where
        S: AddressLabelSource + ?Sized,
    {
        let Some(label) = source
            .extract_address_label()
            .filter(|label| !label.trim().is_empty())
        else {
            tracing::debug!(%order_id, "no address label rendered; nothing captured");
            return false;
        };

        let record = StoreRecord::suggested(order_id.clone(), label, Utc::now());
        let saved = self.store.set(&record);
        if saved {
            tracing::info!(%order_id, label = %record.store_label, "address captured");
        }
        saved
    }

    /// [`Self::capture`] after `delay`; the detail page signals nothing when
    /// it finishes rendering.
    pub async fn capture_after<S>(&self, delay: Duration, order_id: &OrderId, source: &S) -> bool
    where
        S: AddressLabelSource + Sync + ?Sized,
    {
        tokio::time::sleep(delay).await;
        self.capture(order_id, source)
    }
}
