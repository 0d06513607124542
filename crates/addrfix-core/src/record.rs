//! The persisted association between an order and its address label.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of an order in the host application, as it appears in the
/// `ID` query parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct OrderId(String);

impl OrderId {
    /// Returns `None` for blank identifiers.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One address record per order.
///
/// The order id is carried by the storage key, not the JSON value, so it is
/// skipped during (de)serialization and filled in by the store on load.
///
/// `user_selected` is only ever `Some(true)`: it marks a record written from a
/// real user choice, as opposed to a label suggested by the detail page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreRecord {
    #[serde(skip)]
    pub order_id: OrderId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_id: Option<String>,
    pub store_label: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_selected: Option<bool>,
}

impl StoreRecord {
    /// A record captured from the detail view.
    #[must_use]
    pub fn suggested(order_id: OrderId, store_label: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            order_id,
            store_id: None,
            store_label: store_label.into(),
            timestamp: at.timestamp_millis(),
            user_selected: None,
        }
    }

    /// A record written after the user picked an address by hand.
    #[must_use]
    pub fn confirmed(
        order_id: OrderId,
        store_id: impl Into<String>,
        store_label: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            order_id,
            store_id: Some(store_id.into()),
            store_label: store_label.into(),
            timestamp: at.timestamp_millis(),
            user_selected: Some(true),
        }
    }

    #[must_use]
    pub fn is_user_selected(&self) -> bool {
        self.user_selected == Some(true)
    }
}
