//! The module contains the bounded purchase-history archive entry.
//!
//! Entries are immutable snapshots written only by purchase finalization.
//! The archive keeps at most [`HISTORY_CAP`] entries per user; inserting
//! beyond the cap evicts the oldest.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shopping::ShoppingListItem;
use crate::store::Document;

/// Maximum number of archived purchases kept per user.
pub const HISTORY_CAP: usize = 5;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShoppingHistoryEntry {
    pub id: Uuid,
    pub title: String,
    pub date: DateTime<Utc>,
    /// Snapshot of the purchased items; never edited after creation.
    pub items: Vec<ShoppingListItem>,
}

impl ShoppingHistoryEntry {
    pub fn snapshot(title: &str, items: Vec<ShoppingListItem>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.to_string(),
            date: Utc::now(),
            items,
        }
    }
}

impl Document for ShoppingHistoryEntry {
    const COLLECTION: &'static str = "shopping_history";

    fn document_id(&self) -> String {
        self.id.to_string()
    }
}
