use uuid::Uuid;

use crate::history::{HISTORY_CAP, ShoppingHistoryEntry};
use crate::shopping::ShoppingListItem;
use crate::store::Store;
use crate::{EngineError, ResultEngine};

use super::Engine;

impl<S: Store> Engine<S> {
    /// Archived purchases, newest first. The archive never holds more than
    /// [`HISTORY_CAP`] entries.
    pub async fn recent_history(&self, user_id: &str) -> ResultEngine<Vec<ShoppingHistoryEntry>> {
        let mut entries = self.all_history(user_id).await?;
        entries.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        entries.truncate(HISTORY_CAP);
        Ok(entries)
    }

    /// The immutable item snapshot of one archived purchase.
    pub async fn history_items(
        &self,
        user_id: &str,
        history_id: Uuid,
    ) -> ResultEngine<Vec<ShoppingListItem>> {
        let found = self
            .store
            .get::<ShoppingHistoryEntry>(&Self::user_ns(user_id), &history_id.to_string())
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("history entry {history_id}")))?;
        Ok(found.doc.items)
    }

    /// User-initiated removal; no cap interaction.
    pub async fn delete_history_entry(&self, user_id: &str, history_id: Uuid) -> ResultEngine<()> {
        self.store
            .delete::<ShoppingHistoryEntry>(&Self::user_ns(user_id), &history_id.to_string())
            .await?;
        Ok(())
    }

    /// Inserts a finalized snapshot, then evicts oldest-by-date entries until
    /// the archive is back at the cap.
    pub(super) async fn append_history(
        &self,
        user_id: &str,
        entry: &ShoppingHistoryEntry,
    ) -> ResultEngine<()> {
        let ns = Self::user_ns(user_id);
        self.store.put(&ns, entry).await?;

        let mut entries = self.all_history(user_id).await?;
        if entries.len() > HISTORY_CAP {
            entries.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));
            let excess = entries.len() - HISTORY_CAP;
            for old in entries.into_iter().take(excess) {
                self.store
                    .delete::<ShoppingHistoryEntry>(&ns, &old.id.to_string())
                    .await?;
            }
        }
        Ok(())
    }

    async fn all_history(&self, user_id: &str) -> ResultEngine<Vec<ShoppingHistoryEntry>> {
        Ok(self
            .store
            .list::<ShoppingHistoryEntry>(&Self::user_ns(user_id))
            .await?
            .into_iter()
            .map(|versioned| versioned.doc)
            .collect())
    }
}
