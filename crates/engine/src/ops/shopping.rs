use std::collections::HashSet;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::history::ShoppingHistoryEntry;
use crate::journal::{ReconcileStep, Workflow};
use crate::shopping::{ACTIVE_LIST_ID, ShoppingList, ShoppingListItem};
use crate::store::{Document, Store, StoreError, Versioned};
use crate::util::ensure_positive_quantity;
use crate::{EngineError, ResultEngine};

use super::pantry::cas_exhausted;
use super::{CAS_ATTEMPTS, Engine};

/// Result of finalizing a purchase.
#[derive(Clone, Debug, PartialEq)]
pub enum FinalizeOutcome {
    /// No item was checked; nothing moved and no history was written.
    Nothing,
    /// Checked items were moved into the pantry and archived.
    Archived {
        moved: usize,
        entry: ShoppingHistoryEntry,
    },
}

impl<S: Store> Engine<S> {
    /// The current active shopping list, lazily created.
    ///
    /// Creation goes through a compare-and-swap on the singleton document:
    /// under a concurrent first use, exactly one caller creates the list and
    /// the others re-read it.
    pub async fn active_list(&self, user_id: &str) -> ResultEngine<ShoppingList> {
        Ok(self.active_list_versioned(user_id).await?.doc)
    }

    pub(super) async fn active_list_versioned(
        &self,
        user_id: &str,
    ) -> ResultEngine<Versioned<ShoppingList>> {
        let ns = Self::user_ns(user_id);
        for _ in 0..CAS_ATTEMPTS {
            if let Some(found) = self.store.get::<ShoppingList>(&ns, ACTIVE_LIST_ID).await? {
                return Ok(found);
            }
            let fresh = ShoppingList::active();
            match self.store.put_if_version(&ns, &fresh, None).await {
                Ok(version) => {
                    tracing::debug!(user_id, "active shopping list created");
                    return Ok(Versioned {
                        doc: fresh,
                        version,
                    });
                }
                // Someone else won the create race; re-read their list.
                Err(StoreError::Conflict { .. }) => continue,
                Err(err) => return Err(err.into()),
            }
        }
        Err(cas_exhausted(ShoppingList::COLLECTION, ACTIVE_LIST_ID))
    }

    /// Appends `quantity` of an ingredient to the active list, aggregating
    /// onto an existing unchecked manual item for the same ingredient.
    pub async fn add_item(
        &self,
        user_id: &str,
        ingredient_id: Uuid,
        quantity: Decimal,
    ) -> ResultEngine<Uuid> {
        ensure_positive_quantity(quantity, "shopping item quantity")?;
        let ingredient = self.find_ingredient(user_id, ingredient_id).await?;
        self.mutate_active_list(user_id, |list| {
            Ok(list.upsert(ShoppingListItem::new(&ingredient, quantity)))
        })
        .await
    }

    /// Flips the checked flag of one item. Pure state transition: no pantry
    /// side effects until finalization.
    pub async fn toggle_item_checked(
        &self,
        user_id: &str,
        item_id: Uuid,
        checked: bool,
    ) -> ResultEngine<()> {
        self.mutate_active_list(user_id, |list| {
            let item = list
                .item_mut(item_id)
                .ok_or_else(|| EngineError::NotFound(format!("shopping item {item_id}")))?;
            item.checked = checked;
            Ok(())
        })
        .await
    }

    /// Overwrites an item (quantity edit path).
    pub async fn update_item(&self, user_id: &str, item: ShoppingListItem) -> ResultEngine<()> {
        ensure_positive_quantity(item.quantity, "shopping item quantity")?;
        self.mutate_active_list(user_id, |list| {
            let slot = list
                .item_mut(item.id)
                .ok_or_else(|| EngineError::NotFound(format!("shopping item {}", item.id)))?;
            *slot = item.clone();
            Ok(())
        })
        .await
    }

    pub async fn delete_item(&self, user_id: &str, item_id: Uuid) -> ResultEngine<()> {
        self.mutate_active_list(user_id, |list| {
            list.remove_item(item_id)
                .map(|_| ())
                .ok_or_else(|| EngineError::NotFound(format!("shopping item {item_id}")))
        })
        .await
    }

    /// Moves the checked items into the pantry and archives them.
    ///
    /// Sub-steps run in order: pantry deposits, history snapshot, list
    /// truncation. They are not transactional against the store; a failure
    /// after the first completed effect is reported as
    /// [`EngineError::PartialReconciliation`] (with a queryable note) and
    /// nothing is rolled back.
    ///
    /// Guarded by a per-user lease on the active list: a second finalization
    /// while one is in flight fails with
    /// [`EngineError::AlreadyInProgress`] instead of depositing and
    /// archiving the same items twice.
    pub async fn finalize_purchase(&self, user_id: &str) -> ResultEngine<FinalizeOutcome> {
        let _lease = self.begin_in_flight(
            user_id,
            ACTIVE_LIST_ID.to_string(),
            "purchase finalization".to_string(),
        )?;
        let Versioned { doc: list, version } = self.active_list_versioned(user_id).await?;
        let (checked, _) = list.partition_checked();
        if checked.is_empty() {
            return Ok(FinalizeOutcome::Nothing);
        }
        tracing::debug!(user_id, moved = checked.len(), "finalizing purchase");

        let mut completed = 0usize;
        for item in &checked {
            if let Err(err) = self.deposit_purchase(user_id, item).await {
                // Nothing happened yet on the first item: plain failure.
                if completed == 0 {
                    return Err(err);
                }
                return Err(self
                    .record_partial(
                        user_id,
                        Workflow::Finalize,
                        ReconcileStep::PantryDeposit,
                        completed,
                        err,
                    )
                    .await);
            }
            completed += 1;
        }

        let entry = ShoppingHistoryEntry::snapshot(&list.title, checked.clone());
        if let Err(err) = self.append_history(user_id, &entry).await {
            return Err(self
                .record_partial(
                    user_id,
                    Workflow::Finalize,
                    ReconcileStep::HistoryAppend,
                    completed,
                    err,
                )
                .await);
        }
        completed += 1;

        let moved_ids: HashSet<Uuid> = checked.iter().map(|item| item.id).collect();
        if let Err(err) = self
            .truncate_list(user_id, list, version, &moved_ids)
            .await
        {
            return Err(self
                .record_partial(
                    user_id,
                    Workflow::Finalize,
                    ReconcileStep::ListWrite,
                    completed,
                    err,
                )
                .await);
        }

        Ok(FinalizeOutcome::Archived {
            moved: checked.len(),
            entry,
        })
    }

    /// Removes the moved items from the active list, preserving items added
    /// concurrently during finalization.
    async fn truncate_list(
        &self,
        user_id: &str,
        list: ShoppingList,
        version: u64,
        moved_ids: &HashSet<Uuid>,
    ) -> ResultEngine<()> {
        let ns = Self::user_ns(user_id);
        let mut attempt = Versioned { doc: list, version };
        for _ in 0..CAS_ATTEMPTS {
            attempt.doc.remove_items(moved_ids);
            match self
                .store
                .put_if_version(&ns, &attempt.doc, Some(attempt.version))
                .await
            {
                Ok(_) => return Ok(()),
                Err(StoreError::Conflict { .. }) => {
                    attempt = self.active_list_versioned(user_id).await?;
                }
                Err(err) => return Err(err.into()),
            }
        }
        Err(cas_exhausted(ShoppingList::COLLECTION, ACTIVE_LIST_ID))
    }

    /// Optimistic read-modify-write loop on the active list.
    pub(super) async fn mutate_active_list<R>(
        &self,
        user_id: &str,
        mut apply: impl FnMut(&mut ShoppingList) -> ResultEngine<R> + Send,
    ) -> ResultEngine<R> {
        let ns = Self::user_ns(user_id);
        for _ in 0..CAS_ATTEMPTS {
            let Versioned { doc: mut list, version } = self.active_list_versioned(user_id).await?;
            let out = apply(&mut list)?;
            match self.store.put_if_version(&ns, &list, Some(version)).await {
                Ok(_) => return Ok(out),
                Err(StoreError::Conflict { .. }) => continue,
                Err(err) => return Err(err.into()),
            }
        }
        Err(cas_exhausted(ShoppingList::COLLECTION, ACTIVE_LIST_ID))
    }
}
