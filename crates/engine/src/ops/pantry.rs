use rust_decimal::Decimal;
use uuid::Uuid;

use crate::pantry::PantryEntry;
use crate::shopping::ShoppingListItem;
use crate::store::{Document, Store, StoreError, Versioned};
use crate::util::ensure_positive_quantity;
use crate::{EngineError, ResultEngine};

use super::{CAS_ATTEMPTS, Engine};

impl<S: Store> Engine<S> {
    /// Quantity on hand, sorted by ingredient name.
    pub async fn pantry(&self, user_id: &str) -> ResultEngine<Vec<PantryEntry>> {
        let mut entries: Vec<PantryEntry> = self
            .store
            .list::<PantryEntry>(&Self::user_ns(user_id))
            .await?
            .into_iter()
            .map(|versioned| versioned.doc)
            .collect();
        entries.sort_by_key(|entry| entry.name.to_lowercase());
        Ok(entries)
    }

    /// Adds `delta` onto the quantity on hand, creating the entry on first
    /// purchase. The entry's name/category/unit are refreshed from the
    /// catalog on every call, never left as a stale snapshot.
    pub async fn add_to_pantry(
        &self,
        user_id: &str,
        ingredient_id: Uuid,
        delta: Decimal,
    ) -> ResultEngine<PantryEntry> {
        ensure_positive_quantity(delta, "pantry deposit")?;
        let ingredient = self.find_ingredient(user_id, ingredient_id).await?;
        self.deposit_fields(
            user_id,
            ingredient_id,
            &ingredient.name,
            &ingredient.category,
            &ingredient.unit,
            delta,
        )
        .await
    }

    /// Subtracts `amount` from the quantity on hand, flooring at zero.
    ///
    /// An entry driven to zero is deleted, not kept at zero; depleting an
    /// ingredient with no entry is a no-op.
    pub async fn deplete_pantry(
        &self,
        user_id: &str,
        ingredient_id: Uuid,
        amount: Decimal,
    ) -> ResultEngine<()> {
        ensure_positive_quantity(amount, "pantry depletion")?;
        let ns = Self::user_ns(user_id);
        let id = ingredient_id.to_string();

        for _ in 0..CAS_ATTEMPTS {
            let Some(Versioned { mut doc, version }) =
                self.store.get::<PantryEntry>(&ns, &id).await?
            else {
                return Ok(());
            };

            let result = if doc.drain(amount) {
                self.store
                    .delete_if_version::<PantryEntry>(&ns, &id, version)
                    .await
            } else {
                self.store.put_if_version(&ns, &doc, Some(version)).await.map(|_| ())
            };
            match result {
                Ok(()) => return Ok(()),
                Err(StoreError::Conflict { .. }) => continue,
                Err(err) => return Err(err.into()),
            }
        }
        Err(cas_exhausted(PantryEntry::COLLECTION, &id))
    }

    /// Manual-edit path: overwrites quantity and category/unit directly.
    ///
    /// A zero quantity behaves as delete; a negative one is rejected.
    pub async fn update_pantry_entry(&self, user_id: &str, entry: PantryEntry) -> ResultEngine<()> {
        if entry.quantity < Decimal::ZERO {
            return Err(EngineError::InvalidQuantity(format!(
                "pantry quantity must be >= 0, got {}",
                entry.quantity
            )));
        }

        let ns = Self::user_ns(user_id);
        let id = entry.ingredient_id.to_string();
        if self.store.get::<PantryEntry>(&ns, &id).await?.is_none() {
            return Err(EngineError::NotFound(format!("pantry entry {}", entry.id)));
        }

        if entry.is_empty() {
            self.store.delete::<PantryEntry>(&ns, &id).await?;
        } else {
            self.store.put(&ns, &entry).await?;
        }
        Ok(())
    }

    /// Removes an entry unconditionally.
    pub async fn delete_pantry_entry(&self, user_id: &str, entry_id: Uuid) -> ResultEngine<()> {
        let ns = Self::user_ns(user_id);
        let entries = self.store.list::<PantryEntry>(&ns).await?;
        let Some(found) = entries
            .into_iter()
            .find(|versioned| versioned.doc.id == entry_id)
        else {
            return Err(EngineError::NotFound(format!("pantry entry {entry_id}")));
        };
        self.store
            .delete::<PantryEntry>(&ns, &found.doc.document_id())
            .await?;
        Ok(())
    }

    /// Moves one finalized purchase into the pantry. Catalog fields are
    /// carried from the current ingredient record when it still exists, and
    /// from the item snapshot otherwise.
    pub(super) async fn deposit_purchase(
        &self,
        user_id: &str,
        item: &ShoppingListItem,
    ) -> ResultEngine<PantryEntry> {
        match self.find_ingredient(user_id, item.ingredient_id).await {
            Ok(ingredient) => {
                self.deposit_fields(
                    user_id,
                    item.ingredient_id,
                    &ingredient.name,
                    &ingredient.category,
                    &ingredient.unit,
                    item.quantity,
                )
                .await
            }
            Err(EngineError::NotFound(_)) => {
                self.deposit_fields(
                    user_id,
                    item.ingredient_id,
                    &item.name,
                    &item.category,
                    &item.unit,
                    item.quantity,
                )
                .await
            }
            Err(err) => Err(err),
        }
    }

    /// Optimistic aggregate-or-create loop on the per-ingredient entry.
    async fn deposit_fields(
        &self,
        user_id: &str,
        ingredient_id: Uuid,
        name: &str,
        category: &str,
        unit: &str,
        delta: Decimal,
    ) -> ResultEngine<PantryEntry> {
        let ns = Self::user_ns(user_id);
        let id = ingredient_id.to_string();

        for _ in 0..CAS_ATTEMPTS {
            let attempt = match self.store.get::<PantryEntry>(&ns, &id).await? {
                Some(Versioned { mut doc, version }) => {
                    doc.deposit(delta);
                    doc.refresh_from(name, category, unit);
                    (doc, Some(version))
                }
                None => {
                    let entry = PantryEntry::new(
                        ingredient_id,
                        name.to_string(),
                        category.to_string(),
                        unit.to_string(),
                        delta,
                    );
                    (entry, None)
                }
            };
            match self.store.put_if_version(&ns, &attempt.0, attempt.1).await {
                Ok(_) => return Ok(attempt.0),
                Err(StoreError::Conflict { .. }) => continue,
                Err(err) => return Err(err.into()),
            }
        }
        Err(cas_exhausted(PantryEntry::COLLECTION, &id))
    }
}

pub(super) fn cas_exhausted(collection: &'static str, id: &str) -> EngineError {
    EngineError::Store(StoreError::Conflict {
        collection,
        id: id.to_string(),
    })
}
