//! The module contains the `ShoppingList` aggregate and its items.
//!
//! Each user has exactly one active list, stored as a singleton document
//! under [`ACTIVE_LIST_ID`] and created lazily. Items record which recipe
//! generated them (if any) so unmarking a pending recipe can remove exactly
//! the items it produced.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ingredients::Ingredient;
use crate::recipes::RecipeIngredient;
use crate::store::Document;

/// Well-known document id of the per-user active list.
pub const ACTIVE_LIST_ID: &str = "active";
/// Title given to the lazily-created active list.
pub const ACTIVE_LIST_TITLE: &str = "Lista activa";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShoppingListItem {
    pub id: Uuid,
    pub ingredient_id: Uuid,
    pub name: String,
    pub category: String,
    pub unit: String,
    pub quantity: Decimal,
    pub checked: bool,
    /// Recipe that generated this item via the pending workflow, if any.
    #[serde(default)]
    pub source_recipe_id: Option<Uuid>,
}

impl ShoppingListItem {
    pub fn new(ingredient: &Ingredient, quantity: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            ingredient_id: ingredient.id,
            name: ingredient.name.clone(),
            category: ingredient.category.clone(),
            unit: ingredient.unit.clone(),
            quantity,
            checked: false,
            source_recipe_id: None,
        }
    }

    /// Item generated by the pending workflow for a recipe shortfall.
    pub fn for_recipe(required: &RecipeIngredient, quantity: Decimal, recipe_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            ingredient_id: required.ingredient_id,
            name: required.name.clone(),
            category: required.category.clone(),
            unit: required.unit.clone(),
            quantity,
            checked: false,
            source_recipe_id: Some(recipe_id),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShoppingList {
    pub id: String,
    pub title: String,
    pub date: DateTime<Utc>,
    pub items: Vec<ShoppingListItem>,
}

impl ShoppingList {
    /// A fresh, empty active list.
    pub fn active() -> Self {
        Self {
            id: ACTIVE_LIST_ID.to_string(),
            title: ACTIVE_LIST_TITLE.to_string(),
            date: Utc::now(),
            items: Vec::new(),
        }
    }

    /// Adds an item, aggregating onto an existing **unchecked** item with the
    /// same `(ingredient, source recipe)` pair instead of duplicating it.
    /// Checked items are about to be finalized and are never merged into.
    ///
    /// Returns the id of the item that now carries the quantity.
    pub fn upsert(&mut self, item: ShoppingListItem) -> Uuid {
        if let Some(existing) = self.items.iter_mut().find(|candidate| {
            !candidate.checked
                && candidate.ingredient_id == item.ingredient_id
                && candidate.source_recipe_id == item.source_recipe_id
        }) {
            existing.quantity += item.quantity;
            return existing.id;
        }
        let id = item.id;
        self.items.push(item);
        id
    }

    pub fn item_mut(&mut self, item_id: Uuid) -> Option<&mut ShoppingListItem> {
        self.items.iter_mut().find(|item| item.id == item_id)
    }

    pub fn remove_item(&mut self, item_id: Uuid) -> Option<ShoppingListItem> {
        let index = self.items.iter().position(|item| item.id == item_id)?;
        Some(self.items.remove(index))
    }

    /// Splits into `(checked, unchecked)` preserving list order.
    pub fn partition_checked(&self) -> (Vec<ShoppingListItem>, Vec<ShoppingListItem>) {
        self.items.iter().cloned().partition(|item| item.checked)
    }

    /// Drops every item whose id is in `ids` (used after finalization, so
    /// items added concurrently survive).
    pub fn remove_items(&mut self, ids: &HashSet<Uuid>) {
        self.items.retain(|item| !ids.contains(&item.id));
    }

    /// Removes still-unchecked items generated by `recipe_id`; returns how
    /// many were dropped.
    pub fn remove_recipe_items(&mut self, recipe_id: Uuid) -> usize {
        let before = self.items.len();
        self.items
            .retain(|item| item.checked || item.source_recipe_id != Some(recipe_id));
        before - self.items.len()
    }
}

impl Document for ShoppingList {
    const COLLECTION: &'static str = "shopping_lists";

    fn document_id(&self) -> String {
        self.id.clone()
    }
}

#[cfg(test)]
mod tests {
    use crate::ingredients::Scope;

    use super::*;

    fn ingredient(name: &str) -> Ingredient {
        Ingredient::new(
            name.to_string(),
            "Cereales".to_string(),
            "g".to_string(),
            Scope::Common,
        )
    }

    #[test]
    fn upsert_merges_same_ingredient_and_source() {
        let mut list = ShoppingList::active();
        let rice = ingredient("Arroz");

        let first = list.upsert(ShoppingListItem::new(&rice, Decimal::from(200)));
        let second = list.upsert(ShoppingListItem::new(&rice, Decimal::from(300)));

        assert_eq!(first, second);
        assert_eq!(list.items.len(), 1);
        assert_eq!(list.items[0].quantity, Decimal::from(500));
    }

    #[test]
    fn upsert_keeps_recipe_and_manual_items_apart() {
        let mut list = ShoppingList::active();
        let rice = ingredient("Arroz");
        let recipe_id = Uuid::new_v4();
        let required = RecipeIngredient {
            ingredient_id: rice.id,
            name: rice.name.clone(),
            quantity: Decimal::from(500),
            unit: rice.unit.clone(),
            category: rice.category.clone(),
        };

        list.upsert(ShoppingListItem::new(&rice, Decimal::from(200)));
        list.upsert(ShoppingListItem::for_recipe(
            &required,
            Decimal::from(500),
            recipe_id,
        ));

        assert_eq!(list.items.len(), 2);
    }

    #[test]
    fn upsert_never_merges_into_checked_items() {
        let mut list = ShoppingList::active();
        let rice = ingredient("Arroz");

        let first = list.upsert(ShoppingListItem::new(&rice, Decimal::from(200)));
        list.item_mut(first).unwrap().checked = true;
        let second = list.upsert(ShoppingListItem::new(&rice, Decimal::from(300)));

        assert_ne!(first, second);
        assert_eq!(list.items.len(), 2);
    }

    #[test]
    fn remove_recipe_items_spares_checked_ones() {
        let mut list = ShoppingList::active();
        let rice = ingredient("Arroz");
        let recipe_id = Uuid::new_v4();
        let required = RecipeIngredient {
            ingredient_id: rice.id,
            name: rice.name.clone(),
            quantity: Decimal::from(500),
            unit: rice.unit.clone(),
            category: rice.category.clone(),
        };

        let kept = list.upsert(ShoppingListItem::for_recipe(
            &required,
            Decimal::from(200),
            recipe_id,
        ));
        list.item_mut(kept).unwrap().checked = true;
        let beans = ingredient("Alubias");
        let required_beans = RecipeIngredient {
            ingredient_id: beans.id,
            name: beans.name.clone(),
            quantity: Decimal::from(100),
            unit: beans.unit.clone(),
            category: beans.category.clone(),
        };
        list.upsert(ShoppingListItem::for_recipe(
            &required_beans,
            Decimal::from(100),
            recipe_id,
        ));

        assert_eq!(list.remove_recipe_items(recipe_id), 1);
        assert_eq!(list.items.len(), 1);
        assert!(list.items[0].checked);
    }
}
