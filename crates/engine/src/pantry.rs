//! The module contains the `PantryEntry` struct and its implementation.
//!
//! A pantry entry is the quantity on hand of one ingredient for one user.
//! Stored quantity is always strictly positive: an entry driven to zero is
//! deleted, never kept around at zero. Entries are keyed in storage by
//! `ingredient_id`, so a user holds at most one entry per ingredient.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::Document;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PantryEntry {
    pub id: Uuid,
    pub ingredient_id: Uuid,
    /// Denormalized catalog fields, refreshed on every aggregation so they
    /// track the ingredient's current name/category/unit.
    pub name: String,
    pub category: String,
    pub unit: String,
    pub quantity: Decimal,
}

impl PantryEntry {
    pub fn new(
        ingredient_id: Uuid,
        name: String,
        category: String,
        unit: String,
        quantity: Decimal,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            ingredient_id,
            name,
            category,
            unit,
            quantity,
        }
    }

    /// Adds a purchased amount onto the quantity on hand.
    pub fn deposit(&mut self, delta: Decimal) {
        self.quantity += delta;
    }

    /// Subtracts `amount`, flooring at zero. Returns `true` when the entry is
    /// emptied and must be removed from storage.
    pub fn drain(&mut self, amount: Decimal) -> bool {
        self.quantity -= amount;
        if self.quantity <= Decimal::ZERO {
            self.quantity = Decimal::ZERO;
            return true;
        }
        false
    }

    pub fn is_empty(&self) -> bool {
        self.quantity <= Decimal::ZERO
    }

    /// Refreshes the denormalized fields from the catalog record.
    pub fn refresh_from(&mut self, name: &str, category: &str, unit: &str) {
        self.name = name.to_string();
        self.category = category.to_string();
        self.unit = unit.to_string();
    }
}

impl Document for PantryEntry {
    const COLLECTION: &'static str = "pantry";

    // Keyed by ingredient: at most one entry per ingredient per user.
    fn document_id(&self) -> String {
        self.ingredient_id.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(quantity: i64) -> PantryEntry {
        PantryEntry::new(
            Uuid::new_v4(),
            String::from("Arroz"),
            String::from("Cereales"),
            String::from("g"),
            Decimal::from(quantity),
        )
    }

    #[test]
    fn deposit_aggregates() {
        let mut entry = entry(200);
        entry.deposit(Decimal::from(300));
        assert_eq!(entry.quantity, Decimal::from(500));
    }

    #[test]
    fn drain_below_stock_keeps_entry() {
        let mut entry = entry(500);
        assert!(!entry.drain(Decimal::from(200)));
        assert_eq!(entry.quantity, Decimal::from(300));
    }

    #[test]
    fn drain_to_exact_zero_empties() {
        let mut entry = entry(500);
        assert!(entry.drain(Decimal::from(500)));
        assert!(entry.is_empty());
    }

    #[test]
    fn drain_past_zero_floors() {
        let mut entry = entry(100);
        assert!(entry.drain(Decimal::from(900)));
        assert_eq!(entry.quantity, Decimal::ZERO);
    }
}
