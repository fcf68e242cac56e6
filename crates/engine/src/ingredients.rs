//! The module contains the `Ingredient` catalog entity.
//!
//! There is one logical catalog with a scope tag per entry: `Common`
//! ingredients are curated app-wide, `User` ingredients belong to one
//! account. The de-duplication key is the normalized name, so "Tomate" and
//! "tomate " resolve to the same entry.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

use crate::store::Document;

/// Visibility of a catalog record (ingredients and recipes).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Common,
    User,
}

/// A purchasable ingredient, decorated with reference-data category/unit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    /// Stable identifier, generated once and persisted so the ingredient can
    /// be renamed without breaking pantry or recipe references.
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub unit: String,
    pub scope: Scope,
}

impl Ingredient {
    pub fn new(name: String, category: String, unit: String, scope: Scope) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            category,
            unit,
            scope,
        }
    }

    /// De-duplication key: NFC-normalized, trimmed, lowercased name.
    pub fn normalized_name(&self) -> String {
        normalized_name(&self.name)
    }
}

impl Document for Ingredient {
    const COLLECTION: &'static str = "ingredients";

    /// Keyed by the normalized name, so a compare-and-swap create enforces
    /// per-scope uniqueness at write time. Lookups by `id` go through a
    /// collection scan.
    fn document_id(&self) -> String {
        self.normalized_name()
    }
}

pub(crate) fn normalized_name(name: &str) -> String {
    name.nfc().collect::<String>().trim().to_lowercase()
}

/// Which scope wins when both define the same normalized name.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MergePolicy {
    #[default]
    CommonWins,
    UserWins,
}

/// Merges the two catalog scopes into one flat, duplicate-free list.
///
/// Loser entries are dropped from display; output is sorted by normalized
/// name so the result is deterministic regardless of storage order.
pub(crate) fn merge_catalogs(
    common: Vec<Ingredient>,
    user: Vec<Ingredient>,
    policy: MergePolicy,
) -> Vec<Ingredient> {
    let (first, second) = match policy {
        MergePolicy::CommonWins => (common, user),
        MergePolicy::UserWins => (user, common),
    };

    let mut seen: HashSet<String> = HashSet::with_capacity(first.len() + second.len());
    let mut merged: Vec<Ingredient> = Vec::with_capacity(first.len() + second.len());
    for ingredient in first.into_iter().chain(second) {
        if seen.insert(ingredient.normalized_name()) {
            merged.push(ingredient);
        }
    }
    merged.sort_by_key(Ingredient::normalized_name);
    merged
}
