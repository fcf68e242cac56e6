//! The module contains the `Recipe` entity and the per-user membership
//! marks (pending, favorite).
//!
//! Pending and favorite are independent axes: both are idempotent membership
//! flips, not counters. The marks are keyed by recipe id so a recipe can
//! appear at most once in each set.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ingredients::Scope;
use crate::store::Document;

/// One required ingredient of a recipe, with the quantity the recipe needs
/// in total.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecipeIngredient {
    pub ingredient_id: Uuid,
    pub name: String,
    pub quantity: Decimal,
    pub unit: String,
    pub category: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: Uuid,
    pub name: String,
    pub ingredients: Vec<RecipeIngredient>,
    pub steps: Vec<String>,
    pub date_created: DateTime<Utc>,
    /// `Common` recipes are visible to everyone (admin-authored); `User`
    /// recipes only to their author.
    pub scope: Scope,
}

impl Recipe {
    pub fn new(
        name: String,
        ingredients: Vec<RecipeIngredient>,
        steps: Vec<String>,
        scope: Scope,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            ingredients,
            steps,
            date_created: Utc::now(),
            scope,
        }
    }
}

impl Document for Recipe {
    const COLLECTION: &'static str = "recipes";

    fn document_id(&self) -> String {
        self.id.to_string()
    }
}

/// Membership record: the user intends to cook this recipe soon.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PendingMark {
    pub recipe_id: Uuid,
    pub marked_at: DateTime<Utc>,
}

impl PendingMark {
    pub fn new(recipe_id: Uuid) -> Self {
        Self {
            recipe_id,
            marked_at: Utc::now(),
        }
    }
}

impl Document for PendingMark {
    const COLLECTION: &'static str = "pending_recipes";

    fn document_id(&self) -> String {
        self.recipe_id.to_string()
    }
}

/// Membership record: the user marked this recipe as favorite.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FavoriteMark {
    pub recipe_id: Uuid,
    pub marked_at: DateTime<Utc>,
}

impl FavoriteMark {
    pub fn new(recipe_id: Uuid) -> Self {
        Self {
            recipe_id,
            marked_at: Utc::now(),
        }
    }
}

impl Document for FavoriteMark {
    const COLLECTION: &'static str = "favorites";

    fn document_id(&self) -> String {
        self.recipe_id.to_string()
    }
}

/// Joint pending/favorite state of one recipe for one user, as queried per
/// recipe row by the presentation layer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RecipeStatus {
    pub pending: bool,
    pub favorite: bool,
}
