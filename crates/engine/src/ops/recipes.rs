use std::collections::HashSet;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::ingredients::Scope;
use crate::journal::{ReconcileStep, Workflow};
use crate::pantry::PantryEntry;
use crate::recipes::{FavoriteMark, PendingMark, Recipe, RecipeIngredient, RecipeStatus};
use crate::shopping::{ACTIVE_LIST_ID, ShoppingList, ShoppingListItem};
use crate::store::{Document, Namespace, Store, StoreError};
use crate::util::{normalize_required_name, shortfall};
use crate::{EngineError, ResultEngine};

use super::pantry::cas_exhausted;
use super::{CAS_ATTEMPTS, Engine};

/// Result of toggling a recipe's pending state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PendingToggle {
    /// The recipe is now pending; one list item was added per ingredient
    /// with a shortfall.
    Marked { items_added: usize },
    /// The recipe is no longer pending; its still-unchecked generated items
    /// were removed from the active list.
    Unmarked { items_removed: usize },
}

impl<S: Store> Engine<S> {
    /// Authors a recipe, common-scoped when the caller is an admin.
    pub async fn new_recipe(
        &self,
        user_id: &str,
        name: &str,
        ingredients: Vec<RecipeIngredient>,
        steps: Vec<String>,
        is_admin: bool,
    ) -> ResultEngine<Recipe> {
        let name = normalize_required_name(name, "recipe")?;
        for required in &ingredients {
            if required.quantity <= Decimal::ZERO {
                return Err(EngineError::InvalidQuantity(format!(
                    "required quantity for \"{}\" must be > 0, got {}",
                    required.name, required.quantity
                )));
            }
        }

        let scope = if is_admin { Scope::Common } else { Scope::User };
        let recipe = Recipe::new(name, ingredients, steps, scope);
        self.store
            .put_if_version(&self.recipe_ns(user_id, scope), &recipe, None)
            .await?;
        Ok(recipe)
    }

    /// Visible recipes (common ∪ own), newest first.
    pub async fn recipes(&self, user_id: &str) -> ResultEngine<Vec<Recipe>> {
        let mut recipes: Vec<Recipe> = Vec::new();
        for ns in [Namespace::Common, Self::user_ns(user_id)] {
            recipes.extend(
                self.store
                    .list::<Recipe>(&ns)
                    .await?
                    .into_iter()
                    .map(|versioned| versioned.doc),
            );
        }
        recipes.sort_by(|a, b| b.date_created.cmp(&a.date_created).then(b.id.cmp(&a.id)));
        Ok(recipes)
    }

    pub async fn find_recipe(&self, user_id: &str, recipe_id: Uuid) -> ResultEngine<Recipe> {
        let id = recipe_id.to_string();
        for ns in [Self::user_ns(user_id), Namespace::Common] {
            if let Some(found) = self.store.get::<Recipe>(&ns, &id).await? {
                return Ok(found.doc);
            }
        }
        Err(EngineError::NotFound(format!("recipe {recipe_id}")))
    }

    /// Deletes an own recipe; admins may also delete common-scope ones.
    pub async fn delete_recipe(
        &self,
        user_id: &str,
        recipe_id: Uuid,
        is_admin: bool,
    ) -> ResultEngine<()> {
        let id = recipe_id.to_string();
        let user_ns = Self::user_ns(user_id);
        if self.store.get::<Recipe>(&user_ns, &id).await?.is_some() {
            self.store.delete::<Recipe>(&user_ns, &id).await?;
            return Ok(());
        }
        if is_admin && self.store.get::<Recipe>(&Namespace::Common, &id).await?.is_some() {
            self.store.delete::<Recipe>(&Namespace::Common, &id).await?;
            return Ok(());
        }
        Err(EngineError::NotFound(format!("recipe {recipe_id}")))
    }

    /// Idempotent membership flip; returns the new favorite state.
    pub async fn toggle_favorite(&self, user_id: &str, recipe_id: Uuid) -> ResultEngine<bool> {
        let ns = Self::user_ns(user_id);
        let id = recipe_id.to_string();
        if self.store.get::<FavoriteMark>(&ns, &id).await?.is_some() {
            self.store.delete::<FavoriteMark>(&ns, &id).await?;
            Ok(false)
        } else {
            self.store.put(&ns, &FavoriteMark::new(recipe_id)).await?;
            Ok(true)
        }
    }

    pub async fn favorites(&self, user_id: &str) -> ResultEngine<HashSet<Uuid>> {
        Ok(self
            .store
            .list::<FavoriteMark>(&Self::user_ns(user_id))
            .await?
            .into_iter()
            .map(|versioned| versioned.doc.recipe_id)
            .collect())
    }

    pub async fn pending(&self, user_id: &str) -> ResultEngine<HashSet<Uuid>> {
        Ok(self
            .store
            .list::<PendingMark>(&Self::user_ns(user_id))
            .await?
            .into_iter()
            .map(|versioned| versioned.doc.recipe_id)
            .collect())
    }

    /// Joint pending/favorite state for one recipe row.
    pub async fn recipe_status(
        &self,
        user_id: &str,
        recipe_id: Uuid,
    ) -> ResultEngine<RecipeStatus> {
        let ns = Self::user_ns(user_id);
        let id = recipe_id.to_string();
        Ok(RecipeStatus {
            pending: self.store.get::<PendingMark>(&ns, &id).await?.is_some(),
            favorite: self.store.get::<FavoriteMark>(&ns, &id).await?.is_some(),
        })
    }

    /// Toggles the pending state of a recipe.
    ///
    /// Marking computes, per required ingredient, the shortfall against the
    /// pantry (`max(0, required - on hand)`) and pushes one item per missing
    /// ingredient onto the active list — what the user still needs to buy,
    /// not what the recipe needs in total. The pending mark is written only
    /// after the list additions landed, so a list failure leaves the recipe
    /// unmarked.
    ///
    /// Unmarking removes the mark, then drops this recipe's still-unchecked
    /// generated items from the active list (no active list: the unmark
    /// still succeeds with no cleanup).
    ///
    /// Guarded by a per-(user, recipe) lease: a second call while one is in
    /// flight fails with [`EngineError::AlreadyInProgress`] and performs
    /// nothing, so a rapid double-tap cannot insert twice.
    pub async fn toggle_pending(
        &self,
        user_id: &str,
        recipe_id: Uuid,
    ) -> ResultEngine<PendingToggle> {
        let _lease = self.begin_in_flight(
            user_id,
            recipe_id.to_string(),
            format!("pending toggle for recipe {recipe_id}"),
        )?;
        let recipe = self.find_recipe(user_id, recipe_id).await?;

        let marked = self
            .store
            .get::<PendingMark>(&Self::user_ns(user_id), &recipe_id.to_string())
            .await?
            .is_some();
        if marked {
            self.unmark_pending(user_id, &recipe).await
        } else {
            self.mark_pending(user_id, &recipe).await
        }
    }

    /// Depletes the pantry by the recipe's required quantities (flooring at
    /// zero) and clears the pending mark unconditionally — cooking is
    /// terminal for pending status however it was reached.
    pub async fn mark_cooked(&self, user_id: &str, recipe_id: Uuid) -> ResultEngine<()> {
        let _lease = self.begin_in_flight(
            user_id,
            recipe_id.to_string(),
            format!("mark cooked for recipe {recipe_id}"),
        )?;
        let recipe = self.find_recipe(user_id, recipe_id).await?;
        tracing::debug!(user_id, recipe = %recipe.name, "marking recipe cooked");

        let mut completed = 0usize;
        for required in &recipe.ingredients {
            if required.quantity <= Decimal::ZERO {
                continue;
            }
            if let Err(err) = self
                .deplete_pantry(user_id, required.ingredient_id, required.quantity)
                .await
            {
                if completed == 0 {
                    return Err(err);
                }
                return Err(self
                    .record_partial(
                        user_id,
                        Workflow::MarkCooked,
                        ReconcileStep::PantryDeplete,
                        completed,
                        err,
                    )
                    .await);
            }
            completed += 1;
        }

        if let Err(err) = self
            .store
            .delete::<PendingMark>(&Self::user_ns(user_id), &recipe_id.to_string())
            .await
        {
            return Err(self
                .record_partial(
                    user_id,
                    Workflow::MarkCooked,
                    ReconcileStep::PendingMark,
                    completed,
                    EngineError::from(err),
                )
                .await);
        }
        Ok(())
    }

    async fn mark_pending(&self, user_id: &str, recipe: &Recipe) -> ResultEngine<PendingToggle> {
        let ns = Self::user_ns(user_id);

        // Shortfall per required ingredient against the current pantry.
        let mut missing: Vec<(RecipeIngredient, Decimal)> = Vec::new();
        for required in &recipe.ingredients {
            let on_hand = self
                .store
                .get::<PantryEntry>(&ns, &required.ingredient_id.to_string())
                .await?
                .map(|versioned| versioned.doc.quantity)
                .unwrap_or(Decimal::ZERO);
            let needed = shortfall(required.quantity, on_hand);
            if needed > Decimal::ZERO {
                missing.push((required.clone(), needed));
            }
        }

        let items_added = missing.len();
        if !missing.is_empty() {
            // Single list write; if it fails the recipe stays unmarked.
            let recipe_id = recipe.id;
            self.mutate_active_list(user_id, |list| {
                for (required, needed) in &missing {
                    list.upsert(ShoppingListItem::for_recipe(required, *needed, recipe_id));
                }
                Ok(())
            })
            .await?;
        }

        if let Err(err) = self.store.put(&ns, &PendingMark::new(recipe.id)).await {
            // With no list write behind it the failure left no effect at
            // all, so it is a plain error, not a partial one.
            if items_added == 0 {
                return Err(err.into());
            }
            return Err(self
                .record_partial(
                    user_id,
                    Workflow::TogglePending,
                    ReconcileStep::PendingMark,
                    1,
                    EngineError::from(err),
                )
                .await);
        }
        tracing::debug!(user_id, recipe = %recipe.name, items_added, "recipe marked pending");
        Ok(PendingToggle::Marked { items_added })
    }

    async fn unmark_pending(&self, user_id: &str, recipe: &Recipe) -> ResultEngine<PendingToggle> {
        let ns = Self::user_ns(user_id);
        self.store
            .delete::<PendingMark>(&ns, &recipe.id.to_string())
            .await?;

        // List cleanup is keyed off the recipe tag on generated items. No
        // active list means nothing to clean up.
        let Some(mut attempt) = self.store.get::<ShoppingList>(&ns, ACTIVE_LIST_ID).await? else {
            return Ok(PendingToggle::Unmarked { items_removed: 0 });
        };

        for _ in 0..CAS_ATTEMPTS {
            let items_removed = attempt.doc.remove_recipe_items(recipe.id);
            if items_removed == 0 {
                return Ok(PendingToggle::Unmarked { items_removed: 0 });
            }
            match self
                .store
                .put_if_version(&ns, &attempt.doc, Some(attempt.version))
                .await
            {
                Ok(_) => {
                    tracing::debug!(user_id, recipe = %recipe.name, items_removed, "recipe unmarked");
                    return Ok(PendingToggle::Unmarked { items_removed });
                }
                Err(StoreError::Conflict { .. }) => {
                    match self.store.get::<ShoppingList>(&ns, ACTIVE_LIST_ID).await? {
                        Some(fresh) => attempt = fresh,
                        None => return Ok(PendingToggle::Unmarked { items_removed: 0 }),
                    }
                }
                Err(err) => {
                    return Err(self
                        .record_partial(
                            user_id,
                            Workflow::TogglePending,
                            ReconcileStep::ListWrite,
                            1,
                            EngineError::from(err),
                        )
                        .await);
                }
            }
        }
        Err(self
            .record_partial(
                user_id,
                Workflow::TogglePending,
                ReconcileStep::ListWrite,
                1,
                cas_exhausted(ShoppingList::COLLECTION, ACTIVE_LIST_ID),
            )
            .await)
    }

    fn recipe_ns(&self, user_id: &str, scope: Scope) -> Namespace {
        match scope {
            Scope::Common => Namespace::Common,
            Scope::User => Self::user_ns(user_id),
        }
    }
}
