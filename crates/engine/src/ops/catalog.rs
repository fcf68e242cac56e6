use uuid::Uuid;

use crate::ingredients::{self, Ingredient, MergePolicy, Scope};
use crate::store::{Namespace, Store, StoreError};
use crate::util::normalize_required_name;
use crate::{EngineError, ResultEngine};

use super::Engine;

impl<S: Store> Engine<S> {
    /// Merged, duplicate-free catalog (common ∪ user), sorted by name.
    ///
    /// Ties on the normalized name are broken in favor of the common-scope
    /// entry; the losing entry is dropped from display.
    pub async fn ingredients(&self, user_id: &str) -> ResultEngine<Vec<Ingredient>> {
        self.ingredients_with_policy(user_id, MergePolicy::default())
            .await
    }

    /// Same as [`Engine::ingredients`] with an explicit tie-break policy.
    pub async fn ingredients_with_policy(
        &self,
        user_id: &str,
        policy: MergePolicy,
    ) -> ResultEngine<Vec<Ingredient>> {
        let common = self.scope_ingredients(&Namespace::Common).await?;
        let user = self.scope_ingredients(&Self::user_ns(user_id)).await?;
        Ok(ingredients::merge_catalogs(common, user, policy))
    }

    /// Checks both scopes for a normalized-name collision.
    pub async fn ingredient_exists(&self, user_id: &str, name: &str) -> ResultEngine<bool> {
        let needle = ingredients::normalized_name(name);
        if needle.is_empty() {
            return Ok(false);
        }
        for ns in [Namespace::Common, Self::user_ns(user_id)] {
            let scoped = self.scope_ingredients(&ns).await?;
            if scoped
                .iter()
                .any(|ingredient| ingredient.normalized_name() == needle)
            {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Registers a new ingredient, common-scoped when the caller is an admin.
    ///
    /// Registration fails with [`EngineError::DuplicateIngredient`] when the
    /// normalized name collides with either scope, so "Tomate" cannot be
    /// re-registered as "tomate".
    pub async fn register_ingredient(
        &self,
        user_id: &str,
        name: &str,
        category: &str,
        unit: &str,
        is_admin: bool,
    ) -> ResultEngine<Ingredient> {
        let name = normalize_required_name(name, "ingredient")?;
        if self.ingredient_exists(user_id, &name).await? {
            return Err(EngineError::DuplicateIngredient(name));
        }

        let scope = if is_admin { Scope::Common } else { Scope::User };
        let ns = match scope {
            Scope::Common => Namespace::Common,
            Scope::User => Self::user_ns(user_id),
        };
        let ingredient = Ingredient::new(
            name,
            category.trim().to_string(),
            unit.trim().to_string(),
            scope,
        );
        // The document is keyed by normalized name, so a concurrent
        // registration that slipped past the existence check loses the
        // create race here instead of writing a duplicate.
        match self.store.put_if_version(&ns, &ingredient, None).await {
            Ok(_) => {}
            Err(StoreError::Conflict { .. }) => {
                return Err(EngineError::DuplicateIngredient(ingredient.name));
            }
            Err(err) => return Err(err.into()),
        }
        tracing::debug!(user_id, name = %ingredient.name, ?scope, "ingredient registered");
        Ok(ingredient)
    }

    /// Lookup by id across both scopes (user scope first). Documents are
    /// keyed by name, so this scans; catalogs are small.
    pub async fn find_ingredient(
        &self,
        user_id: &str,
        ingredient_id: Uuid,
    ) -> ResultEngine<Ingredient> {
        for ns in [Self::user_ns(user_id), Namespace::Common] {
            if let Some(found) = self
                .scope_ingredients(&ns)
                .await?
                .into_iter()
                .find(|ingredient| ingredient.id == ingredient_id)
            {
                return Ok(found);
            }
        }
        Err(EngineError::NotFound(format!("ingredient {ingredient_id}")))
    }

    async fn scope_ingredients(&self, ns: &Namespace) -> ResultEngine<Vec<Ingredient>> {
        Ok(self
            .store
            .list::<Ingredient>(ns)
            .await?
            .into_iter()
            .map(|versioned| versioned.doc)
            .collect())
    }
}
