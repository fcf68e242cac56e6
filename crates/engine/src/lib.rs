//! Domain engine for a grocery/recipe pantry.
//!
//! The engine keeps four loosely-coupled per-user records mutually
//! consistent: the ingredient catalog (common ∪ user scope), the pantry
//! (quantity on hand), the single active shopping list, and recipe
//! pending/favorite marks. It is a library-level component: persistence goes
//! through the async [`Store`] seam and all presentation concerns stay with
//! the caller.

pub use error::EngineError;
pub use history::{HISTORY_CAP, ShoppingHistoryEntry};
pub use ingredients::{Ingredient, MergePolicy, Scope};
pub use journal::{ReconcileStep, ReconciliationNote, Workflow};
pub use ops::{Engine, FinalizeOutcome, PendingToggle};
pub use pantry::PantryEntry;
pub use recipes::{FavoriteMark, PendingMark, Recipe, RecipeIngredient, RecipeStatus};
pub use shopping::{ACTIVE_LIST_ID, ACTIVE_LIST_TITLE, ShoppingList, ShoppingListItem};
pub use store::memory::MemoryStore;
pub use store::{Document, Namespace, Store, StoreError, Versioned};

mod error;
mod history;
mod ingredients;
mod journal;
mod ops;
mod pantry;
mod recipes;
mod shopping;
pub mod store;
mod util;

pub type ResultEngine<T> = Result<T, EngineError>;
