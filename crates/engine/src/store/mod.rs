//! Persistence seam towards the remote per-user document store.
//!
//! The engine never talks to a concrete backend. Everything it persists goes
//! through the async [`Store`] trait: namespaced collections of JSON-shaped
//! documents, addressed by a string id. Writes come in two flavors:
//! unconditional ([`Store::put`], last-write-wins) and version-checked
//! ([`Store::put_if_version`] / [`Store::delete_if_version`]) so callers can
//! run optimistic read-modify-write loops instead of silently losing
//! concurrent updates.

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

pub mod memory;

/// Storage failures.
///
/// `Unavailable` means an I/O failure with no partial write applied for the
/// single document involved. `Conflict` is not a failure from the user's
/// point of view: optimistic writers re-read and retry.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("version conflict on \"{collection}/{id}\"")]
    Conflict {
        collection: &'static str,
        id: String,
    },
    #[error("serialization: {0}")]
    Serde(String),
}

pub type ResultStore<T> = Result<T, StoreError>;

/// A namespace groups the collections of one owner.
///
/// `Common` holds app-wide records (the curated catalog, shared recipes);
/// `User` holds everything private to one account.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Namespace {
    Common,
    User(String),
}

impl Namespace {
    pub fn user(user_id: impl Into<String>) -> Self {
        Self::User(user_id.into())
    }

    /// Stable string key, usable as a path segment by backends.
    pub fn key(&self) -> String {
        match self {
            Self::Common => "common".to_string(),
            Self::User(user_id) => format!("user:{user_id}"),
        }
    }
}

/// A persistable entity: one collection name per type, one id per document.
pub trait Document: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const COLLECTION: &'static str;

    fn document_id(&self) -> String;
}

/// A document together with the store-assigned version of the copy read.
#[derive(Clone, Debug)]
pub struct Versioned<T> {
    pub doc: T,
    pub version: u64,
}

/// Async document store.
///
/// All calls can fail with [`StoreError::Unavailable`]; none are assumed
/// transactional across documents or collections.
#[async_trait]
pub trait Store: Send + Sync {
    async fn get<T: Document>(&self, ns: &Namespace, id: &str) -> ResultStore<Option<Versioned<T>>>;

    async fn list<T: Document>(&self, ns: &Namespace) -> ResultStore<Vec<Versioned<T>>>;

    /// Unconditional write (create or overwrite). Returns the new version.
    async fn put<T: Document>(&self, ns: &Namespace, doc: &T) -> ResultStore<u64>;

    /// Compare-and-swap write.
    ///
    /// `expected = None` means the document must not exist yet. On mismatch
    /// the store returns [`StoreError::Conflict`] and writes nothing.
    async fn put_if_version<T: Document>(
        &self,
        ns: &Namespace,
        doc: &T,
        expected: Option<u64>,
    ) -> ResultStore<u64>;

    /// Idempotent delete: removing an absent document succeeds.
    async fn delete<T: Document>(&self, ns: &Namespace, id: &str) -> ResultStore<()>;

    /// Version-checked delete; `Conflict` when the document changed or is
    /// already gone.
    async fn delete_if_version<T: Document>(
        &self,
        ns: &Namespace,
        id: &str,
        expected: u64,
    ) -> ResultStore<()>;
}

// Shared handles delegate, so an engine and its caller can hold the same
// backend.
#[async_trait]
impl<S: Store + ?Sized> Store for std::sync::Arc<S> {
    async fn get<T: Document>(&self, ns: &Namespace, id: &str) -> ResultStore<Option<Versioned<T>>> {
        (**self).get(ns, id).await
    }

    async fn list<T: Document>(&self, ns: &Namespace) -> ResultStore<Vec<Versioned<T>>> {
        (**self).list(ns).await
    }

    async fn put<T: Document>(&self, ns: &Namespace, doc: &T) -> ResultStore<u64> {
        (**self).put(ns, doc).await
    }

    async fn put_if_version<T: Document>(
        &self,
        ns: &Namespace,
        doc: &T,
        expected: Option<u64>,
    ) -> ResultStore<u64> {
        (**self).put_if_version(ns, doc, expected).await
    }

    async fn delete<T: Document>(&self, ns: &Namespace, id: &str) -> ResultStore<()> {
        (**self).delete::<T>(ns, id).await
    }

    async fn delete_if_version<T: Document>(
        &self,
        ns: &Namespace,
        id: &str,
        expected: u64,
    ) -> ResultStore<()> {
        (**self).delete_if_version::<T>(ns, id, expected).await
    }
}
