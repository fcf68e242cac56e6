//! Shared test support.

use async_trait::async_trait;
use engine::{Document, MemoryStore, Namespace, Store, StoreError, Versioned};

/// Store wrapper that suspends before every operation, so two workflows
/// driven by `tokio::join!` actually interleave instead of running back to
/// back on first poll.
pub struct YieldStore(pub MemoryStore);

#[async_trait]
impl Store for YieldStore {
    async fn get<T: Document>(
        &self,
        ns: &Namespace,
        id: &str,
    ) -> Result<Option<Versioned<T>>, StoreError> {
        tokio::task::yield_now().await;
        self.0.get(ns, id).await
    }

    async fn list<T: Document>(&self, ns: &Namespace) -> Result<Vec<Versioned<T>>, StoreError> {
        tokio::task::yield_now().await;
        self.0.list(ns).await
    }

    async fn put<T: Document>(&self, ns: &Namespace, doc: &T) -> Result<u64, StoreError> {
        tokio::task::yield_now().await;
        self.0.put(ns, doc).await
    }

    async fn put_if_version<T: Document>(
        &self,
        ns: &Namespace,
        doc: &T,
        expected: Option<u64>,
    ) -> Result<u64, StoreError> {
        tokio::task::yield_now().await;
        self.0.put_if_version(ns, doc, expected).await
    }

    async fn delete<T: Document>(&self, ns: &Namespace, id: &str) -> Result<(), StoreError> {
        tokio::task::yield_now().await;
        self.0.delete::<T>(ns, id).await
    }

    async fn delete_if_version<T: Document>(
        &self,
        ns: &Namespace,
        id: &str,
        expected: u64,
    ) -> Result<(), StoreError> {
        tokio::task::yield_now().await;
        self.0.delete_if_version::<T>(ns, id, expected).await
    }
}
