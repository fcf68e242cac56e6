//! In-process reference implementation of the [`Store`] seam.
//!
//! Backs the integration tests and doubles as documentation of the expected
//! store semantics (versioning, CAS, idempotent delete). Writes can be made
//! to fail on purpose via [`MemoryStore::fail_writes`] so tests can exercise
//! mid-workflow failures.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::Value;

use super::{Document, Namespace, ResultStore, Store, StoreError, Versioned};

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    // (namespace key, collection) -> id -> (document, version)
    collections: HashMap<(String, &'static str), HashMap<String, (Value, u64)>>,
    next_version: u64,
    fail_writes: HashMap<&'static str, u32>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `n` writes (put or delete) against `collection` fail
    /// with [`StoreError::Unavailable`].
    pub fn fail_writes(&self, collection: &'static str, n: u32) {
        let mut inner = self.lock();
        *inner.fail_writes.entry(collection).or_insert(0) += n;
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Inner {
    fn take_failure(&mut self, collection: &'static str) -> ResultStore<()> {
        if let Some(left) = self.fail_writes.get_mut(collection)
            && *left > 0
        {
            *left -= 1;
            return Err(StoreError::Unavailable(format!(
                "injected write failure on {collection}"
            )));
        }
        Ok(())
    }

    fn collection(&mut self, ns: &Namespace, name: &'static str) -> &mut HashMap<String, (Value, u64)> {
        self.collections.entry((ns.key(), name)).or_default()
    }

    fn bump_version(&mut self) -> u64 {
        self.next_version += 1;
        self.next_version
    }
}

fn encode<T: Document>(doc: &T) -> ResultStore<Value> {
    serde_json::to_value(doc).map_err(|err| StoreError::Serde(err.to_string()))
}

fn decode<T: Document>(value: &Value) -> ResultStore<T> {
    serde_json::from_value(value.clone()).map_err(|err| StoreError::Serde(err.to_string()))
}

#[async_trait]
impl Store for MemoryStore {
    async fn get<T: Document>(&self, ns: &Namespace, id: &str) -> ResultStore<Option<Versioned<T>>> {
        let mut inner = self.lock();
        match inner.collection(ns, T::COLLECTION).get(id) {
            Some((value, version)) => Ok(Some(Versioned {
                doc: decode(value)?,
                version: *version,
            })),
            None => Ok(None),
        }
    }

    async fn list<T: Document>(&self, ns: &Namespace) -> ResultStore<Vec<Versioned<T>>> {
        let mut inner = self.lock();
        inner
            .collection(ns, T::COLLECTION)
            .values()
            .map(|(value, version)| {
                Ok(Versioned {
                    doc: decode(value)?,
                    version: *version,
                })
            })
            .collect()
    }

    async fn put<T: Document>(&self, ns: &Namespace, doc: &T) -> ResultStore<u64> {
        let value = encode(doc)?;
        let mut inner = self.lock();
        inner.take_failure(T::COLLECTION)?;
        let version = inner.bump_version();
        inner
            .collection(ns, T::COLLECTION)
            .insert(doc.document_id(), (value, version));
        Ok(version)
    }

    async fn put_if_version<T: Document>(
        &self,
        ns: &Namespace,
        doc: &T,
        expected: Option<u64>,
    ) -> ResultStore<u64> {
        let value = encode(doc)?;
        let id = doc.document_id();
        let mut inner = self.lock();
        inner.take_failure(T::COLLECTION)?;

        let current = inner
            .collection(ns, T::COLLECTION)
            .get(&id)
            .map(|(_, version)| *version);
        if current != expected {
            return Err(StoreError::Conflict {
                collection: T::COLLECTION,
                id,
            });
        }

        let version = inner.bump_version();
        inner
            .collection(ns, T::COLLECTION)
            .insert(id, (value, version));
        Ok(version)
    }

    async fn delete<T: Document>(&self, ns: &Namespace, id: &str) -> ResultStore<()> {
        let mut inner = self.lock();
        inner.take_failure(T::COLLECTION)?;
        inner.collection(ns, T::COLLECTION).remove(id);
        Ok(())
    }

    async fn delete_if_version<T: Document>(
        &self,
        ns: &Namespace,
        id: &str,
        expected: u64,
    ) -> ResultStore<()> {
        let mut inner = self.lock();
        inner.take_failure(T::COLLECTION)?;

        let collection = inner.collection(ns, T::COLLECTION);
        let current = collection.get(id).map(|(_, version)| *version);
        match current {
            Some(version) if version == expected => {
                collection.remove(id);
                Ok(())
            }
            _ => Err(StoreError::Conflict {
                collection: T::COLLECTION,
                id: id.to_string(),
            }),
        }
    }
}
