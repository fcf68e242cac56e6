//! The `Engine` and its operation families.
//!
//! The engine is stateless apart from the store handle and the in-flight
//! guard: every operation reads current state from the store, computes the
//! new state, and writes it back. One file per operation family.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use uuid::Uuid;

use crate::journal::{ReconcileStep, ReconciliationNote, Workflow};
use crate::store::{Namespace, Store};
use crate::{EngineError, ResultEngine};

mod catalog;
mod history;
mod pantry;
mod recipes;
mod shopping;

pub use recipes::PendingToggle;
pub use shopping::FinalizeOutcome;

/// Retry budget for optimistic-concurrency write loops. A loop that runs out
/// of attempts surfaces the last version conflict to the caller.
const CAS_ATTEMPTS: usize = 4;

#[derive(Debug)]
pub struct Engine<S> {
    store: S,
    /// Multi-step workflow leases, keyed per (user, workflow target). A
    /// second call while one is in flight is rejected, not queued.
    in_flight: Mutex<HashSet<(String, String)>>,
}

impl<S: Store> Engine<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub(crate) fn user_ns(user_id: &str) -> Namespace {
        Namespace::user(user_id)
    }

    fn in_flight_lock(&self) -> MutexGuard<'_, HashSet<(String, String)>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Takes the workflow lease for `(user, target)`, or fails with
    /// [`EngineError::AlreadyInProgress`]. The lease is released when the
    /// returned guard drops.
    pub(crate) fn begin_in_flight(
        &self,
        user_id: &str,
        target: String,
        what: String,
    ) -> ResultEngine<InFlightGuard<'_>> {
        let key = (user_id.to_string(), target);
        let mut leases = self.in_flight_lock();
        if !leases.insert(key.clone()) {
            return Err(EngineError::AlreadyInProgress(what));
        }
        Ok(InFlightGuard {
            leases: &self.in_flight,
            key,
        })
    }

    /// Converts a mid-workflow failure into [`EngineError::PartialReconciliation`],
    /// best-effort recording a note the caller can query later. The note
    /// write itself is allowed to fail; the error is returned either way.
    pub(crate) async fn record_partial(
        &self,
        user_id: &str,
        workflow: Workflow,
        failed_step: ReconcileStep,
        completed: usize,
        source: EngineError,
    ) -> EngineError {
        let note = ReconciliationNote::new(workflow, failed_step, source.to_string());
        if let Err(err) = self.store.put(&Self::user_ns(user_id), &note).await {
            tracing::warn!(%workflow, "failed to record reconciliation note: {err}");
        }
        tracing::warn!(%workflow, %failed_step, completed, "workflow stopped mid-sequence");
        EngineError::PartialReconciliation {
            workflow,
            failed_step,
            completed,
            source: Box::new(source),
        }
    }

    /// Partial-failure backlog, newest first.
    pub async fn reconciliation_backlog(
        &self,
        user_id: &str,
    ) -> ResultEngine<Vec<ReconciliationNote>> {
        let mut notes: Vec<ReconciliationNote> = self
            .store
            .list::<ReconciliationNote>(&Self::user_ns(user_id))
            .await?
            .into_iter()
            .map(|versioned| versioned.doc)
            .collect();
        notes.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(notes)
    }

    pub async fn clear_reconciliation_note(
        &self,
        user_id: &str,
        note_id: Uuid,
    ) -> ResultEngine<()> {
        self.store
            .delete::<ReconciliationNote>(&Self::user_ns(user_id), &note_id.to_string())
            .await?;
        Ok(())
    }
}

/// RAII release of a workflow lease.
pub(crate) struct InFlightGuard<'a> {
    leases: &'a Mutex<HashSet<(String, String)>>,
    key: (String, String),
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.leases
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}
