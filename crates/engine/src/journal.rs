//! Persisted record of partially-applied multi-step workflows.
//!
//! The reconciliation workflows are not transactional against the store: a
//! failure mid-sequence can leave, say, checked items both in the pantry and
//! still on the list. Instead of hiding that possibility, the engine records
//! a note the caller can query and clear once the user has reconciled
//! manually (or re-issued the command).

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::Document;

/// The multi-step workflows that can stop mid-sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Workflow {
    Finalize,
    TogglePending,
    MarkCooked,
}

impl Workflow {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Finalize => "finalize",
            Self::TogglePending => "toggle_pending",
            Self::MarkCooked => "mark_cooked",
        }
    }
}

impl fmt::Display for Workflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The step at which a workflow stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileStep {
    PantryDeposit,
    PantryDeplete,
    HistoryAppend,
    ListWrite,
    PendingMark,
}

impl ReconcileStep {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PantryDeposit => "pantry_deposit",
            Self::PantryDeplete => "pantry_deplete",
            Self::HistoryAppend => "history_append",
            Self::ListWrite => "list_write",
            Self::PendingMark => "pending_mark",
        }
    }
}

impl fmt::Display for ReconcileStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationNote {
    pub id: Uuid,
    pub workflow: Workflow,
    pub failed_step: ReconcileStep,
    pub detail: String,
    pub created_at: DateTime<Utc>,
}

impl ReconciliationNote {
    pub fn new(workflow: Workflow, failed_step: ReconcileStep, detail: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            workflow,
            failed_step,
            detail,
            created_at: Utc::now(),
        }
    }
}

impl Document for ReconciliationNote {
    const COLLECTION: &'static str = "reconciliation_notes";

    fn document_id(&self) -> String {
        self.id.to_string()
    }
}
