//! The module contains the errors the engine can throw.
//!
//! Single-document operations either fully succeed or fail with one of the
//! plain variants. Multi-step workflows (purchase finalization, the pending
//! toggle, cooking) report [`PartialReconciliation`] when they stop after
//! some effects already landed; the caller decides whether to retry or to
//! surface a manual-reconciliation message.
//!
//! [`PartialReconciliation`]: EngineError::PartialReconciliation

use thiserror::Error;

use crate::journal::{ReconcileStep, Workflow};
use crate::store::StoreError;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("\"{0}\" not found!")]
    NotFound(String),
    #[error("ingredient \"{0}\" already registered")]
    DuplicateIngredient(String),
    #[error("invalid quantity: {0}")]
    InvalidQuantity(String),
    #[error("invalid name: {0}")]
    InvalidName(String),
    #[error("\"{0}\" already in progress")]
    AlreadyInProgress(String),
    #[error("{workflow} stopped at {failed_step} after {completed} completed step(s): {source}")]
    PartialReconciliation {
        workflow: Workflow,
        failed_step: ReconcileStep,
        completed: usize,
        #[source]
        source: Box<EngineError>,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::NotFound(a), Self::NotFound(b)) => a == b,
            (Self::DuplicateIngredient(a), Self::DuplicateIngredient(b)) => a == b,
            (Self::InvalidQuantity(a), Self::InvalidQuantity(b)) => a == b,
            (Self::InvalidName(a), Self::InvalidName(b)) => a == b,
            (Self::AlreadyInProgress(a), Self::AlreadyInProgress(b)) => a == b,
            (
                Self::PartialReconciliation {
                    workflow: wa,
                    failed_step: sa,
                    completed: ca,
                    source: ea,
                },
                Self::PartialReconciliation {
                    workflow: wb,
                    failed_step: sb,
                    completed: cb,
                    source: eb,
                },
            ) => wa == wb && sa == sb && ca == cb && ea == eb,
            (Self::Store(a), Self::Store(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
