//! Reconcilers.
//!
//! A reconciler compares desired state (from the caller) with actual state
//! (from the backend) and takes at most one action to converge.

pub mod repository;

pub use repository::{Field, RepositoryReconciler, diff};

use async_trait::async_trait;
use serde::Serialize;

use crate::error::Result;
use crate::model::RepositoryRecord;

/// Trait for resource reconcilers.
#[async_trait]
pub trait Reconciler: Send + Sync {
    /// The desired-state type supplied by the caller.
    type Spec;
    /// The result type reported back.
    type Status;

    /// Reconcile the resource - compare desired vs actual state and take action.
    async fn reconcile(&self, spec: &Self::Spec) -> Result<Self::Status>;

    /// Make sure the resource identified by `key` is gone.
    async fn finalize(&self, key: &str) -> Result<Self::Status>;
}

/// Terminal outcome of one reconciliation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Created,
    Updated,
    Unchanged,
    Deleted,
    AlreadyAbsent,
}

impl Outcome {
    /// Whether a mutating call was made.
    pub fn changed(self) -> bool {
        !matches!(self, Outcome::Unchanged | Outcome::AlreadyAbsent)
    }
}

/// Result of reconciling one repository.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    pub outcome: Outcome,
    /// The record as seen during lookup, before any action was taken.
    pub observed: Option<RepositoryRecord>,
}

impl Reconciliation {
    pub fn changed(&self) -> bool {
        self.outcome.changed()
    }
}
