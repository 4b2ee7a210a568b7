//! bwh-repo: reconciles a BorgWarehouse repository against its desired state.
//!
//! The backend is the only source of truth. Each run lists the repositories,
//! looks ours up by alias, diffs the managed fields and issues at most one
//! create, update or delete.

pub mod clients;
pub mod error;
pub mod model;
pub mod reconciler;
pub mod runner;

pub use clients::{HttpTransport, RepoClient, Transport, find_by_alias};
pub use error::{Error, ErrorDescription, Result, TransportError};
pub use model::{DesiredState, Intent, RepoId, RepositoryRecord};
pub use reconciler::{Outcome, Reconciler, Reconciliation, RepositoryReconciler};
pub use runner::{Params, RunResult, run, run_with};
