//! One reconciliation run as seen by the caller.
//!
//! Takes the caller's parameters, drives the reconciler and folds the outcome
//! (or the error) into a single JSON-serializable result.

use std::time::Duration;

use serde::Serialize;
use tracing::{error, info};

use crate::clients::{HttpTransport, RepoClient, Transport};
use crate::error::{Error, ErrorDescription, Result};
use crate::model::{DesiredState, RepositoryRecord};
use crate::reconciler::{Outcome, Reconciler, RepositoryReconciler};

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Caller parameters for one run.
#[derive(Debug, Clone)]
pub struct Params {
    pub url: String,
    pub api_token: String,
    pub desired: DesiredState,
    /// Dry run: never contact the backend.
    pub check_mode: bool,
    pub timeout: Duration,
}

/// What the caller gets back.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunResult {
    pub changed: bool,
    pub repository: Option<RepositoryRecord>,
    pub error: Option<ErrorDescription>,
}

impl RunResult {
    fn failed(err: &Error) -> Self {
        Self {
            changed: false,
            repository: None,
            error: Some(err.describe()),
        }
    }

    fn skipped() -> Self {
        Self {
            changed: false,
            repository: None,
            error: None,
        }
    }

    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}

/// Run against the backend at `params.url`.
pub async fn run(params: &Params) -> RunResult {
    if params.check_mode {
        info!("Check mode, not contacting {}", params.url);
        return RunResult::skipped();
    }

    match HttpTransport::new(&params.url, params.timeout) {
        Ok(transport) => run_with(transport, params).await,
        Err(e) => {
            error!("Unusable backend URL: {}", e);
            RunResult::failed(&Error::from(e))
        }
    }
}

/// Run over an already constructed transport.
pub async fn run_with<T: Transport>(transport: T, params: &Params) -> RunResult {
    if params.check_mode {
        return RunResult::skipped();
    }

    match converge(transport, &params.api_token, &params.desired).await {
        Ok(result) => result,
        Err(e) => {
            error!("Reconciling repository {} failed: {}", params.desired.alias, e);
            RunResult::failed(&e)
        }
    }
}

async fn converge<T: Transport>(
    transport: T,
    api_token: &str,
    desired: &DesiredState,
) -> Result<RunResult> {
    let reconciler = RepositoryReconciler::new(RepoClient::new(transport, api_token)?);
    let result = reconciler.reconcile(desired).await?;

    // Report what the backend holds after the run; only re-list if we touched it.
    let repository = match result.outcome {
        Outcome::Unchanged => result.observed,
        Outcome::AlreadyAbsent => None,
        Outcome::Created | Outcome::Updated | Outcome::Deleted => {
            reconciler.client().lookup(&desired.alias).await?
        }
    };

    Ok(RunResult {
        changed: result.outcome.changed(),
        repository,
        error: None,
    })
}
