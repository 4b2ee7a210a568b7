//! Repository reconciler - converges one BorgWarehouse repository on its desired state.

use std::fmt;

use async_trait::async_trait;
use tracing::info;

use super::{Outcome, Reconciler, Reconciliation};
use crate::clients::{RepoClient, Transport};
use crate::error::{Error, Result};
use crate::model::{DesiredState, Intent, RepoId, RepositoryRecord};

/// A managed field of a repository record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    SshPublicKey,
    StorageSize,
    Alert,
    Comment,
}

impl Field {
    pub fn as_str(self) -> &'static str {
        match self {
            Field::SshPublicKey => "sshPublicKey",
            Field::StorageSize => "storageSize",
            Field::Alert => "alert",
            Field::Comment => "comment",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Managed fields on which `current` differs from `desired`.
///
/// `alias` is the lookup key and server-owned fields are not ours, so neither
/// takes part.
pub fn diff(current: &RepositoryRecord, desired: &DesiredState) -> Vec<Field> {
    let mut fields = Vec::new();
    if current.ssh_public_key != desired.ssh_public_key {
        fields.push(Field::SshPublicKey);
    }
    if current.storage_size != desired.storage_size {
        fields.push(Field::StorageSize);
    }
    if current.alert != desired.alert {
        fields.push(Field::Alert);
    }
    if current.comment != desired.comment {
        fields.push(Field::Comment);
    }
    fields
}

/// Repository reconciler that talks to the BorgWarehouse API.
///
/// Each run re-lists the backend; no state survives between runs. Lookup and
/// mutation are not atomic, so a concurrent writer on the same alias can slip
/// in between them.
pub struct RepositoryReconciler<T> {
    client: RepoClient<T>,
}

impl<T: Transport> RepositoryReconciler<T> {
    pub fn new(client: RepoClient<T>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &RepoClient<T> {
        &self.client
    }
}

#[async_trait]
impl<T: Transport> Reconciler for RepositoryReconciler<T> {
    type Spec = DesiredState;
    type Status = Reconciliation;

    async fn reconcile(&self, spec: &Self::Spec) -> Result<Self::Status> {
        if spec.intent == Intent::Absent {
            return self.finalize(&spec.alias).await;
        }

        info!("Reconciling repository {}", spec.alias);
        let Some(current) = self.client.lookup(&spec.alias).await? else {
            info!("Creating repository {}", spec.alias);
            self.client.create(spec).await?;
            return Ok(Reconciliation {
                outcome: Outcome::Created,
                observed: None,
            });
        };

        let fields = diff(&current, spec);
        if fields.is_empty() {
            info!("Repository {} is up to date", spec.alias);
            return Ok(Reconciliation {
                outcome: Outcome::Unchanged,
                observed: Some(current),
            });
        }

        let id = require_id(&current)?;
        let names: Vec<&str> = fields.iter().map(|f| f.as_str()).collect();
        info!(
            "Updating repository {} ({}): {} differ",
            spec.alias,
            id,
            names.join(", ")
        );
        self.client.update(id, spec).await?;

        Ok(Reconciliation {
            outcome: Outcome::Updated,
            observed: Some(current),
        })
    }

    async fn finalize(&self, key: &str) -> Result<Self::Status> {
        let Some(current) = self.client.lookup(key).await? else {
            info!("Repository {} already absent", key);
            return Ok(Reconciliation {
                outcome: Outcome::AlreadyAbsent,
                observed: None,
            });
        };

        let id = require_id(&current)?;
        info!("Finalizing (deleting) repository {} ({})", key, id);
        self.client.delete(id).await?;

        Ok(Reconciliation {
            outcome: Outcome::Deleted,
            observed: Some(current),
        })
    }
}

fn require_id(record: &RepositoryRecord) -> Result<&RepoId> {
    record
        .id
        .as_ref()
        .ok_or_else(|| Error::Malformed(format!("repository {} has no id", record.alias)))
}
