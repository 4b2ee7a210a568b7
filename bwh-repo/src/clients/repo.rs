//! Client for the BorgWarehouse repository endpoints.

use reqwest::Method;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Serialize;
use tracing::debug;

use super::transport::Transport;
use crate::error::{Result, TransportError};
use crate::model::{DeletePayload, DesiredState, RepoId, RepoList, RepositoryRecord};

/// Stateless client for repository records.
///
/// Every call goes to the backend; nothing is cached between calls.
pub struct RepoClient<T> {
    transport: T,
    headers: HeaderMap,
}

impl<T: Transport> RepoClient<T> {
    /// Create a client that authenticates with `api_token`.
    pub fn new(transport: T, api_token: &str) -> Result<Self> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", api_token))
            .map_err(|_| TransportError::Unauthorized)?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        Ok(Self { transport, headers })
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// List every repository on the backend.
    pub async fn list_all(&self) -> Result<Vec<RepositoryRecord>> {
        let resp = self
            .transport
            .request(Method::GET, "/api/repo", &self.headers, None)
            .await?;
        let list: RepoList = serde_json::from_slice(&resp.body)?;
        debug!("Backend lists {} repositories", list.repo_list.len());
        Ok(list.repo_list)
    }

    /// Fetch the list and pick out `alias`.
    pub async fn lookup(&self, alias: &str) -> Result<Option<RepositoryRecord>> {
        Ok(find_by_alias(self.list_all().await?, alias))
    }

    /// Create a repository. The assigned id is not returned; re-list to learn it.
    pub async fn create(&self, desired: &DesiredState) -> Result<()> {
        debug!("Creating repository {}", desired.alias);
        self.send(Method::POST, "/api/repo/add", &desired.payload())
            .await
    }

    /// Replace the managed fields of repository `id` with `desired`.
    pub async fn update(&self, id: &RepoId, desired: &DesiredState) -> Result<()> {
        debug!("Updating repository {} ({})", desired.alias, id);
        let path = id_path(id, "edit");
        self.send(Method::PUT, &path, &desired.payload()).await
    }

    /// Delete repository `id`.
    pub async fn delete(&self, id: &RepoId) -> Result<()> {
        debug!("Deleting repository {}", id);
        let path = id_path(id, "delete");
        self.send(Method::DELETE, &path, &DeletePayload { to_delete: true })
            .await
    }

    async fn send<B: Serialize>(&self, method: Method, path: &str, body: &B) -> Result<()> {
        let body = serde_json::to_vec(body)?;
        self.transport
            .request(method, path, &self.headers, Some(body))
            .await?;
        Ok(())
    }
}

/// Per-id endpoint; the id is percent-encoded as a single path segment.
fn id_path(id: &RepoId, action: &str) -> String {
    format!(
        "/api/repo/id/{}/{}",
        urlencoding::encode(&id.to_string()),
        action
    )
}

/// First record whose alias matches exactly.
pub fn find_by_alias(
    records: impl IntoIterator<Item = RepositoryRecord>,
    alias: &str,
) -> Option<RepositoryRecord> {
    records.into_iter().find(|r| r.alias == alias)
}
