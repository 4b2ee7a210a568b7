//! In-process fake of the BorgWarehouse repository API.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio::net::TcpListener;

pub const TOKEN: &str = "yet-another-secret";

pub const KEY: &str =
    "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAIK0wmN/Cr3JXqmLW7u+g9pTh+wyqDHpSQEIQczXkVx9q ansibletest";

/// A request the fake backend accepted.
#[derive(Debug, Clone)]
pub struct Call {
    pub method: &'static str,
    pub path: String,
    pub body: Option<Value>,
}

#[derive(Default)]
struct Backend {
    repos: Vec<Value>,
    next_id: u64,
    calls: Vec<Call>,
}

type Shared = Arc<Mutex<Backend>>;

/// Test server wrapper around the fake backend.
pub struct TestServer {
    pub addr: SocketAddr,
    backend: Shared,
    shutdown_tx: tokio::sync::oneshot::Sender<()>,
}

impl TestServer {
    /// Spawn an empty backend on an OS-assigned port.
    pub async fn spawn() -> Self {
        let backend: Shared = Arc::new(Mutex::new(Backend {
            next_id: 1,
            ..Default::default()
        }));

        let router = Router::new()
            .route("/api/repo", get(list_repos))
            .route("/api/repo/add", post(add_repo))
            .route("/api/repo/id/{id}/edit", put(edit_repo))
            .route("/api/repo/id/{id}/delete", delete(delete_repo))
            .with_state(backend.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
        tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            backend,
            shutdown_tx,
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Insert a repository directly, bypassing the API. Returns its id.
    pub fn seed(&self, alias: &str, storage_size: Value) -> u64 {
        let mut backend = self.backend.lock().unwrap();
        let id = backend.next_id;
        backend.next_id += 1;
        backend.repos.push(json!({
            "id": id,
            "alias": alias,
            "sshPublicKey": KEY,
            "storageSize": storage_size,
            "alert": 172800,
            "comment": "Managed by Ansible.",
            "repositoryName": format!("{:08x}", id * 0x1f2e3d),
            "status": false,
            "storageUsed": 0,
            "lastSave": 0,
            "displayDetails": true,
            "lanCommand": false
        }));
        id
    }

    /// Current server-side copy of `alias`.
    pub fn repo(&self, alias: &str) -> Option<Value> {
        let backend = self.backend.lock().unwrap();
        backend
            .repos
            .iter()
            .find(|r| r["alias"] == alias)
            .cloned()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.backend.lock().unwrap().calls.clone()
    }

    /// Calls other than listing.
    pub fn mutations(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| c.method != "GET")
            .collect()
    }

    pub fn clear_calls(&self) {
        self.backend.lock().unwrap().calls.clear();
    }

    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
    }
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {}", TOKEN))
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

async fn list_repos(State(backend): State<Shared>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return error(StatusCode::UNAUTHORIZED, "Invalid API key");
    }
    let mut backend = backend.lock().unwrap();
    backend.calls.push(Call {
        method: "GET",
        path: "/api/repo".to_string(),
        body: None,
    });
    Json(json!({ "repoList": backend.repos })).into_response()
}

async fn add_repo(
    State(backend): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return error(StatusCode::UNAUTHORIZED, "Invalid API key");
    }
    if !body["sshPublicKey"]
        .as_str()
        .is_some_and(|k| k.starts_with("ssh-"))
    {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "Invalid SSH key");
    }

    let mut backend = backend.lock().unwrap();
    backend.calls.push(Call {
        method: "POST",
        path: "/api/repo/add".to_string(),
        body: Some(body.clone()),
    });

    let id = backend.next_id;
    backend.next_id += 1;
    backend.repos.push(json!({
        "id": id,
        "alias": body["alias"],
        "sshPublicKey": body["sshPublicKey"],
        "storageSize": body["storageSize"],
        "alert": body["alert"],
        "comment": body["comment"],
        "lanCommand": body["lanCommand"],
        "repositoryName": format!("{:08x}", id * 0x1f2e3d),
        "status": false,
        "storageUsed": 0,
        "lastSave": 0,
        "displayDetails": true
    }));

    Json(json!({ "id": id, "repositoryName": format!("{:08x}", id * 0x1f2e3d) }))
        .into_response()
}

async fn edit_repo(
    State(backend): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return error(StatusCode::UNAUTHORIZED, "Invalid API key");
    }

    let mut backend = backend.lock().unwrap();
    backend.calls.push(Call {
        method: "PUT",
        path: format!("/api/repo/id/{}/edit", id),
        body: Some(body.clone()),
    });

    let Some(repo) = backend.repos.iter_mut().find(|r| r["id"] == id) else {
        return error(StatusCode::NOT_FOUND, "Repository not found");
    };
    for field in ["sshPublicKey", "storageSize", "alert", "comment", "lanCommand"] {
        repo[field] = body[field].clone();
    }
    Json(json!({ "message": "Envoi API réussi" })).into_response()
}

async fn delete_repo(
    State(backend): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return error(StatusCode::UNAUTHORIZED, "Invalid API key");
    }
    if body["toDelete"] != true {
        return error(StatusCode::BAD_REQUEST, "Missing toDelete");
    }

    let mut backend = backend.lock().unwrap();
    backend.calls.push(Call {
        method: "DELETE",
        path: format!("/api/repo/id/{}/delete", id),
        body: Some(body),
    });

    let before = backend.repos.len();
    backend.repos.retain(|r| r["id"] != id);
    if backend.repos.len() == before {
        return error(StatusCode::NOT_FOUND, "Repository not found");
    }
    Json(json!({ "message": "deleted" })).into_response()
}
