//! Repository records as exchanged with the BorgWarehouse API.
//!
//! The backend speaks camelCase JSON. Only the fields this crate manages are
//! typed; everything the server owns (status, usage counters, last save time,
//! ...) is kept in `extra` and written back out verbatim.

use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Default storage quota in GB.
pub const DEFAULT_STORAGE_SIZE: i64 = 10;

/// Default staleness alert threshold in seconds (48h).
pub const DEFAULT_ALERT: i64 = 172_800;

/// Default comment attached to managed repositories.
pub const DEFAULT_COMMENT: &str = "Managed by Ansible.";

/// Server-assigned repository identifier.
///
/// Opaque to us: the backend currently hands out integers, but we accept
/// strings too and only ever render it back into URL paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RepoId(Value);

impl RepoId {
    pub fn new(id: impl Into<Value>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Value::String(s) => f.write_str(s),
            other => write!(f, "{}", other),
        }
    }
}

impl<'de> Deserialize<'de> for RepoId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            v @ (Value::Number(_) | Value::String(_)) => Ok(Self(v)),
            other => Err(serde::de::Error::custom(format!(
                "repository id must be a number or string, got {}",
                other
            ))),
        }
    }
}

/// A repository record as returned by `GET /api/repo`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RepoId>,
    pub alias: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub ssh_public_key: String,
    #[serde(deserialize_with = "lenient_int")]
    pub storage_size: i64,
    #[serde(deserialize_with = "lenient_int")]
    pub alert: i64,
    #[serde(default, deserialize_with = "nullable_string")]
    pub comment: String,
    /// Server-owned fields, passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Lifecycle intent requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    #[default]
    Present,
    Absent,
}

/// Caller-supplied desired state of one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesiredState {
    pub alias: String,
    pub ssh_public_key: String,
    pub storage_size: i64,
    pub alert: i64,
    pub comment: String,
    pub intent: Intent,
}

impl DesiredState {
    /// Desired state with the default quota, alert and comment.
    pub fn new(alias: impl Into<String>, ssh_public_key: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            ssh_public_key: ssh_public_key.into(),
            storage_size: DEFAULT_STORAGE_SIZE,
            alert: DEFAULT_ALERT,
            comment: DEFAULT_COMMENT.to_string(),
            intent: Intent::Present,
        }
    }

    pub fn with_intent(mut self, intent: Intent) -> Self {
        self.intent = intent;
        self
    }

    /// Body for the add and edit endpoints.
    pub fn payload(&self) -> RepoPayload<'_> {
        RepoPayload {
            alias: &self.alias,
            ssh_public_key: &self.ssh_public_key,
            storage_size: self.storage_size,
            alert: self.alert,
            comment: &self.comment,
            append_only_mode: false,
            lan_command: false,
        }
    }
}

/// Whole-record body sent to `POST /api/repo/add` and `PUT /api/repo/id/{id}/edit`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoPayload<'a> {
    pub alias: &'a str,
    pub ssh_public_key: &'a str,
    pub storage_size: i64,
    pub alert: i64,
    pub comment: &'a str,
    pub append_only_mode: bool,
    pub lan_command: bool,
}

/// Body sent to `DELETE /api/repo/id/{id}/delete`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletePayload {
    pub to_delete: bool,
}

/// Envelope returned by `GET /api/repo`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoList {
    pub repo_list: Vec<RepositoryRecord>,
}

// i64::MIN is exactly representable; i64::MAX rounds up to 2^63, so the upper
// bound is exclusive.
const I64_MIN_F64: f64 = i64::MIN as f64;
const I64_MAX_F64: f64 = i64::MAX as f64;

/// A `null` string field reads as empty, so it diffs as drift instead of failing.
fn nullable_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accepts an integer, an integral float or a numeric string.
fn lenient_int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    use serde::de::Error;

    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && (I64_MIN_F64..I64_MAX_F64).contains(f))
                    .map(|f| f as i64)
            })
            .ok_or_else(|| D::Error::custom(format!("expected an integer, got {}", n))),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| D::Error::custom(format!("expected an integer, got {:?}", s))),
        other => Err(D::Error::custom(format!("expected an integer, got {}", other))),
    }
}
