//! Clients for the BorgWarehouse backend.
//!
//! - transport: authenticated HTTP requests with status classification
//! - repo: repository listing, lookup by alias, create/update/delete

pub mod repo;
pub mod transport;

pub use repo::{RepoClient, find_by_alias};
pub use transport::{HttpTransport, Response, Transport};
