pub mod auth;
pub mod config;
pub mod rest;
pub mod storage;
pub mod tasks;

use std::sync::Arc;

use auth::TokenKeys;
use config::DaemonConfig;
use storage::Storage;
use tasks::TaskStorage;

/// Shared application state passed to every request handler.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<DaemonConfig>,
    pub storage: Arc<Storage>,
    /// Task table access (shares the same SQLite pool as `storage`).
    pub tasks: Arc<TaskStorage>,
    /// Bearer-token signing/verification keys. Handlers never see the raw
    /// header — the `rest::caller::Caller` extractor resolves it to a user id
    /// and passes the identity as an explicit argument.
    pub tokens: Arc<TokenKeys>,
    pub started_at: std::time::Instant,
}
