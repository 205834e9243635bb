//! Request and response types for all vlb-daemon HTTP endpoints.
//!
//! No business logic lives here.

use serde::{Deserialize, Serialize};
use vlb_runtime::StoreStatus;
use vlb_stats::Violation;

use crate::state::LastRun;

// ---------------------------------------------------------------------------
// /v1/health
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub service: &'static str,
    pub version: &'static str,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Every non-2xx body: one human-readable summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// /api/henrik
// ---------------------------------------------------------------------------

/// Query of the proxy endpoint. Absent fields fall back to config.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProxyQuery {
    pub name: Option<String>,
    pub tag: Option<String>,
    pub region: Option<String>,
    pub mode: Option<String>,
    pub size: Option<u32>,
}

// ---------------------------------------------------------------------------
// /api/config
// ---------------------------------------------------------------------------

/// What a browser client needs to find the documents. Never credentials,
/// never the names of the variables holding them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicConfigResponse {
    pub repo: String,
    pub branch: String,
    pub user_path: String,
    pub match_dir: String,
    pub leaderboard_path: String,
    pub proxy_path: String,
    pub name: String,
    pub tag: String,
    pub region: String,
    pub mode: String,
}

// ---------------------------------------------------------------------------
// /v1/leaderboard/rebuild
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct RebuildResponse {
    pub players: usize,
    pub violations: Vec<Violation>,
}

// ---------------------------------------------------------------------------
// /v1/status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub daemon_uptime_secs: u64,
    pub config_hash: String,
    pub proxy_enabled: bool,
    pub reconcile_enabled: bool,
    pub store: Option<StoreStatus>,
    pub store_error: Option<String>,
    pub last_run: Option<LastRun>,
}
