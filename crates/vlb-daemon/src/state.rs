//! Shared runtime state for vlb-daemon.
//!
//! Handlers receive `State<Arc<AppState>>` from Axum. Credentials live only
//! inside the constructed clients; nothing here serializes them.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};
use uuid::Uuid;
use vlb_config::secrets::ResolvedSecrets;
use vlb_config::TrackerConfig;
use vlb_runtime::{RunOutcome, Supervisor};
use vlb_source::{build_match_source, HenrikMatchSource};
use vlb_store::GitHubContentsStore;

// ---------------------------------------------------------------------------
// BuildInfo
// ---------------------------------------------------------------------------

/// Static build metadata included in health / status responses.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BuildInfo {
    pub service: &'static str,
    pub version: &'static str,
}

// ---------------------------------------------------------------------------
// LastRun
// ---------------------------------------------------------------------------

/// Summary of the most recent reconcile or rebuild triggered over HTTP.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LastRun {
    pub run_id: Option<Uuid>,
    /// "reconcile" | "rebuild"
    pub kind: String,
    pub finished_at: DateTime<Utc>,
    pub ok: bool,
    /// "NO_ELIGIBLE" | "UP_TO_DATE" | "STALE", reconcile only.
    pub state: Option<String>,
    pub had_new_matches: bool,
    pub watermark: Option<String>,
    pub error: Option<String>,
}

impl LastRun {
    pub fn from_outcome(outcome: &RunOutcome) -> Self {
        Self {
            run_id: Some(outcome.run_id),
            kind: "reconcile".to_string(),
            finished_at: Utc::now(),
            ok: true,
            state: Some(outcome.state.as_str().to_string()),
            had_new_matches: outcome.had_new_matches,
            watermark: outcome.watermark.clone(),
            error: None,
        }
    }

    pub fn succeeded(kind: &str) -> Self {
        Self {
            run_id: None,
            kind: kind.to_string(),
            finished_at: Utc::now(),
            ok: true,
            state: None,
            had_new_matches: false,
            watermark: None,
            error: None,
        }
    }

    pub fn failed(kind: &str, error: String) -> Self {
        Self {
            ok: false,
            error: Some(error),
            ..Self::succeeded(kind)
        }
    }
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

pub struct AppState {
    /// Static build metadata.
    pub build: BuildInfo,
    pub config: TrackerConfig,
    pub config_hash: String,
    /// `None` when the document store token is not configured; the trigger
    /// routes then answer 503.
    pub supervisor: Option<Arc<Supervisor>>,
    /// Upstream client behind `/api/henrik`; `None` without a provider key.
    pub upstream: Option<HenrikMatchSource>,
    /// Serialises reconcile and rebuild runs within this process.
    pub run_lock: Mutex<()>,
    pub last_run: RwLock<Option<LastRun>>,
}

impl AppState {
    pub fn new(
        config: TrackerConfig,
        config_hash: String,
        supervisor: Option<Supervisor>,
        upstream: Option<HenrikMatchSource>,
    ) -> Self {
        Self {
            build: BuildInfo {
                service: "vlb-daemon",
                version: env!("CARGO_PKG_VERSION"),
            },
            config,
            config_hash,
            supervisor: supervisor.map(Arc::new),
            upstream,
            run_lock: Mutex::new(()),
            last_run: RwLock::new(None),
        }
    }

    /// Wire the real clients from config and whatever secrets are present.
    ///
    /// A missing provider key disables the proxy endpoint; a missing store
    /// token disables the reconcile triggers. Neither is fatal at boot.
    pub fn from_config(
        config: TrackerConfig,
        config_hash: String,
        secrets: &ResolvedSecrets,
    ) -> anyhow::Result<Self> {
        let timeout = Duration::from_millis(config.engine.request_timeout_ms);

        let upstream = match secrets.source_api_key.clone() {
            Some(key) => Some(
                HenrikMatchSource::new_with_base_url(key, config.source.upstream_base.clone(), timeout)
                    .context("building upstream client")?,
            ),
            None => {
                warn!(
                    env = %config.source.api_key_env,
                    "stats provider key not set, /api/henrik will answer 500"
                );
                None
            }
        };

        let supervisor = match secrets.store_token.clone() {
            Some(token) => {
                let store = GitHubContentsStore::from_config(&config.store, token, timeout)
                    .context("building document store client")?;
                let source =
                    build_match_source(&config, secrets).context("building match source")?;
                info!(repo = store.repo(), branch = store.branch(), "document store configured");
                Some(Supervisor::new(source, Arc::new(store), config.clone()))
            }
            None => {
                warn!(
                    env = %config.store.token_env,
                    "document store token not set, reconcile triggers disabled"
                );
                None
            }
        };

        Ok(Self::new(config, config_hash, supervisor, upstream))
    }

    pub async fn record(&self, run: LastRun) {
        *self.last_run.write().await = Some(run);
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Monotonically increasing uptime since first call (process lifetime).
pub fn uptime_secs() -> u64 {
    static START: std::sync::OnceLock<std::time::Instant> = std::sync::OnceLock::new();
    START
        .get_or_init(std::time::Instant::now)
        .elapsed()
        .as_secs()
}
