//! Axum router and all HTTP handlers for vlb-daemon.
//!
//! `build_router` is the single entry point; `main.rs` calls it and attaches
//! middleware layers.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, warn};
use vlb_runtime::{RunError, Supervisor};
use vlb_source::MatchListRequest;
use vlb_stats::verify_leaderboard;

use crate::{
    api_types::{
        ErrorResponse, HealthResponse, ProxyQuery, PublicConfigResponse, RebuildResponse,
        StatusResponse,
    },
    state::{uptime_secs, AppState, LastRun},
};

pub use vlb_config::PROXY_PATH;

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the complete application router wired to the given shared state.
///
/// Middleware layers (CORS, tracing) are **not** applied here; `main.rs`
/// attaches them after this call so tests can use the bare router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(PROXY_PATH, get(henrik_proxy))
        .route("/api/config", get(public_config))
        .route("/v1/health", get(health))
        .route("/v1/status", get(status_handler))
        .route("/v1/reconcile", post(reconcile))
        .route("/v1/leaderboard/rebuild", post(rebuild_leaderboard))
        .with_state(state)
}

fn error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ErrorResponse::new(message))).into_response()
}

/// 409 for a concurrent writer, 502 for everything the store or the
/// provider did wrong.
fn run_error_status(e: &RunError) -> StatusCode {
    if e.is_conflict() {
        StatusCode::CONFLICT
    } else {
        StatusCode::BAD_GATEWAY
    }
}

fn supervisor_or_503(st: &AppState) -> Result<Arc<Supervisor>, Response> {
    st.supervisor.clone().ok_or_else(|| {
        error(
            StatusCode::SERVICE_UNAVAILABLE,
            format!(
                "reconciler not configured: env var '{}' is not set",
                st.config.store.token_env
            ),
        )
    })
}

// ---------------------------------------------------------------------------
// GET /api/henrik
// ---------------------------------------------------------------------------

/// Forward a match-list query upstream with the provider key attached and
/// pass the body through. Upstream failures keep their status.
pub(crate) async fn henrik_proxy(
    State(st): State<Arc<AppState>>,
    Query(q): Query<ProxyQuery>,
) -> Response {
    let Some(upstream) = st.upstream.as_ref() else {
        return error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "stats provider key is not configured",
        );
    };

    let mut req = MatchListRequest::from_config(&st.config.source);
    if let Some(name) = q.name {
        req.name = name;
    }
    if let Some(tag) = q.tag {
        req.tag = tag;
    }
    if let Some(region) = q.region {
        req.region = region;
    }
    if let Some(mode) = q.mode {
        req.mode = mode;
    }
    if let Some(size) = q.size {
        req.size = size;
    }
    if req.name.trim().is_empty() || req.tag.trim().is_empty() {
        return error(StatusCode::BAD_REQUEST, "name and tag are required");
    }

    match upstream.fetch_raw(&req).await {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(e) => {
            warn!(error = %e, region = %req.region, "upstream match list failed");
            let status =
                StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::BAD_GATEWAY);
            error(status, e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// GET /api/config
// ---------------------------------------------------------------------------

pub(crate) async fn public_config(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    let c = &st.config;
    (
        StatusCode::OK,
        Json(PublicConfigResponse {
            repo: c.store.repo.clone(),
            branch: c.store.branch.clone(),
            user_path: c.store.user_path.clone(),
            match_dir: c.store.match_dir.clone(),
            leaderboard_path: c.store.leaderboard_path.clone(),
            proxy_path: PROXY_PATH.to_string(),
            name: c.source.name.clone(),
            tag: c.source.tag.clone(),
            region: c.source.region.clone(),
            mode: c.source.mode.clone(),
        }),
    )
}

// ---------------------------------------------------------------------------
// GET /v1/health
// ---------------------------------------------------------------------------

pub(crate) async fn health(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            ok: true,
            service: st.build.service,
            version: st.build.version,
        }),
    )
}

// ---------------------------------------------------------------------------
// GET /v1/status
// ---------------------------------------------------------------------------

pub(crate) async fn status_handler(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    let (store, store_error) = match st.supervisor.as_ref() {
        Some(sup) => match sup.status().await {
            Ok(s) => (Some(s), None),
            Err(e) => (None, Some(e.to_string())),
        },
        None => (None, None),
    };
    let last_run = st.last_run.read().await.clone();

    (
        StatusCode::OK,
        Json(StatusResponse {
            daemon_uptime_secs: uptime_secs(),
            config_hash: st.config_hash.clone(),
            proxy_enabled: st.upstream.is_some(),
            reconcile_enabled: st.supervisor.is_some(),
            store,
            store_error,
            last_run,
        }),
    )
}

// ---------------------------------------------------------------------------
// POST /v1/reconcile
// ---------------------------------------------------------------------------

pub(crate) async fn reconcile(State(st): State<Arc<AppState>>) -> Response {
    let sup = match supervisor_or_503(&st) {
        Ok(sup) => sup,
        Err(resp) => return resp,
    };
    let _guard = st.run_lock.lock().await;

    match sup.reconcile_and_aggregate().await {
        Ok(outcome) => {
            info!(
                run_id = %outcome.run_id,
                state = %outcome.state,
                had_new_matches = outcome.had_new_matches,
                "reconcile/trigger done"
            );
            st.record(LastRun::from_outcome(&outcome)).await;
            (StatusCode::OK, Json(outcome)).into_response()
        }
        Err(e) => {
            warn!(error = %e, "reconcile/trigger failed");
            st.record(LastRun::failed("reconcile", e.to_string())).await;
            error(run_error_status(&e), e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// POST /v1/leaderboard/rebuild
// ---------------------------------------------------------------------------

pub(crate) async fn rebuild_leaderboard(State(st): State<Arc<AppState>>) -> Response {
    let sup = match supervisor_or_503(&st) {
        Ok(sup) => sup,
        Err(resp) => return resp,
    };
    let _guard = st.run_lock.lock().await;

    match sup.rebuild_leaderboard().await {
        Ok(lb) => {
            st.record(LastRun::succeeded("rebuild")).await;
            (
                StatusCode::OK,
                Json(RebuildResponse {
                    players: lb.players.len(),
                    violations: verify_leaderboard(&lb),
                }),
            )
                .into_response()
        }
        Err(e) => {
            warn!(error = %e, "leaderboard rebuild failed");
            st.record(LastRun::failed("rebuild", e.to_string())).await;
            error(run_error_status(&e), e.to_string())
        }
    }
}
