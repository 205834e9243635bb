//! vlb-daemon entry point.
//!
//! Thin: sets up tracing, loads config, builds the shared state, wires
//! middleware and starts the HTTP server. Route handlers live in
//! `routes.rs`; shared state types live in `state.rs`.

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::http::{HeaderValue, Method};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{info, Level};
use vlb_config::{
    load_layered_yaml, report_unused_keys, ConfigRole, UnusedKeyPolicy, DEFAULT_DAEMON_ADDR,
};
use vlb_daemon::{routes, state};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Silent if the file does not exist; production injects env vars directly.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let paths = config_paths_from_env();
    let path_refs: Vec<&str> = paths.iter().map(String::as_str).collect();
    let loaded = load_layered_yaml(&path_refs).context("loading config")?;
    let config = loaded.tracker().context("typed config")?;
    let secrets = vlb_config::secrets::resolve_secrets_optional(&loaded.config_json);

    // Without a store token the daemon only serves the proxy.
    let role = if secrets.store_token.is_some() {
        ConfigRole::Reconciler
    } else {
        ConfigRole::Proxy
    };
    let report = report_unused_keys(role, &loaded.config_json, UnusedKeyPolicy::Warn)?;
    if !report.is_clean() {
        info!(
            role = role.as_str(),
            unused = report.unused_leaf_pointers.len(),
            "config has keys this role ignores"
        );
    }

    let shared = Arc::new(state::AppState::from_config(
        config,
        loaded.config_hash.clone(),
        &secrets,
    )?);
    info!(config_hash = %loaded.config_hash, "config loaded");

    let app = routes::build_router(Arc::clone(&shared))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_localhost_only());

    let addr = bind_addr_from_env()
        .or_else(|| DEFAULT_DAEMON_ADDR.parse().ok())
        .context("no usable bind address")?;
    info!("vlb-daemon listening on http://{}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
        .await
        .context("server crashed")?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}

fn bind_addr_from_env() -> Option<SocketAddr> {
    std::env::var("VLB_DAEMON_ADDR").ok()?.parse().ok()
}

/// Comma-separated YAML layers from `VLB_CONFIG`, else `config/base.yaml`.
fn config_paths_from_env() -> Vec<String> {
    std::env::var("VLB_CONFIG")
        .ok()
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| vec!["config/base.yaml".to_string()])
}

/// CORS: allow only localhost origins.
fn cors_localhost_only() -> CorsLayer {
    let allowed_origins = [
        "http://localhost",
        "http://127.0.0.1",
        "http://localhost:3000",
        "http://127.0.0.1:3000",
        "http://localhost:5173",
        "http://127.0.0.1:5173",
    ];

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(tower_http::cors::Any)
}
