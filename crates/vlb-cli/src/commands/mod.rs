//! Command handler modules for vlb-cli.
//!
//! Shared wiring lives here; command-specific logic lives in the submodules.

pub mod report;
pub mod run;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::warn;
use vlb_config::secrets::{resolve_secrets, ResolvedSecrets};
use vlb_config::{load_layered_yaml, report_unused_keys, ConfigRole, TrackerConfig, UnusedKeyPolicy};
use vlb_runtime::Supervisor;
use vlb_source::build_match_source;
use vlb_store::GitHubContentsStore;

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Load the layered config and resolve the reconciler's secrets.
pub fn load(paths: &[&str]) -> Result<(TrackerConfig, ResolvedSecrets)> {
    let loaded = load_layered_yaml(paths).context("loading config")?;
    let report = report_unused_keys(
        ConfigRole::Reconciler,
        &loaded.config_json,
        UnusedKeyPolicy::Warn,
    )?;
    if !report.is_clean() {
        warn!(unused = ?report.unused_leaf_pointers, "config keys not read by the reconciler");
    }
    let cfg = loaded.tracker().context("typed config")?;
    let secrets = resolve_secrets(&loaded.config_json, ConfigRole::Reconciler)?;
    Ok((cfg, secrets))
}

pub fn github_store(cfg: &TrackerConfig, secrets: &ResolvedSecrets) -> Result<GitHubContentsStore> {
    let token = secrets
        .store_token
        .clone()
        .with_context(|| format!("env var '{}' is not set", cfg.store.token_env))?;
    let timeout = Duration::from_millis(cfg.engine.request_timeout_ms);
    GitHubContentsStore::from_config(&cfg.store, token, timeout)
        .context("building document store client")
}

pub fn supervisor(paths: &[&str]) -> Result<Supervisor> {
    let (cfg, secrets) = load(paths)?;
    let store = github_store(&cfg, &secrets)?;
    let source = build_match_source(&cfg, &secrets).context("building match source")?;
    Ok(Supervisor::new(source, Arc::new(store), cfg))
}
