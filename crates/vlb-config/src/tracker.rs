//! Typed view over the merged configuration JSON.
//!
//! Every key is optional; absent keys take the defaults below.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Placeholder for the one legacy match whose team result must never count
/// towards `win` / `all`. It matches no real provider id; each deployment
/// sets its own under `/eligibility/excluded_match_ids`.
pub const LEGACY_EXCLUDED_MATCH_ID: &str = "legacy-excluded-match-placeholder";

/// Default listen address of the daemon.
pub const DEFAULT_DAEMON_ADDR: &str = "127.0.0.1:8787";

/// Path of the daemon's stats-provider indirection endpoint.
pub const PROXY_PATH: &str = "/api/henrik";

/// Full two 4-stacks, or a 3v3 when two tracked players sat out.
pub const DEFAULT_PARTICIPANT_COUNTS: [usize; 2] = [6, 8];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub store: StoreConfig,
    pub source: SourceConfig,
    pub engine: EngineConfig,
    pub eligibility: EligibilityConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// `owner/name`
    pub repo: String,
    pub branch: String,
    pub api_base: String,
    pub token_env: String,
    pub user_path: String,
    pub match_dir: String,
    pub leaderboard_path: String,
    /// Delay between successive corpus reads.
    pub read_pacing_ms: u64,
    /// Parallel MatchRecord creates within one run.
    pub write_concurrency: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            repo: String::new(),
            branch: "main".to_string(),
            api_base: "https://api.github.com".to_string(),
            token_env: crate::secrets::DEFAULT_STORE_TOKEN_ENV.to_string(),
            user_path: "src/user.json".to_string(),
            match_dir: "src/match".to_string(),
            leaderboard_path: "src/leaderboard.json".to_string(),
            read_pacing_ms: 100,
            write_concurrency: 1,
        }
    }
}

impl StoreConfig {
    /// `<match_dir>/<match_id>.json`
    pub fn match_path(&self, match_id: &str) -> String {
        format!("{}/{}.json", self.match_dir.trim_end_matches('/'), match_id)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceTransport {
    /// Query the server-side indirection endpoint; no key in this process.
    #[default]
    Proxy,
    /// Call the upstream provider directly with the resolved key.
    Direct,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub transport: SourceTransport,
    /// Full URL of the indirection endpoint.
    pub proxy_url: String,
    pub upstream_base: String,
    pub api_key_env: String,
    /// Identity whose match history is scanned.
    pub name: String,
    pub tag: String,
    pub region: String,
    pub mode: String,
    pub size: u32,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            transport: SourceTransport::Proxy,
            proxy_url: format!("http://{DEFAULT_DAEMON_ADDR}{PROXY_PATH}"),
            upstream_base: "https://api.henrikdev.xyz".to_string(),
            api_key_env: crate::secrets::DEFAULT_SOURCE_KEY_ENV.to_string(),
            name: String::new(),
            tag: String::new(),
            region: "eu".to_string(),
            mode: "custom".to_string(),
            size: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 500,
            max_backoff_ms: 8000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Pause between the last match write and re-reading the corpus.
    pub cooldown_ms: u64,
    pub request_timeout_ms: u64,
    pub retry: RetryConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cooldown_ms: 2000,
            request_timeout_ms: 15000,
            retry: RetryConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EligibilityConfig {
    pub mode: String,
    pub participant_counts: Vec<usize>,
    pub excluded_match_ids: Vec<String>,
}

impl Default for EligibilityConfig {
    fn default() -> Self {
        Self {
            mode: "custom".to_string(),
            participant_counts: DEFAULT_PARTICIPANT_COUNTS.to_vec(),
            excluded_match_ids: vec![LEGACY_EXCLUDED_MATCH_ID.to_string()],
        }
    }
}

impl TrackerConfig {
    pub fn from_json(config_json: &Value) -> Result<Self> {
        let cfg: TrackerConfig = if config_json.is_null() {
            TrackerConfig::default()
        } else {
            serde_json::from_value(config_json.clone()).context("CONFIG_INVALID: tracker config")?
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.store.branch.trim().is_empty() {
            bail!("CONFIG_INVALID: /store/branch must not be empty");
        }
        for (ptr, v) in [
            ("/store/user_path", &self.store.user_path),
            ("/store/match_dir", &self.store.match_dir),
            ("/store/leaderboard_path", &self.store.leaderboard_path),
        ] {
            if v.trim().is_empty() {
                bail!("CONFIG_INVALID: {ptr} must not be empty");
            }
        }
        if self.store.write_concurrency == 0 {
            bail!("CONFIG_INVALID: /store/write_concurrency must be >= 1");
        }
        if self.source.size == 0 {
            bail!("CONFIG_INVALID: /source/size must be >= 1");
        }
        if self.engine.request_timeout_ms == 0 {
            bail!("CONFIG_INVALID: /engine/request_timeout_ms must be > 0");
        }
        if self.engine.retry.max_attempts == 0 {
            bail!("CONFIG_INVALID: /engine/retry/max_attempts must be >= 1");
        }
        if self.eligibility.participant_counts.is_empty() {
            bail!("CONFIG_INVALID: /eligibility/participant_counts must not be empty");
        }
        Ok(())
    }

    /// Fails unless the store repository is set. Read-only commands such as
    /// `config-hash` skip this.
    pub fn require_repo(&self) -> Result<&str> {
        let repo = self.store.repo.trim();
        if repo.is_empty() || !repo.contains('/') {
            bail!("CONFIG_INVALID: /store/repo must be 'owner/name'");
        }
        Ok(repo)
    }
}
