//! Test doubles and fixtures shared by the scenario tests.
//!
//! Nothing here is used by production builds.

mod builder;
mod fake_source;
mod faulty_store;

pub use builder::MatchBuilder;
pub use fake_source::FakeMatchSource;
pub use faulty_store::FaultyStore;

use std::sync::Arc;

use vlb_config::{RetryConfig, TrackerConfig};
use vlb_runtime::Supervisor;
use vlb_schemas::{Player, UserState};
use vlb_store::{to_pretty_json, DocumentStore, MemoryStore};

/// `p1`..`pn`.
pub fn puuids(n: usize) -> Vec<String> {
    (1..=n).map(|i| format!("p{i}")).collect()
}

/// Roster entries with placeholder display fields.
pub fn roster(puuids: &[String]) -> Vec<Player> {
    puuids
        .iter()
        .map(|p| {
            let mut player = Player::new(p.clone());
            player.name = format!("old-{p}");
            player.tag = "EU".to_string();
            player
        })
        .collect()
}

/// Defaults with every delay removed.
pub fn fast_config() -> TrackerConfig {
    let mut cfg = TrackerConfig::default();
    cfg.source.name = "Tracker".to_string();
    cfg.source.tag = "EU1".to_string();
    cfg.store.read_pacing_ms = 0;
    cfg.engine.cooldown_ms = 0;
    cfg.engine.retry = RetryConfig {
        max_attempts: 3,
        initial_backoff_ms: 1,
        max_backoff_ms: 2,
    };
    cfg
}

/// Write the roster document directly, bypassing version checks.
pub fn seed_user_state(
    store: &MemoryStore,
    cfg: &TrackerConfig,
    players: &[Player],
    watermark: Option<&str>,
) {
    let state = UserState {
        players: players.to_vec(),
        newest_match_id: watermark.map(str::to_string),
        ..Default::default()
    };
    let body = to_pretty_json(&state).unwrap_or_default();
    store.insert(&cfg.store.user_path, body);
}

pub fn supervisor(
    source: &Arc<FakeMatchSource>,
    store: Arc<dyn DocumentStore>,
    cfg: TrackerConfig,
) -> Supervisor {
    Supervisor::new(source.clone(), store, cfg)
}

/// The stored watermark, read straight from the roster document.
pub fn stored_watermark(store: &MemoryStore, cfg: &TrackerConfig) -> Option<String> {
    let body = store.content(&cfg.store.user_path)?;
    let state: UserState = serde_json::from_str(&body).ok()?;
    state.newest_match_id
}
