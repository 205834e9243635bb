//! Scenario: concurrent writers are detected, never overwritten
//!
//! # Invariants under test
//!
//! 1. A UserState changed by another writer after this run read it fails the
//!    run with a conflict; the other writer's content survives.
//! 2. The leaderboard is not written after a failed UserState write.
//! 3. A leaderboard conflict fails the run after the watermark moved; the
//!    next run finds the damaged leaderboard and rebuilds it.

use std::sync::Arc;

use vlb_reconcile::RunState;
use vlb_stats::LeaderboardHealth;
use vlb_store::MemoryStore;
use vlb_testkit::{
    fast_config, puuids, roster, seed_user_state, stored_watermark, supervisor, FakeMatchSource,
    FaultyStore, MatchBuilder,
};

#[tokio::test]
async fn user_state_conflict_fails_loudly() {
    let cfg = fast_config();
    let ids = puuids(8);
    let mem = MemoryStore::new();
    seed_user_state(&mem, &cfg, &roster(&ids), None);
    let store = FaultyStore::new(mem.clone());
    let source = Arc::new(FakeMatchSource::with_matches(vec![MatchBuilder::new("m1")
        .lobby(&ids)
        .build()]));
    let sup = supervisor(&source, Arc::new(store.clone()), cfg.clone());

    let theirs = r#"{ "players": [], "newestMatchID": "someone-else" }"#;
    store.concurrent_write_on(&cfg.store.user_path, theirs);

    let err = sup.reconcile_and_aggregate().await.unwrap_err();
    assert!(err.is_conflict(), "{err}");
    assert!(!err.is_transient());
    assert_eq!(mem.content(&cfg.store.user_path).as_deref(), Some(theirs));
    assert!(!mem.contains(&cfg.store.leaderboard_path));
    assert!(mem.contains(&cfg.store.match_path("m1")));
}

#[tokio::test]
async fn leaderboard_conflict_is_repaired_by_the_next_run() {
    let cfg = fast_config();
    let ids = puuids(8);
    let mem = MemoryStore::new();
    seed_user_state(&mem, &cfg, &roster(&ids), None);
    let store = FaultyStore::new(mem.clone());
    let source = Arc::new(FakeMatchSource::with_matches(vec![MatchBuilder::new("m1")
        .lobby(&ids)
        .kill("p1", "p2", &[])
        .build()]));
    let sup = supervisor(&source, Arc::new(store.clone()), cfg.clone());

    store.concurrent_write_on(&cfg.store.leaderboard_path, r#"{ "players": [] }"#);
    let err = sup.reconcile_and_aggregate().await.unwrap_err();
    assert!(err.is_conflict());
    assert_eq!(stored_watermark(&mem, &cfg).as_deref(), Some("m1"));

    let out = sup.reconcile_and_aggregate().await.unwrap();
    assert_eq!(out.state, RunState::UpToDate);
    assert_eq!(out.leaderboard_health, Some(LeaderboardHealth::Empty));
    let lb = out.leaderboard.unwrap();
    assert_eq!(lb.players.len(), 8);
    assert_eq!(lb.get("p1").unwrap().kills_against.get("p2"), Some(&1));
}
