//! Scenario: watermark planning across consecutive runs
//!
//! # Invariants under test
//!
//! 1. The unseen run stops at the stored watermark and never includes it.
//! 2. Replaying the plan's head as the new watermark makes the next run
//!    UP_TO_DATE with the same list (idempotent convergence).
//! 3. Across a sequence of fetches, the planned head never moves to a match
//!    the source reports as older than one already accepted.
//! 4. A rotated window with an older head is held by the guard.
//!
//! Pure in-process; the caller's store is simulated by a local variable.

use serde_json::json;
use vlb_reconcile::{decide_advance, plan_run, ReconcilePlan, RunState, WatermarkAdvance};
use vlb_schemas::RawMatch;

fn m(id: &str, start: i64) -> RawMatch {
    RawMatch::from_value(json!({ "metadata": { "matchid": id, "game_start": start } }))
}

#[test]
fn converges_after_one_advance() {
    let list = vec![m("m3", 300), m("m2", 200), m("m1", 100)];

    let first = plan_run(&list, Some("m1"));
    assert_eq!(first.ids_to_persist(), ["m3", "m2"]);
    let watermark = first.head().map(str::to_string);

    let second = plan_run(&list, watermark.as_deref());
    assert_eq!(second.state(), RunState::UpToDate);
}

#[test]
fn sequence_of_windows_only_moves_forward() {
    let windows = vec![
        vec![m("m2", 200), m("m1", 100)],
        vec![m("m4", 400), m("m3", 300), m("m2", 200)],
        vec![m("m4", 400), m("m3", 300)],
        vec![m("m6", 600), m("m5", 500), m("m4", 400)],
    ];

    let mut watermark: Option<String> = None;
    let mut accepted_start = i64::MIN;
    for w in &windows {
        if let ReconcilePlan::Stale { head, .. } = plan_run(w, watermark.as_deref()) {
            let start = w[0].view().metadata.game_start.unwrap_or_default();
            assert!(start >= accepted_start, "watermark moved back to {head}");
            accepted_start = start;
            watermark = Some(head);
        }
    }
    assert_eq!(watermark.as_deref(), Some("m6"));
}

#[test]
fn rotated_window_with_older_head_is_held() {
    // The stored watermark m9 is missing from a window whose head is older.
    let list = vec![m("m5", 500), m("m4", 400)];
    let plan = plan_run(&list, Some("m9"));
    let ReconcilePlan::Stale {
        watermark_found,
        unseen,
        ..
    } = plan
    else {
        panic!("expected STALE");
    };
    assert_eq!(unseen.len(), 2, "unseen matches are still persisted");
    assert_eq!(
        decide_advance(watermark_found, Some(900), list[0].view().metadata.game_start),
        WatermarkAdvance::Hold {
            watermark_start: 900,
            head_start: 500
        }
    );
}
