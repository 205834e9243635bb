//! Scenario: eligibility filter
//!
//! # Invariants under test
//!
//! 1. A match with 7 roster participants (neither 6 nor 8) is excluded.
//! 2. `mode = "Custom"` (capitalised) is included.
//! 3. One participant outside the roster excludes the whole match.
//! 4. Ignoring is reported with a reason, never raised as an error.
//! 5. A widened participant policy is honoured (config, not code).
//!
//! Pure in-process; no network or store.

use std::collections::BTreeSet;

use serde_json::{json, Value};
use vlb_reconcile::{classify_batch, EligibilityPolicy, Ineligibility};
use vlb_schemas::MatchBatch;

fn roster() -> BTreeSet<String> {
    (1..=8).map(|i| format!("p{i}")).collect()
}

fn payload(id: &str, mode: &str, players: &[&str]) -> Value {
    json!({
        "metadata": { "matchid": id, "mode": mode, "mode_id": "custom" },
        "players": { "all_players": players.iter().map(|p| json!({ "puuid": p, "team": "Red" })).collect::<Vec<_>>() },
        "kills": [],
        "teams": { "red": { "has_won": true }, "blue": { "has_won": false } }
    })
}

fn batch(items: Vec<Value>) -> MatchBatch {
    MatchBatch::from_response(&json!({ "data": items })).unwrap()
}

const ALL: [&str; 8] = ["p1", "p2", "p3", "p4", "p5", "p6", "p7", "p8"];

#[test]
fn seven_participants_are_excluded() {
    let c = classify_batch(
        &batch(vec![payload("m7", "custom", &ALL[..7])]),
        &roster(),
        &EligibilityPolicy::default(),
    );
    assert!(c.eligible.is_empty());
    assert_eq!(c.ignored[0].reason, Ineligibility::ParticipantCount { got: 7 });
}

#[test]
fn capitalised_custom_is_included() {
    let mut m = payload("m1", "Custom", &ALL);
    m["metadata"]["mode_id"] = json!("");
    let c = classify_batch(&batch(vec![m]), &roster(), &EligibilityPolicy::default());
    assert_eq!(c.eligible_ids(), vec!["m1"]);
}

#[test]
fn stranger_excludes_entire_match() {
    let mut players = ALL.to_vec();
    players[7] = "outsider";
    let c = classify_batch(
        &batch(vec![payload("m1", "custom", &players), payload("m0", "custom", &ALL)]),
        &roster(),
        &EligibilityPolicy::default(),
    );
    assert_eq!(c.eligible_ids(), vec!["m0"]);
    assert_eq!(
        c.ignored[0].reason,
        Ineligibility::UntrackedParticipant {
            puuid: "outsider".into()
        }
    );
}

#[test]
fn reasons_serialise_for_reporting() {
    let c = classify_batch(
        &batch(vec![payload("m7", "custom", &ALL[..7])]),
        &roster(),
        &EligibilityPolicy::default(),
    );
    let v = serde_json::to_value(&c.ignored[0]).unwrap();
    assert_eq!(v, json!({ "match_id": "m7", "reason": "participant_count", "got": 7 }));
}

#[test]
fn configured_counts_widen_the_filter() {
    let policy = EligibilityPolicy::new("custom", vec![6, 7, 8]);
    let c = classify_batch(&batch(vec![payload("m7", "custom", &ALL[..7])]), &roster(), &policy);
    assert_eq!(c.eligible_ids(), vec!["m7"]);
}
