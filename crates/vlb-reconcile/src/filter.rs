use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;
use vlb_schemas::{MatchBatch, MatchView, RawMatch};

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// Which matches count.
///
/// A match is eligible iff:
/// - `metadata.mode` or `metadata.mode_id` equals `mode` (case-insensitive),
/// - the participant count is one of `participant_counts`,
/// - every participant is on the roster,
/// - it carries a non-blank match id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EligibilityPolicy {
    pub mode: String,
    pub participant_counts: Vec<usize>,
}

impl Default for EligibilityPolicy {
    fn default() -> Self {
        Self {
            mode: "custom".to_string(),
            participant_counts: vec![6, 8],
        }
    }
}

/// Why a match was ignored. Ignoring is never an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Ineligibility {
    WrongMode { mode: String, mode_id: String },
    ParticipantCount { got: usize },
    UntrackedParticipant { puuid: String },
    MissingMatchId,
}

impl fmt::Display for Ineligibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ineligibility::WrongMode { mode, mode_id } => {
                write!(f, "wrong mode (mode='{mode}', mode_id='{mode_id}')")
            }
            Ineligibility::ParticipantCount { got } => {
                write!(f, "participant count {got} not allowed")
            }
            Ineligibility::UntrackedParticipant { puuid } => {
                write!(f, "participant {puuid} is not on the roster")
            }
            Ineligibility::MissingMatchId => write!(f, "match id missing"),
        }
    }
}

impl EligibilityPolicy {
    pub fn new(mode: impl Into<String>, participant_counts: Vec<usize>) -> Self {
        Self {
            mode: mode.into(),
            participant_counts,
        }
    }

    fn mode_matches(&self, view: &MatchView) -> bool {
        let want = self.mode.trim();
        view.metadata.mode.trim().eq_ignore_ascii_case(want)
            || view.metadata.mode_id.trim().eq_ignore_ascii_case(want)
    }

    pub fn check(&self, view: &MatchView, roster: &BTreeSet<String>) -> Result<(), Ineligibility> {
        if !self.mode_matches(view) {
            return Err(Ineligibility::WrongMode {
                mode: view.metadata.mode.clone(),
                mode_id: view.metadata.mode_id.clone(),
            });
        }
        let participants = view.participants();
        if !self.participant_counts.contains(&participants.len()) {
            return Err(Ineligibility::ParticipantCount {
                got: participants.len(),
            });
        }
        if let Some(stranger) = participants.iter().find(|p| !roster.contains(&p.puuid)) {
            return Err(Ineligibility::UntrackedParticipant {
                puuid: stranger.puuid.clone(),
            });
        }
        if view.match_id().is_none() {
            return Err(Ineligibility::MissingMatchId);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Batch classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IgnoredMatch {
    pub match_id: Option<String>,
    #[serde(flatten)]
    pub reason: Ineligibility,
}

/// A batch split into eligible matches (input order preserved, so newest
/// first) and ignored ones with their reasons.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Classified {
    pub eligible: Vec<RawMatch>,
    pub ignored: Vec<IgnoredMatch>,
}

impl Classified {
    pub fn head(&self) -> Option<&RawMatch> {
        self.eligible.first()
    }

    pub fn eligible_ids(&self) -> Vec<&str> {
        self.eligible.iter().filter_map(RawMatch::match_id).collect()
    }
}

pub fn classify_batch(
    batch: &MatchBatch,
    roster: &BTreeSet<String>,
    policy: &EligibilityPolicy,
) -> Classified {
    let mut out = Classified::default();
    for m in &batch.matches {
        match policy.check(m.view(), roster) {
            Ok(()) => out.eligible.push(m.clone()),
            Err(reason) => out.ignored.push(IgnoredMatch {
                match_id: m.match_id().map(str::to_string),
                reason,
            }),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn roster(n: usize) -> BTreeSet<String> {
        (1..=n).map(|i| format!("p{i}")).collect()
    }

    fn payload(id: &str, mode: &str, players: &[&str]) -> Value {
        json!({
            "metadata": { "matchid": id, "mode": mode, "mode_id": "" },
            "players": { "all_players": players.iter().map(|p| json!({ "puuid": p })).collect::<Vec<_>>() }
        })
    }

    fn view(v: Value) -> MatchView {
        MatchView::from_value(&v)
    }

    const EIGHT: [&str; 8] = ["p1", "p2", "p3", "p4", "p5", "p6", "p7", "p8"];

    #[test]
    fn full_lobby_in_custom_mode_is_eligible() {
        let p = EligibilityPolicy::default();
        assert_eq!(p.check(&view(payload("m", "custom", &EIGHT)), &roster(8)), Ok(()));
    }

    #[test]
    fn mode_is_case_insensitive_on_either_field() {
        let p = EligibilityPolicy::default();
        assert!(p.check(&view(payload("m", "Custom", &EIGHT)), &roster(8)).is_ok());

        let mut v = payload("m", "Competitive", &EIGHT);
        v["metadata"]["mode_id"] = json!("CUSTOM");
        assert!(p.check(&view(v), &roster(8)).is_ok());
    }

    #[test]
    fn other_modes_are_ignored() {
        let p = EligibilityPolicy::default();
        let err = p
            .check(&view(payload("m", "Competitive", &EIGHT)), &roster(8))
            .unwrap_err();
        assert!(matches!(err, Ineligibility::WrongMode { .. }));
    }

    #[test]
    fn six_is_allowed_seven_is_not() {
        let p = EligibilityPolicy::default();
        assert!(p.check(&view(payload("m", "custom", &EIGHT[..6])), &roster(8)).is_ok());
        assert_eq!(
            p.check(&view(payload("m", "custom", &EIGHT[..7])), &roster(8)),
            Err(Ineligibility::ParticipantCount { got: 7 })
        );
    }

    #[test]
    fn one_stranger_excludes_the_whole_match() {
        let p = EligibilityPolicy::default();
        let mut players = EIGHT.to_vec();
        players[3] = "stranger";
        assert_eq!(
            p.check(&view(payload("m", "custom", &players)), &roster(8)),
            Err(Ineligibility::UntrackedParticipant {
                puuid: "stranger".into()
            })
        );
    }

    #[test]
    fn blank_match_id_is_ignored() {
        let p = EligibilityPolicy::default();
        assert_eq!(
            p.check(&view(payload("  ", "custom", &EIGHT)), &roster(8)),
            Err(Ineligibility::MissingMatchId)
        );
    }

    #[test]
    fn missing_players_section_counts_as_zero_participants() {
        let p = EligibilityPolicy::default();
        let v = json!({ "metadata": { "matchid": "m", "mode": "custom" } });
        assert_eq!(
            p.check(&view(v), &roster(8)),
            Err(Ineligibility::ParticipantCount { got: 0 })
        );
    }

    #[test]
    fn malformed_fields_do_not_change_eligibility() {
        let p = EligibilityPolicy::default();
        let mut v = payload("m", "custom", &EIGHT);
        v["metadata"]["game_start"] = json!("2024-03-01T20:00:00Z");
        v["players"]["all_players"][2]["stats"] = json!({ "kills": 1.5, "deaths": 2 });
        assert_eq!(p.check(&view(v), &roster(8)), Ok(()));
    }

    #[test]
    fn classify_preserves_order_and_reports_reasons() {
        let batch = MatchBatch::from_response(&json!({ "data": [
            payload("m3", "custom", &EIGHT),
            payload("m2", "competitive", &EIGHT),
            payload("m1", "custom", &EIGHT[..6]),
        ]}))
        .unwrap();
        let c = classify_batch(&batch, &roster(8), &EligibilityPolicy::default());
        assert_eq!(c.eligible_ids(), vec!["m3", "m1"]);
        assert_eq!(c.ignored.len(), 1);
        assert_eq!(c.ignored[0].match_id.as_deref(), Some("m2"));
        assert_eq!(c.head().and_then(|m| m.match_id()), Some("m3"));
    }
}
