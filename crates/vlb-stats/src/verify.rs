use std::fmt;

use serde::Serialize;
use vlb_schemas::{headrate, LeaderboardDocument};

/// A leaderboard entry that breaks a derived-document invariant.
///
/// These point at corrupted corpus data (a stat line disagreeing with the
/// kill events), not at the aggregator.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    KillsAgainstExceedsKills {
        puuid: String,
        kills: u64,
        kills_against: u64,
    },
    WinsExceedPlayed {
        puuid: String,
        win: u64,
        all: u64,
    },
    HeadrateMismatch {
        puuid: String,
        stored: f64,
        expected: f64,
    },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::KillsAgainstExceedsKills {
                puuid,
                kills,
                kills_against,
            } => write!(f, "{puuid}: killsAgainst total {kills_against} > kills {kills}"),
            Violation::WinsExceedPlayed { puuid, win, all } => {
                write!(f, "{puuid}: win {win} > all {all}")
            }
            Violation::HeadrateMismatch {
                puuid,
                stored,
                expected,
            } => write!(f, "{puuid}: headrate {stored} != {expected}"),
        }
    }
}

/// Check `sum(killsAgainst) <= kills`, `win <= all` and headrate consistency
/// for every entry. Empty result means clean.
pub fn verify_leaderboard(doc: &LeaderboardDocument) -> Vec<Violation> {
    let mut out = Vec::new();
    for p in &doc.players {
        let against = p.kills_against_total();
        if against > p.kills {
            out.push(Violation::KillsAgainstExceedsKills {
                puuid: p.puuid.clone(),
                kills: p.kills,
                kills_against: against,
            });
        }
        if p.win > p.all {
            out.push(Violation::WinsExceedPlayed {
                puuid: p.puuid.clone(),
                win: p.win,
                all: p.all,
            });
        }
        let expected = headrate(p.headshots, p.bodyshots, p.legshots);
        if (p.headrate - expected).abs() > 1e-9 || p.headrate.is_nan() {
            out.push(Violation::HeadrateMismatch {
                puuid: p.puuid.clone(),
                stored: p.headrate,
                expected,
            });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use vlb_schemas::PlayerStats;

    #[test]
    fn zeroed_entries_are_clean() {
        let doc = LeaderboardDocument {
            players: vec![PlayerStats::zeroed("a", ["a", "b"])],
        };
        assert!(verify_leaderboard(&doc).is_empty());
    }

    #[test]
    fn each_invariant_is_reported() {
        let mut p = PlayerStats::zeroed("a", ["a", "b"]);
        p.kills = 1;
        p.kills_against.insert("b".into(), 2);
        p.win = 2;
        p.all = 1;
        p.headshots = 1;
        p.headrate = 12.0;
        let v = verify_leaderboard(&LeaderboardDocument { players: vec![p] });
        assert_eq!(v.len(), 3);
        assert!(v[0].to_string().contains("killsAgainst total 2 > kills 1"));
    }
}
