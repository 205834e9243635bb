use std::collections::{BTreeMap, BTreeSet};

use vlb_schemas::{headrate, LeaderboardDocument, MatchRecord, Player, PlayerStats};

/// Recompute the leaderboard from the full corpus.
///
/// 1. Every roster player starts at zero, with a zero entry for every other
///    roster member in `killsAgainst` / `assistsWith`.
/// 2. Per-match stat lines of roster participants are summed.
/// 3. Kill events: suicides never enter `killsAgainst` (their raw stat line
///    still counts in `kills`). `killsAgainst[victim]` and
///    `assistsWith[killer]` only count when both sides are on the roster.
/// 4. Decisive matches outside `excluded_match_ids` add to `all`, and to
///    `win` for players on the winning side.
/// 5. `headrate` last.
///
/// Players appear in roster order. Matches missing `kills` or `players`
/// contribute nothing to those tallies.
pub fn aggregate(
    corpus: &[MatchRecord],
    roster: &[Player],
    excluded_match_ids: &BTreeSet<String>,
) -> LeaderboardDocument {
    let mut order: Vec<&str> = Vec::new();
    for p in roster {
        if !order.contains(&p.puuid.as_str()) {
            order.push(p.puuid.as_str());
        }
    }

    let mut stats: BTreeMap<&str, PlayerStats> = order
        .iter()
        .map(|puuid| (*puuid, PlayerStats::zeroed(puuid, order.iter().copied())))
        .collect();

    for record in corpus {
        let view = record.view();

        for participant in view.participants() {
            if let Some(s) = stats.get_mut(participant.puuid.as_str()) {
                let line = participant.stats;
                s.kills += line.kills;
                s.deaths += line.deaths;
                s.assists += line.assists;
                s.headshots += line.headshots;
                s.bodyshots += line.bodyshots;
                s.legshots += line.legshots;
            }
        }

        for kill in &view.kills {
            let killer = kill.killer_puuid.as_str();
            let killer_tracked = stats.contains_key(killer);

            if !kill.is_suicide() && killer_tracked && stats.contains_key(kill.victim_puuid.as_str())
            {
                if let Some(s) = stats.get_mut(killer) {
                    *s.kills_against.entry(kill.victim_puuid.clone()).or_insert(0) += 1;
                }
            }

            if !killer_tracked {
                continue;
            }
            for assist in &kill.assistants {
                let assistant = assist.assistant_puuid.as_str();
                if assistant == killer {
                    continue;
                }
                if let Some(s) = stats.get_mut(assistant) {
                    *s.assists_with.entry(killer.to_string()).or_insert(0) += 1;
                }
            }
        }

        let excluded = record
            .match_id()
            .map(|id| excluded_match_ids.contains(id))
            .unwrap_or(false);
        if excluded {
            continue;
        }
        if let Some(winner) = view.teams.decisive_winner() {
            for participant in view.participants() {
                if let Some(s) = stats.get_mut(participant.puuid.as_str()) {
                    s.all += 1;
                    if participant.team_color() == Some(winner) {
                        s.win += 1;
                    }
                }
            }
        }
    }

    let players = order
        .iter()
        .filter_map(|puuid| stats.remove(puuid))
        .map(|mut s| {
            s.headrate = headrate(s.headshots, s.bodyshots, s.legshots);
            s
        })
        .collect();

    LeaderboardDocument { players }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn roster(ids: &[&str]) -> Vec<Player> {
        ids.iter().map(|id| Player::new(*id)).collect()
    }

    fn none() -> BTreeSet<String> {
        BTreeSet::new()
    }

    #[test]
    fn empty_corpus_yields_zeroed_roster() {
        let lb = aggregate(&[], &roster(&["a", "b"]), &none());
        assert_eq!(lb.players.len(), 2);
        assert_eq!(lb.players[0].puuid, "a");
        assert_eq!(lb.players[0].kills_against.get("b"), Some(&0));
        assert_eq!(lb.players[0].headrate, 0.0);
    }

    #[test]
    fn duplicate_roster_entries_collapse() {
        let lb = aggregate(&[], &roster(&["a", "a", "b"]), &none());
        assert_eq!(lb.players.len(), 2);
    }

    #[test]
    fn untracked_participants_are_ignored() {
        let m = MatchRecord::from_value(json!({
            "metadata": { "matchid": "m1" },
            "players": { "all_players": [
                { "puuid": "a", "team": "Red", "stats": { "kills": 3 } },
                { "puuid": "x", "team": "Blue", "stats": { "kills": 9 } }
            ]},
            "kills": [
                { "killer_puuid": "x", "victim_puuid": "a", "assistants": [{ "assistant_puuid": "a" }] },
                { "killer_puuid": "a", "victim_puuid": "x" }
            ],
            "teams": { "red": { "has_won": false }, "blue": { "has_won": true } }
        }));
        let lb = aggregate(&[m], &roster(&["a", "b"]), &none());
        let a = lb.get("a").unwrap();
        assert_eq!(a.kills, 3);
        assert_eq!(a.kills_against_total(), 0);
        assert_eq!(a.assists_with.get("x"), None);
        assert_eq!((a.win, a.all), (0, 1));
    }

    #[test]
    fn assisting_own_kill_is_not_counted() {
        let m = MatchRecord::from_value(json!({
            "metadata": { "matchid": "m1" },
            "players": { "all_players": [ { "puuid": "a" }, { "puuid": "b" } ] },
            "kills": [
                { "killer_puuid": "a", "victim_puuid": "b",
                  "assistants": [{ "assistant_puuid": "a" }, { "assistant_puuid": "b" }] }
            ]
        }));
        let lb = aggregate(&[m], &roster(&["a", "b"]), &none());
        assert_eq!(lb.get("a").unwrap().assists_with.get("a"), None);
        assert_eq!(lb.get("b").unwrap().assists_with.get("a"), Some(&1));
    }

    #[test]
    fn team_label_comparison_ignores_case() {
        let m = MatchRecord::from_value(json!({
            "metadata": { "matchid": "m1" },
            "players": { "all_players": [ { "puuid": "a", "team": "blue" } ] },
            "teams": { "red": { "has_won": false }, "blue": { "has_won": true } }
        }));
        let lb = aggregate(&[m], &roster(&["a"]), &none());
        assert_eq!(lb.get("a").unwrap().win, 1);
    }

    #[test]
    fn both_flagged_winners_is_not_decisive() {
        let m = MatchRecord::from_value(json!({
            "metadata": { "matchid": "m1" },
            "players": { "all_players": [ { "puuid": "a", "team": "Red" } ] },
            "teams": { "red": { "has_won": true }, "blue": { "has_won": true } }
        }));
        let lb = aggregate(&[m], &roster(&["a"]), &none());
        assert_eq!(lb.get("a").unwrap().all, 0);
    }
    #[test]
    fn suicide_and_undecided_match_leave_matrices_and_totals_alone() {
        let ids = ["p1", "p2", "p3", "p4", "p5", "p6", "p7", "p8"];
        let all: Vec<_> = ids
            .iter()
            .enumerate()
            .map(|(i, id)| {
                json!({
                    "puuid": id,
                    "team": if i % 2 == 0 { "Red" } else { "Blue" },
                    "stats": { "kills": if *id == "p1" { 1 } else { 0 } }
                })
            })
            .collect();
        let m1 = MatchRecord::from_value(json!({
            "metadata": { "matchid": "m1" },
            "players": { "all_players": all },
            "kills": [
                { "killer_puuid": "p1", "victim_puuid": "p2",
                  "assistants": [{ "assistant_puuid": "p3" }] }
            ],
            "teams": { "red": { "has_won": true, "rounds_won": 13 },
                       "blue": { "has_won": false, "rounds_won": 4 } }
        }));
        let m2 = MatchRecord::from_value(json!({
            "metadata": { "matchid": "m2" },
            "players": { "all_players": [
                { "puuid": "p1" }, { "puuid": "p2" }, { "puuid": "p3" },
                { "puuid": "p4", "stats": { "kills": 1 } }, { "puuid": "p5" }, { "puuid": "p6" }
            ]},
            "kills": [ { "killer_puuid": "p4", "victim_puuid": "p4" } ]
        }));

        let lb = aggregate(&[m1, m2], &roster(&ids), &none());
        let p1 = lb.get("p1").unwrap();
        assert_eq!(p1.kills, 1);
        assert_eq!(p1.kills_against.get("p2"), Some(&1));
        assert_eq!((p1.win, p1.all), (1, 1));
        assert_eq!(lb.get("p3").unwrap().assists_with.get("p1"), Some(&1));

        let p4 = lb.get("p4").unwrap();
        assert_eq!(p4.kills, 1);
        assert_eq!(p4.kills_against.get("p4"), None);
        assert_eq!(p4.kills_against_total(), 0);
        assert_eq!((p4.win, p4.all), (0, 1));
    }
}
