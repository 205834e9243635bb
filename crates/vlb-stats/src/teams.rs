use std::cmp::Ordering;

use serde::Serialize;
use vlb_schemas::{LeaderboardDocument, Player};

/// A balanced split of the roster.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamRecommendation {
    pub red: Vec<String>,
    pub blue: Vec<String>,
    /// Mean K/D per side, two decimals.
    pub red_mean_kd: f64,
    pub blue_mean_kd: f64,
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Sort roster players by K/D (descending, puuid breaks ties) and deal them
/// alternately into red and blue. Players without a leaderboard entry have K/D 0.
pub fn recommend_teams(leaderboard: &LeaderboardDocument, roster: &[Player]) -> TeamRecommendation {
    let mut ranked: Vec<(&str, f64)> = roster
        .iter()
        .map(|p| {
            let kd = leaderboard.get(&p.puuid).map(|s| s.kd()).unwrap_or(0.0);
            (p.puuid.as_str(), kd)
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.0.cmp(b.0))
    });
    ranked.dedup_by(|a, b| a.0 == b.0);

    let mut red = Vec::new();
    let mut blue = Vec::new();
    let mut red_kd = Vec::new();
    let mut blue_kd = Vec::new();
    for (i, (puuid, kd)) in ranked.into_iter().enumerate() {
        if i % 2 == 0 {
            red.push(puuid.to_string());
            red_kd.push(kd);
        } else {
            blue.push(puuid.to_string());
            blue_kd.push(kd);
        }
    }

    TeamRecommendation {
        red,
        blue,
        red_mean_kd: round2(mean(&red_kd)),
        blue_mean_kd: round2(mean(&blue_kd)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vlb_schemas::PlayerStats;

    fn stats(puuid: &str, kills: u64, deaths: u64) -> PlayerStats {
        PlayerStats {
            puuid: puuid.into(),
            kills,
            deaths,
            ..Default::default()
        }
    }

    #[test]
    fn deals_alternately_by_kd() {
        let lb = LeaderboardDocument {
            players: vec![stats("a", 10, 10), stats("b", 30, 10), stats("c", 20, 10), stats("d", 5, 10)],
        };
        let roster: Vec<Player> = ["a", "b", "c", "d"].iter().map(|p| Player::new(*p)).collect();
        let rec = recommend_teams(&lb, &roster);
        assert_eq!(rec.red, vec!["b".to_string(), "a".to_string()]);
        assert_eq!(rec.blue, vec!["c".to_string(), "d".to_string()]);
        assert_eq!(rec.red_mean_kd, 2.0);
        assert_eq!(rec.blue_mean_kd, 1.25);
    }

    #[test]
    fn zero_deaths_uses_kills_and_ties_break_by_puuid() {
        let lb = LeaderboardDocument {
            players: vec![stats("z", 2, 0), stats("y", 4, 2)],
        };
        let roster = vec![Player::new("z"), Player::new("y"), Player::new("new")];
        let rec = recommend_teams(&lb, &roster);
        // z: 2.0, y: 2.0 -> y first by puuid; new: 0.0
        assert_eq!(rec.red, vec!["y".to_string(), "new".to_string()]);
        assert_eq!(rec.blue, vec!["z".to_string()]);
        assert_eq!(rec.red_mean_kd, 1.0);
    }

    #[test]
    fn empty_roster_gives_empty_sides() {
        let rec = recommend_teams(&LeaderboardDocument::default(), &[]);
        assert!(rec.red.is_empty());
        assert_eq!(rec.blue_mean_kd, 0.0);
    }
}
