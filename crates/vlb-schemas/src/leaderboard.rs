use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::lenient::null_as_default;

/// Headshot percentage with one decimal: `round(hs / total * 1000) / 10`.
/// Zero when no shots were recorded.
pub fn headrate(headshots: u64, bodyshots: u64, legshots: u64) -> f64 {
    let total = headshots + bodyshots + legshots;
    if total == 0 {
        return 0.0;
    }
    (headshots as f64 / total as f64 * 1000.0).round() / 10.0
}

/// Aggregate statistics for one roster player.
///
/// Maps are `BTreeMap` so serialized output is byte-stable across runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub puuid: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub kills: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub deaths: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub assists: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub headshots: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub bodyshots: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub legshots: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub headrate: f64,
    /// Decisive matches won.
    #[serde(default, deserialize_with = "null_as_default")]
    pub win: u64,
    /// Decisive matches played.
    #[serde(default, deserialize_with = "null_as_default")]
    pub all: u64,
    /// victim puuid -> kills on that victim (roster victims only).
    #[serde(
        rename = "killsAgainst",
        default,
        deserialize_with = "null_as_default"
    )]
    pub kills_against: BTreeMap<String, u64>,
    /// killer puuid -> kills this player assisted (roster killers only).
    #[serde(
        rename = "assistsWith",
        default,
        deserialize_with = "null_as_default"
    )]
    pub assists_with: BTreeMap<String, u64>,
}

impl PlayerStats {
    /// All counters at zero, with a zero entry in both sub-maps for every
    /// other roster member.
    pub fn zeroed<'a>(puuid: &str, roster: impl IntoIterator<Item = &'a str>) -> Self {
        let mut s = Self {
            puuid: puuid.to_string(),
            ..Default::default()
        };
        for other in roster {
            if other != puuid {
                s.kills_against.insert(other.to_string(), 0);
                s.assists_with.insert(other.to_string(), 0);
            }
        }
        s
    }

    pub fn total_shots(&self) -> u64 {
        self.headshots + self.bodyshots + self.legshots
    }

    pub fn kills_against_total(&self) -> u64 {
        self.kills_against.values().sum()
    }

    /// Kills per death; the raw kill count when there are no deaths.
    pub fn kd(&self) -> f64 {
        if self.deaths == 0 {
            self.kills as f64
        } else {
            self.kills as f64 / self.deaths as f64
        }
    }

    /// Win percentage over decisive matches, `None` before the first one.
    pub fn win_rate(&self) -> Option<f64> {
        if self.all == 0 {
            None
        } else {
            Some(self.win as f64 / self.all as f64 * 100.0)
        }
    }
}

/// The derived leaderboard document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardDocument {
    #[serde(default, deserialize_with = "null_as_default")]
    pub players: Vec<PlayerStats>,
}

impl LeaderboardDocument {
    pub fn get(&self, puuid: &str) -> Option<&PlayerStats> {
        self.players.iter().find(|p| p.puuid == puuid)
    }
}
