use std::collections::BTreeSet;

use serde::Serialize;
use vlb_schemas::LeaderboardDocument;

/// State of the stored leaderboard when no match was written this run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LeaderboardHealth {
    Healthy,
    Missing,
    Unparsable { error: String },
    Empty,
    /// Roster players with no stats and no kill matrix although matches exist.
    Uninitialized { puuids: Vec<String> },
    /// Leaderboard players differ from the roster.
    RosterMismatch {
        missing: Vec<String>,
        extra: Vec<String>,
    },
}

impl LeaderboardHealth {
    pub fn needs_rebuild(&self) -> bool {
        !matches!(self, LeaderboardHealth::Healthy)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LeaderboardHealth::Healthy => "healthy",
            LeaderboardHealth::Missing => "missing",
            LeaderboardHealth::Unparsable { .. } => "unparsable",
            LeaderboardHealth::Empty => "empty",
            LeaderboardHealth::Uninitialized { .. } => "uninitialized",
            LeaderboardHealth::RosterMismatch { .. } => "roster_mismatch",
        }
    }
}

/// Classify the stored leaderboard body (`None` when the document is absent).
pub fn assess_leaderboard(
    content: Option<&str>,
    roster: &BTreeSet<String>,
    corpus_nonempty: bool,
) -> LeaderboardHealth {
    let Some(content) = content else {
        return LeaderboardHealth::Missing;
    };
    if content.trim().is_empty() {
        return LeaderboardHealth::Empty;
    }
    let doc: LeaderboardDocument = match serde_json::from_str(content) {
        Ok(doc) => doc,
        Err(e) => {
            return LeaderboardHealth::Unparsable {
                error: e.to_string(),
            }
        }
    };
    if doc.players.is_empty() {
        return if roster.is_empty() {
            LeaderboardHealth::Healthy
        } else {
            LeaderboardHealth::Empty
        };
    }

    let stored: BTreeSet<String> = doc.players.iter().map(|p| p.puuid.clone()).collect();
    if &stored != roster {
        return LeaderboardHealth::RosterMismatch {
            missing: roster.difference(&stored).cloned().collect(),
            extra: stored.difference(roster).cloned().collect(),
        };
    }

    if corpus_nonempty && roster.len() > 1 {
        let puuids: Vec<String> = doc
            .players
            .iter()
            .filter(|p| p.kills == 0 && p.deaths == 0 && p.kills_against.is_empty())
            .map(|p| p.puuid.clone())
            .collect();
        if !puuids.is_empty() {
            return LeaderboardHealth::Uninitialized { puuids };
        }
    }

    LeaderboardHealth::Healthy
}
