use std::collections::BTreeSet;

use vlb_schemas::{LeaderboardDocument, MatchRecord, UserState};
use vlb_stats::aggregate;

/// Everything one run works on, owned by the supervisor and handed to each
/// step explicitly.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconciliationContext {
    pub roster: UserState,
    /// Version of the roster document as read at the start of the run;
    /// `None` when it did not exist.
    pub roster_version: Option<String>,
    /// The stored corpus, loaded right before aggregation.
    pub matches: Vec<MatchRecord>,
    pub leaderboard: Option<LeaderboardDocument>,
}

impl ReconciliationContext {
    pub fn new(roster: UserState, roster_version: Option<String>) -> Self {
        Self {
            roster,
            roster_version,
            ..Default::default()
        }
    }

    pub fn roster_puuids(&self) -> BTreeSet<String> {
        self.roster.puuids()
    }

    /// Recompute the leaderboard from `matches` and the current roster,
    /// discarding whatever was there before.
    pub fn aggregate(&mut self, excluded_match_ids: &BTreeSet<String>) -> &LeaderboardDocument {
        let doc = aggregate(&self.matches, &self.roster.players, excluded_match_ids);
        self.leaderboard.insert(doc)
    }
}
