//! vlb-stats
//!
//! Statistics aggregation over the stored match corpus.
//!
//! The leaderboard is a derived document: every run starts from zero and
//! recomputes from every stored match. Nothing is carried over from the
//! previous leaderboard, so a re-run after a partial failure can never
//! double-count.
//!
//! Pure logic. No IO.

mod aggregate;
mod health;
mod summary;
mod teams;
mod verify;

pub use aggregate::aggregate;
pub use health::{assess_leaderboard, LeaderboardHealth};
pub use summary::{MatchSummary, SummaryPlayer};
pub use teams::{recommend_teams, TeamRecommendation};
pub use verify::{verify_leaderboard, Violation};
