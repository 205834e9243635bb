//! vlb-schemas
//!
//! Shared document and payload shapes for the match tracker.
//!
//! Three stored documents exist:
//! - [`UserState`]: the roster plus the reconciliation watermark (singleton).
//! - [`MatchRecord`]: one per match, the provider payload minus `rounds`
//!   (append-only, never rewritten).
//! - [`LeaderboardDocument`]: fully derived from the match corpus (singleton).
//!
//! Provider payloads are duck-typed JSON. They are parsed exactly once, at the
//! boundary, into [`MatchView`] with "missing or malformed means zero/empty"
//! defaulting so that aggregation never has to null-check.

mod leaderboard;
mod lenient;
mod payload;
mod roster;

pub use leaderboard::{headrate, LeaderboardDocument, PlayerStats};
pub use payload::{
    Assistant, KillEvent, MatchBatch, MatchMetadata, MatchPlayer, MatchPlayers, MatchRecord,
    MatchView, PlayerAssets, PlayerCard, PlayerMatchStats, RawMatch, TeamColor, TeamOutcome, Teams,
};
pub use roster::{Player, UserState};
