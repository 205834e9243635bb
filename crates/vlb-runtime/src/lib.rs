//! vlb-runtime
//!
//! The consistency supervisor: one externally invocable run that fetches,
//! filters, persists, advances the watermark and rebuilds the leaderboard,
//! in an order that leaves the three stored documents recoverable after a
//! failure at any step.
//!
//! # Write ordering
//!
//! 1. MatchRecord creates (existence-checked, append-only).
//! 2. UserState (watermark + roster display fields), only once every match
//!    write of the run has succeeded or found the record already present.
//! 3. LeaderboardDocument, recomputed from the full stored corpus.
//!
//! Every write to an existing path carries the version from the read just
//! before it. Conflicts abort the run; re-running converges.

mod context;
mod corpus;
mod error;
mod retry;
mod supervisor;

pub use context::ReconciliationContext;
pub use corpus::{load_corpus, CorpusLoad};
pub use error::{FailedWrite, RunError};
pub use retry::{with_retry, Transient};
pub use supervisor::{RunOutcome, StoreStatus, Supervisor};
