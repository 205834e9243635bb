//! vlb-reconcile
//!
//! Incremental ingestion decisions for the match tracker.
//!
//! - Match filter: which fetched matches count at all.
//! - Planner: compares the newest eligible match with the stored watermark
//!   and decides `NO_ELIGIBLE`, `UP_TO_DATE` (backfill scan) or `STALE`
//!   (persist the unseen run).
//! - Watermark guard: never move the watermark backwards in time.
//! - Roster sync: refresh display fields from the newest eligible match.
//!
//! Deterministic, pure logic. No IO. The caller performs every read and
//! write and owns the ordering between them.

mod filter;
mod plan;
mod roster_sync;
mod watermark;

pub use filter::{classify_batch, Classified, EligibilityPolicy, IgnoredMatch, Ineligibility};
pub use plan::{plan_run, ReconcilePlan, RunState};
pub use roster_sync::{sync_roster, RosterRefresh};
pub use watermark::{decide_advance, WatermarkAdvance};
