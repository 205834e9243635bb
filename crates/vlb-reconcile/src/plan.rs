//! Watermark planner.
//!
//! # State machine
//!
//! `START -> FETCHED -> FILTERED -> {NO_ELIGIBLE | UP_TO_DATE | STALE}`
//!
//! - `NO_ELIGIBLE`: nothing eligible; terminal, no writes.
//! - `UP_TO_DATE`: newest eligible id equals the watermark. Every eligible
//!   match is still existence-checked (backfill scan).
//! - `STALE`: the newest-first run of eligible matches up to, excluding, the
//!   watermark is unseen. When the watermark is not in the list at all the
//!   whole list is unseen.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;
use vlb_schemas::RawMatch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunState {
    NoEligible,
    UpToDate,
    Stale,
}

impl RunState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunState::NoEligible => "NO_ELIGIBLE",
            RunState::UpToDate => "UP_TO_DATE",
            RunState::Stale => "STALE",
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What one run must do. Ids are newest first and unique.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcilePlan {
    NoEligible,
    UpToDate {
        head: String,
        /// Every eligible id; missing records are backfilled.
        backfill_scan: Vec<String>,
    },
    Stale {
        head: String,
        previous: Option<String>,
        /// Ids to persist before the watermark moves.
        unseen: Vec<String>,
        /// `false` when the previous watermark was absent from the list
        /// (first run, or the source's window rotated past it).
        watermark_found: bool,
    },
}

impl ReconcilePlan {
    pub fn state(&self) -> RunState {
        match self {
            ReconcilePlan::NoEligible => RunState::NoEligible,
            ReconcilePlan::UpToDate { .. } => RunState::UpToDate,
            ReconcilePlan::Stale { .. } => RunState::Stale,
        }
    }

    pub fn head(&self) -> Option<&str> {
        match self {
            ReconcilePlan::NoEligible => None,
            ReconcilePlan::UpToDate { head, .. } | ReconcilePlan::Stale { head, .. } => {
                Some(head.as_str())
            }
        }
    }

    /// Ids whose records must exist (or be created) in this run.
    pub fn ids_to_persist(&self) -> &[String] {
        match self {
            ReconcilePlan::NoEligible => &[],
            ReconcilePlan::UpToDate { backfill_scan, .. } => backfill_scan,
            ReconcilePlan::Stale { unseen, .. } => unseen,
        }
    }
}

/// Classify the eligible list (newest first) against the stored watermark.
pub fn plan_run(eligible: &[RawMatch], watermark: Option<&str>) -> ReconcilePlan {
    let mut seen = BTreeSet::new();
    let ids: Vec<String> = eligible
        .iter()
        .filter_map(RawMatch::match_id)
        .filter(|id| seen.insert(id.to_string()))
        .map(str::to_string)
        .collect();

    let Some(head) = ids.first().cloned() else {
        return ReconcilePlan::NoEligible;
    };

    if watermark == Some(head.as_str()) {
        return ReconcilePlan::UpToDate {
            head,
            backfill_scan: ids,
        };
    }

    let cut = watermark.and_then(|w| ids.iter().position(|id| id == w));
    let unseen = match cut {
        Some(pos) => ids[..pos].to_vec(),
        None => ids.clone(),
    };
    ReconcilePlan::Stale {
        head,
        previous: watermark.map(str::to_string),
        unseen,
        watermark_found: cut.is_some(),
    }
}
