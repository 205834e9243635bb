//! Watermark monotonicity guard.
//!
//! # Invariants
//!
//! - When the old watermark is in the eligible list, the head is newer by
//!   the source's ordering and the watermark advances.
//! - When it is not (window rotated, or the list was reordered upstream),
//!   the start times decide: the watermark advances only if the new head
//!   did not start before the match it replaces.
//! - Missing start times cannot prove regression; the watermark advances.
//! - Pure, no IO: the caller reads the stored record for the old watermark.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum WatermarkAdvance {
    Advance,
    /// Unseen matches are still persisted; only the watermark stays put.
    Hold {
        watermark_start: i64,
        head_start: i64,
    },
}

impl WatermarkAdvance {
    pub fn is_advance(&self) -> bool {
        matches!(self, WatermarkAdvance::Advance)
    }
}

pub fn decide_advance(
    watermark_found: bool,
    watermark_start: Option<i64>,
    head_start: Option<i64>,
) -> WatermarkAdvance {
    if watermark_found {
        return WatermarkAdvance::Advance;
    }
    match (watermark_start, head_start) {
        (Some(w), Some(h)) if h < w => WatermarkAdvance::Hold {
            watermark_start: w,
            head_start: h,
        },
        _ => WatermarkAdvance::Advance,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn found_watermark_always_advances() {
        assert!(decide_advance(true, Some(200), Some(100)).is_advance());
    }

    #[test]
    fn older_head_holds() {
        assert_eq!(
            decide_advance(false, Some(200), Some(100)),
            WatermarkAdvance::Hold {
                watermark_start: 200,
                head_start: 100
            }
        );
    }

    #[test]
    fn equal_or_newer_head_advances() {
        assert!(decide_advance(false, Some(200), Some(200)).is_advance());
        assert!(decide_advance(false, Some(200), Some(300)).is_advance());
    }

    #[test]
    fn unknown_times_advance() {
        assert!(decide_advance(false, None, Some(1)).is_advance());
        assert!(decide_advance(false, Some(1), None).is_advance());
    }
}
