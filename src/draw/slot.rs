//! Fixed-width time buckets

use serde::{Deserialize, Serialize};

const DRAW_ID_PREFIX: &str = "draw_";

/// Start of the bucket containing `now_ms`
pub fn current_slot(now_ms: u64, interval_ms: u64) -> u64 {
    (now_ms / interval_ms) * interval_ms
}

/// Start of the bucket after the one containing `now_ms`.
///
/// On an exact boundary this is one full interval away, not `now_ms` itself.
pub fn next_slot(now_ms: u64, interval_ms: u64) -> u64 {
    current_slot(now_ms, interval_ms) + interval_ms
}

pub fn draw_id(slot_ms: u64) -> String {
    format!("{}{}", DRAW_ID_PREFIX, slot_ms)
}

/// Inverse of [`draw_id`]
pub fn parse_draw_id(id: &str) -> Option<u64> {
    id.strip_prefix(DRAW_ID_PREFIX)?.parse().ok()
}

/// Snapshot of where `now` falls in a slot schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawSlot {
    pub interval_ms: u64,
    pub current_slot_ms: u64,
    pub next_slot_ms: u64,
    pub ms_until_next: u64,
}

impl DrawSlot {
    pub fn at(now_ms: u64, interval_ms: u64) -> Self {
        let current_slot_ms = current_slot(now_ms, interval_ms);
        let next_slot_ms = current_slot_ms + interval_ms;
        Self {
            interval_ms,
            current_slot_ms,
            next_slot_ms,
            ms_until_next: next_slot_ms - now_ms,
        }
    }

    pub fn current_draw_id(&self) -> String {
        draw_id(self.current_slot_ms)
    }

    pub fn next_draw_id(&self) -> String {
        draw_id(self.next_slot_ms)
    }

    /// Whether `slot_ms` lies on this schedule's grid
    pub fn is_aligned(&self, slot_ms: u64) -> bool {
        slot_ms % self.interval_ms == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    const FIFTEEN_MIN: u64 = 15 * 60 * 1000;

    fn ms(h: u32, m: u32, s: u32) -> u64 {
        Utc.with_ymd_and_hms(2024, 5, 1, h, m, s)
            .unwrap()
            .timestamp_millis() as u64
    }

    #[test]
    fn test_slot_boundaries_mid_bucket() {
        let now = ms(12, 7, 0);
        assert_eq!(current_slot(now, FIFTEEN_MIN), ms(12, 0, 0));
        assert_eq!(next_slot(now, FIFTEEN_MIN), ms(12, 15, 0));
    }

    #[test]
    fn test_exact_boundary_starts_new_bucket() {
        let now = ms(12, 15, 0);
        assert_eq!(current_slot(now, FIFTEEN_MIN), now);
        assert_eq!(next_slot(now, FIFTEEN_MIN), ms(12, 30, 0));
    }

    #[test]
    fn test_draw_slot_snapshot() {
        let slot = DrawSlot::at(ms(12, 7, 30), FIFTEEN_MIN);
        assert_eq!(slot.ms_until_next, 7 * 60 * 1000 + 30 * 1000);
        assert_eq!(slot.current_draw_id(), draw_id(ms(12, 0, 0)));
        assert!(slot.is_aligned(ms(13, 45, 0)));
        assert!(!slot.is_aligned(ms(13, 46, 0)));
    }

    #[test]
    fn test_draw_id_round_trip() {
        let id = draw_id(1_714_564_800_000);
        assert_eq!(id, "draw_1714564800000");
        assert_eq!(parse_draw_id(&id), Some(1_714_564_800_000));
        assert_eq!(parse_draw_id("battle_1"), None);
        assert_eq!(parse_draw_id("draw_abc"), None);
    }
}
