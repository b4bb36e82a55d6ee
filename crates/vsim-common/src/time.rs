//! ---
//! vsim_section: "01-core-functionality"
//! vsim_subsection: "module"
//! vsim_type: "source"
//! vsim_scope: "code"
//! vsim_description: "Shared primitives and utilities for the simulation runtime."
//! vsim_version: "v0.0.0-prealpha"
//! vsim_owner: "tbd"
//! ---
use std::time::Duration;

use chrono::{DateTime, Utc};

/// Current wall-clock time in epoch milliseconds.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Timestamp for the `index`-th event of a batch captured at `base_ms`.
///
/// Offsetting by one millisecond per event keeps timestamps unique within a batch.
pub fn batch_timestamp(base_ms: i64, index: usize) -> i64 {
    base_ms.saturating_add(i64::try_from(index).unwrap_or(i64::MAX))
}

/// Convert a duration into whole milliseconds, saturating at `u64::MAX`.
pub fn duration_to_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Number of additional passes after the immediate one: `floor(trigger / period - 1)`.
///
/// Returns zero when the trigger interval does not exceed the period.
pub fn additional_passes(period: Duration, trigger_interval: Duration) -> u64 {
    let period_ms = duration_to_millis(period);
    if period_ms == 0 {
        return 0;
    }
    (duration_to_millis(trigger_interval) / period_ms).saturating_sub(1)
}

/// Render epoch milliseconds as RFC 3339 for log output.
pub fn millis_to_rfc3339(ms: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp_millis(ms).map(|dt| dt.to_rfc3339())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_timestamps_are_offset_by_index() {
        assert_eq!(batch_timestamp(1_000, 0), 1_000);
        assert_eq!(batch_timestamp(1_000, 42), 1_042);
    }

    #[test]
    fn additional_passes_follow_floor_rule() {
        let ms = Duration::from_millis;
        assert_eq!(additional_passes(ms(30_000), ms(60_000)), 1);
        assert_eq!(additional_passes(ms(10_000), ms(60_000)), 5);
        assert_eq!(additional_passes(ms(25_000), ms(60_000)), 1);
        assert_eq!(additional_passes(ms(60_000), ms(60_000)), 0);
        assert_eq!(additional_passes(ms(90_000), ms(60_000)), 0);
        assert_eq!(additional_passes(ms(0), ms(60_000)), 0);
    }

    #[test]
    fn rfc3339_rendering() {
        assert_eq!(
            millis_to_rfc3339(0).as_deref(),
            Some("1970-01-01T00:00:00+00:00")
        );
    }
}
