use chrono::{DateTime, Utc};

/// Length of one rate limit window: 20 minutes.
///
/// Also used as the counter TTL, set once when a counter is created. The
/// guard against indefinite growth is window rotation, not TTL renewal.
pub const WINDOW_SECONDS: i64 = 20 * 60;

/// Derives the window stamp for a point in time.
///
/// Truncates `now` to the preceding multiple of [`WINDOW_SECONDS`] (floor,
/// never rounding) and formats the window start as zero-padded "HHMM" in UTC.
/// Pure function; total for any representable timestamp.
#[must_use]
pub fn window_stamp(now: DateTime<Utc>) -> String {
    let epoch = now.timestamp();
    let window_start = epoch - epoch.rem_euclid(WINDOW_SECONDS);

    DateTime::<Utc>::from_timestamp(window_start, 0)
        .map(|start| start.format("%H%M").to_string())
        .unwrap_or_else(|| "0000".to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(epoch: i64) -> DateTime<Utc> {
        DateTime::<Utc>::UNIX_EPOCH + chrono::TimeDelta::seconds(epoch)
    }

    #[test]
    fn timestamps_in_the_same_bucket_share_a_stamp() {
        // 10:00:00 UTC and 10:19:59 UTC fall in the same window.
        let base = 10 * 3600;
        assert_eq!(window_stamp(at(base)), "1000");
        assert_eq!(window_stamp(at(base + WINDOW_SECONDS - 1)), "1000");
    }

    #[test]
    fn one_second_past_a_boundary_starts_a_new_window() {
        let base = 10 * 3600;
        assert_eq!(window_stamp(at(base + WINDOW_SECONDS)), "1020");
        assert_eq!(window_stamp(at(base + WINDOW_SECONDS + 1)), "1020");
        assert_eq!(window_stamp(at(base + WINDOW_SECONDS - 1)), "1000");
    }

    #[test]
    fn consecutive_windows_have_distinct_stamps() {
        let base = 14 * 3600 + 40 * 60;
        assert_ne!(window_stamp(at(base)), window_stamp(at(base + WINDOW_SECONDS)));
    }

    #[test]
    fn stamps_wrap_cleanly_across_midnight() {
        let last_window = 86_400 - WINDOW_SECONDS;
        assert_eq!(window_stamp(at(last_window)), "2340");
        assert_eq!(window_stamp(at(86_400 - 1)), "2340");
        assert_eq!(window_stamp(at(86_400)), "0000");
    }

    #[test]
    fn stamp_format_repeats_daily_by_design() {
        // HHMM carries no date component; the 20-minute counter TTL is what
        // prevents cross-day key collisions in practice.
        let ten_am = 10 * 3600;
        assert_eq!(window_stamp(at(ten_am)), window_stamp(at(ten_am + 86_400)));
    }
}
