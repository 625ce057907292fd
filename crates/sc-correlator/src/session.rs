//! Session id derivation: `stream_YYYY_MM_DD` in a configured timezone,
//! stable across same-day window resets.

use chrono::{DateTime, Datelike, TimeZone, Utc};

#[must_use]
pub fn session_id_for<Tz: TimeZone>(now: DateTime<Utc>, tz: &Tz) -> String {
    let local = now.with_timezone(tz);
    format!("stream_{:04}_{:02}_{:02}", local.year(), local.month(), local.day())
}

/// `true` when `session_id`'s date suffix still matches the day `now` falls
/// on in `tz` — used by window reset to decide whether to keep the session
/// id or regenerate it.
#[must_use]
pub fn session_id_still_current<Tz: TimeZone>(session_id: &str, now: DateTime<Utc>, tz: &Tz) -> bool {
    session_id == session_id_for(now, tz)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::America::Los_Angeles;

    #[test]
    fn session_id_round_trips_for_valid_dates() {
        let now = Utc.with_ymd_and_hms(2026, 3, 5, 12, 0, 0).unwrap();
        assert_eq!(session_id_for(now, &Los_Angeles), "stream_2026_03_05");
    }

    #[test]
    fn session_id_uses_configured_timezone_not_utc() {
        // 02:30 UTC on Jan 2 is still Jan 1 evening in Los Angeles (UTC-8).
        let now = Utc.with_ymd_and_hms(2026, 1, 2, 2, 30, 0).unwrap();
        assert_eq!(session_id_for(now, &Los_Angeles), "stream_2026_01_01");
    }

    #[test]
    fn session_id_still_current_detects_day_rollover() {
        let earlier = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
        let session = session_id_for(earlier, &Los_Angeles);
        let next_day = Utc.with_ymd_and_hms(2026, 1, 2, 12, 0, 0).unwrap();
        assert!(!session_id_still_current(&session, next_day, &Los_Angeles));
        assert!(session_id_still_current(&session, earlier, &Los_Angeles));
    }
}
