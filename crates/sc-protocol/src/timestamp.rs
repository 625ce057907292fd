//! Timestamp normalization shared by every ingest path.
//!
//! Internally everything is unified on microseconds since the Unix epoch;
//! conversion happens only at the edges (decoding an inbound frame,
//! formatting an outbound ISO 8601 string).

use chrono::{DateTime, TimeZone, Utc};

/// Below this, a microsecond timestamp is almost certainly not a real wall
/// clock value (it corresponds to 2001-09-09) and is instead a relative,
/// process-uptime style value from a known upstream timestamp bug.
const MIN_PLAUSIBLE_EPOCH_MICROS: i64 = 1_000_000_000_000;

/// Numeric chat timestamps at or below this are treated as seconds rather
/// than milliseconds and are scaled up accordingly.
const MAX_PLAUSIBLE_EPOCH_MILLIS_AS_SECONDS: i64 = 1_000_000_000_000;

/// Normalize a raw microsecond timestamp, replacing implausible
/// (pre-2001, i.e. relative-from-startup) values with the current wall
/// clock.
#[must_use]
pub fn normalize_micros(raw_micros: i64, now: DateTime<Utc>) -> i64 {
    if raw_micros < MIN_PLAUSIBLE_EPOCH_MICROS {
        now.timestamp_micros()
    } else {
        raw_micros
    }
}

/// Normalize a numeric chat timestamp whose unit is ambiguous between
/// seconds and milliseconds: values at or below the plausible-milliseconds
/// floor are assumed to be seconds and scaled by 1000.
#[must_use]
pub fn normalize_chat_millis(raw: i64) -> i64 {
    if raw <= MAX_PLAUSIBLE_EPOCH_MILLIS_AS_SECONDS {
        raw.saturating_mul(1000)
    } else {
        raw
    }
}

/// Parse an ISO 8601 timestamp string into epoch microseconds, accepting a
/// trailing `Z` the way `chrono`'s RFC 3339 parser expects `+00:00` instead.
pub fn parse_iso8601_micros(s: &str) -> Option<i64> {
    let normalized = if let Some(stripped) = s.strip_suffix('Z') {
        format!("{stripped}+00:00")
    } else {
        s.to_string()
    };
    DateTime::parse_from_rfc3339(&normalized)
        .ok()
        .map(|dt| dt.with_timezone(&Utc).timestamp_micros())
}

/// Format epoch microseconds as an RFC 3339 string in the given timezone.
pub fn format_iso8601<Tz: TimeZone>(micros: i64, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let secs = micros.div_euclid(1_000_000);
    let nanos = micros.rem_euclid(1_000_000) * 1000;
    let utc = Utc.timestamp_opt(secs, nanos as u32).single().unwrap_or(Utc::now());
    utc.with_timezone(tz).to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_micros_passes_through_plausible_values() {
        let now = Utc::now();
        let plausible = 1_700_000_000_000_000_i64;
        assert_eq!(normalize_micros(plausible, now), plausible);
    }

    #[test]
    fn normalize_micros_replaces_relative_startup_values() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let bogus = 42_000_000_i64; // ~42 seconds of uptime, not a real epoch
        assert_eq!(normalize_micros(bogus, now), now.timestamp_micros());
    }

    #[test]
    fn normalize_chat_millis_scales_seconds_up() {
        assert_eq!(normalize_chat_millis(1_700_000_000), 1_700_000_000_000);
    }

    #[test]
    fn normalize_chat_millis_passes_through_millis() {
        assert_eq!(normalize_chat_millis(1_700_000_000_123), 1_700_000_000_123);
    }

    #[test]
    fn parse_iso8601_micros_handles_trailing_z() {
        let micros = parse_iso8601_micros("2026-01-01T00:00:00Z").unwrap();
        let expected = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap().timestamp_micros();
        assert_eq!(micros, expected);
    }
}
