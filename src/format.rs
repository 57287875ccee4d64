//! Display formatting shared by the reel views.

use chrono::{DateTime, FixedOffset, NaiveDateTime};

/// Shown when a timestamp is missing or cannot be parsed
pub const NOT_AVAILABLE: &str = "N/A";

/// Shown in place of an absent corrugation-out time: the usage is still open
pub const ACTIVE: &str = "Active";

/// Format a backend timestamp as a long date with a short time,
/// e.g. `March 5, 2024 at 2:30 PM`, in the given display offset.
///
/// Accepts RFC 3339 strings as well as naive `YYYY-MM-DDTHH:MM:SS[.fff]`
/// values, which are taken to be UTC.
pub fn long_date_time(raw: Option<&str>, offset: &FixedOffset) -> String {
    match raw.and_then(parse_timestamp) {
        Some(ts) => ts
            .with_timezone(offset)
            .format("%B %-d, %Y at %-I:%M %p")
            .to_string(),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// Like [`long_date_time`] but an absent value means the usage is still active
pub fn date_out(raw: Option<&str>, offset: &FixedOffset) -> String {
    match raw {
        None => ACTIVE.to_string(),
        Some(s) if s.trim().is_empty() => ACTIVE.to_string(),
        Some(s) => long_date_time(Some(s), offset),
    }
}

/// Two decimal places with an explicit zero fallback
pub fn weight(value: Option<f64>) -> String {
    format!("{:.2}", value.unwrap_or(0.0))
}

/// Round to two decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Parse a `+HH:MM` / `-HH:MM` offset string; `Z` and `UTC` mean zero
pub fn parse_offset(raw: &str) -> Option<FixedOffset> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("z") || raw.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0);
    }
    raw.parse().ok()
}

fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts);
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc().fixed_offset())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[test]
    fn formats_long_date_and_short_time() {
        assert_eq!(
            long_date_time(Some("2024-03-05T14:30:00.000Z"), &utc()),
            "March 5, 2024 at 2:30 PM"
        );
    }

    #[test]
    fn applies_display_offset() {
        let ist = parse_offset("+05:30").unwrap();
        assert_eq!(
            long_date_time(Some("2024-03-05T20:00:00Z"), &ist),
            "March 6, 2024 at 1:30 AM"
        );
    }

    #[test]
    fn naive_timestamps_are_utc() {
        assert_eq!(
            long_date_time(Some("2024-12-31 08:05:00"), &utc()),
            "December 31, 2024 at 8:05 AM"
        );
    }

    #[test]
    fn missing_and_active_are_distinct() {
        assert_eq!(long_date_time(None, &utc()), NOT_AVAILABLE);
        assert_eq!(long_date_time(Some("garbage"), &utc()), NOT_AVAILABLE);
        assert_eq!(date_out(None, &utc()), ACTIVE);
        assert_eq!(date_out(Some("garbage"), &utc()), NOT_AVAILABLE);
    }

    #[test]
    fn weights_have_two_decimals() {
        assert_eq!(weight(Some(12.5)), "12.50");
        assert_eq!(weight(None), "0.00");
        assert_eq!(round2(200.499999), 200.5);
    }

    #[test]
    fn offsets() {
        assert_eq!(parse_offset("-03:00").unwrap().local_minus_utc(), -3 * 3600);
        assert_eq!(parse_offset("UTC").unwrap().local_minus_utc(), 0);
        assert!(parse_offset("+25:00").is_none());
        assert!(parse_offset("").is_none());
    }
}
