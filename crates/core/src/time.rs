//! Timestamp encoding shared by storage and the sync protocol.
//!
//! Persisted timestamps are fixed-width UTC text so that SQL string comparison
//! orders them the same way as the instants they encode. That only holds for
//! years 0 through 9999, so writes outside that range are rejected.

use chrono::{DateTime, Datelike, NaiveDateTime, Utc};

use crate::error::{DomainError, DomainResult};

/// Storage format: microsecond precision, always six fractional digits.
pub const STORAGE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

/// Format the remote service uses for `created_at` on sync records.
pub const REMOTE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.fZ";

/// Sentinel cursor meaning "nothing has been synced yet".
pub const MIN_TIMESTAMP: DateTime<Utc> = DateTime::<Utc>::MIN_UTC;

/// Last year whose encoding sorts correctly; later years gain a `+` prefix.
pub const MAX_STORABLE_YEAR: i32 = 9999;

const LAST_STORABLE: &str = "9999-12-31T23:59:59.999999Z";

/// Encode an instant for storage. Fails outside years 0..=9999.
pub fn encode(ts: DateTime<Utc>) -> DomainResult<String> {
    if !(0..=MAX_STORABLE_YEAR).contains(&ts.year()) {
        return Err(DomainError::invalid_timestamp(format!(
            "{ts} is outside the storable years 0..={MAX_STORABLE_YEAR}"
        )));
    }
    Ok(ts.format(STORAGE_FORMAT).to_string())
}

/// Encode the lower bound of a `created_at > bound` comparison.
///
/// Instants before year 0, [`MIN_TIMESTAMP`] included, keep their leading `-`
/// and sort before every stored value. Instants after year 9999 clamp to the
/// last storable microsecond, so they match nothing.
pub fn encode_bound(ts: DateTime<Utc>) -> String {
    if ts.year() > MAX_STORABLE_YEAR {
        return LAST_STORABLE.to_string();
    }
    ts.format(STORAGE_FORMAT).to_string()
}

/// Decode a stored instant.
pub fn decode(raw: &str) -> DomainResult<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw, STORAGE_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| DomainError::invalid_timestamp(format!("{raw:?}: {e}")))
}

/// Parse a `created_at` value returned by the remote service.
///
/// Accepts `2020-05-01T12:30:00.123Z` and, failing that, any RFC 3339 value.
pub fn parse_remote(raw: &str) -> DomainResult<DateTime<Utc>> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, REMOTE_FORMAT) {
        return Ok(naive.and_utc());
    }

    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DomainError::invalid_timestamp(format!("{raw:?}: {e}")))
}

/// Convert a Unix epoch (seconds) day-start instant supplied by the host.
pub fn from_unix_seconds(secs: i64) -> DomainResult<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(secs, 0)
        .ok_or_else(|| DomainError::invalid_timestamp(format!("unix time {secs} out of range")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn storage_encoding_is_fixed_width_and_reversible() {
        let whole = Utc.with_ymd_and_hms(2021, 3, 4, 5, 6, 7).unwrap();
        let encoded = encode(whole).unwrap();
        assert_eq!(encoded, "2021-03-04T05:06:07.000000Z");
        assert_eq!(decode(&encoded).unwrap(), whole);

        let later = whole + chrono::Duration::microseconds(5);
        assert!(encode(later).unwrap() > encoded);
    }

    #[test]
    fn sentinel_sorts_before_any_real_instant() {
        let epoch = Utc.timestamp_opt(0, 0).unwrap();
        let year_zero = Utc.with_ymd_and_hms(0, 1, 1, 0, 0, 0).unwrap();
        assert!(encode_bound(MIN_TIMESTAMP) < encode(year_zero).unwrap());
        assert!(encode_bound(MIN_TIMESTAMP) < encode(epoch).unwrap());
    }

    #[test]
    fn instants_past_year_9999_are_not_storable() {
        let recent = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let last = Utc.with_ymd_and_hms(9999, 12, 31, 23, 59, 59).unwrap()
            + chrono::Duration::microseconds(999_999);
        let far = Utc.with_ymd_and_hms(10000, 1, 1, 0, 0, 0).unwrap();
        let before_zero = Utc.with_ymd_and_hms(-1, 12, 31, 0, 0, 0).unwrap();

        assert!(matches!(encode(far), Err(DomainError::InvalidTimestamp(_))));
        assert!(encode(before_zero).is_err());
        assert!(encode(last).unwrap() > encode(recent).unwrap());

        assert_eq!(encode_bound(far), encode(last).unwrap());
        assert!(encode_bound(far) > encode(recent).unwrap());
        assert_eq!(encode_bound(recent), encode(recent).unwrap());
    }

    #[test]
    fn remote_timestamps_parse_with_millis_and_rfc3339() {
        let parsed = parse_remote("2020-05-01T12:30:00.123Z").unwrap();
        assert_eq!(parsed.timestamp_subsec_millis(), 123);

        let rfc = parse_remote("2020-05-01T14:30:00+02:00").unwrap();
        assert_eq!(rfc, Utc.with_ymd_and_hms(2020, 5, 1, 12, 30, 0).unwrap());

        assert!(parse_remote("yesterday").is_err());
    }

    #[test]
    fn unix_day_start_converts() {
        let ts = from_unix_seconds(86_400).unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(1970, 1, 2, 0, 0, 0).unwrap());
        assert!(from_unix_seconds(i64::MAX).is_err());
    }
}
