//! `submitted_at` is kept as `YYYY-MM-DD HH:MM:SS.nnnnnnnnn` text. Legacy rows carry whole
//! seconds only and still sort correctly against new ones, since the fraction is fixed-width.
//! Rows imported from the legacy database may carry the all-zero date.

use chrono::{DateTime, NaiveDateTime, Utc};

pub const STORAGE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.9f";

const ZERO_DATE: &str = "0000-00-00 00:00:00";

/// The value unreadable timestamps decode to.
pub fn zero_timestamp() -> DateTime<Utc> {
    DateTime::<Utc>::default()
}

pub fn is_zero(ts: &DateTime<Utc>) -> bool {
    *ts == zero_timestamp()
}

pub fn encode(ts: &DateTime<Utc>) -> String {
    ts.format(STORAGE_FORMAT).to_string()
}

/// Never fails: the zero-date sentinel and malformed text both yield [`zero_timestamp`].
pub fn decode(raw: &str) -> DateTime<Utc> {
    let raw = raw.trim();
    if raw == ZERO_DATE {
        return zero_timestamp();
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f") {
        return naive.and_utc();
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| zero_timestamp())
}
