//! Time and timestamp helpers.

use chrono::{DateTime, NaiveDate, Utc};

/// UTC timestamp used for `lastTriggeredAt`, log entries, event times, etc.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Parse a stored due date.
///
/// Records keep dates either as a plain `YYYY-MM-DD` calendar date or as a
/// full RFC 3339 timestamp; only the calendar day matters for reminders.
#[must_use]
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc).date_naive())
}

/// Whole calendar days from `now` until `date` (negative when in the past).
#[must_use]
pub fn days_until(date: NaiveDate, now: Timestamp) -> i64 {
    (date - now.date_naive()).num_days()
}
