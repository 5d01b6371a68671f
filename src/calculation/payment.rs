use chrono::{DateTime, NaiveDate, TimeDelta, TimeZone, Utc};

use crate::error::RoyaltyError;

/// Days allowed for payment when the caller does not choose a due date.
pub const DEFAULT_PAYMENT_TERMS_DAYS: i64 = 14;

/// `from` plus `days` whole days.
pub fn default_payment_due_date(
    from: DateTime<Utc>,
    days: i64,
) -> Result<DateTime<Utc>, RoyaltyError> {
    TimeDelta::try_days(days)
        .and_then(|delta| from.checked_add_signed(delta))
        .ok_or_else(|| {
            RoyaltyError::InvalidInput(format!("payment terms of {days} days are out of range"))
        })
}

/// Parse a caller-chosen due date.
///
/// Accepts a calendar date (`2024-07-01`, taken as midnight UTC) or a full
/// RFC 3339 timestamp.
pub fn parse_due_date(s: &str) -> Result<DateTime<Utc>, RoyaltyError> {
    let s = s.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&midnight));
        }
    }
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| {
            RoyaltyError::ParseError(format!(
                "Invalid due date '{s}'. Use YYYY-MM-DD or an RFC 3339 timestamp"
            ))
        })
}
