//! Time and date parsing utilities.

use crate::error::{DocketError, Result};
use chrono::{DateTime, Duration, Local, NaiveDate, NaiveTime, TimeZone, Utc};

/// Parse a flexible time specification into a `DateTime<Utc>`.
///
/// Supports:
/// - RFC3339: `2026-01-15T12:00:00Z`, `2026-01-15T12:00:00+00:00`
/// - Simple date: `2026-01-15` (defaults to 9:00 AM local time)
/// - Relative duration: `+1h`, `+2d`, `+1w`, `+30m`
/// - Keywords: `tomorrow`, `next-week`
///
/// # Errors
///
/// Returns an error if:
/// - The time format is invalid or unrecognized
/// - A relative duration has an invalid unit (only m, h, d, w supported)
/// - The local time is ambiguous (e.g., during DST transitions)
pub fn parse_flexible_timestamp(s: &str, field_name: &str) -> Result<DateTime<Utc>> {
    let s = s.trim();

    // Try RFC3339 first
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    // Try simple date (YYYY-MM-DD) - default to 9:00 AM local time
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return local_morning(date, field_name);
    }

    // Try relative duration (+1h, +2d, +1w, +30m)
    if let Some(rest) = s.strip_prefix('+') {
        if let Some(unit_char) = rest.chars().last() {
            let amount_str = &rest[..rest.len() - 1];
            if let Ok(amount) = amount_str.parse::<i64>() {
                let duration = match unit_char {
                    'm' => Duration::minutes(amount),
                    'h' => Duration::hours(amount),
                    'd' => Duration::days(amount),
                    'w' => Duration::weeks(amount),
                    _ => {
                        return Err(DocketError::validation(
                            field_name,
                            "invalid unit (use m, h, d, w)",
                        ));
                    }
                };
                return Ok(Utc::now() + duration);
            }
        }
    }

    // Try keywords
    let today = Local::now().date_naive();
    match s.to_lowercase().as_str() {
        "tomorrow" => local_morning(today + Duration::days(1), field_name),
        "next-week" | "nextweek" => local_morning(today + Duration::weeks(1), field_name),
        _ => Err(DocketError::validation(
            field_name,
            "invalid time format (try: +1h, +2d, tomorrow, next-week, or 2026-01-15)",
        )),
    }
}

fn local_morning(date: NaiveDate, field_name: &str) -> Result<DateTime<Utc>> {
    let time = NaiveTime::from_hms_opt(9, 0, 0)
        .ok_or_else(|| DocketError::validation(field_name, "invalid time"))?;
    let naive_dt = date.and_time(time);
    let local_dt = Local
        .from_local_datetime(&naive_dt)
        .single()
        .ok_or_else(|| DocketError::validation(field_name, "ambiguous local time"))?;
    Ok(local_dt.with_timezone(&Utc))
}

/// Parse an RFC 3339 timestamp leniently, falling back to `now` on failure.
///
/// Used for timestamps inside embedded `remote_state` snapshots, which are
/// advisory and may have been hand-edited.
#[must_use]
pub fn parse_lenient_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s.trim()).map_or_else(
        |_| {
            tracing::warn!("unparseable timestamp '{s}', falling back to now");
            Utc::now()
        },
        |dt| dt.with_timezone(&Utc),
    )
}
