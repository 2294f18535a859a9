//! Conversions between the due date representations
//!
//! Due dates come as RFC 3339 timestamps from the course service, and are stored as `06/01/2025 @ 11:59PM` strings in checklist items. \
//! Internally, they are [`DueDate`]s: local times, truncated to the minute so that a display string round-trips losslessly.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};
use once_cell::sync::Lazy;

use crate::error::{Error, Result};

/// A due date, in the local time zone, with zero seconds
pub type DueDate = DateTime<Local>;

/// The pattern used to display due dates (e.g. `06/01/2025 @ 11:59PM`)
pub const DISPLAY_FORMAT: &str = "%m/%d/%Y @ %I:%M%p";

/// What stands for an absent due date in checklist items
pub const NO_DUE_DATE: &str = "no due date";

static MAX_SENTINEL: Lazy<DueDate> = Lazy::new(|| {
    let last_minute = NaiveDate::from_ymd_opt(9999, 12, 31)
        .and_then(|day| day.and_hms_opt(23, 59, 0))
        .unwrap(/* this cannot panic since this is a valid constant date */);
    Utc.from_utc_datetime(&last_minute).with_timezone(&Local)
});

/// Parse a due date sent by the course service.
///
/// An absent due date is not an error. A present one must be a valid RFC 3339 timestamp (usually in UTC, e.g. `2025-06-01T23:59:00Z`).
/// During the repeated hour at the end of daylight saving time, both instants map to the earliest one, like [`parse_display`] does
pub fn parse_source_timestamp(text: Option<&str>) -> Result<Option<DueDate>> {
    let text = match text {
        None => return Ok(None),
        Some(text) => text,
    };

    let parsed = DateTime::parse_from_rfc3339(text)
        .map_err(|err| Error::malformed_due_date(text, err))?;
    let truncated = parsed
        .with_second(0)
        .and_then(|dt| dt.with_nanosecond(0))
        .ok_or_else(|| Error::malformed_due_date(text, "unable to truncate it to the minute"))?;

    // A local time that occurs twice must resolve the way it is read back from a checklist
    let local = truncated.with_timezone(&Local);
    let canonical = Local
        .from_local_datetime(&local.naive_local())
        .earliest()
        .unwrap_or(local);
    Ok(Some(canonical))
}

/// Format a due date the way it is shown in checklist items, or [`NO_DUE_DATE`] when there is none
pub fn format_display(due_date: Option<&DueDate>) -> String {
    match due_date {
        None => NO_DUE_DATE.to_string(),
        Some(date) => date.format(DISPLAY_FORMAT).to_string(),
    }
}

/// The inverse of [`format_display`].
///
/// Only canonical strings (the exact output of [`format_display`]) are accepted, so that `format_display(parse_display(s)) == s` always holds.
pub fn parse_display(text: &str) -> Result<Option<DueDate>> {
    if text == NO_DUE_DATE {
        return Ok(None);
    }

    let naive = NaiveDateTime::parse_from_str(text, DISPLAY_FORMAT)
        .map_err(|err| Error::parse(text, err))?;
    let date = Local
        .from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| Error::parse(text, "this local time does not exist"))?;

    if date.format(DISPLAY_FORMAT).to_string() != text {
        return Err(Error::parse(text, format!("due date is not in the canonical {:?} form", DISPLAY_FORMAT)));
    }
    Ok(Some(date))
}

/// A timestamp later than any real due date.
///
/// This is only meant to be used as a sort key, so that tasks without a due date are sorted last
pub fn max_sentinel() -> DueDate {
    *MAX_SENTINEL
}
