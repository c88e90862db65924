//! Conversion between UTC instants and ZIP timestamps.
//!
//! ZIP stores MS-DOS date-times with two-second resolution between 1980 and
//! 2107. Archive timestamps are written in UTC and clamped to that range.
//! Entries additionally carry the extended-timestamp extra field (whole-second
//! Unix mtime), which takes precedence when reading.

use chrono::{DateTime, Datelike, NaiveDate, Timelike, Utc};
use zip::ExtraField;

/// Header id of the extended-timestamp extra field.
pub(crate) const EXTENDED_TIMESTAMP_ID: u16 = 0x5455;

/// Flags byte announcing a modification time.
const EXTENDED_MTIME_FLAG: u8 = 0x01;

/// Convert an instant to the DOS value stored in the archive.
pub(crate) fn to_zip(instant: DateTime<Utc>) -> zip::DateTime {
    let first = dos_bound(1980, 1, 1, 0, 0, 0);
    let last = dos_bound(2107, 12, 31, 23, 59, 58);
    let instant = match (first, last) {
        (Some(first), Some(last)) => instant.clamp(first, last),
        _ => instant,
    };

    zip::DateTime::from_date_and_time(
        instant.year() as u16,
        instant.month() as u8,
        instant.day() as u8,
        instant.hour() as u8,
        instant.minute() as u8,
        instant.second() as u8,
    )
    .unwrap_or_default()
}

/// Convert a DOS timestamp back to an instant. Invalid stored values yield
/// `None`.
pub(crate) fn from_zip(stamp: zip::DateTime) -> Option<DateTime<Utc>> {
    NaiveDate::from_ymd_opt(
        i32::from(stamp.year()),
        u32::from(stamp.month()),
        u32::from(stamp.day()),
    )?
    .and_hms_opt(
        u32::from(stamp.hour()),
        u32::from(stamp.minute()),
        u32::from(stamp.second()),
    )
    .map(|naive| naive.and_utc())
}

/// Payload of the extended-timestamp field for `instant`, or `None` when the
/// instant does not fit the field's unsigned 32-bit seconds.
pub(crate) fn extended_field(instant: DateTime<Utc>) -> Option<Box<[u8]>> {
    let seconds = u32::try_from(instant.timestamp()).ok()?;
    let mut data = Vec::with_capacity(5);
    data.push(EXTENDED_MTIME_FLAG);
    data.extend_from_slice(&seconds.to_le_bytes());
    Some(data.into_boxed_slice())
}

/// Modification time from an entry's extended-timestamp field, if any.
pub(crate) fn from_extra_fields<'a>(
    fields: impl IntoIterator<Item = &'a ExtraField>,
) -> Option<DateTime<Utc>> {
    fields
        .into_iter()
        .find_map(|field| match field {
            ExtraField::ExtendedTimestamp(stamp) => stamp.mod_time(),
            _ => None,
        })
        .and_then(|seconds| DateTime::from_timestamp(i64::from(seconds), 0))
}

/// The instant as it reads back after a trip through the archive: whole
/// seconds when the extended field can hold it, DOS resolution otherwise.
pub(crate) fn truncate(instant: DateTime<Utc>) -> Option<DateTime<Utc>> {
    match extended_field(instant) {
        Some(_) => DateTime::from_timestamp(instant.timestamp(), 0),
        None => from_zip(to_zip(instant)),
    }
}

fn dos_bound(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> Option<DateTime<Utc>> {
    NaiveDate::from_ymd_opt(y, mo, d)?
        .and_hms_opt(h, mi, s)
        .map(|naive| naive.and_utc())
}
