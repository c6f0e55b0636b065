#![forbid(unsafe_code)]

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;

/// Wall-clock UTC instant with fixed millisecond precision. The constant
/// width keeps stored timestamps lexicographically ordered.
pub(crate) fn now_iso_ms() -> String {
    format_iso_ms(OffsetDateTime::now_utc())
}

pub(crate) fn format_iso_ms(instant: OffsetDateTime) -> String {
    let fmt = format_description!(
        "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z"
    );
    instant
        .to_offset(time::UtcOffset::UTC)
        .format(&fmt)
        .unwrap_or_else(|_| "1970-01-01T00:00:00.000Z".to_string())
}

pub(crate) fn now_utc() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}

pub(crate) fn duration_ms(start: OffsetDateTime, end: OffsetDateTime) -> i64 {
    let ms = (end - start).whole_milliseconds();
    ms.clamp(0, i64::MAX as i128) as i64
}

pub(crate) fn compact_date(instant: OffsetDateTime) -> String {
    let fmt = format_description!("[year][month][day]");
    instant
        .to_offset(time::UtcOffset::UTC)
        .format(&fmt)
        .unwrap_or_else(|_| "19700101".to_string())
}

pub(crate) fn today_ymd() -> String {
    let fmt = format_description!("[year]-[month]-[day]");
    OffsetDateTime::now_utc()
        .format(&fmt)
        .unwrap_or_else(|_| "1970-01-01".to_string())
}

/// Parses a source-provided `date_posted`: an RFC 3339 instant or a bare
/// `YYYY-MM-DD` date (midnight UTC). Returns the canonical millisecond
/// format, or `None` when the value is unusable.
pub(crate) fn parse_captured_at(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(instant) = OffsetDateTime::parse(trimmed, &Rfc3339) {
        return Some(format_iso_ms(instant));
    }
    let date_fmt = format_description!("[year]-[month]-[day]");
    if let Ok(date) = time::Date::parse(trimmed, &date_fmt) {
        return Some(format_iso_ms(date.midnight().assume_utc()));
    }
    None
}

/// The `YYYY-MM-DD` day of a canonical timestamp, if the prefix looks like
/// one.
pub(crate) fn date_part(iso: &str) -> Option<&str> {
    let prefix = iso.get(..10)?;
    let bytes = prefix.as_bytes();
    let shape_ok = bytes
        .iter()
        .enumerate()
        .all(|(i, b)| if i == 4 || i == 7 { *b == b'-' } else { b.is_ascii_digit() });
    shape_ok.then_some(prefix)
}
