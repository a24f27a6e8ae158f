//! Date parsing for Info and XMP values
//!
//! Info dictionaries use the PDF date format `D:YYYYMMDDHHmmSSOHH'mm'`
//! (ISO 32000-1 Section 7.9.4) where every field after the year is optional.
//! XMP packets use ISO 8601 dates of varying precision.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

/// Parse a PDF date string, ignoring the time zone
pub fn parse_pdf_date(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    let digits = value.strip_prefix("D:").unwrap_or(value);
    let digits: String = digits.chars().take_while(char::is_ascii_digit).collect();
    if digits.len() < 4 {
        return None;
    }

    let field = |start: usize, len: usize, default: u32| -> Option<u32> {
        match digits.get(start..start + len) {
            Some(part) => part.parse().ok(),
            None => Some(default),
        }
    };

    let year: i32 = digits[..4].parse().ok()?;
    let date = NaiveDate::from_ymd_opt(year, field(4, 2, 1)?, field(6, 2, 1)?)?;
    let time = NaiveTime::from_hms_opt(field(8, 2, 0)?, field(10, 2, 0)?, field(12, 2, 0)?)?;
    Some(date.and_time(time))
}

/// Parse an XMP date such as `2019`, `2019-05`, `2019-05-04` or
/// `2019-05-04T10:20:30+02:00`
pub fn parse_xmp_date(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();

    if let Ok(date_time) = DateTime::parse_from_rfc3339(value) {
        return Some(date_time.naive_local());
    }
    if let Ok(date_time) = DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%z") {
        return Some(date_time.naive_local());
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(date_time) = NaiveDateTime::parse_from_str(value, format) {
            return Some(date_time);
        }
    }
    // Dates with a zone but no seconds, or other partial forms
    let date_part = value.split('T').next().unwrap_or(value);
    if let Ok(date) = NaiveDate::parse_from_str(date_part, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }

    let mut parts = date_part.splitn(3, '-');
    let year = parts.next()?.parse::<i32>().ok()?;
    if !(1..=9999).contains(&year) || date_part.len() < 4 {
        return None;
    }
    let month = match parts.next() {
        Some(month) => month.parse().ok()?,
        None => 1,
    };
    NaiveDate::from_ymd_opt(year, month, 1)?.and_hms_opt(0, 0, 0)
}

/// Year of a date in either format
pub fn year_of(value: &str) -> Option<i32> {
    use chrono::Datelike;

    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    let parsed = if value.starts_with("D:") {
        parse_pdf_date(value)
    } else {
        parse_xmp_date(value).or_else(|| parse_pdf_date(value))
    };
    parsed.map(|date_time| date_time.year())
}
