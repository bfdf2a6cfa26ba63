//! Creation dates of works.
//!
//! Dates may be partially unknown: `20??-03-??` is a valid creation date.
//! The first `????` becomes `0000`, every other `?` becomes `1`, then the
//! result is parsed as an ISO 8601 date (or a prefix of one).

use chrono::{NaiveDate, NaiveDateTime};

/// Parse a possibly-partial creation date.
///
/// Accepted shapes after `?` substitution: `YYYY`, `YYYY-MM`, `YYYY-MM-DD`
/// and `YYYY-MM-DDTHH:MM:SS` (time part ignored).
pub fn parse_creation_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim().replacen("????", "0000", 1).replace('?', "1");

    if let Ok(date) = NaiveDate::parse_from_str(&text, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(datetime) = NaiveDateTime::parse_from_str(&text, "%Y-%m-%dT%H:%M:%S") {
        return Some(datetime.date());
    }

    let mut parts = text.splitn(2, '-');
    let year: i32 = parts.next().filter(|y| y.len() == 4)?.parse().ok()?;
    let month: u32 = match parts.next() {
        Some(m) if m.len() == 2 => m.parse().ok()?,
        Some(_) => return None,
        None => 1,
    };
    NaiveDate::from_ymd_opt(year, month, 1)
}
