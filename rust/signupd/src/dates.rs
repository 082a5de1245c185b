use anyhow::{anyhow, bail};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};

/// Parses a bootstrap date (`start_date`, `default_date`, ...).
///
/// A bare `YYYY-MM-DD` is a calendar date and is taken as-is, never as a UTC
/// instant. Date-times carrying an offset are moved to local time before the
/// date is taken; date-times without one are already local.
pub fn parse_config_date(raw: &str) -> anyhow::Result<NaiveDate> {
    let t = raw.trim();
    if t.is_empty() {
        bail!("date must not be empty");
    }
    if let Ok(d) = NaiveDate::parse_from_str(t, "%Y-%m-%d") {
        return Ok(d);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(t) {
        return Ok(dt.with_timezone(&Local).date_naive());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(t, fmt) {
            return Ok(dt.date());
        }
    }
    Err(anyhow!("unrecognized date: {}", t))
}

/// `YYYY-MM-DD`, the value of a date `<input>`.
pub fn format_ymd(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Parses the text of a date input back into a date. Any time-of-day suffix
/// is dropped.
pub fn parse_ymd_input(value: &str) -> anyhow::Result<NaiveDate> {
    let t = value.trim();
    let day_part = t.split_once('T').map(|(d, _)| d).unwrap_or(t);

    let mut parts = day_part.splitn(3, '-');
    let (Some(y), Some(m), Some(d)) = (parts.next(), parts.next(), parts.next()) else {
        bail!("date must be YYYY-MM-DD");
    };
    let year = y
        .trim()
        .parse::<i32>()
        .map_err(|_| anyhow!("year must be numeric"))?;
    let month = m
        .trim()
        .parse::<u32>()
        .map_err(|_| anyhow!("month must be numeric"))?;
    let day = d
        .trim()
        .parse::<u32>()
        .map_err(|_| anyhow!("day must be numeric"))?;

    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| anyhow!("{}-{}-{} is not a calendar date", year, month, day))
}

/// Long US-English form used above the signups table, e.g.
/// `Monday, January 15, 2024`.
pub fn readable_date(date: NaiveDate) -> String {
    date.format("%A, %B %-d, %Y").to_string()
}
