use std::collections::BTreeSet;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::error::{Error, Result};

/// Discrete time keywords for a CDS API request.
///
/// Each list holds the unique values, in range order, that occur between the
/// start and end of the requested range.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TimeRangeParams {
    pub time: Vec<String>,
    pub year: Vec<String>,
    pub month: Vec<String>,
    pub day: Vec<String>,
}

/// Expand `start..=end` at `freq` into CDS time keywords.
///
/// `freq` accepts pandas-style aliases with an optional multiplier:
/// `h`, `3h`, `D`, `30min`, `s`.
pub fn timerange_params(start: &str, end: &str, freq: &str) -> Result<TimeRangeParams> {
    let start = parse_datetime_like(start)?;
    let end = parse_datetime_like(end)?;
    let step = parse_frequency(freq)?;

    let mut time = Vec::new();
    let mut year = Vec::new();
    let mut month = Vec::new();
    let mut day = Vec::new();

    let mut cur = start;
    while cur <= end {
        time.push(cur.format("%H:%M").to_string());
        year.push(cur.format("%Y").to_string());
        month.push(cur.format("%m").to_string());
        day.push(cur.format("%d").to_string());
        cur = match cur.checked_add_signed(step) {
            Some(next) => next,
            None => break,
        };
    }

    Ok(TimeRangeParams {
        time: unique_preserve(time),
        year: unique_preserve(year),
        month: unique_preserve(month),
        day: unique_preserve(day),
    })
}

/// Accepts "YYYY-MM-DD", "YYYYMMDD", "YYYY-MM-DD HH:MM[:SS]" and the `T`
/// separated forms.
pub fn parse_datetime_like(s: &str) -> Result<NaiveDateTime> {
    let trimmed = s.trim();

    for fmt in [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Ok(dt);
        }
    }

    for fmt in ["%Y-%m-%d", "%Y%m%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(trimmed, fmt) {
            return Ok(d.and_time(chrono::NaiveTime::MIN));
        }
    }

    Err(Error::InvalidRequest(format!(
        "unsupported date format: {trimmed}"
    )))
}

/// Parse a pandas-style frequency alias into a step.
pub fn parse_frequency(freq: &str) -> Result<Duration> {
    let f = freq.trim();
    let split = f.find(|c: char| !c.is_ascii_digit()).unwrap_or(f.len());
    let (count, unit) = f.split_at(split);

    let count: i64 = if count.is_empty() {
        1
    } else {
        count
            .parse()
            .map_err(|_| Error::InvalidRequest(format!("invalid frequency: {freq}")))?
    };
    if count <= 0 {
        return Err(Error::InvalidRequest(format!(
            "frequency must be >0, got {freq}"
        )));
    }

    let step = match unit {
        "h" | "H" => Duration::try_hours(count),
        "D" | "d" => Duration::try_days(count),
        "min" | "T" => Duration::try_minutes(count),
        "s" | "S" => Duration::try_seconds(count),
        _ => {
            return Err(Error::InvalidRequest(format!(
                "unsupported frequency unit {unit:?} (use h, D, min or s)"
            )));
        }
    };
    step.ok_or_else(|| Error::InvalidRequest(format!("frequency out of range: {freq}")))
}

fn unique_preserve(xs: Vec<String>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut out = Vec::new();
    for x in xs {
        if seen.insert(x.clone()) {
            out.push(x);
        }
    }
    out
}
