//! Pure parsing helpers shared by the source clients.
//!
//! Upstream payloads are loosely typed: SteamSpy sends numbers as strings
//! (sometimes empty), the storefront writes release dates in whatever format
//! the publisher typed, and owner counts arrive as a human-readable range.
//! Everything here is total: bad input maps to a neutral value, never a panic.

use std::sync::LazyLock;

use chrono::{DateTime, Datelike, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use steamsync_core::OwnersRange;

static QUARTER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^q([1-4])\s*(\d{4})$").expect("valid regex"));
static YEAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4})$").expect("valid regex"));

/// Placeholder release texts the store shows for unreleased titles.
const UNRELEASED_MARKERS: [&str; 5] = ["coming soon", "tba", "tbd", "to be announced", "soon"];

/// `chrono` formats tried in order. `%B` also accepts the abbreviated month
/// name when parsing, so `"Mar 15, 2020"` and `"March 15, 2020"` share a format.
const DATE_FORMATS: [&str; 7] = [
    "%Y-%m-%d",
    "%B %d, %Y",
    "%B %d %Y",
    "%d %B, %Y",
    "%d %B %Y",
    "%Y/%m/%d",
    "%d.%m.%Y",
];

/// Parses an owner-count range such as `"10,000,000 .. 20,000,000"`.
///
/// A single bare number yields `{min: n, max: n}`; anything unparseable
/// yields `{min: 0, max: 0}`.
#[must_use]
pub fn parse_owners(raw: &str) -> OwnersRange {
    let parse_bound = |s: &str| -> Option<i64> {
        let digits: String = s.trim().chars().filter(|c| *c != ',').collect();
        if digits.is_empty() {
            return None;
        }
        digits.parse::<i64>().ok()
    };

    if let Some((low, high)) = raw.split_once("..") {
        return match (parse_bound(low), parse_bound(high)) {
            (Some(min), Some(max)) => OwnersRange { min, max },
            _ => OwnersRange::default(),
        };
    }

    parse_bound(raw).map_or_else(OwnersRange::default, |n| OwnersRange { min: n, max: n })
}

/// Parses free-text release dates into a calendar date.
///
/// Accepts ISO dates, `"March 15, 2020"`, `"15 March 2020"`, `"15 Mar, 2020"`,
/// RFC 3339 / RFC 2822 timestamps, `"Q3 2021"` (first day of the quarter) and a
/// bare `"2021"` (January 1). Placeholders like `"Coming soon"` and anything
/// unrecognised return `None`.
#[must_use]
pub fn parse_release_date(raw: &str) -> Option<NaiveDate> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }
    let lower = text.to_lowercase();
    if UNRELEASED_MARKERS.contains(&lower.as_str()) {
        return None;
    }

    if let Some(caps) = QUARTER_RE.captures(text) {
        let quarter: u32 = caps[1].parse().ok()?;
        let year: i32 = caps[2].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, (quarter - 1) * 3 + 1, 1);
    }

    if let Some(caps) = YEAR_RE.captures(text) {
        let year: i32 = caps[1].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, 1, 1);
    }

    if let Some(date) = DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
    {
        return Some(date);
    }

    DateTime::parse_from_rfc3339(text)
        .or_else(|_| DateTime::parse_from_rfc2822(text))
        .ok()
        .map(|dt| dt.date_naive())
}

/// First day of the month containing `date`.
#[must_use]
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Reads an integer out of a JSON value that may be a number, a numeric
/// string, an empty string or `null`.
#[must_use]
pub fn value_as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(truncate_f64)),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                trimmed
                    .parse::<i64>()
                    .ok()
                    .or_else(|| trimmed.parse::<f64>().ok().filter(|f| f.is_finite()).map(truncate_f64))
            }
        }
        _ => None,
    }
}

/// Parses a price in cents. SteamSpy sends `"999"`, the storefront sends
/// `999`; both mean $9.99. Negative or out-of-range values are rejected.
#[must_use]
pub fn parse_price_cents(value: &Value) -> Option<i32> {
    value_as_i64(value)
        .filter(|cents| *cents >= 0)
        .and_then(|cents| i32::try_from(cents).ok())
}

/// `deserialize_with` helper: lenient `i32` defaulting to zero.
///
/// # Errors
///
/// Only fails if the input is not valid JSON at all.
pub fn lenient_i32<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(value_as_i64)
        .and_then(|n| i32::try_from(n).ok())
        .unwrap_or(0))
}

/// `deserialize_with` helper: lenient optional price in cents.
///
/// # Errors
///
/// Only fails if the input is not valid JSON at all.
pub fn lenient_price_cents<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(parse_price_cents))
}

/// `deserialize_with` helper: string that may be `null`, a number or blank.
/// Blank strings become `None`.
///
/// # Errors
///
/// Only fails if the input is not valid JSON at all.
pub fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_owned())
        }
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

#[allow(clippy::cast_possible_truncation)]
fn truncate_f64(f: f64) -> i64 {
    f.trunc() as i64
}

#[cfg(test)]
#[path = "parse_test.rs"]
mod tests;
