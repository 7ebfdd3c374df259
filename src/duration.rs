//! Lesson length normalization to `HH:MM:SS`.
//!
//! Accepted inputs, tried in this order on the trimmed string (one pair of
//! enclosing parentheses is removed first):
//! 1. unit tokens at the start, e.g. `1h 2m 3s`, `12 min` (case-insensitive);
//! 2. colon form `M:SS`, `MM:SS` or `H:MM:SS`;
//! 3. every digit in the string concatenated and read as seconds.
//!
//! Token parsing wins whenever it matches, even if the rest of the string is
//! colon shaped.

use once_cell::sync::Lazy;
use regex::Regex;

pub const ZERO: &str = "00:00:00";

static TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:(\d+)\s*h)?\s*(?:(\d+)\s*m)?\s*(?:(\d+)\s*s)?").unwrap()
});
static MINUTES_SECONDS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d{1,2}):(\d{2})$").unwrap());
static HOURS_MINUTES_SECONDS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+):(\d{2}):(\d{2})$").unwrap());

pub fn format_hms(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

/// Numeric seconds: floored, negatives and NaN clamp to zero.
pub fn from_seconds(seconds: f64) -> String {
    if seconds.is_nan() || seconds <= 0.0 {
        return ZERO.to_string();
    }
    // `as` saturates at u64::MAX for out-of-range floats.
    format_hms(seconds.floor() as u64)
}

pub fn normalize(raw: &str) -> String {
    match to_seconds(raw) {
        Some(total) => format_hms(total),
        None => ZERO.to_string(),
    }
}

/// Total seconds, or `None` when the input carries no digits at all.
pub fn to_seconds(raw: &str) -> Option<u64> {
    let trimmed = raw.trim();
    let s = trimmed
        .strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
        .map(str::trim)
        .unwrap_or(trimmed);

    if let Some(caps) = TOKEN_RE.captures(s) {
        let part = |i: usize| caps.get(i).map(|m| parse_digits(m.as_str()));
        let (h, m, sec) = (part(1), part(2), part(3));
        if h.is_some() || m.is_some() || sec.is_some() {
            return Some(hms(h.unwrap_or(0), m.unwrap_or(0), sec.unwrap_or(0)));
        }
    }

    if let Some(caps) = HOURS_MINUTES_SECONDS_RE.captures(s) {
        return Some(hms(
            parse_digits(&caps[1]),
            parse_digits(&caps[2]),
            parse_digits(&caps[3]),
        ));
    }
    if let Some(caps) = MINUTES_SECONDS_RE.captures(s) {
        return Some(hms(0, parse_digits(&caps[1]), parse_digits(&caps[2])));
    }

    let digits: String = s.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        None
    } else {
        Some(parse_digits(&digits))
    }
}

fn parse_digits(digits: &str) -> u64 {
    digits.parse().unwrap_or(u64::MAX)
}

fn hms(hours: u64, minutes: u64, seconds: u64) -> u64 {
    hours
        .saturating_mul(3600)
        .saturating_add(minutes.saturating_mul(60))
        .saturating_add(seconds)
}
