use std::sync::LazyLock;

use biopulse_common::DatePattern;
use chrono::NaiveDate;
use regex::Regex;

// ---------------------------------------------------------------------------
// Date grammars
// ---------------------------------------------------------------------------
//
// Every grammar requires an explicit year, month and day. Partial dates
// ("January 29") and relative wording ("latest", "recent") never resolve.

static ISO_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^0-9])(\d{4})-(\d{2})-(\d{2})(?:[^0-9]|$)").unwrap()
});

static PATH_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/(\d{4})/(\d{1,2})/(\d{1,2})(?:[/?#]|$)").unwrap());

static MONTH_DAY_YEAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b([a-z]{3,9})\.?\s+(\d{1,2})(?:st|nd|rd|th)?,?\s+(\d{4})\b").unwrap()
});

static DAY_MONTH_YEAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{1,2})(?:st|nd|rd|th)?\s+([a-z]{3,9})\.?,?\s+(\d{4})\b").unwrap()
});

static COMPACT_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|[^0-9])(\d{8})(?:[^0-9]|$)").unwrap());

/// Resolve raw date evidence to a calendar date. Grammars are tried in
/// order of trustworthiness; the first that yields a real date wins.
pub fn parse_date_evidence(evidence: &str) -> Option<(NaiveDate, DatePattern)> {
    if let Some(date) = parse_iso(evidence) {
        return Some((date, DatePattern::Iso));
    }
    if let Some(date) = parse_path(evidence) {
        return Some((date, DatePattern::UrlPath));
    }
    if let Some(date) = parse_month_name(evidence) {
        return Some((date, DatePattern::MonthName));
    }
    if let Some(date) = parse_compact(evidence) {
        return Some((date, DatePattern::Compact));
    }
    None
}

fn parse_iso(text: &str) -> Option<NaiveDate> {
    ISO_DATE
        .captures_iter(text)
        .find_map(|caps| build_date(&caps[1], &caps[2], &caps[3]))
}

fn parse_path(text: &str) -> Option<NaiveDate> {
    PATH_DATE
        .captures_iter(text)
        .find_map(|caps| build_date(&caps[1], &caps[2], &caps[3]))
}

fn parse_month_name(text: &str) -> Option<NaiveDate> {
    for caps in MONTH_DAY_YEAR.captures_iter(text) {
        if let Some(month) = month_number(&caps[1]) {
            if let Some(date) = ymd(&caps[3], month, &caps[2]) {
                return Some(date);
            }
        }
    }
    for caps in DAY_MONTH_YEAR.captures_iter(text) {
        if let Some(month) = month_number(&caps[2]) {
            if let Some(date) = ymd(&caps[3], month, &caps[1]) {
                return Some(date);
            }
        }
    }
    None
}

fn parse_compact(text: &str) -> Option<NaiveDate> {
    COMPACT_DATE.captures_iter(text).find_map(|caps| {
        let digits = &caps[1];
        let year: i32 = digits[0..4].parse().ok()?;
        // 8-digit runs are only trusted as dates inside a plausible year
        // range, otherwise order numbers and phone fragments would resolve.
        if !(2000..=2099).contains(&year) {
            return None;
        }
        let month: u32 = digits[4..6].parse().ok()?;
        let day: u32 = digits[6..8].parse().ok()?;
        NaiveDate::from_ymd_opt(year, month, day)
    })
}

fn build_date(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    let month: u32 = month.parse().ok()?;
    ymd(year, month, day)
}

fn ymd(year: &str, month: u32, day: &str) -> Option<NaiveDate> {
    let year: i32 = year.parse().ok()?;
    let day: u32 = day.parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn month_number(name: &str) -> Option<u32> {
    let prefix = name.get(0..3)?.to_lowercase();
    let month = match prefix.as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    // Guard against arbitrary words sharing a month prefix ("mayor").
    let full = [
        "january",
        "february",
        "march",
        "april",
        "may",
        "june",
        "july",
        "august",
        "september",
        "october",
        "november",
        "december",
    ][month - 1];
    let lower = name.to_lowercase();
    if full.starts_with(&lower) || lower == prefix {
        Some(month as u32)
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// Evidence capture
// ---------------------------------------------------------------------------

/// Collect date-looking substrings from a URL and snippet, verbatim and
/// unparsed. Dated path segments are kept whole so evidence like
/// `press-release-20250129.pdf` survives intact.
pub fn capture_date_evidence(url: &str, snippet: &str) -> String {
    let mut found: Vec<String> = Vec::new();

    let path = url.split("://").nth(1).unwrap_or(url);
    if let Some(m) = PATH_DATE.find(path) {
        found.push(m.as_str().to_string());
    }
    for segment in path.split(['/', '?', '#']) {
        if segment_has_date(segment) {
            found.push(segment.to_string());
        }
    }

    if let Some(caps) = ISO_DATE
        .captures_iter(snippet)
        .find(|caps| build_date(&caps[1], &caps[2], &caps[3]).is_some())
    {
        found.push(format!("{}-{}-{}", &caps[1], &caps[2], &caps[3]));
    }
    for re in [&MONTH_DAY_YEAR, &DAY_MONTH_YEAR] {
        if let Some(m) = re
            .find_iter(snippet)
            .find(|m| parse_month_name(m.as_str()).is_some())
        {
            found.push(m.as_str().to_string());
        }
    }

    found.dedup();
    found.join(" ")
}

fn segment_has_date(segment: &str) -> bool {
    parse_iso(segment).is_some() || parse_compact(segment).is_some()
}
