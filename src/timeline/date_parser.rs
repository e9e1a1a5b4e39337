//! Free-form date strings to fractional years.
//!
//! A fractional year is `year + position_in_year`, where Jan 1 00:00 UTC is
//! `.0`. Formats are tried in priority order; the first one that matches wins:
//! - `YYYY-MM-DD` - exact day of year
//! - `Month YYYY` - middle of the month
//! - `YYYY` - start of the year, exactly
//! - other calendar dates (`July 20, 1969`, `1969/07/20`, RFC 3339, ...)
//! - any standalone four-digit number ("1450s" included), as a start-of-year anchor

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Timelike};

const MONTH_NAMES: [&str; 12] = [
    "january", "february", "march", "april", "may", "june",
    "july", "august", "september", "october", "november", "december",
];

/// Shortest month-name prefix accepted in `Month YYYY` dates.
const MIN_MONTH_PREFIX: usize = 3;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Result of parsing a date string.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParsedDate {
    Parsed(f64),
    Unparseable,
}

impl ParsedDate {
    /// The fractional year, if the string was understood.
    pub fn fractional_year(self) -> Option<f64> {
        match self {
            ParsedDate::Parsed(year) => Some(year),
            ParsedDate::Unparseable => None,
        }
    }

    #[cfg(test)]
    pub fn is_parsed(self) -> bool {
        matches!(self, ParsedDate::Parsed(_))
    }
}

/// A single recognised date format.
struct DateFormat {
    name: &'static str,
    parse: fn(&str) -> Option<f64>,
}

/// Recognised formats, highest priority first.
const FORMATS: &[DateFormat] = &[
    DateFormat { name: "iso date", parse: parse_iso_date },
    DateFormat { name: "month year", parse: parse_month_year },
    DateFormat { name: "bare year", parse: parse_bare_year },
    DateFormat { name: "calendar date", parse: parse_calendar_date },
    DateFormat { name: "embedded year", parse: parse_embedded_year },
];

/// Parse a date string into a fractional year.
pub fn parse(date_str: &str) -> ParsedDate {
    let trimmed = date_str.trim();
    if trimmed.is_empty() {
        return ParsedDate::Unparseable;
    }

    for format in FORMATS {
        if let Some(year) = (format.parse)(trimmed) {
            tracing::trace!(date = trimmed, format = format.name, year, "parsed date");
            return ParsedDate::Parsed(year);
        }
    }

    tracing::debug!("Could not parse date: {:?}", date_str);
    ParsedDate::Unparseable
}

/// Convenience wrapper returning `None` on failure.
pub fn parse_fractional_year(date_str: &str) -> Option<f64> {
    parse(date_str).fractional_year()
}

/// Gregorian leap year rule.
pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

pub fn days_in_year(year: i32) -> u32 {
    if is_leap_year(year) {
        366
    } else {
        365
    }
}

/// Fractional year for a calendar date at midnight UTC.
pub fn date_to_fractional_year(date: NaiveDate) -> f64 {
    let year = date.year();
    year as f64 + date.ordinal0() as f64 / days_in_year(year) as f64
}

fn datetime_to_fractional_year(datetime: NaiveDateTime) -> f64 {
    let year = datetime.year();
    let elapsed_days = datetime.ordinal0() as f64
        + datetime.num_seconds_from_midnight() as f64 / SECONDS_PER_DAY;
    year as f64 + elapsed_days / days_in_year(year) as f64
}

fn is_four_digits(s: &str) -> bool {
    s.len() == 4 && s.bytes().all(|b| b.is_ascii_digit())
}

/// Month index (0-based) for a full name or an unambiguous prefix.
pub fn month_index(name: &str) -> Option<usize> {
    let name = name.to_lowercase();
    if let Some(idx) = MONTH_NAMES.iter().position(|m| *m == name) {
        return Some(idx);
    }
    if name.chars().count() < MIN_MONTH_PREFIX {
        return None;
    }

    let mut matches = MONTH_NAMES
        .iter()
        .enumerate()
        .filter(|(_, m)| m.starts_with(&name));
    match (matches.next(), matches.next()) {
        (Some((idx, _)), None) => Some(idx),
        _ => None,
    }
}

fn parse_iso_date(s: &str) -> Option<f64> {
    let bytes = s.as_bytes();
    if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
        return None;
    }
    let (year, month, day) = (&s[0..4], &s[5..7], &s[8..10]);
    if !is_four_digits(year)
        || !month.bytes().all(|b| b.is_ascii_digit())
        || !day.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }

    let date = NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)?;
    Some(date_to_fractional_year(date))
}

fn parse_month_year(s: &str) -> Option<f64> {
    let tokens: Vec<&str> = s.split_whitespace().collect();

    for (i, pair) in tokens.windows(2).enumerate() {
        // "20 July 1969" carries a day; leave it to the calendar parser
        let after_day_number = i > 0 && tokens[i - 1].starts_with(|c: char| c.is_ascii_digit());
        if after_day_number {
            continue;
        }

        let word = pair[0].trim_end_matches('.');
        let word_start = word
            .char_indices()
            .rev()
            .take_while(|(_, c)| c.is_alphabetic())
            .last()
            .map(|(i, _)| i);
        let Some(word_start) = word_start else {
            continue;
        };

        let digits: String = pair[1].chars().take_while(|c| c.is_ascii_digit()).collect();
        if digits.len() != 4 {
            continue;
        }

        if let Some(month) = month_index(&word[word_start..]) {
            let year: i32 = digits.parse().ok()?;
            return Some(year as f64 + (month as f64 + 0.5) / 12.0);
        }
    }
    None
}

fn parse_bare_year(s: &str) -> Option<f64> {
    if !is_four_digits(s) {
        return None;
    }
    s.parse::<i32>().ok().map(f64::from)
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMATS: &[&str] = &[
    "%B %d, %Y",
    "%B %d %Y",
    "%b %d, %Y",
    "%b %d %Y",
    "%d %B %Y",
    "%d %B, %Y",
    "%d %b %Y",
    "%A, %B %d, %Y",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%Y.%m.%d",
    "%Y-%m-%d",
];

fn parse_calendar_date(s: &str) -> Option<f64> {
    if let Ok(datetime) = DateTime::parse_from_rfc3339(s) {
        return Some(datetime_to_fractional_year(datetime.naive_utc()));
    }
    if let Ok(datetime) = DateTime::parse_from_rfc2822(s) {
        return Some(datetime_to_fractional_year(datetime.naive_utc()));
    }

    let normalized = expand_month_names(&strip_ordinal_suffixes(s));
    for format in DATETIME_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(&normalized, format) {
            return Some(datetime_to_fractional_year(datetime));
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(&normalized, format) {
            return Some(date_to_fractional_year(date));
        }
    }
    None
}

/// "July 20th, 1969" -> "July 20, 1969"
fn strip_ordinal_suffixes(s: &str) -> String {
    s.split(' ')
        .map(|token| {
            let digits = token.chars().take_while(|c| c.is_ascii_digit()).count();
            if digits == 0 {
                return token.to_string();
            }
            let (number, rest) = token.split_at(digits);
            let suffix_len = ["st", "nd", "rd", "th"]
                .iter()
                .find(|suffix| rest.to_ascii_lowercase().starts_with(*suffix))
                .map_or(0, |suffix| suffix.len());
            format!("{}{}", number, &rest[suffix_len..])
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// "Sept. 11, 2001" -> "september 11, 2001"
fn expand_month_names(s: &str) -> String {
    s.split(' ')
        .map(|token| {
            let word_len: usize = token
                .chars()
                .take_while(|c| c.is_alphabetic())
                .map(char::len_utf8)
                .sum();
            let (word, rest) = token.split_at(word_len);
            match month_index(word) {
                Some(month) => format!("{}{}", MONTH_NAMES[month], rest.strip_prefix('.').unwrap_or(rest)),
                None => token.to_string(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// First four-digit run not touching other letters or digits. A plural
/// "s" may follow it.
fn parse_embedded_year(s: &str) -> Option<f64> {
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if !bytes[i].is_ascii_digit() {
            i += 1;
            continue;
        }
        let start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i - start != 4 {
            continue;
        }

        let before = s[..start].chars().next_back();
        let mut after = s[i..].chars();
        let standalone_before = !before.is_some_and(char::is_alphanumeric);
        let standalone_after = match after.next() {
            None => true,
            Some('s') => !after.next().is_some_and(char::is_alphanumeric),
            Some(c) => !c.is_alphanumeric(),
        };
        if standalone_before && standalone_after {
            return s[start..i].parse::<i32>().ok().map(f64::from);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn bare_year_is_exact_start_of_year() {
        assert_eq!(parse("2001"), ParsedDate::Parsed(2001.0));
        assert_eq!(parse("  1969 "), ParsedDate::Parsed(1969.0));
    }

    #[test]
    fn month_year_anchors_mid_month() {
        let year = parse_fractional_year("February 2001").unwrap();
        assert!(approx(year, 2001.0 + 1.5 / 12.0), "got {}", year);

        let year = parse_fractional_year("december 1999").unwrap();
        assert!(approx(year, 1999.0 + 11.5 / 12.0));
    }

    #[test]
    fn month_year_accepts_unambiguous_prefixes() {
        let year = parse_fractional_year("Sept 1939").unwrap();
        assert!(approx(year, 1939.0 + 8.5 / 12.0));

        let year = parse_fractional_year("Feb. 2001").unwrap();
        assert!(approx(year, 2001.0 + 1.5 / 12.0));
    }

    #[test]
    fn ambiguous_month_prefix_is_rejected() {
        assert_eq!(month_index("ju"), None);
        assert_eq!(month_index("ma"), None);
        assert_eq!(month_index("mar"), Some(2));
        assert_eq!(month_index("May"), Some(4));
    }

    #[test]
    fn month_year_found_inside_longer_text() {
        let year = parse_fractional_year("Early March 1876").unwrap();
        assert!(approx(year, 1876.0 + 2.5 / 12.0));
    }

    #[test]
    fn iso_date_uses_day_of_year() {
        let year = parse_fractional_year("2001-03-01").unwrap();
        assert!(approx(year, 2001.0 + 59.0 / 365.0), "got {}", year);

        // Leap year: Jan 31 + Feb 29 = 60 days before March 1
        let year = parse_fractional_year("2000-03-01").unwrap();
        assert!(approx(year, 2000.0 + 60.0 / 366.0));

        assert_eq!(parse("1970-01-01"), ParsedDate::Parsed(1970.0));
    }

    #[test]
    fn garbage_is_unparseable() {
        assert_eq!(parse("not a date"), ParsedDate::Unparseable);
        assert_eq!(parse(""), ParsedDate::Unparseable);
        assert_eq!(parse("   "), ParsedDate::Unparseable);
        assert!(!parse("sometime in the 80s").is_parsed());
    }

    #[test]
    fn leap_years() {
        assert!(is_leap_year(2000));
        assert!(!is_leap_year(1900));
        assert!(is_leap_year(2024));
        assert!(!is_leap_year(2023));
        assert_eq!(days_in_year(2024), 366);
        assert_eq!(days_in_year(2023), 365);
    }

    #[test]
    fn calendar_dates_fall_back_to_generic_parse() {
        let expected = date_to_fractional_year(NaiveDate::from_ymd_opt(1969, 7, 20).unwrap());

        for input in ["July 20, 1969", "20 July 1969", "Jul 20 1969", "July 20th, 1969", "1969/07/20"] {
            let year = parse_fractional_year(input).unwrap();
            assert!(approx(year, expected), "{} parsed to {}", input, year);
        }
    }

    #[test]
    fn datetimes_use_utc_fields() {
        // 23:00 at -05:00 is already Jan 2 in UTC
        let year = parse_fractional_year("2001-01-01T23:00:00-05:00").unwrap();
        let expected = 2001.0 + (1.0 + 4.0 / 24.0) / 365.0;
        assert!(approx(year, expected), "got {}", year);
    }

    #[test]
    fn embedded_year_is_last_resort() {
        assert_eq!(parse("circa 1450s"), ParsedDate::Parsed(1450.0));
        assert_eq!(parse("Q3 2001"), ParsedDate::Parsed(2001.0));
        assert_eq!(parse("c.1450"), ParsedDate::Parsed(1450.0));
        // Five-digit runs are not years
        assert_eq!(parse("ref 12345"), ParsedDate::Unparseable);
    }

    #[test]
    fn embedded_year_must_stand_alone() {
        assert_eq!(parse("AB1234CD"), ParsedDate::Unparseable);
        assert_eq!(parse("model 1234X"), ParsedDate::Unparseable);
        assert_eq!(parse("the 1960sx"), ParsedDate::Unparseable);
        assert_eq!(parse("AB1234CD, then 1871"), ParsedDate::Parsed(1871.0));
    }

    #[test]
    fn abbreviated_months_keep_their_day() {
        let expected = date_to_fractional_year(NaiveDate::from_ymd_opt(2001, 9, 11).unwrap());
        for input in ["Sept. 11, 2001", "Sep 11, 2001", "11 Sept 2001"] {
            let year = parse_fractional_year(input).unwrap();
            assert!(approx(year, expected), "{} parsed to {}", input, year);
        }

        let expected = date_to_fractional_year(NaiveDate::from_ymd_opt(1941, 12, 7).unwrap());
        assert!(approx(parse_fractional_year("Dec. 7th, 1941").unwrap(), expected));
    }

    #[test]
    fn invalid_iso_date_falls_through_to_year() {
        assert_eq!(parse("2001-02-30"), ParsedDate::Parsed(2001.0));
    }
}
