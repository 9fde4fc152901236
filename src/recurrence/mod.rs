//! Recurrence rules
//!
//! iCal RRULE parsing, expansion and descriptions. All date arithmetic for
//! recurring items goes through this module.

#![allow(dead_code)]

mod expand;
mod rule;

pub use expand::Occurrences;
pub use rule::{RecurrenceRule, WeekdaySpec};

use chrono::{NaiveDateTime, Weekday};
use thiserror::Error;

use crate::timefmt::{iso, TimeError};

/// Occurrences returned when neither `count` nor `end` is given
pub const DEFAULT_OCCURRENCE_LIMIT: usize = 100;

/// Recurrence errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RecurrenceError {
    #[error("RRULE has no FREQ")]
    MissingFrequency,

    #[error("Unknown frequency: {0}")]
    UnknownFrequency(String),

    #[error("Malformed RRULE part: {0}")]
    MalformedPart(String),

    #[error("Unsupported RRULE part: {0}")]
    UnknownPart(String),

    #[error("Invalid value for {part}: {value}")]
    InvalidValue { part: String, value: String },

    #[error("COUNT and UNTIL cannot both be set")]
    CountWithUntil,

    #[error("Invalid recurrence window: {0}")]
    InvalidWindow(#[from] TimeError),
}

pub fn validate_rrule(rrule: &str) -> bool {
    RecurrenceRule::parse(rrule).is_ok()
}

/// Occurrences of `rrule` anchored at `start`.
///
/// With `count`, the first `count` occurrences. Otherwise with `end`, those
/// strictly between `start` and `end`. Otherwise the first
/// [`DEFAULT_OCCURRENCE_LIMIT`].
pub fn generate_occurrences(
    rrule: &str,
    start: NaiveDateTime,
    end: Option<NaiveDateTime>,
    count: Option<usize>,
) -> Result<Vec<NaiveDateTime>, RecurrenceError> {
    let occurrences = Occurrences::new(RecurrenceRule::parse(rrule)?, start);

    let result = match (count.filter(|c| *c > 0), end) {
        (Some(n), _) => occurrences.take(n).collect(),
        (None, Some(end)) => occurrences
            .take_while(|o| *o < end)
            .filter(|o| *o > start)
            .collect(),
        (None, None) => occurrences.take(DEFAULT_OCCURRENCE_LIMIT).collect(),
    };
    Ok(result)
}

/// First occurrence strictly after `after`, with the rule anchored there
pub fn get_next_occurrence(
    rrule: &str,
    after: NaiveDateTime,
) -> Result<Option<NaiveDateTime>, RecurrenceError> {
    let mut occurrences = Occurrences::new(RecurrenceRule::parse(rrule)?, after);
    Ok(occurrences.find(|o| *o > after))
}

/// Human-readable form, e.g. `Every month on the 2nd Friday`
pub fn rrule_to_description(rrule: &str) -> Result<String, RecurrenceError> {
    Ok(describe(&RecurrenceRule::parse(rrule)?))
}

/// `true` when `valid_until` is absent or after `valid_from`
pub fn is_valid_recurrence_window(
    valid_from: &str,
    valid_until: Option<&str>,
) -> Result<bool, RecurrenceError> {
    let from = iso::to_datetime(valid_from)?;
    match valid_until.filter(|u| !u.trim().is_empty()) {
        Some(until) => Ok(from < iso::to_datetime(until)?),
        None => Ok(true),
    }
}

pub fn describe(rule: &RecurrenceRule) -> String {
    let mut text = if rule.interval == 1 {
        format!("Every {}", rule.freq.unit())
    } else {
        format!("Every {} {}s", rule.interval, rule.freq.unit())
    };

    if !rule.by_month.is_empty() {
        let months: Vec<String> = rule.by_month.iter().map(|m| month_name(*m).to_string()).collect();
        text.push_str(&format!(" in {}", join(&months)));
    }

    if !rule.by_week_no.is_empty() {
        let weeks: Vec<String> = rule.by_week_no.iter().map(|w| w.to_string()).collect();
        let noun = if weeks.len() == 1 { "week" } else { "weeks" };
        text.push_str(&format!(" in {noun} {}", join(&weeks)));
    }

    if !rule.by_year_day.is_empty() {
        let days: Vec<String> = rule.by_year_day.iter().map(|d| ordinal_phrase(*d)).collect();
        text.push_str(&format!(" on the {} day of the year", join(&days)));
    }

    if !rule.by_day.is_empty() {
        let days: Vec<String> = rule.by_day.iter().map(describe_weekday).collect();
        text.push_str(&format!(" on {}", join(&days)));
    }

    if !rule.by_month_day.is_empty() {
        let days: Vec<String> = rule.by_month_day.iter().map(|d| ordinal_phrase(*d)).collect();
        text.push_str(&format!(" on the {} day", join(&days)));
    }

    if !rule.by_hour.is_empty() {
        let hours: Vec<String> = rule.by_hour.iter().map(|h| h.to_string()).collect();
        text.push_str(&format!(" at hour {}", join(&hours)));
    }

    if !rule.by_minute.is_empty() {
        let minutes: Vec<String> = rule.by_minute.iter().map(|m| m.to_string()).collect();
        text.push_str(&format!(" at minute {}", join(&minutes)));
    }

    if !rule.by_second.is_empty() {
        let seconds: Vec<String> = rule.by_second.iter().map(|s| s.to_string()).collect();
        text.push_str(&format!(" at second {}", join(&seconds)));
    }

    if !rule.by_set_pos.is_empty() {
        let positions: Vec<String> = rule.by_set_pos.iter().map(|p| ordinal_phrase(*p)).collect();
        text.push_str(&format!(
            ", taking the {} match each {}",
            join(&positions),
            rule.freq.unit()
        ));
    }

    if let Some(count) = rule.count {
        let times = if count == 1 { "time" } else { "times" };
        text.push_str(&format!(", {count} {times}"));
    }

    if let Some(until) = rule.until {
        text.push_str(&format!(", until {}", iso::naive_to_timestamp(&until)));
    }

    text
}

fn describe_weekday(spec: &WeekdaySpec) -> String {
    let name = weekday_name(spec.weekday);
    if spec.ordinal == 0 {
        name.to_string()
    } else {
        format!("the {} {}", ordinal_phrase(spec.ordinal), name)
    }
}

/// `1st`, `2nd`, `last`, `2nd to last`
fn ordinal_phrase(n: i32) -> String {
    match n {
        -1 => "last".to_string(),
        n if n < 0 => format!("{} to last", ordinal(n.unsigned_abs())),
        n => ordinal(n.unsigned_abs()),
    }
}

fn ordinal(n: u32) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{n}{suffix}")
}

/// `a`, `a and b`, `a, b and c`
fn join(items: &[String]) -> String {
    match items {
        [] => String::new(),
        [only] => only.clone(),
        [rest @ .., last] => format!("{} and {}", rest.join(", "), last),
    }
}

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

fn month_name(month: u32) -> &'static str {
    match month {
        1 => "January",
        2 => "February",
        3 => "March",
        4 => "April",
        5 => "May",
        6 => "June",
        7 => "July",
        8 => "August",
        9 => "September",
        10 => "October",
        11 => "November",
        _ => "December",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn dt(y: i32, mo: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_validate_rrule() {
        assert!(validate_rrule("FREQ=MONTHLY;BYDAY=2FR"));
        assert!(validate_rrule("RRULE:FREQ=DAILY;COUNT=3"));
        assert!(!validate_rrule("INVALID"));
        assert!(!validate_rrule(""));
    }

    #[test]
    fn test_validate_accepts_every_rfc_part() {
        for rule in [
            "FREQ=WEEKLY;BYDAY=2FR",
            "FREQ=YEARLY;BYWEEKNO=20",
            "FREQ=YEARLY;BYYEARDAY=100",
            "FREQ=SECONDLY",
            "FREQ=MINUTELY;BYSECOND=0,30",
        ] {
            assert!(validate_rrule(rule), "rule {rule}");
        }
    }

    #[test]
    fn test_fractional_anchor() {
        let start = NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_milli_opt(9, 0, 0, 500)
            .unwrap();
        let nine = |d: u32| NaiveDate::from_ymd_opt(2025, 1, d).unwrap().and_hms_opt(9, 0, 0).unwrap();

        let occurrences = generate_occurrences("FREQ=DAILY", start, None, Some(2)).unwrap();
        assert_eq!(occurrences, vec![nine(1), nine(2)]);

        assert_eq!(get_next_occurrence("FREQ=DAILY", start).unwrap(), Some(nine(2)));
    }

    #[test]
    fn test_generate_with_count() {
        let occurrences =
            generate_occurrences("FREQ=MONTHLY;BYDAY=2FR", dt(2025, 1, 1), None, Some(3)).unwrap();
        assert_eq!(occurrences, vec![dt(2025, 1, 10), dt(2025, 2, 14), dt(2025, 3, 14)]);
    }

    #[test]
    fn test_generate_between_is_exclusive() {
        let occurrences =
            generate_occurrences("FREQ=DAILY", dt(2025, 1, 1), Some(dt(2025, 1, 4)), None).unwrap();
        assert_eq!(occurrences, vec![dt(2025, 1, 2), dt(2025, 1, 3)]);
    }

    #[test]
    fn test_generate_default_limit() {
        let occurrences = generate_occurrences("FREQ=DAILY", dt(2025, 1, 1), None, None).unwrap();
        assert_eq!(occurrences.len(), DEFAULT_OCCURRENCE_LIMIT);
        assert_eq!(occurrences[0], dt(2025, 1, 1));
    }

    #[test]
    fn test_generate_zero_count_falls_back() {
        let occurrences =
            generate_occurrences("FREQ=DAILY", dt(2025, 1, 1), Some(dt(2025, 1, 3)), Some(0)).unwrap();
        assert_eq!(occurrences, vec![dt(2025, 1, 2)]);
    }

    #[test]
    fn test_generate_rule_count_wins() {
        let occurrences =
            generate_occurrences("FREQ=DAILY;COUNT=2", dt(2025, 1, 1), None, Some(10)).unwrap();
        assert_eq!(occurrences.len(), 2);
    }

    #[test]
    fn test_generate_invalid() {
        assert!(generate_occurrences("FREQ=NEVER", dt(2025, 1, 1), None, None).is_err());
    }

    #[test]
    fn test_next_occurrence() {
        assert_eq!(
            get_next_occurrence("FREQ=DAILY", dt(2025, 1, 1)).unwrap(),
            Some(dt(2025, 1, 2))
        );
        assert_eq!(
            get_next_occurrence("FREQ=MONTHLY;BYMONTHDAY=15", dt(2025, 1, 20)).unwrap(),
            Some(dt(2025, 2, 15))
        );
    }

    #[test]
    fn test_next_occurrence_exhausted() {
        assert_eq!(get_next_occurrence("FREQ=DAILY;COUNT=1", dt(2025, 1, 1)).unwrap(), None);
    }

    #[test]
    fn test_description() {
        assert_eq!(
            rrule_to_description("FREQ=MONTHLY;BYDAY=2FR").unwrap(),
            "Every month on the 2nd Friday"
        );
        assert_eq!(
            rrule_to_description("FREQ=WEEKLY;INTERVAL=2;BYDAY=MO,WE,FR").unwrap(),
            "Every 2 weeks on Monday, Wednesday and Friday"
        );
        assert_eq!(
            rrule_to_description("FREQ=MONTHLY;BYMONTHDAY=-1;COUNT=6").unwrap(),
            "Every month on the last day, 6 times"
        );
        assert_eq!(
            rrule_to_description("FREQ=YEARLY;BYMONTH=11;BYDAY=4TH").unwrap(),
            "Every year in November on the 4th Thursday"
        );
        assert_eq!(
            rrule_to_description("FREQ=DAILY;UNTIL=20251231").unwrap(),
            "Every day, until 2025-12-31T00:00:00Z"
        );
        assert_eq!(
            rrule_to_description("FREQ=MONTHLY;BYDAY=MO,TU,WE,TH,FR;BYSETPOS=-2").unwrap(),
            "Every month on Monday, Tuesday, Wednesday, Thursday and Friday, taking the 2nd to last match each month"
        );
        assert_eq!(
            rrule_to_description("FREQ=YEARLY;BYWEEKNO=20;BYDAY=MO").unwrap(),
            "Every year in week 20 on Monday"
        );
        assert_eq!(
            rrule_to_description("FREQ=YEARLY;BYYEARDAY=1,-1").unwrap(),
            "Every year on the last and 1st day of the year"
        );
        assert_eq!(
            rrule_to_description("FREQ=MINUTELY;INTERVAL=5;BYSECOND=0,30").unwrap(),
            "Every 5 minutes at second 0 and 30"
        );
        assert_eq!(
            rrule_to_description("FREQ=WEEKLY;BYDAY=2FR").unwrap(),
            "Every week on Friday"
        );
    }

    #[test]
    fn test_ordinal_suffixes() {
        assert_eq!(ordinal(1), "1st");
        assert_eq!(ordinal(2), "2nd");
        assert_eq!(ordinal(3), "3rd");
        assert_eq!(ordinal(11), "11th");
        assert_eq!(ordinal(12), "12th");
        assert_eq!(ordinal(22), "22nd");
    }

    #[test]
    fn test_recurrence_window() {
        assert!(is_valid_recurrence_window("2025-01-01T00:00:00Z", None).unwrap());
        assert!(is_valid_recurrence_window("2025-01-01T00:00:00Z", Some("")).unwrap());
        assert!(is_valid_recurrence_window("2025-01-01", Some("2025-02-01")).unwrap());
        assert!(!is_valid_recurrence_window("2025-02-01", Some("2025-01-01")).unwrap());
        assert!(!is_valid_recurrence_window("2025-01-01", Some("2025-01-01")).unwrap());
    }

    #[test]
    fn test_recurrence_window_unparsable() {
        assert!(matches!(
            is_valid_recurrence_window("someday", None),
            Err(RecurrenceError::InvalidWindow(_))
        ));
    }
}
