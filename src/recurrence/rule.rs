//! RRULE parsing
//!
//! Accepts every RFC 5545 RRULE part: `FREQ`, `INTERVAL`, `COUNT`, `UNTIL`,
//! `BYMONTH`, `BYWEEKNO`, `BYYEARDAY`, `BYMONTHDAY`, `BYDAY`, `BYHOUR`,
//! `BYMINUTE`, `BYSECOND`, `BYSETPOS` and `WKST`. `BYDAY` ordinals only mean
//! something for MONTHLY and YEARLY; finer frequencies read `2FR` as `FR`.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Weekday};

use super::RecurrenceError;

/// Recurrence frequency, coarsest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Frequency {
    Yearly,
    Monthly,
    Weekly,
    Daily,
    Hourly,
    Minutely,
    Secondly,
}

impl Frequency {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "YEARLY" => Some(Frequency::Yearly),
            "MONTHLY" => Some(Frequency::Monthly),
            "WEEKLY" => Some(Frequency::Weekly),
            "DAILY" => Some(Frequency::Daily),
            "HOURLY" => Some(Frequency::Hourly),
            "MINUTELY" => Some(Frequency::Minutely),
            "SECONDLY" => Some(Frequency::Secondly),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Frequency::Yearly => "YEARLY",
            Frequency::Monthly => "MONTHLY",
            Frequency::Weekly => "WEEKLY",
            Frequency::Daily => "DAILY",
            Frequency::Hourly => "HOURLY",
            Frequency::Minutely => "MINUTELY",
            Frequency::Secondly => "SECONDLY",
        }
    }

    /// Period noun used in descriptions
    pub fn unit(&self) -> &'static str {
        match self {
            Frequency::Yearly => "year",
            Frequency::Monthly => "month",
            Frequency::Weekly => "week",
            Frequency::Daily => "day",
            Frequency::Hourly => "hour",
            Frequency::Minutely => "minute",
            Frequency::Secondly => "second",
        }
    }
}

/// One `BYDAY` entry: a weekday with an optional ordinal (`2FR`, `-1SU`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekdaySpec {
    pub weekday: Weekday,
    /// 0 means every matching weekday in the period
    pub ordinal: i32,
}

impl WeekdaySpec {
    fn parse(s: &str) -> Option<Self> {
        let split = s.len().checked_sub(2)?;
        let (num, code) = s.split_at_checked(split)?;
        let weekday = weekday_from_code(code)?;
        let ordinal = if num.is_empty() {
            0
        } else {
            let n: i32 = num.parse().ok()?;
            if n == 0 || n.abs() > 53 {
                return None;
            }
            n
        };
        Some(Self { weekday, ordinal })
    }
}

pub(crate) fn weekday_from_code(code: &str) -> Option<Weekday> {
    match code {
        "MO" => Some(Weekday::Mon),
        "TU" => Some(Weekday::Tue),
        "WE" => Some(Weekday::Wed),
        "TH" => Some(Weekday::Thu),
        "FR" => Some(Weekday::Fri),
        "SA" => Some(Weekday::Sat),
        "SU" => Some(Weekday::Sun),
        _ => None,
    }
}

/// Parsed recurrence rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurrenceRule {
    pub freq: Frequency,
    pub interval: u32,
    pub count: Option<u32>,
    /// Inclusive upper bound; a trailing `Z` is read as the same wall time
    pub until: Option<NaiveDateTime>,
    pub by_month: Vec<u32>,
    pub by_week_no: Vec<i32>,
    pub by_year_day: Vec<i32>,
    pub by_month_day: Vec<i32>,
    pub by_day: Vec<WeekdaySpec>,
    pub by_hour: Vec<u32>,
    pub by_minute: Vec<u32>,
    pub by_second: Vec<u32>,
    pub by_set_pos: Vec<i32>,
    pub week_start: Weekday,
}

impl RecurrenceRule {
    fn new(freq: Frequency) -> Self {
        Self {
            freq,
            interval: 1,
            count: None,
            until: None,
            by_month: Vec::new(),
            by_week_no: Vec::new(),
            by_year_day: Vec::new(),
            by_month_day: Vec::new(),
            by_day: Vec::new(),
            by_hour: Vec::new(),
            by_minute: Vec::new(),
            by_second: Vec::new(),
            by_set_pos: Vec::new(),
            week_start: Weekday::Mon,
        }
    }

    /// Parse `FREQ=...;...`, with or without a leading `RRULE:`
    pub fn parse(s: &str) -> Result<Self, RecurrenceError> {
        let trimmed = s.trim();
        let body = match trimmed.get(..6) {
            Some(prefix) if prefix.eq_ignore_ascii_case("RRULE:") => &trimmed[6..],
            _ => trimmed,
        };

        let mut freq = None;
        let mut parts = Vec::new();
        for part in body.split(';').filter(|p| !p.trim().is_empty()) {
            let (name, value) = part
                .split_once('=')
                .ok_or_else(|| RecurrenceError::MalformedPart(part.to_string()))?;
            let name = name.trim().to_ascii_uppercase();
            let value = value.trim().to_ascii_uppercase();
            if name == "FREQ" {
                let parsed = Frequency::from_str(&value)
                    .ok_or_else(|| RecurrenceError::UnknownFrequency(value.clone()))?;
                freq = Some(parsed);
            } else {
                parts.push((name, value));
            }
        }

        let mut rule = Self::new(freq.ok_or(RecurrenceError::MissingFrequency)?);
        for (name, value) in parts {
            rule.apply(&name, &value)?;
        }

        if rule.count.is_some() && rule.until.is_some() {
            return Err(RecurrenceError::CountWithUntil);
        }
        if rule.freq > Frequency::Monthly {
            for day in &mut rule.by_day {
                day.ordinal = 0;
            }
            rule.by_day.dedup();
        }
        Ok(rule)
    }

    fn apply(&mut self, name: &str, value: &str) -> Result<(), RecurrenceError> {
        let invalid = || RecurrenceError::InvalidValue {
            part: name.to_string(),
            value: value.to_string(),
        };

        match name {
            "INTERVAL" => {
                self.interval = value.parse().ok().filter(|n| *n > 0).ok_or_else(invalid)?;
            }
            "COUNT" => self.count = Some(value.parse().map_err(|_| invalid())?),
            "UNTIL" => self.until = Some(parse_until(value).ok_or_else(invalid)?),
            "BYMONTH" => self.by_month = parse_list(value, |n: u32| (1..=12).contains(&n)).ok_or_else(invalid)?,
            "BYWEEKNO" => {
                self.by_week_no =
                    parse_list(value, |n: i32| n != 0 && n.abs() <= 53).ok_or_else(invalid)?
            }
            "BYYEARDAY" => {
                self.by_year_day =
                    parse_list(value, |n: i32| n != 0 && n.abs() <= 366).ok_or_else(invalid)?
            }
            "BYMONTHDAY" => {
                self.by_month_day =
                    parse_list(value, |n: i32| n != 0 && n.abs() <= 31).ok_or_else(invalid)?
            }
            "BYHOUR" => self.by_hour = parse_list(value, |n: u32| n < 24).ok_or_else(invalid)?,
            "BYMINUTE" => self.by_minute = parse_list(value, |n: u32| n < 60).ok_or_else(invalid)?,
            "BYSECOND" => self.by_second = parse_list(value, |n: u32| n < 60).ok_or_else(invalid)?,
            "BYSETPOS" => {
                self.by_set_pos =
                    parse_list(value, |n: i32| n != 0 && n.abs() <= 366).ok_or_else(invalid)?
            }
            "BYDAY" => {
                self.by_day = value
                    .split(',')
                    .map(|d| WeekdaySpec::parse(d.trim()))
                    .collect::<Option<Vec<_>>>()
                    .ok_or_else(invalid)?
            }
            "WKST" => self.week_start = weekday_from_code(value).ok_or_else(invalid)?,
            _ => return Err(RecurrenceError::UnknownPart(name.to_string())),
        }
        Ok(())
    }
}

/// Comma list of numbers, each checked by `valid`; sorted and deduplicated
fn parse_list<T>(value: &str, valid: impl Fn(T) -> bool) -> Option<Vec<T>>
where
    T: std::str::FromStr + Ord + Copy,
{
    let mut items = value
        .split(',')
        .map(|v| v.trim().parse::<T>().ok().filter(|n| valid(*n)))
        .collect::<Option<Vec<_>>>()?;
    items.sort();
    items.dedup();
    Some(items)
}

/// `20250101T000000Z`, `20250101T000000` or `20250101`
fn parse_until(value: &str) -> Option<NaiveDateTime> {
    let value = value.strip_suffix('Z').unwrap_or(value);
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%S") {
        return Some(dt);
    }
    NaiveDate::parse_from_str(value, "%Y%m%d")
        .ok()
        .map(|d| d.and_time(NaiveTime::MIN))
}
