//! Occurrence expansion
//!
//! Walks the rule period by period (every `interval` years, months, weeks,
//! days, hours, minutes or seconds from the start), builds the sorted
//! candidate set for each period, applies `BYSETPOS`, then yields candidates
//! at or after the start until `UNTIL` or `COUNT` ends the series. The start
//! is truncated to whole seconds first.

use std::collections::VecDeque;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Weekday};

use super::rule::{Frequency, RecurrenceRule, WeekdaySpec};

/// Consecutive periods without a candidate before the series is treated as
/// exhausted (e.g. `BYMONTH=2;BYMONTHDAY=30`). Sub-daily walks skip whole
/// days, hours or minutes that cannot match, and each skip counts once.
fn max_empty_periods(freq: Frequency) -> u32 {
    match freq {
        Frequency::Yearly => 400,
        Frequency::Monthly => 4_800,
        Frequency::Weekly => 21_000,
        Frequency::Daily => 150_000,
        Frequency::Hourly | Frequency::Minutely | Frequency::Secondly => 1_000_000,
    }
}

/// Day filters after start-date defaults are filled in
#[derive(Debug, Clone)]
struct DayFilter {
    months: Vec<u32>,
    week_numbers: Vec<i32>,
    year_days: Vec<i32>,
    month_days: Vec<i32>,
    weekdays: Vec<WeekdaySpec>,
    week_start: Weekday,
    /// Ordinal weekdays count within the month instead of the year
    ordinal_in_month: bool,
}

impl DayFilter {
    fn new(rule: &RecurrenceRule, start: &NaiveDateTime) -> Self {
        let mut months = rule.by_month.clone();
        let mut month_days = rule.by_month_day.clone();
        let mut weekdays = rule.by_day.clone();

        let no_day_parts = month_days.is_empty()
            && weekdays.is_empty()
            && rule.by_year_day.is_empty()
            && rule.by_week_no.is_empty();
        if no_day_parts {
            match rule.freq {
                Frequency::Yearly => {
                    if months.is_empty() {
                        months.push(start.month());
                    }
                    month_days.push(start.day() as i32);
                }
                Frequency::Monthly => month_days.push(start.day() as i32),
                Frequency::Weekly => weekdays.push(WeekdaySpec {
                    weekday: start.weekday(),
                    ordinal: 0,
                }),
                _ => {}
            }
        }

        Self {
            months,
            week_numbers: rule.by_week_no.clone(),
            year_days: rule.by_year_day.clone(),
            month_days,
            weekdays,
            week_start: rule.week_start,
            ordinal_in_month: rule.freq == Frequency::Monthly || !rule.by_month.is_empty(),
        }
    }

    fn matches(&self, date: &NaiveDate) -> bool {
        if !self.months.is_empty() && !self.months.contains(&date.month()) {
            return false;
        }

        if !self.week_numbers.is_empty() {
            let Some((number, weeks)) = week_number(date, self.week_start) else {
                return false;
            };
            let from_end = number - weeks - 1;
            if !self.week_numbers.iter().any(|n| *n == number || *n == from_end) {
                return false;
            }
        }

        if !self.year_days.is_empty() {
            let day = date.ordinal() as i32;
            let from_end = day - days_in_year(date.year()) as i32 - 1;
            if !self.year_days.iter().any(|d| *d == day || *d == from_end) {
                return false;
            }
        }

        if !self.month_days.is_empty() {
            let day = date.day() as i32;
            let from_end = day - days_in_month(date) as i32 - 1;
            if !self.month_days.iter().any(|d| *d == day || *d == from_end) {
                return false;
            }
        }

        if !self.weekdays.is_empty() {
            let (index, len) = if self.ordinal_in_month {
                (date.day(), days_in_month(date))
            } else {
                (date.ordinal(), days_in_year(date.year()))
            };
            let forward = ((index - 1) / 7 + 1) as i32;
            let backward = -(((len - index) / 7 + 1) as i32);
            let hit = self.weekdays.iter().any(|spec| {
                spec.weekday == date.weekday()
                    && (spec.ordinal == 0 || spec.ordinal == forward || spec.ordinal == backward)
            });
            if !hit {
                return false;
            }
        }

        true
    }
}

fn days_in_month(date: &NaiveDate) -> u32 {
    let (y, m) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(y, m, 1)
        .and_then(|next| next.pred_opt())
        .map(|last| last.day())
        .unwrap_or(31)
}

fn days_in_year(year: i32) -> u32 {
    if NaiveDate::from_ymd_opt(year, 2, 29).is_some() {
        366
    } else {
        365
    }
}

/// Days from `week_start` back to `date`'s weekday
fn days_since(week_start: Weekday, date: &NaiveDate) -> i64 {
    let diff = date.weekday().num_days_from_monday() as i64
        - week_start.num_days_from_monday() as i64;
    diff.rem_euclid(7)
}

/// First day of week 1: the week opening on `week_start` that holds at
/// least four days of `year`
fn first_week_start(year: i32, week_start: Weekday) -> Option<NaiveDate> {
    let jan1 = NaiveDate::from_ymd_opt(year, 1, 1)?;
    let back = days_since(week_start, &jan1);
    let opening = jan1.checked_sub_signed(Duration::try_days(back)?)?;
    if back > 3 {
        opening.checked_add_signed(Duration::try_days(7)?)
    } else {
        Some(opening)
    }
}

/// Week number of `date` in its week-numbering year, and the number of
/// weeks in that year. Late December can fall in week 1 of the next year
/// and early January in the last week of the previous one.
fn week_number(date: &NaiveDate, week_start: Weekday) -> Option<(i32, i32)> {
    let mut year = date.year();
    let mut first = first_week_start(year, week_start)?;
    if *date < first {
        year -= 1;
        first = first_week_start(year, week_start)?;
    } else {
        let next = first_week_start(year + 1, week_start)?;
        if *date >= next {
            year += 1;
            first = next;
        }
    }
    let following = first_week_start(year + 1, week_start)?;

    let number = (date.signed_duration_since(first).num_days() / 7 + 1) as i32;
    let weeks = (following.signed_duration_since(first).num_days() / 7) as i32;
    Some((number, weeks))
}

/// `values`, or `fallback` alone when the rule leaves the part unset
fn or_start(values: &[u32], fallback: u32) -> Vec<u32> {
    if values.is_empty() {
        vec![fallback]
    } else {
        values.to_vec()
    }
}

/// An empty filter allows everything
fn allows(values: &[u32], value: u32) -> bool {
    values.is_empty() || values.contains(&value)
}

/// Lazy iterator over the occurrences of a rule
#[derive(Debug, Clone)]
pub struct Occurrences {
    rule: RecurrenceRule,
    start: NaiveDateTime,
    filter: DayFilter,
    hours: Vec<u32>,
    minutes: Vec<u32>,
    seconds: Vec<u32>,
    period: i64,
    emitted: u32,
    pending: VecDeque<NaiveDateTime>,
    done: bool,
}

impl Occurrences {
    pub fn new(rule: RecurrenceRule, start: NaiveDateTime) -> Self {
        let start = start.with_nanosecond(0).unwrap_or(start);

        Self {
            filter: DayFilter::new(&rule, &start),
            hours: or_start(&rule.by_hour, start.hour()),
            minutes: or_start(&rule.by_minute, start.minute()),
            seconds: or_start(&rule.by_second, start.second()),
            rule,
            start,
            period: 0,
            emitted: 0,
            pending: VecDeque::new(),
            done: false,
        }
    }

    /// Candidate days for period `k`; `None` once dates overflow
    fn period_days(&self, k: i64) -> Option<Vec<NaiveDate>> {
        let step = k.checked_mul(self.rule.interval as i64)?;
        let start = self.start.date();

        let (first, len) = match self.rule.freq {
            Frequency::Yearly => {
                let year = i32::try_from(start.year() as i64 + step).ok()?;
                (NaiveDate::from_ymd_opt(year, 1, 1)?, days_in_year(year) as i64)
            }
            Frequency::Monthly => {
                let index = start.year() as i64 * 12 + start.month0() as i64 + step;
                let year = i32::try_from(index.div_euclid(12)).ok()?;
                let first = NaiveDate::from_ymd_opt(year, index.rem_euclid(12) as u32 + 1, 1)?;
                (first, days_in_month(&first) as i64)
            }
            Frequency::Weekly => {
                let back = days_since(self.rule.week_start, &start);
                let week = start.checked_sub_signed(Duration::try_days(back)?)?;
                (week.checked_add_signed(Duration::try_days(step.checked_mul(7)?)?)?, 7)
            }
            Frequency::Daily => (start.checked_add_signed(Duration::try_days(step)?)?, 1),
            // Sub-daily periods are walked by `slot_candidates`
            Frequency::Hourly | Frequency::Minutely | Frequency::Secondly => {
                return Some(Vec::new())
            }
        };

        Some(
            first
                .iter_days()
                .take(len as usize)
                .filter(|d| self.filter.matches(d))
                .collect(),
        )
    }

    /// Length of one sub-daily period in seconds
    fn slot_seconds(&self) -> i64 {
        let unit = match self.rule.freq {
            Frequency::Hourly => 3_600,
            Frequency::Minutely => 60,
            _ => 1,
        };
        unit * self.rule.interval as i64
    }

    /// Start of sub-daily period 0: the start truncated to the period unit
    fn slot_anchor(&self) -> Option<NaiveDateTime> {
        let s = self.start;
        match self.rule.freq {
            Frequency::Hourly => s.date().and_hms_opt(s.hour(), 0, 0),
            Frequency::Minutely => s.date().and_hms_opt(s.hour(), s.minute(), 0),
            _ => Some(s),
        }
    }

    /// Candidates of sub-daily period `k` and the next period worth visiting.
    ///
    /// A slot whose day, hour or minute fails a filter jumps straight to the
    /// first slot past that day, hour or minute.
    fn slot_candidates(&self, k: i64) -> Option<(Vec<NaiveDateTime>, i64)> {
        let anchor = self.slot_anchor()?;
        let step = self.slot_seconds();
        let slot = anchor.checked_add_signed(Duration::try_seconds(k.checked_mul(step)?)?)?;
        let date = slot.date();
        let freq = self.rule.freq;

        let skip_to = if !self.filter.matches(&date) {
            Some(date.succ_opt()?.and_time(NaiveTime::MIN))
        } else if !allows(&self.rule.by_hour, slot.hour()) {
            date.and_hms_opt(slot.hour(), 0, 0)?
                .checked_add_signed(Duration::try_hours(1)?)
        } else if freq >= Frequency::Minutely && !allows(&self.rule.by_minute, slot.minute()) {
            date.and_hms_opt(slot.hour(), slot.minute(), 0)?
                .checked_add_signed(Duration::try_minutes(1)?)
        } else if freq == Frequency::Secondly && !allows(&self.rule.by_second, slot.second()) {
            slot.checked_add_signed(Duration::try_seconds(1)?)
        } else {
            None
        };

        if let Some(target) = skip_to {
            let gap = target.signed_duration_since(anchor).num_seconds();
            let next = gap.div_euclid(step) + i64::from(gap.rem_euclid(step) != 0);
            return Some((Vec::new(), next.max(k + 1)));
        }

        let candidates = match freq {
            Frequency::Hourly => self
                .minutes
                .iter()
                .flat_map(|m| {
                    self.seconds
                        .iter()
                        .filter_map(move |s| slot.with_minute(*m)?.with_second(*s))
                })
                .collect(),
            Frequency::Minutely => self
                .seconds
                .iter()
                .filter_map(|s| slot.with_second(*s))
                .collect(),
            _ => vec![slot],
        };
        Some((candidates, k + 1))
    }

    /// All candidates in period `k`, sorted, and the next period to visit
    fn period_candidates(&self, k: i64) -> Option<(Vec<NaiveDateTime>, i64)> {
        let (mut candidates, next) = if self.rule.freq > Frequency::Daily {
            self.slot_candidates(k)?
        } else {
            let days = self.period_days(k)?;
            let mut out = Vec::with_capacity(
                days.len() * self.hours.len() * self.minutes.len() * self.seconds.len(),
            );
            for day in days {
                for h in &self.hours {
                    for m in &self.minutes {
                        for s in &self.seconds {
                            if let Some(time) = NaiveTime::from_hms_opt(*h, *m, *s) {
                                out.push(day.and_time(time));
                            }
                        }
                    }
                }
            }
            (out, k + 1)
        };

        candidates.sort();
        if self.rule.by_set_pos.is_empty() {
            return Some((candidates, next));
        }

        let len = candidates.len() as i32;
        let mut picked: Vec<NaiveDateTime> = self
            .rule
            .by_set_pos
            .iter()
            .filter_map(|pos| {
                let index = if *pos > 0 { pos - 1 } else { len + pos };
                usize::try_from(index).ok().and_then(|i| candidates.get(i).copied())
            })
            .collect();
        picked.sort();
        picked.dedup();
        Some((picked, next))
    }
}

impl Iterator for Occurrences {
    type Item = NaiveDateTime;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let limit = max_empty_periods(self.rule.freq);
        let mut empty = 0;
        while self.pending.is_empty() {
            if empty >= limit {
                self.done = true;
                return None;
            }
            let Some((candidates, next)) = self.period_candidates(self.period) else {
                self.done = true;
                return None;
            };
            self.period = next;

            let start = self.start;
            self.pending.extend(candidates.into_iter().filter(|c| *c >= start));
            if self.pending.is_empty() {
                empty += 1;
            }
        }

        let next = self.pending.pop_front()?;
        if self.rule.until.is_some_and(|until| next > until)
            || self.rule.count.is_some_and(|count| self.emitted >= count)
        {
            self.done = true;
            self.pending.clear();
            return None;
        }

        self.emitted += 1;
        Some(next)
    }
}
