//! Day counts since the system epoch (2020-01-01)

use chrono::{Datelike, NaiveDate, Utc};

use super::TimeError;

/// `NaiveDate::num_days_from_ce` of 2020-01-01
const EPOCH_DAYS_FROM_CE: i64 = 737_425;

/// The epoch as a date
pub fn epoch() -> NaiveDate {
    day_to_date(0).unwrap_or(NaiveDate::MIN)
}

/// Today as days since the epoch
pub fn current_day() -> i64 {
    date_to_day(&Utc::now().date_naive())
}

/// Date for a day number
pub fn day_to_date(day: i64) -> Result<NaiveDate, TimeError> {
    EPOCH_DAYS_FROM_CE
        .checked_add(day)
        .and_then(|n| i32::try_from(n).ok())
        .and_then(NaiveDate::from_num_days_from_ce_opt)
        .ok_or(TimeError::DayOutOfRange(day))
}

/// Day number for a date; negative before the epoch
pub fn date_to_day(date: &NaiveDate) -> i64 {
    i64::from(date.num_days_from_ce()) - EPOCH_DAYS_FROM_CE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epoch() {
        assert_eq!(epoch(), NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
    }

    #[test]
    fn test_day_to_date() {
        assert_eq!(
            day_to_date(2229).unwrap(),
            NaiveDate::from_ymd_opt(2026, 2, 7).unwrap()
        );
        assert_eq!(
            day_to_date(-1).unwrap(),
            NaiveDate::from_ymd_opt(2019, 12, 31).unwrap()
        );
    }

    #[test]
    fn test_date_to_day() {
        let date = NaiveDate::from_ymd_opt(2026, 2, 7).unwrap();
        assert_eq!(date_to_day(&date), 2229);
    }

    #[test]
    fn test_out_of_range() {
        assert!(matches!(
            day_to_date(i64::MAX),
            Err(TimeError::DayOutOfRange(_))
        ));
    }

    #[test]
    fn test_current_day_after_2025() {
        assert!(current_day() > date_to_day(&NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()));
    }
}
