use chrono::{NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{invalid_schedule_error, Error};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Schedule {
    pub days: Vec<Weekday>,
    pub departure: NaiveTime,
}

impl Schedule {
    /// Build a schedule from weekday tags and a 12-hour clock string such as
    /// `"8:00 AM"`. Noon and midnight follow the usual 12 PM / 12 AM rule.
    pub fn new(days: Vec<Weekday>, departure: &str) -> Result<Self, Error> {
        if days.is_empty() {
            return Err(invalid_schedule_error("empty day set"));
        }

        Ok(Self {
            days,
            departure: parse_clock_time(departure)?,
        })
    }

    pub fn shares_day(&self, other: &Schedule) -> bool {
        is_day_match(&self.days, &other.days)
    }

    /// Absolute difference between the two departures, in minutes since
    /// midnight.
    pub fn minutes_between(&self, other: &Schedule) -> i64 {
        (minutes_since_midnight(self.departure) - minutes_since_midnight(other.departure)).abs()
    }

    pub fn departs_within(&self, other: &Schedule, window_min: i64) -> bool {
        self.minutes_between(other) <= window_min
    }
}

/// Parse a 12-hour wall-clock string (`"8:00 AM"`, `"12:15 pm"`).
pub fn parse_clock_time(value: &str) -> Result<NaiveTime, Error> {
    Ok(NaiveTime::parse_from_str(value.trim(), "%I:%M %p")?)
}

fn minutes_since_midnight(time: NaiveTime) -> i64 {
    i64::from(time.num_seconds_from_midnight()) / 60
}

/// Any shared weekday counts as a day match.
pub fn is_day_match(a: &[Weekday], b: &[Weekday]) -> bool {
    a.iter().any(|day| b.contains(day))
}

/// True when the two clock strings are within `window_min` minutes of each
/// other, compared as minutes since midnight.
pub fn is_time_match(a: &str, b: &str, window_min: i64) -> Result<bool, Error> {
    let a = minutes_since_midnight(parse_clock_time(a)?);
    let b = minutes_since_midnight(parse_clock_time(b)?);

    Ok((a - b).abs() <= window_min)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday::{Fri, Mon, Tue, Wed};

    #[test]
    fn day_match_requires_shared_day() {
        assert!(is_day_match(&[Mon, Wed], &[Wed, Fri]));
        assert!(!is_day_match(&[Mon], &[Tue]));
    }

    #[test]
    fn time_match_uses_window() {
        assert!(is_time_match("8:00 AM", "8:45 AM", 60).unwrap());
        assert!(!is_time_match("8:00 AM", "9:15 AM", 60).unwrap());
        assert!(is_time_match("8:00 AM", "8:00 AM", 0).unwrap());
    }

    #[test]
    fn noon_and_midnight_parse_by_the_twelve_rule() {
        assert_eq!(
            parse_clock_time("12:00 AM").unwrap(),
            NaiveTime::from_hms_opt(0, 0, 0).unwrap()
        );
        assert_eq!(
            parse_clock_time("12:30 PM").unwrap(),
            NaiveTime::from_hms_opt(12, 30, 0).unwrap()
        );
    }

    #[test]
    fn malformed_time_is_rejected() {
        assert!(parse_clock_time("25:00").is_err());
        assert!(parse_clock_time("8 o'clock").is_err());
    }

    #[test]
    fn schedule_rejects_empty_day_set() {
        assert!(Schedule::new(vec![], "8:00 AM").is_err());
    }

    #[test]
    fn minutes_between_is_symmetric() {
        let early = Schedule::new(vec![Wed], "8:00 AM").unwrap();
        let late = Schedule::new(vec![Wed], "8:45 AM").unwrap();

        assert_eq!(early.minutes_between(&late), 45);
        assert_eq!(late.minutes_between(&early), 45);
        assert!(early.departs_within(&late, 60));
        assert!(!early.departs_within(&late, 30));
    }
}
