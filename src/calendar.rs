//! Calendar helpers: inclusive date ranges, weekday numbering and
//! minute-of-day conversions.

use crate::time::TimeRange;
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Weekday};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Minutes since midnight. A day spans `[0, MINUTES_PER_DAY]`.
pub type Minute = u16;

pub const MINUTES_PER_DAY: Minute = 24 * 60;

/// The whole calendar day as a minute range
pub const WHOLE_DAY: TimeRange<Minute> = TimeRange(0, MINUTES_PER_DAY);

/// Inclusive [from, to] range of calendar dates
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        DateRange { from, to }
    }

    /// A range covering a single date
    pub fn day(date: NaiveDate) -> Self {
        DateRange::new(date, date)
    }

    pub fn is_reversed(&self) -> bool {
        self.from > self.to
    }

    /// Number of dates in the range, both ends included.
    /// Reversed ranges hold no dates.
    ///
    /// # Examples
    /// ```
    /// use chrono::NaiveDate;
    /// use rehearsal_libs::calendar::DateRange;
    ///
    /// let from = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
    /// let to = NaiveDate::from_ymd_opt(2025, 6, 30).unwrap();
    ///
    /// assert_eq!(DateRange::new(from, to).day_count(), 30);
    /// assert_eq!(DateRange::new(to, from).day_count(), 0);
    /// ```
    pub fn day_count(&self) -> i64 {
        if self.is_reversed() {
            0
        } else {
            (self.to - self.from).num_days() + 1
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let to = self.to;
        self.from.iter_days().take_while(move |date| *date <= to)
    }
}

/// Day of week numbered from Sunday = 0 to Saturday = 6
pub fn day_of_week(date: NaiveDate) -> u8 {
    weekday_number(date.weekday())
}

pub fn weekday_number(weekday: Weekday) -> u8 {
    weekday.num_days_from_sunday() as u8
}

pub fn minute_of(time: NaiveTime) -> Minute {
    (time.hour() * 60 + time.minute()) as Minute
}

/// Minute range covering `[start, end)` wall-clock times
pub fn time_window(start: NaiveTime, end: NaiveTime) -> TimeRange<Minute> {
    TimeRange::new(minute_of(start), minute_of(end))
}

/// Parses `HH:MM` or `HH:MM:SS` into minutes since midnight.
/// `24:00` is accepted as the end of the day; seconds are dropped.
///
/// # Examples
/// ```
/// use rehearsal_libs::calendar::parse_time_of_day;
///
/// assert_eq!(parse_time_of_day("18:30"), Some(1110));
/// assert_eq!(parse_time_of_day("19:00:00"), Some(1140));
/// assert_eq!(parse_time_of_day("24:00"), Some(1440));
/// assert_eq!(parse_time_of_day("24:01"), None);
/// assert_eq!(parse_time_of_day("7pm"), None);
/// ```
pub fn parse_time_of_day(value: &str) -> Option<Minute> {
    let mut parts = value.trim().split(':');
    let hours: Minute = parts.next()?.parse().ok()?;
    let minutes: Minute = parts.next()?.parse().ok()?;
    if let Some(seconds) = parts.next() {
        let seconds: u8 = seconds.parse().ok()?;
        if seconds > 59 {
            return None;
        }
    }
    if parts.next().is_some() || minutes > 59 {
        return None;
    }

    let total = hours.checked_mul(60)?.checked_add(minutes)?;
    if total > MINUTES_PER_DAY {
        None
    } else {
        Some(total)
    }
}

pub fn format_time_of_day(minute: Minute) -> String {
    format!("{:02}:{:02}", minute / 60, minute % 60)
}

/// Wall-clock datetime `minute` minutes after midnight of `date`.
/// `MINUTES_PER_DAY` lands on midnight of the following date.
pub fn at_minute(date: NaiveDate, minute: Minute) -> NaiveDateTime {
    NaiveDateTime::new(date, NaiveTime::MIN) + Duration::minutes(i64::from(minute))
}

/// Portion of `[start, end)` falling on `date`, as minutes of that day.
/// Partial minutes are widened outwards so the result never under-covers.
pub fn clip_to_date(
    date: NaiveDate,
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> Option<TimeRange<Minute>> {
    let day_start = NaiveDateTime::new(date, NaiveTime::MIN);
    let day_end = day_start + Duration::days(1);

    let start = start.max(day_start);
    let end = end.min(day_end);
    if end <= start {
        return None;
    }

    let from = (start - day_start).num_minutes();
    let to_seconds = (end - day_start).num_seconds();
    let to = (to_seconds + 59) / 60;

    Some(TimeRange::new(from as Minute, to as Minute))
}
