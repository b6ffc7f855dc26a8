use crate::calendar::{day_of_week, weekday_number, Minute, WHOLE_DAY};
use crate::time::TimeRange;
use crate::{BandId, UserId};
use chrono::{NaiveDate, Weekday};
use log::{trace, warn};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A weekly-recurring window when a member is normally free for one band.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct RecurringRule {
    pub user_id: UserId,
    pub band_id: BandId,
    /// 0 = Sunday ... 6 = Saturday
    pub day_of_week: u8,
    pub window: TimeRange<Minute>,
}

impl RecurringRule {
    pub fn new(
        user_id: UserId,
        band_id: BandId,
        weekday: Weekday,
        window: TimeRange<Minute>,
    ) -> RecurringRule {
        RecurringRule {
            user_id,
            band_id,
            day_of_week: weekday_number(weekday),
            window,
        }
    }
}

/// A date-specific override of a member's availability, independent of band.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct AvailabilityException {
    pub user_id: UserId,
    pub date: NaiveDate,
    pub is_available: bool,
    /// Ignored when `is_available` is false. `None` with `is_available`
    /// means free for the whole day.
    pub window: Option<TimeRange<Minute>>,
    pub reason: Option<String>,
}

impl AvailabilityException {
    /// Blocks the whole date
    pub fn unavailable(user_id: UserId, date: NaiveDate) -> AvailabilityException {
        AvailabilityException {
            user_id,
            date,
            is_available: false,
            window: None,
            reason: None,
        }
    }

    /// Replaces the usual availability on `date` with `window`
    pub fn available(
        user_id: UserId,
        date: NaiveDate,
        window: TimeRange<Minute>,
    ) -> AvailabilityException {
        AvailabilityException {
            user_id,
            date,
            is_available: true,
            window: Some(window),
            reason: None,
        }
    }

    pub fn with_reason(mut self, reason: &str) -> AvailabilityException {
        self.reason = Some(reason.to_string());
        self
    }

    fn intervals(&self) -> Vec<TimeRange<Minute>> {
        if !self.is_available {
            return vec![];
        }

        self.window
            .unwrap_or(WHOLE_DAY)
            .intersect(WHOLE_DAY)
            .into_iter()
            .collect()
    }
}

pub trait Available {
    /// Intervals of `date` during which the subject is free
    fn availability_on(&self, date: NaiveDate) -> Vec<TimeRange<Minute>>;
}

/// Everything known about one member's availability for one band:
/// recurring rules keyed by weekday and exceptions keyed by date.
#[derive(Clone, Debug)]
pub struct MemberAvailability {
    pub user_id: UserId,
    rules: HashMap<u8, TimeRange<Minute>>,
    exceptions: HashMap<NaiveDate, AvailabilityException>,
}

impl MemberAvailability {
    /// Builds the lookup tables. Rules for the same weekday, or exceptions
    /// for the same date, keep the last one given. Rules with an empty or
    /// out-of-range window are discarded.
    pub fn new(
        user_id: UserId,
        rules: Vec<RecurringRule>,
        exceptions: Vec<AvailabilityException>,
    ) -> MemberAvailability {
        let rules: HashMap<u8, TimeRange<Minute>> = rules
            .into_iter()
            .filter_map(|rule| {
                if rule.day_of_week > 6 {
                    warn!(
                        "Discarding rule for {}: day of week {} is not within 0-6",
                        user_id, rule.day_of_week
                    );
                    return None;
                }
                match rule.window.intersect(WHOLE_DAY) {
                    Some(window) => Some((rule.day_of_week, window)),
                    None => {
                        warn!(
                            "Discarding rule for {} on day {}: window {} is empty",
                            user_id, rule.day_of_week, rule.window
                        );
                        None
                    }
                }
            })
            .collect();

        let exceptions = exceptions
            .into_iter()
            .map(|exception| {
                let empty = exception
                    .window
                    .filter(|window| exception.is_available && window.is_empty());
                if let Some(window) = empty {
                    warn!(
                        "Exception for {} on {} has an empty window {}, treating the day as unavailable",
                        user_id, exception.date, window
                    );
                }
                (exception.date, exception)
            })
            .collect::<HashMap<_, _>>();

        trace!(
            "Member {} has {} recurring rule(s) and {} exception(s)",
            user_id,
            rules.len(),
            exceptions.len()
        );

        MemberAvailability {
            user_id,
            rules,
            exceptions,
        }
    }

    pub fn rule_for(&self, day_of_week: u8) -> Option<TimeRange<Minute>> {
        self.rules.get(&day_of_week).copied()
    }

    pub fn exception_on(&self, date: NaiveDate) -> Option<&AvailabilityException> {
        self.exceptions.get(&date)
    }
}

impl Available for MemberAvailability {
    /// An exception for the date wins outright; otherwise the weekday's
    /// recurring rule applies.
    fn availability_on(&self, date: NaiveDate) -> Vec<TimeRange<Minute>> {
        match self.exception_on(date) {
            Some(exception) => exception.intervals(),
            None => self.rule_for(day_of_week(date)).into_iter().collect(),
        }
    }
}
