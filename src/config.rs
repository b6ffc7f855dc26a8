use crate::calendar::Minute;
use crate::time::{TimeRange, Windowed};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use thiserror::Error;

pub const MAX_HORIZON_DAYS_VAR: &str = "REHEARSAL_MAX_HORIZON_DAYS";
pub const SUGGESTION_LIMIT_VAR: &str = "REHEARSAL_SUGGESTION_LIMIT";
pub const MIN_ATTENDANCE_VAR: &str = "REHEARSAL_MIN_ATTENDANCE";
pub const EXCLUDE_SCHEDULED_VAR: &str = "REHEARSAL_EXCLUDE_SCHEDULED";
pub const CANDIDATE_POLICY_VAR: &str = "REHEARSAL_CANDIDATE_POLICY";

/// How a qualifying stretch of shared free time turns into candidates
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "camelCase"))]
pub enum CandidatePolicy {
    /// One candidate spanning the whole stretch
    #[default]
    WholeInterval,
    /// One candidate of exactly the requested duration at the stretch's start
    Anchored,
    /// Every window of the requested duration, starts `step_minutes` apart
    Sliding {
        #[cfg_attr(feature = "serde", serde(rename = "stepMinutes"))]
        step_minutes: Minute,
    },
}

impl CandidatePolicy {
    /// Candidate windows inside `range` for a rehearsal of `duration` minutes
    ///
    /// # Examples
    /// ```
    /// use rehearsal_libs::config::CandidatePolicy;
    /// use rehearsal_libs::time::TimeRange;
    ///
    /// let evening = TimeRange::new(1080, 1200);
    ///
    /// assert_eq!(CandidatePolicy::WholeInterval.windows(evening, 60), vec![evening]);
    /// assert_eq!(
    ///     CandidatePolicy::Anchored.windows(evening, 60),
    ///     vec![TimeRange::new(1080, 1140)]
    /// );
    /// assert_eq!(
    ///     CandidatePolicy::Sliding { step_minutes: 30 }.windows(evening, 60),
    ///     vec![
    ///         TimeRange::new(1080, 1140),
    ///         TimeRange::new(1110, 1170),
    ///         TimeRange::new(1140, 1200),
    ///     ]
    /// );
    /// assert!(CandidatePolicy::WholeInterval.windows(evening, 150).is_empty());
    /// ```
    pub fn windows(self, range: TimeRange<Minute>, duration: Minute) -> Vec<TimeRange<Minute>> {
        if duration == 0 || range.len() < duration {
            return vec![];
        }

        match self {
            CandidatePolicy::WholeInterval => vec![range],
            CandidatePolicy::Anchored => {
                vec![TimeRange::new(range.start(), range.start() + duration)]
            }
            CandidatePolicy::Sliding { step_minutes } => {
                [range].iter().windowed_by(duration, step_minutes)
            }
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown candidate policy `{0}`, expected `whole`, `anchored` or `sliding:<minutes>`")]
pub struct ParsePolicyError(pub String);

impl FromStr for CandidatePolicy {
    type Err = ParsePolicyError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        match value.split_once(':') {
            None if value.eq_ignore_ascii_case("whole") => Ok(CandidatePolicy::WholeInterval),
            None if value.eq_ignore_ascii_case("anchored") => Ok(CandidatePolicy::Anchored),
            Some((kind, step)) if kind.eq_ignore_ascii_case("sliding") => step
                .trim()
                .parse()
                .ok()
                .filter(|&step_minutes: &Minute| step_minutes > 0)
                .map(|step_minutes| CandidatePolicy::Sliding { step_minutes })
                .ok_or_else(|| ParsePolicyError(value.to_string())),
            _ => Err(ParsePolicyError(value.to_string())),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "camelCase"))]
pub struct ResolverConfig {
    /// Longest search range accepted, in days (both ends included)
    pub max_horizon_days: u32,
    /// Suggestions returned when a request sets no limit; `None` is unbounded
    pub default_limit: Option<usize>,
    /// Candidates below this attendance percentage are dropped
    pub min_attendance: u8,
    /// Keep suggestions clear of rehearsals already on the calendar
    pub exclude_scheduled: bool,
    pub policy: CandidatePolicy,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        ResolverConfig {
            max_horizon_days: 90,
            default_limit: None,
            min_attendance: 0,
            exclude_scheduled: true,
            policy: CandidatePolicy::WholeInterval,
        }
    }
}

impl ResolverConfig {
    /// Defaults overridden by any `REHEARSAL_*` environment variables that parse
    pub fn from_env() -> Self {
        ResolverConfig::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`ResolverConfig::from_env`] with a custom variable source.
    /// Values that fail to parse keep their default.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = ResolverConfig::default();

        let max_horizon_days = lookup(MAX_HORIZON_DAYS_VAR)
            .map(|e| e.parse::<u32>().ok())
            .flatten()
            .unwrap_or(defaults.max_horizon_days);
        let default_limit = lookup(SUGGESTION_LIMIT_VAR)
            .map(|e| e.parse::<usize>().ok())
            .flatten()
            .or(defaults.default_limit);
        let min_attendance = lookup(MIN_ATTENDANCE_VAR)
            .map(|e| e.parse::<u8>().ok())
            .flatten()
            .map(|pct| pct.min(100))
            .unwrap_or(defaults.min_attendance);
        let exclude_scheduled = lookup(EXCLUDE_SCHEDULED_VAR)
            .map(|e| e.parse::<bool>().ok())
            .flatten()
            .unwrap_or(defaults.exclude_scheduled);
        let policy = lookup(CANDIDATE_POLICY_VAR)
            .map(|e| e.parse::<CandidatePolicy>().ok())
            .flatten()
            .unwrap_or(defaults.policy);

        ResolverConfig {
            max_horizon_days,
            default_limit,
            min_attendance,
            exclude_scheduled,
            policy,
        }
    }

    pub fn with_max_horizon_days(mut self, days: u32) -> Self {
        self.max_horizon_days = days;
        self
    }

    pub fn with_default_limit(mut self, limit: Option<usize>) -> Self {
        self.default_limit = limit;
        self
    }

    pub fn with_min_attendance(mut self, percentage: u8) -> Self {
        self.min_attendance = percentage.min(100);
        self
    }

    pub fn with_exclude_scheduled(mut self, exclude: bool) -> Self {
        self.exclude_scheduled = exclude;
        self
    }

    pub fn with_policy(mut self, policy: CandidatePolicy) -> Self {
        self.policy = policy;
        self
    }
}
