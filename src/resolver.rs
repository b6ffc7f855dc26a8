use crate::calendar::{at_minute, DateRange, Minute};
use crate::config::ResolverConfig;
use crate::coverage::sweep;
use crate::error::{RangeError, SuggestError};
use crate::member::{Available, MemberAvailability};
use crate::store::{AvailabilityStore, ScheduledRehearsal};
use crate::time::{Blocks, TimeRange};
use crate::{BandId, UserId};
use chrono::{Duration, NaiveDateTime};
use log::{debug, info, trace};
#[cfg(feature = "rayon")]
use rayon::prelude::*;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A proposed, unpersisted rehearsal slot
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct CandidateWindow {
    #[cfg_attr(feature = "serde", serde(rename = "startDatetime"))]
    pub start: NaiveDateTime,
    #[cfg_attr(feature = "serde", serde(rename = "endDatetime"))]
    pub end: NaiveDateTime,
    pub available_member_ids: Vec<UserId>,
    pub attendance_percentage: u8,
}

impl CandidateWindow {
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn includes(&self, user_id: UserId) -> bool {
        self.available_member_ids.contains(&user_id)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct SuggestRequest {
    pub band_id: BandId,
    pub range: DateRange,
    pub duration_minutes: i64,
    pub limit: Option<usize>,
}

impl SuggestRequest {
    pub fn new(band_id: BandId, range: DateRange, duration: Duration) -> SuggestRequest {
        // Partial minutes round up so a window is never shorter than asked
        let seconds = duration.num_seconds();
        let duration_minutes = if seconds > 0 {
            (seconds + 59) / 60
        } else {
            seconds / 60
        };

        SuggestRequest {
            band_id,
            range,
            duration_minutes,
            limit: None,
        }
    }

    pub fn with_limit(mut self, limit: Option<usize>) -> SuggestRequest {
        self.limit = limit;
        self
    }

    /// Checks the request against `config`, returning the duration in minutes.
    /// Durations longer than a day are valid but can never be satisfied.
    pub fn validate(&self, config: &ResolverConfig) -> Result<Minute, RangeError> {
        if self.range.is_reversed() {
            return Err(RangeError::Reversed {
                from: self.range.from,
                to: self.range.to,
            });
        }
        if self.duration_minutes <= 0 {
            return Err(RangeError::NonPositiveDuration);
        }

        let days = self.range.day_count();
        if days > i64::from(config.max_horizon_days) {
            return Err(RangeError::HorizonExceeded {
                days,
                max: config.max_horizon_days,
            });
        }

        Ok(Minute::try_from(self.duration_minutes).unwrap_or(Minute::MAX))
    }
}

/// Availability of every active member of a band, loaded for one request
#[derive(Clone, Debug)]
pub struct BandSnapshot {
    pub band_id: BandId,
    pub members: Vec<MemberAvailability>,
    pub rehearsals: Vec<ScheduledRehearsal>,
}

impl BandSnapshot {
    pub fn load<S>(
        store: &S,
        band_id: BandId,
        range: &DateRange,
        with_rehearsals: bool,
    ) -> Result<BandSnapshot, SuggestError>
    where
        S: AvailabilityStore + ?Sized,
    {
        let member_ids = store
            .active_members(band_id)
            .map_err(SuggestError::data_unavailable)?
            .ok_or(SuggestError::NotFound(band_id))?;

        let members = member_ids
            .into_iter()
            .map(|user_id| {
                let rules = store
                    .recurring_rules(user_id, band_id)
                    .map_err(SuggestError::data_unavailable)?;
                let exceptions = store
                    .exceptions(user_id, range)
                    .map_err(SuggestError::data_unavailable)?;
                Ok(MemberAvailability::new(user_id, rules, exceptions))
            })
            .collect::<Result<Vec<_>, SuggestError>>()?;

        let rehearsals = if with_rehearsals {
            store
                .scheduled_rehearsals(band_id, range)
                .map_err(SuggestError::data_unavailable)?
        } else {
            Vec::new()
        };

        debug!(
            members = members.len(), rehearsals = rehearsals.len();
            "Loaded availability snapshot for band {}", band_id
        );

        Ok(BandSnapshot {
            band_id,
            members,
            rehearsals,
        })
    }
}

/// `round(100 * covered / total)`, halves rounding up. Zero when `total` is zero.
///
/// # Examples
/// ```
/// use rehearsal_libs::resolver::attendance_percentage;
///
/// assert_eq!(attendance_percentage(1, 2), 50);
/// assert_eq!(attendance_percentage(2, 3), 67);
/// assert_eq!(attendance_percentage(1, 8), 13);
/// assert_eq!(attendance_percentage(0, 0), 0);
/// ```
pub fn attendance_percentage(covered: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let covered = covered.min(total);
    ((100 * covered + total / 2) / total) as u8
}

/// Highest attendance first, then earliest start
fn rank(a: &CandidateWindow, b: &CandidateWindow) -> Ordering {
    b.attendance_percentage
        .cmp(&a.attendance_percentage)
        .then_with(|| a.start.cmp(&b.start))
        .then_with(|| a.end.cmp(&b.end))
        .then_with(|| a.available_member_ids.cmp(&b.available_member_ids))
}

/// Computes ranked candidate windows over an already-loaded snapshot.
pub fn resolve(
    snapshot: &BandSnapshot,
    request: &SuggestRequest,
    config: &ResolverConfig,
) -> Result<Vec<CandidateWindow>, RangeError> {
    let duration = request.validate(config)?;
    let total = snapshot.members.len();

    if total == 0 {
        debug!("Band {} has no active members", snapshot.band_id);
        return Ok(vec![]);
    }

    let mut candidates: Vec<CandidateWindow> = Vec::new();

    for date in request.range.days() {
        let blocked: Vec<TimeRange<Minute>> = if config.exclude_scheduled {
            snapshot
                .rehearsals
                .iter()
                .filter_map(|rehearsal| rehearsal.clip_to(date))
                .collect()
        } else {
            vec![]
        };

        let free: Vec<Vec<TimeRange<Minute>>> = snapshot
            .members
            .iter()
            .map(|member| {
                let available = member.availability_on(date);
                if blocked.is_empty() {
                    available
                } else {
                    available.iter().blocks(blocked.iter())
                }
            })
            .collect();

        for segment in sweep(&free) {
            trace!(
                "{} {}: {} member(s) free",
                date,
                segment.range,
                segment.members.len()
            );

            if segment.range.len() < duration {
                continue;
            }

            let attendance = attendance_percentage(segment.members.len(), total);
            if attendance < config.min_attendance {
                continue;
            }

            let member_ids: Vec<UserId> = segment
                .members
                .iter()
                .filter_map(|&index| snapshot.members.get(index))
                .map(|member| member.user_id)
                .collect();

            candidates.extend(config.policy.windows(segment.range, duration).into_iter().map(
                |window| CandidateWindow {
                    start: at_minute(date, window.start()),
                    end: at_minute(date, window.end()),
                    available_member_ids: member_ids.clone(),
                    attendance_percentage: attendance,
                },
            ));
        }
    }

    #[cfg(feature = "rayon")]
    candidates.par_sort_unstable_by(rank);
    #[cfg(not(feature = "rayon"))]
    candidates.sort_unstable_by(rank);

    if let Some(limit) = request.limit.or(config.default_limit) {
        candidates.truncate(limit);
    }

    debug!(candidates = candidates.len(); "Resolved suggestions for band {}", snapshot.band_id);

    Ok(candidates)
}

/// Suggests rehearsal times for a band from the availability in `store`.
#[derive(Clone, Debug)]
pub struct Resolver<S> {
    store: S,
    config: ResolverConfig,
}

impl<S> Resolver<S>
where
    S: AvailabilityStore,
{
    pub fn new(store: S) -> Resolver<S> {
        Resolver::with_config(store, ResolverConfig::default())
    }

    pub fn with_config(store: S, config: ResolverConfig) -> Resolver<S> {
        Resolver { store, config }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Ranked candidate windows of at least `duration` within `range`.
    ///
    /// # Errors
    /// `InvalidRange` for a reversed range, a non-positive duration or a
    /// range past the configured horizon; these are checked before the store
    /// is touched. `NotFound` when the band does not exist, and
    /// `DataUnavailable` when the store fails.
    ///
    /// # Example
    /// ```
    /// use chrono::{Duration, NaiveDate, Weekday};
    /// use rehearsal_libs::{
    ///     calendar::DateRange,
    ///     member::RecurringRule,
    ///     resolver::Resolver,
    ///     store::{MembershipStatus, MemoryStore},
    ///     time::TimeRange,
    /// };
    /// use uuid::Uuid;
    ///
    /// let band = Uuid::new_v4();
    /// let (guitar, drums) = (Uuid::new_v4(), Uuid::new_v4());
    ///
    /// let mut store = MemoryStore::new();
    /// store
    ///     .set_membership(band, guitar, MembershipStatus::Active)
    ///     .set_membership(band, drums, MembershipStatus::Active);
    /// store.set_recurring_rule(RecurringRule::new(guitar, band, Weekday::Mon, TimeRange::new(1080, 1260)));
    /// store.set_recurring_rule(RecurringRule::new(drums, band, Weekday::Mon, TimeRange::new(1140, 1260)));
    ///
    /// let monday = NaiveDate::from_ymd_opt(2025, 6, 16).unwrap();
    /// let resolver = Resolver::new(store);
    /// let suggestions = resolver
    ///     .suggest(band, DateRange::day(monday), Duration::minutes(90), None)
    ///     .unwrap();
    ///
    /// assert_eq!(suggestions[0].attendance_percentage, 100);
    /// assert_eq!(suggestions[0].start, monday.and_hms_opt(19, 0, 0).unwrap());
    /// assert_eq!(suggestions[0].end, monday.and_hms_opt(21, 0, 0).unwrap());
    /// ```
    pub fn suggest(
        &self,
        band_id: BandId,
        range: DateRange,
        duration: Duration,
        limit: Option<usize>,
    ) -> Result<Vec<CandidateWindow>, SuggestError> {
        self.suggest_request(&SuggestRequest::new(band_id, range, duration).with_limit(limit))
    }

    pub fn suggest_request(
        &self,
        request: &SuggestRequest,
    ) -> Result<Vec<CandidateWindow>, SuggestError> {
        request.validate(&self.config)?;

        info!(
            "Suggesting {} minute rehearsals for band {} between {} and {}",
            request.duration_minutes, request.band_id, request.range.from, request.range.to
        );

        let snapshot = BandSnapshot::load(
            &self.store,
            request.band_id,
            &request.range,
            self.config.exclude_scheduled,
        )?;

        resolve(&snapshot, request, &self.config).map_err(SuggestError::from)
    }
}
