pub mod calendar;
pub mod config;
pub mod coverage;
pub mod error;
pub mod member;
#[cfg(feature = "serde")]
pub mod payload;
pub mod resolver;
pub mod store;
pub mod time;
#[cfg(feature = "wasm")]
pub mod wasm;

pub use calendar::{DateRange, Minute};
pub use config::{CandidatePolicy, ResolverConfig};
pub use error::{RangeError, SuggestError};
pub use member::{AvailabilityException, RecurringRule};
pub use resolver::{resolve, BandSnapshot, CandidateWindow, Resolver, SuggestRequest};
pub use store::{AvailabilityStore, MembershipStatus, MemoryStore, ScheduledRehearsal};
pub use time::TimeRange;

pub type UserId = uuid::Uuid;
pub type BandId = uuid::Uuid;

#[cfg(test)]
mod tests {
    use crate::calendar::DateRange;
    use crate::member::{AvailabilityException, RecurringRule};
    use crate::store::{MembershipStatus, MemoryStore};
    use crate::time::TimeRange;
    use crate::{BandId, UserId};
    use chrono::{Duration, NaiveDate, NaiveDateTime, Weekday};
    use uuid::Uuid;

    const A: UserId = Uuid::from_u128(1);
    const B: UserId = Uuid::from_u128(2);
    const BAND: BandId = Uuid::from_u128(100);

    fn friday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 20).unwrap()
    }

    fn at(date: NaiveDate, hour: u32, minute: u32) -> NaiveDateTime {
        date.and_hms_opt(hour, minute, 0).unwrap()
    }

    fn hours(start: u16, end: u16) -> TimeRange<u16> {
        TimeRange::new(start * 60, end * 60)
    }

    /// A: Friday 18:00-22:00, B: Friday 19:00-21:00
    fn friday_band() -> MemoryStore {
        let mut store = MemoryStore::new();
        store
            .set_membership(BAND, A, MembershipStatus::Active)
            .set_membership(BAND, B, MembershipStatus::Active);
        store.set_recurring_rule(RecurringRule::new(A, BAND, Weekday::Fri, hours(18, 22)));
        store.set_recurring_rule(RecurringRule::new(B, BAND, Weekday::Fri, hours(19, 21)));
        store
    }

    fn week_of_friday() -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(2025, 6, 16).unwrap(),
            NaiveDate::from_ymd_opt(2025, 6, 22).unwrap(),
        )
    }

    #[test]
    fn overlapping_rules_rank_full_band_first() {
        use crate::resolver::Resolver;

        let resolver = Resolver::new(friday_band());
        let suggestions = resolver
            .suggest(BAND, week_of_friday(), Duration::minutes(60), None)
            .unwrap();

        let summary: Vec<_> = suggestions
            .iter()
            .map(|c| {
                (
                    c.start,
                    c.end,
                    c.available_member_ids.clone(),
                    c.attendance_percentage,
                )
            })
            .collect();

        assert_eq!(
            summary,
            vec![
                (at(friday(), 19, 0), at(friday(), 21, 0), vec![A, B], 100),
                (at(friday(), 18, 0), at(friday(), 19, 0), vec![A], 50),
                (at(friday(), 21, 0), at(friday(), 22, 0), vec![A], 50),
            ]
        );
    }

    #[test]
    fn unavailable_exception_removes_member_for_the_day() {
        use crate::resolver::Resolver;

        let mut store = friday_band();
        store.set_exception(AvailabilityException::unavailable(B, friday()).with_reason("Gig"));

        let suggestions = Resolver::new(store)
            .suggest(BAND, week_of_friday(), Duration::minutes(60), None)
            .unwrap();

        assert!(!suggestions.is_empty());
        assert!(suggestions.iter().all(|c| !c.includes(B)));
        assert!(suggestions.iter().all(|c| c.attendance_percentage == 50));
        assert_eq!(suggestions[0].start, at(friday(), 18, 0));
        assert_eq!(suggestions[0].end, at(friday(), 22, 0));
    }

    #[test]
    fn member_without_availability_is_never_suggested() {
        use crate::resolver::Resolver;

        let idle = Uuid::from_u128(3);
        let mut store = friday_band();
        store.set_membership(BAND, idle, MembershipStatus::Active);

        let suggestions = Resolver::new(store)
            .suggest(BAND, week_of_friday(), Duration::minutes(30), None)
            .unwrap();

        assert!(suggestions.iter().all(|c| !c.includes(idle)));
        // Three active members now: 2 of 3 and 1 of 3
        assert_eq!(suggestions[0].attendance_percentage, 67);
        assert_eq!(suggestions[1].attendance_percentage, 33);
    }

    #[test]
    fn reversed_range_is_invalid() {
        use crate::error::{RangeError, SuggestError};
        use crate::resolver::Resolver;

        let resolver = Resolver::new(friday_band());
        let range = DateRange::new(friday(), friday().pred_opt().unwrap());

        assert!(matches!(
            resolver.suggest(BAND, range, Duration::minutes(60), None),
            Err(SuggestError::InvalidRange(RangeError::Reversed { .. }))
        ));
        assert!(matches!(
            resolver.suggest(BAND, week_of_friday(), Duration::zero(), None),
            Err(SuggestError::InvalidRange(RangeError::NonPositiveDuration))
        ));
        assert!(matches!(
            resolver.suggest(BAND, week_of_friday(), Duration::minutes(-30), None),
            Err(SuggestError::InvalidRange(RangeError::NonPositiveDuration))
        ));
    }

    #[test]
    fn horizon_is_bounded() {
        use crate::error::{RangeError, SuggestError};
        use crate::resolver::Resolver;

        let resolver = Resolver::new(friday_band());
        let range = DateRange::new(friday(), friday() + Duration::days(90));

        assert!(matches!(
            resolver.suggest(BAND, range, Duration::minutes(60), None),
            Err(SuggestError::InvalidRange(RangeError::HorizonExceeded { days: 91, max: 90 }))
        ));

        let range = DateRange::new(friday(), friday() + Duration::days(89));
        assert!(resolver.suggest(BAND, range, Duration::minutes(60), None).is_ok());
    }

    #[test]
    fn unknown_band_is_not_found() {
        use crate::error::SuggestError;
        use crate::resolver::Resolver;

        let stranger = Uuid::from_u128(999);
        let result = Resolver::new(friday_band()).suggest(
            stranger,
            week_of_friday(),
            Duration::minutes(60),
            None,
        );

        assert!(matches!(result, Err(SuggestError::NotFound(id)) if id == stranger));
    }

    #[test]
    fn band_without_active_members_has_no_suggestions() {
        use crate::resolver::Resolver;

        let mut store = friday_band();
        store
            .set_membership(BAND, A, MembershipStatus::Inactive)
            .set_membership(BAND, B, MembershipStatus::Inactive);

        let suggestions = Resolver::new(store)
            .suggest(BAND, week_of_friday(), Duration::minutes(60), None)
            .unwrap();

        assert!(suggestions.is_empty());
    }

    #[test]
    fn inactive_member_does_not_count_towards_attendance() {
        use crate::resolver::Resolver;

        let mut store = friday_band();
        store.set_membership(BAND, B, MembershipStatus::Inactive);

        let suggestions = Resolver::new(store)
            .suggest(BAND, week_of_friday(), Duration::minutes(60), None)
            .unwrap();

        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].available_member_ids, vec![A]);
        assert_eq!(suggestions[0].attendance_percentage, 100);
    }

    #[test]
    fn short_stretches_are_discarded() {
        use crate::resolver::Resolver;

        let suggestions = Resolver::new(friday_band())
            .suggest(BAND, week_of_friday(), Duration::minutes(90), None)
            .unwrap();

        // Only 19:00-21:00 is long enough; A's solo hours are too short
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].attendance_percentage, 100);
    }

    #[test]
    fn limit_and_minimum_attendance() {
        use crate::config::ResolverConfig;
        use crate::resolver::Resolver;

        let resolver = Resolver::new(friday_band());
        let top = resolver
            .suggest(BAND, week_of_friday(), Duration::minutes(60), Some(1))
            .unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].attendance_percentage, 100);

        let resolver = Resolver::with_config(
            friday_band(),
            ResolverConfig::default().with_min_attendance(75),
        );
        let quorum = resolver
            .suggest(BAND, week_of_friday(), Duration::minutes(60), None)
            .unwrap();
        assert_eq!(quorum.len(), 1);

        let resolver = Resolver::with_config(
            friday_band(),
            ResolverConfig::default().with_default_limit(Some(2)),
        );
        assert_eq!(
            resolver
                .suggest(BAND, week_of_friday(), Duration::minutes(60), None)
                .unwrap()
                .len(),
            2
        );
    }

    #[test]
    fn candidate_policies() {
        use crate::config::{CandidatePolicy, ResolverConfig};
        use crate::resolver::Resolver;

        let anchored = Resolver::with_config(
            friday_band(),
            ResolverConfig::default().with_policy(CandidatePolicy::Anchored),
        )
        .suggest(BAND, week_of_friday(), Duration::minutes(60), None)
        .unwrap();

        assert_eq!(anchored.len(), 3);
        assert!(anchored.iter().all(|c| c.duration() == Duration::minutes(60)));
        assert_eq!(anchored[0].start, at(friday(), 19, 0));
        assert_eq!(anchored[0].end, at(friday(), 20, 0));

        let sliding = Resolver::with_config(
            friday_band(),
            ResolverConfig::default().with_policy(CandidatePolicy::Sliding { step_minutes: 30 }),
        )
        .suggest(BAND, week_of_friday(), Duration::minutes(60), None)
        .unwrap();

        // 19:00, 19:30, 20:00 with both; 18:00 and 21:00 with A alone
        let starts: Vec<_> = sliding.iter().map(|c| c.start).collect();
        assert_eq!(
            starts,
            vec![
                at(friday(), 19, 0),
                at(friday(), 19, 30),
                at(friday(), 20, 0),
                at(friday(), 18, 0),
                at(friday(), 21, 0),
            ]
        );
    }

    #[test]
    fn scheduled_rehearsals_are_avoided() {
        use crate::config::ResolverConfig;
        use crate::resolver::Resolver;
        use crate::store::ScheduledRehearsal;

        let mut store = friday_band();
        store.schedule_rehearsal(ScheduledRehearsal::new(
            BAND,
            at(friday(), 19, 30),
            at(friday(), 20, 30),
        ));

        let suggestions = Resolver::new(&store)
            .suggest(BAND, week_of_friday(), Duration::minutes(30), None)
            .unwrap();
        assert!(suggestions
            .iter()
            .all(|c| c.end <= at(friday(), 19, 30) || c.start >= at(friday(), 20, 30)));
        assert_eq!(suggestions[0].start, at(friday(), 19, 0));
        assert_eq!(suggestions[0].end, at(friday(), 19, 30));

        let ignoring = Resolver::with_config(
            &store,
            ResolverConfig::default().with_exclude_scheduled(false),
        )
        .suggest(BAND, week_of_friday(), Duration::minutes(30), None)
        .unwrap();
        assert_eq!(ignoring[0].end, at(friday(), 21, 0));
    }

    #[test]
    fn store_failures_surface_as_data_unavailable() {
        use crate::error::SuggestError;
        use crate::resolver::Resolver;
        use crate::store::AvailabilityStore;
        use std::io;

        struct Offline;

        impl AvailabilityStore for Offline {
            type Error = io::Error;

            fn active_members(&self, _: BandId) -> Result<Option<Vec<UserId>>, io::Error> {
                Ok(Some(vec![A]))
            }

            fn recurring_rules(&self, _: UserId, _: BandId) -> Result<Vec<RecurringRule>, io::Error> {
                Err(io::Error::new(io::ErrorKind::ConnectionReset, "connection reset"))
            }

            fn exceptions(
                &self,
                _: UserId,
                _: &DateRange,
            ) -> Result<Vec<AvailabilityException>, io::Error> {
                Ok(vec![])
            }
        }

        let resolver = Resolver::new(Offline);
        let error = resolver
            .suggest(BAND, week_of_friday(), Duration::minutes(60), None)
            .unwrap_err();

        assert!(matches!(error, SuggestError::DataUnavailable(_)));
        assert_eq!(error.code(), "DATA_UNAVAILABLE");

        // Invalid input is rejected before the store is consulted
        let error = resolver
            .suggest(BAND, week_of_friday(), Duration::zero(), None)
            .unwrap_err();
        assert_eq!(error.code(), "INVALID_RANGE");
    }

    #[test]
    fn suggestions_are_idempotent() {
        use crate::resolver::Resolver;

        let mut store = friday_band();
        for (user, weekday, window) in [
            (A, Weekday::Tue, hours(10, 14)),
            (B, Weekday::Tue, hours(12, 16)),
            (A, Weekday::Sat, hours(9, 17)),
            (B, Weekday::Sat, hours(9, 17)),
        ] {
            store.set_recurring_rule(RecurringRule::new(user, BAND, weekday, window));
        }
        let resolver = Resolver::new(store);
        let range = DateRange::new(friday(), friday() + Duration::days(30));

        let first = resolver.suggest(BAND, range, Duration::minutes(45), None).unwrap();
        let second = resolver.suggest(BAND, range, Duration::minutes(45), None).unwrap();

        assert_eq!(first, second);
        assert!(first
            .windows(2)
            .all(|w| w[0].attendance_percentage >= w[1].attendance_percentage));
        assert!(first.iter().all(|c| c.attendance_percentage <= 100));
    }
}
