//! The band availability document served by `GET /availability/band/:bandId`,
//! and its conversion into a [`MemoryStore`] the resolver can query.

use crate::calendar::Minute;
use crate::member::{AvailabilityException, RecurringRule};
use crate::store::{MembershipStatus, MemoryStore};
use crate::time::TimeRange;
use crate::{BandId, UserId};
use chrono::NaiveDate;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upper bound on members in one document
pub const MAX_MEMBERS: usize = 100;
/// Upper bound on exceptions per member, a year's worth of dates
pub const MAX_EXCEPTIONS: usize = 366;

#[derive(Error, Debug, Eq, PartialEq)]
pub enum ValidationError {
    #[error("Unsupported length of input. Expected at most {expected}, got {found}")]
    UnsupportedLength { expected: usize, found: usize },
    #[error("Member {user} is listed more than once")]
    DuplicateMember { user: UserId },
    #[error("Day of week must be within 0-6, member {user} has a rule for day {day}")]
    InvalidDayOfWeek { user: UserId, day: u8 },
    #[error("Member {user} has more than one regular availability for day {day}")]
    DuplicateRule { user: UserId, day: u8 },
    #[error("Member {user} has more than one exception on {date}")]
    DuplicateException { user: UserId, date: NaiveDate },
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserName {
    pub first_name: String,
    pub last_name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegularAvailabilityRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub day_of_week: u8,
    #[serde(with = "time_of_day")]
    pub start_time: Minute,
    #[serde(with = "time_of_day")]
    pub end_time: Minute,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExceptionRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub exception_date: NaiveDate,
    pub is_available: bool,
    #[serde(default, with = "optional_time_of_day")]
    pub start_time: Option<Minute>,
    #[serde(default, with = "optional_time_of_day")]
    pub end_time: Option<Minute>,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberAvailabilityRecord {
    pub user_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserName>,
    #[serde(default)]
    pub regular_availability: Vec<RegularAvailabilityRecord>,
    #[serde(default)]
    pub exceptions: Vec<ExceptionRecord>,
}

impl ExceptionRecord {
    fn window(&self) -> Option<TimeRange<Minute>> {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => Some(TimeRange::new(start, end)),
            (Some(start), None) => Some(TimeRange::new(start, crate::calendar::MINUTES_PER_DAY)),
            (None, Some(end)) => Some(TimeRange::new(0, end)),
            (None, None) => None,
        }
    }
}

/// Every member of one band with their regular availability and exceptions.
/// All listed members are treated as active.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BandAvailability {
    pub band_id: BandId,
    pub members: Vec<MemberAvailabilityRecord>,
}

impl BandAvailability {
    pub fn new(band_id: BandId, members: Vec<MemberAvailabilityRecord>) -> Self {
        BandAvailability { band_id, members }
    }

    /// Parses the JSON array served for the band
    pub fn from_json(band_id: BandId, json: &str) -> serde_json::Result<Self> {
        Ok(BandAvailability::new(band_id, serde_json::from_str(json)?))
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.members.len() > MAX_MEMBERS {
            return Err(ValidationError::UnsupportedLength {
                expected: MAX_MEMBERS,
                found: self.members.len(),
            });
        }

        if let Some((_, user)) = self
            .members
            .iter()
            .map(|m| m.user_id)
            .sorted_unstable()
            .tuple_windows()
            .find(|(last, next)| last == next)
        {
            return Err(ValidationError::DuplicateMember { user });
        }

        for member in self.members.iter() {
            let user = member.user_id;

            if let Some(rule) = member
                .regular_availability
                .iter()
                .find(|rule| rule.day_of_week > 6)
            {
                return Err(ValidationError::InvalidDayOfWeek {
                    user,
                    day: rule.day_of_week,
                });
            }

            if let Some((_, day)) = member
                .regular_availability
                .iter()
                .map(|rule| rule.day_of_week)
                .sorted_unstable()
                .tuple_windows()
                .find(|(last, next)| last == next)
            {
                return Err(ValidationError::DuplicateRule { user, day });
            }

            if member.exceptions.len() > MAX_EXCEPTIONS {
                return Err(ValidationError::UnsupportedLength {
                    expected: MAX_EXCEPTIONS,
                    found: member.exceptions.len(),
                });
            }

            if let Some((_, date)) = member
                .exceptions
                .iter()
                .map(|exception| exception.exception_date)
                .sorted_unstable()
                .tuple_windows()
                .find(|(last, next)| last == next)
            {
                return Err(ValidationError::DuplicateException { user, date });
            }
        }

        Ok(())
    }

    /// Validates the document and loads it into a fresh store
    pub fn into_store(self) -> Result<MemoryStore, ValidationError> {
        self.validate()?;

        let band_id = self.band_id;
        let mut store = MemoryStore::new();
        store.add_band(band_id);

        for member in self.members {
            let user_id = member.user_id;
            store.set_membership(band_id, user_id, MembershipStatus::Active);

            for rule in member.regular_availability {
                store.set_recurring_rule(RecurringRule {
                    user_id,
                    band_id,
                    day_of_week: rule.day_of_week,
                    window: TimeRange::new(rule.start_time, rule.end_time),
                });
            }

            for exception in member.exceptions {
                store.set_exception(AvailabilityException {
                    user_id,
                    date: exception.exception_date,
                    is_available: exception.is_available,
                    window: exception.window(),
                    reason: exception.reason,
                });
            }
        }

        Ok(store)
    }
}

/// `"HH:MM"` / `"HH:MM:SS"` strings as minutes since midnight
pub mod time_of_day {
    use crate::calendar::{format_time_of_day, parse_time_of_day, Minute};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Minute, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format_time_of_day(*value))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Minute, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        parse_time_of_day(&value).ok_or_else(|| {
            de::Error::invalid_value(de::Unexpected::Str(&value), &"a time of day as HH:MM")
        })
    }
}

/// Nullable variant of [`time_of_day`]
pub mod optional_time_of_day {
    use crate::calendar::{format_time_of_day, parse_time_of_day, Minute};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<Minute>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(minute) => serializer.serialize_str(&format_time_of_day(*minute)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Minute>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(None),
            Some(value) if value.trim().is_empty() => Ok(None),
            Some(value) => parse_time_of_day(&value).map(Some).ok_or_else(|| {
                de::Error::invalid_value(de::Unexpected::Str(&value), &"a time of day as HH:MM")
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::DateRange;
    use crate::store::AvailabilityStore;
    use uuid::Uuid;

    const BAND_AVAILABILITY: &str = r#"[
        {
            "userId": "123e4567-e89b-12d3-a456-426614174000",
            "user": { "firstName": "John", "lastName": "Doe" },
            "regularAvailability": [
                { "id": "123e4567-e89b-12d3-a456-426614174001", "dayOfWeek": 1, "startTime": "18:00", "endTime": "21:00" },
                { "id": "123e4567-e89b-12d3-a456-426614174002", "dayOfWeek": 3, "startTime": "19:00", "endTime": "22:00" }
            ],
            "exceptions": [
                { "id": "123e4567-e89b-12d3-a456-426614174003", "exceptionDate": "2025-06-20", "isAvailable": false, "reason": "Family commitment" }
            ]
        },
        {
            "userId": "223e4567-e89b-12d3-a456-426614174000",
            "user": { "firstName": "Jane", "lastName": "Smith" },
            "regularAvailability": [
                { "dayOfWeek": 1, "startTime": "19:00:00", "endTime": "21:00:00" },
                { "dayOfWeek": 5, "startTime": "18:00", "endTime": "23:00" }
            ],
            "exceptions": []
        }
    ]"#;

    fn band() -> BandId {
        Uuid::from_u128(42)
    }

    #[test]
    fn parses_band_availability() {
        let doc = BandAvailability::from_json(band(), BAND_AVAILABILITY).unwrap();

        assert_eq!(doc.members.len(), 2);
        assert_eq!(doc.members[0].regular_availability[0].start_time, 1080);
        assert_eq!(doc.members[1].regular_availability[0].end_time, 1260);
        assert_eq!(
            doc.members[0].exceptions[0].reason.as_deref(),
            Some("Family commitment")
        );
        assert_eq!(doc.members[0].exceptions[0].start_time, None);
        assert!(doc.validate().is_ok());
    }

    #[test]
    fn loads_into_store() {
        let store = BandAvailability::from_json(band(), BAND_AVAILABILITY)
            .unwrap()
            .into_store()
            .unwrap();
        let john: UserId = "123e4567-e89b-12d3-a456-426614174000".parse().unwrap();

        assert_eq!(store.active_members(band()).unwrap().map(|m| m.len()), Some(2));
        assert_eq!(store.recurring_rules(john, band()).unwrap().len(), 2);

        let june = DateRange::new(
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 6, 30).unwrap(),
        );
        let exceptions = store.exceptions(john, &june).unwrap();
        assert_eq!(exceptions.len(), 1);
        assert!(!exceptions[0].is_available);
    }

    #[test]
    fn rejects_duplicate_rules() {
        let mut doc = BandAvailability::from_json(band(), BAND_AVAILABILITY).unwrap();
        let mut rule = doc.members[1].regular_availability[0].clone();
        rule.start_time = 600;
        doc.members[1].regular_availability.push(rule);

        assert_eq!(
            doc.validate(),
            Err(ValidationError::DuplicateRule {
                user: doc.members[1].user_id,
                day: 1
            })
        );
    }

    #[test]
    fn rejects_bad_weekday_and_duplicate_members() {
        let mut doc = BandAvailability::from_json(band(), BAND_AVAILABILITY).unwrap();
        doc.members[0].regular_availability[0].day_of_week = 7;
        assert!(matches!(
            doc.validate(),
            Err(ValidationError::InvalidDayOfWeek { day: 7, .. })
        ));

        let mut doc = BandAvailability::from_json(band(), BAND_AVAILABILITY).unwrap();
        let copy = doc.members[0].clone();
        doc.members.push(copy);
        assert!(matches!(
            doc.validate(),
            Err(ValidationError::DuplicateMember { .. })
        ));
    }

    #[test]
    fn rejects_malformed_times() {
        let json = r#"[{ "userId": "123e4567-e89b-12d3-a456-426614174000",
            "regularAvailability": [{ "dayOfWeek": 1, "startTime": "6pm", "endTime": "21:00" }] }]"#;

        assert!(BandAvailability::from_json(band(), json).is_err());
    }
}
