//! Data-access seam for the resolver.
//!
//! [`AvailabilityStore`] is what the resolver needs from persistence;
//! [`MemoryStore`] is an in-process implementation holding the same
//! uniqueness rules the relational schema enforces.

use crate::calendar::{clip_to_date, DateRange, Minute};
use crate::member::{AvailabilityException, RecurringRule};
use crate::time::TimeRange;
use crate::{BandId, UserId};
use chrono::{NaiveDate, NaiveDateTime};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::convert::Infallible;
use std::error::Error as StdError;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum MembershipStatus {
    Active,
    Inactive,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Membership {
    pub band_id: BandId,
    pub user_id: UserId,
    pub status: MembershipStatus,
}

/// A rehearsal already on the band's calendar
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct ScheduledRehearsal {
    pub band_id: BandId,
    #[cfg_attr(feature = "serde", serde(rename = "startDatetime"))]
    pub start: NaiveDateTime,
    #[cfg_attr(feature = "serde", serde(rename = "endDatetime"))]
    pub end: NaiveDateTime,
}

impl ScheduledRehearsal {
    pub fn new(band_id: BandId, start: NaiveDateTime, end: NaiveDateTime) -> Self {
        ScheduledRehearsal {
            band_id,
            start,
            end,
        }
    }

    /// The minutes of `date` this rehearsal occupies
    pub fn clip_to(&self, date: NaiveDate) -> Option<TimeRange<Minute>> {
        clip_to_date(date, self.start, self.end)
    }

    pub fn touches(&self, range: &DateRange) -> bool {
        self.start.date() <= range.to && range.from <= self.end.date()
    }
}

pub trait AvailabilityStore {
    type Error: StdError + Send + Sync + 'static;

    /// Active members of the band, or `None` when the band does not exist
    fn active_members(&self, band_id: BandId) -> Result<Option<Vec<UserId>>, Self::Error>;

    /// The member's weekly rules for this band
    fn recurring_rules(
        &self,
        user_id: UserId,
        band_id: BandId,
    ) -> Result<Vec<RecurringRule>, Self::Error>;

    /// The member's exceptions dated within `range`
    fn exceptions(
        &self,
        user_id: UserId,
        range: &DateRange,
    ) -> Result<Vec<AvailabilityException>, Self::Error>;

    /// Rehearsals already booked for the band that touch `range`
    fn scheduled_rehearsals(
        &self,
        _band_id: BandId,
        _range: &DateRange,
    ) -> Result<Vec<ScheduledRehearsal>, Self::Error> {
        Ok(Vec::new())
    }
}

impl<S> AvailabilityStore for &S
where
    S: AvailabilityStore + ?Sized,
{
    type Error = S::Error;

    fn active_members(&self, band_id: BandId) -> Result<Option<Vec<UserId>>, Self::Error> {
        (**self).active_members(band_id)
    }

    fn recurring_rules(
        &self,
        user_id: UserId,
        band_id: BandId,
    ) -> Result<Vec<RecurringRule>, Self::Error> {
        (**self).recurring_rules(user_id, band_id)
    }

    fn exceptions(
        &self,
        user_id: UserId,
        range: &DateRange,
    ) -> Result<Vec<AvailabilityException>, Self::Error> {
        (**self).exceptions(user_id, range)
    }

    fn scheduled_rehearsals(
        &self,
        band_id: BandId,
        range: &DateRange,
    ) -> Result<Vec<ScheduledRehearsal>, Self::Error> {
        (**self).scheduled_rehearsals(band_id, range)
    }
}

#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    bands: BTreeMap<BandId, Vec<Membership>>,
    rules: HashMap<(UserId, BandId, u8), RecurringRule>,
    exceptions: HashMap<(UserId, NaiveDate), AvailabilityException>,
    rehearsals: Vec<ScheduledRehearsal>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    /// Registers a band with no members yet
    pub fn add_band(&mut self, band_id: BandId) -> &mut Self {
        self.bands.entry(band_id).or_default();
        self
    }

    /// Adds the user to the band, or updates the status of an existing
    /// membership. Members keep the order they first joined in.
    pub fn set_membership(
        &mut self,
        band_id: BandId,
        user_id: UserId,
        status: MembershipStatus,
    ) -> &mut Self {
        let members = self.bands.entry(band_id).or_default();
        match members.iter_mut().find(|m| m.user_id == user_id) {
            Some(membership) => membership.status = status,
            None => members.push(Membership {
                band_id,
                user_id,
                status,
            }),
        }
        self
    }

    /// Sets the member's rule for the rule's weekday, returning the one it replaced
    pub fn set_recurring_rule(&mut self, rule: RecurringRule) -> Option<RecurringRule> {
        self.rules
            .insert((rule.user_id, rule.band_id, rule.day_of_week), rule)
    }

    /// Sets the member's exception for its date, returning the one it replaced
    pub fn set_exception(
        &mut self,
        exception: AvailabilityException,
    ) -> Option<AvailabilityException> {
        self.exceptions
            .insert((exception.user_id, exception.date), exception)
    }

    pub fn schedule_rehearsal(&mut self, rehearsal: ScheduledRehearsal) -> &mut Self {
        self.rehearsals.push(rehearsal);
        self
    }

    pub fn memberships(&self, band_id: BandId) -> &[Membership] {
        self.bands.get(&band_id).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl AvailabilityStore for MemoryStore {
    type Error = Infallible;

    fn active_members(&self, band_id: BandId) -> Result<Option<Vec<UserId>>, Self::Error> {
        Ok(self.bands.get(&band_id).map(|members| {
            members
                .iter()
                .filter(|m| m.status == MembershipStatus::Active)
                .map(|m| m.user_id)
                .collect()
        }))
    }

    fn recurring_rules(
        &self,
        user_id: UserId,
        band_id: BandId,
    ) -> Result<Vec<RecurringRule>, Self::Error> {
        Ok((0..7)
            .filter_map(|day| self.rules.get(&(user_id, band_id, day)).cloned())
            .collect())
    }

    fn exceptions(
        &self,
        user_id: UserId,
        range: &DateRange,
    ) -> Result<Vec<AvailabilityException>, Self::Error> {
        Ok(range
            .days()
            .filter_map(|date| self.exceptions.get(&(user_id, date)).cloned())
            .collect())
    }

    fn scheduled_rehearsals(
        &self,
        band_id: BandId,
        range: &DateRange,
    ) -> Result<Vec<ScheduledRehearsal>, Self::Error> {
        Ok(self
            .rehearsals
            .iter()
            .filter(|r| r.band_id == band_id && r.touches(range))
            .cloned()
            .collect())
    }
}
