//! Absolute instants with an optional zone and two families of arithmetic.
//!
//! `add`/`sub` step the UTC value, so "one hour" is always one real hour.
//! `add_local`/`sub_local` step the zone-local wall clock and resolve the
//! result in the zone again, so "one day" keeps the same local time even
//! when the UTC distance is 23 or 25 hours.
//!
//! A `DateTime` without a zone is zone-naive: its local and UTC values
//! coincide and no offset is ever applied.

use std::cmp::Ordering;
use std::fmt;

use chrono::{
    Datelike, NaiveDate, NaiveDateTime, NaiveTime, SubsecRound, TimeDelta, Timelike,
};

use crate::clock::TimeSource;
use crate::error::{PeriodError, Result};
use crate::unit::{days_in_month, TimeUnit};
use crate::zone::{Normalize, Zone};

/// Calendar and clock fields of an instant, in one particular view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fields {
    pub year: i32,
    /// 1-12
    pub month: u32,
    /// 1-31
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
    pub millisecond: u32,
}

impl Fields {
    /// Midnight at the start of the given date.
    pub fn date(year: i32, month: u32, day: u32) -> Fields {
        Fields {
            year,
            month,
            day,
            hour: 0,
            minute: 0,
            second: 0,
            millisecond: 0,
        }
    }

    pub fn with_time(self, hour: u32, minute: u32, second: u32, millisecond: u32) -> Fields {
        Fields {
            hour,
            minute,
            second,
            millisecond,
            ..self
        }
    }

    /// Keep this value's fields from the year down to and including `unit`,
    /// and take all smaller fields from `rest`.
    pub(crate) fn splice(self, rest: Fields, unit: TimeUnit) -> Fields {
        let depth = match unit {
            TimeUnit::Year => 1,
            TimeUnit::Month => 2,
            TimeUnit::Week | TimeUnit::Day => 3,
            TimeUnit::Hour => 4,
            TimeUnit::Minute => 5,
            TimeUnit::Second => 6,
            TimeUnit::Millisecond => 7,
        };
        Fields {
            year: self.year,
            month: if depth >= 2 { self.month } else { rest.month },
            day: if depth >= 3 { self.day } else { rest.day },
            hour: if depth >= 4 { self.hour } else { rest.hour },
            minute: if depth >= 5 { self.minute } else { rest.minute },
            second: if depth >= 6 { self.second } else { rest.second },
            millisecond: if depth >= 7 {
                self.millisecond
            } else {
                rest.millisecond
            },
        }
    }

    fn to_naive(self) -> Result<NaiveDateTime> {
        let invalid = || PeriodError::InvalidArgument(format!("invalid date/time fields: {:?}", self));
        if self.millisecond >= 1000 {
            return Err(invalid());
        }
        let date = NaiveDate::from_ymd_opt(self.year, self.month, self.day).ok_or_else(invalid)?;
        let time = NaiveTime::from_hms_milli_opt(self.hour, self.minute, self.second, self.millisecond)
            .ok_or_else(invalid)?;
        Ok(date.and_time(time))
    }

    fn from_naive(value: &NaiveDateTime) -> Fields {
        Fields {
            year: value.year(),
            month: value.month(),
            day: value.day(),
            hour: value.hour(),
            minute: value.minute(),
            second: value.second(),
            millisecond: value.nanosecond() / 1_000_000,
        }
    }
}

/// A point in time, optionally attached to a zone.
///
/// Equality and ordering compare the instant only; use [`DateTime::identical`]
/// to also compare zones.
#[derive(Debug, Clone, Copy)]
pub struct DateTime {
    utc: NaiveDateTime,
    local: NaiveDateTime,
    zone: Option<Zone>,
}

impl DateTime {
    /// Build from zone-local fields. A local time that falls in a DST gap is
    /// moved forward by the size of the gap.
    ///
    /// # Errors
    /// Returns `PeriodError::InvalidArgument` for fields that do not form a
    /// valid date and time.
    pub fn new(fields: Fields, zone: Option<Zone>) -> Result<DateTime> {
        DateTime::from_local_naive(fields.to_naive()?, zone)
    }

    /// Build from UTC fields. For a zone-naive value the fields are taken as is.
    pub fn from_utc(fields: Fields, zone: Option<Zone>) -> Result<DateTime> {
        DateTime::from_utc_naive(fields.to_naive()?, zone)
    }

    pub fn from_unix_millis(millis: i64, zone: Option<Zone>) -> Result<DateTime> {
        let utc = chrono::DateTime::from_timestamp_millis(millis)
            .ok_or_else(|| PeriodError::OutOfRange(format!("unix millis {}", millis)))?
            .naive_utc();
        DateTime::from_utc_naive(utc, zone)
    }

    /// The current time from `source`, truncated to milliseconds.
    pub fn now(source: &dyn TimeSource, zone: Option<Zone>) -> Result<DateTime> {
        DateTime::from_utc_naive(source.now().naive_utc().trunc_subsecs(3), zone)
    }

    fn from_utc_naive(utc: NaiveDateTime, zone: Option<Zone>) -> Result<DateTime> {
        let local = match zone {
            Some(zone) => shift_seconds(utc, zone.offset_for_utc(&utc).local_minus_utc())?,
            None => utc,
        };
        Ok(DateTime { utc, local, zone })
    }

    pub(crate) fn from_local_naive(local: NaiveDateTime, zone: Option<Zone>) -> Result<DateTime> {
        match zone {
            Some(zone) => {
                let offset = zone.offset_for_local(&local);
                let utc = shift_seconds(local, -offset.local_minus_utc())?;
                DateTime::from_utc_naive(utc, Some(zone))
            }
            None => Ok(DateTime {
                utc: local,
                local,
                zone: None,
            }),
        }
    }

    pub fn zone(&self) -> Option<Zone> {
        self.zone
    }

    /// Zone-local fields.
    pub fn fields(&self) -> Fields {
        Fields::from_naive(&self.local)
    }

    pub fn utc_fields(&self) -> Fields {
        Fields::from_naive(&self.utc)
    }

    pub(crate) fn local_naive(&self) -> NaiveDateTime {
        self.local
    }

    pub fn year(&self) -> i32 {
        self.local.year()
    }

    pub fn month(&self) -> u32 {
        self.local.month()
    }

    pub fn day(&self) -> u32 {
        self.local.day()
    }

    pub fn hour(&self) -> u32 {
        self.local.hour()
    }

    pub fn minute(&self) -> u32 {
        self.local.minute()
    }

    pub fn second(&self) -> u32 {
        self.local.second()
    }

    pub fn millisecond(&self) -> u32 {
        self.local.nanosecond() / 1_000_000
    }

    /// Milliseconds since 1970-01-01T00:00:00Z (the local fields for a
    /// zone-naive value).
    pub fn unix_millis(&self) -> i64 {
        self.utc.and_utc().timestamp_millis()
    }

    /// Step the UTC value.
    pub fn add(&self, amount: i64, unit: TimeUnit) -> Result<DateTime> {
        DateTime::from_utc_naive(step(self.utc, amount, unit)?, self.zone)
    }

    pub fn sub(&self, amount: i64, unit: TimeUnit) -> Result<DateTime> {
        self.add(negate(amount)?, unit)
    }

    /// Step the local wall clock, then resolve the result in the zone. A
    /// result inside a DST gap is pushed out of it in the direction of the step.
    pub fn add_local(&self, amount: i64, unit: TimeUnit) -> Result<DateTime> {
        let local = step(self.local, amount, unit)?;
        match self.zone {
            Some(zone) => {
                let direction = if amount >= 0 {
                    Normalize::Up
                } else {
                    Normalize::Down
                };
                DateTime::from_local_naive(zone.normalize_local(local, direction), Some(zone))
            }
            None => DateTime::from_local_naive(local, None),
        }
    }

    pub fn sub_local(&self, amount: i64, unit: TimeUnit) -> Result<DateTime> {
        self.add_local(negate(amount)?, unit)
    }

    /// Elapsed time from `other` to `self`.
    pub fn diff(&self, other: &DateTime) -> TimeDelta {
        self.utc - other.utc
    }

    /// The same instant in another zone. `None` drops the zone and keeps the
    /// local fields.
    ///
    /// # Errors
    /// Returns `PeriodError::InvalidArgument` when asked to attach a zone to
    /// a zone-naive value.
    pub fn to_zone(&self, zone: Option<Zone>) -> Result<DateTime> {
        match (self.zone, zone) {
            (_, None) => Ok(DateTime {
                utc: self.local,
                local: self.local,
                zone: None,
            }),
            (Some(_), Some(target)) => DateTime::from_utc_naive(self.utc, Some(target)),
            (None, Some(_)) => Err(PeriodError::InvalidArgument(
                "cannot convert an unaware date to an aware date".to_string(),
            )),
        }
    }

    /// Same instant and identical zone.
    pub fn identical(&self, other: &DateTime) -> bool {
        self == other && self.zone == other.zone
    }

    /// `2014-01-01T12:00:00.000+01:00`, without offset when zone-naive.
    pub fn to_iso_string(&self) -> String {
        let stamp = self.local.format("%Y-%m-%dT%H:%M:%S%.3f");
        match self.zone {
            Some(zone) => format!("{}{}", stamp, zone.offset_for_utc(&self.utc)),
            None => stamp.to_string(),
        }
    }
}

impl PartialEq for DateTime {
    fn eq(&self, other: &Self) -> bool {
        self.utc == other.utc
    }
}

impl Eq for DateTime {}

impl PartialOrd for DateTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DateTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.utc.cmp(&other.utc)
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.local.format("%Y-%m-%dT%H:%M:%S%.3f"))?;
        if let Some(zone) = self.zone {
            write!(f, " {}", zone)?;
        }
        Ok(())
    }
}

fn negate(amount: i64) -> Result<i64> {
    amount
        .checked_neg()
        .ok_or_else(|| PeriodError::OutOfRange(format!("cannot negate {}", amount)))
}

fn shift_seconds(value: NaiveDateTime, seconds: i32) -> Result<NaiveDateTime> {
    value
        .checked_add_signed(TimeDelta::seconds(i64::from(seconds)))
        .ok_or_else(|| PeriodError::OutOfRange(format!("{} shifted by {}s", value, seconds)))
}

/// Add `amount` units to a civil value. Months and years clamp the day to
/// the length of the target month.
fn step(value: NaiveDateTime, amount: i64, unit: TimeUnit) -> Result<NaiveDateTime> {
    let out_of_range = || PeriodError::OutOfRange(format!("{} + {} {}", value, amount, unit));
    match unit.fixed_millis() {
        Some(millis) => {
            let delta = amount
                .checked_mul(millis)
                .and_then(TimeDelta::try_milliseconds)
                .ok_or_else(out_of_range)?;
            value.checked_add_signed(delta).ok_or_else(out_of_range)
        }
        None => {
            let months = if unit == TimeUnit::Year {
                amount.checked_mul(12).ok_or_else(out_of_range)?
            } else {
                amount
            };
            let total = (i64::from(value.year()) * 12 + i64::from(value.month0()))
                .checked_add(months)
                .ok_or_else(out_of_range)?;
            let year = i32::try_from(total.div_euclid(12)).map_err(|_| out_of_range())?;
            // rem_euclid(12) is always within 0..12
            let month = total.rem_euclid(12) as u32 + 1;
            let day = value.day().min(days_in_month(year, month));
            NaiveDate::from_ymd_opt(year, month, day)
                .map(|date| date.and_time(value.time()))
                .ok_or_else(out_of_range)
        }
    }
}
