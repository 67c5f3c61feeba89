//! Recurring periods: a start instant repeated every interval, forever.
//!
//! A [`Period`] answers two questions about its occurrence sequence: which
//! occurrence comes first after a given instant ([`Period::find_first`]),
//! and where the neighbours of a known occurrence are ([`Period::find_next`],
//! [`Period::find_prev`]).
//!
//! The interval, start and DST policy are normalized once at construction:
//!
//! - whole multiples fold into the next unit (1000 ms → 1 s, 60 s → 1 min,
//!   60 min → 1 h, 24 h → 1 day, 12 months → 1 year) and weeks become days;
//! - the DST policy collapses to `RegularIntervals` when the start zone has
//!   no DST, since both policies then produce the same sequence;
//! - for monthly periods, and yearly periods starting in February, a start
//!   day above 28 is clamped to 28 so month arithmetic never produces an
//!   invalid date. Every answer gets the original day back, capped at the
//!   length of its month: a period starting Jan 31 hits Feb 28, Mar 31, Apr 30.
//!
//! Months and years are counted on the wall clock with `RegularLocalTime`
//! and on the UTC calendar with `RegularIntervals`.
//!
//! With `RegularLocalTime`, sub-day periods restart at the start's time of
//! day every day, so an interval that does not divide the day leaves a
//! shorter last slot before the next day's first occurrence. Slots whose
//! wall-clock time falls in a DST gap are skipped.

use std::fmt;
use std::ops::Range;

use chrono::{NaiveDateTime, TimeDelta};
use tracing::{debug, trace};

use crate::clock::TimeSource;
use crate::datetime::{DateTime, Fields};
use crate::dst::PeriodDst;
use crate::duration::Duration;
use crate::error::{PeriodError, Result};
use crate::unit::{days_in_month, TimeUnit};
use crate::zone::{Zone, ZoneKind};

const MILLIS_PER_DAY: i64 = 86_400_000;

/// A repeating time period: a start instant and an interval.
///
/// Equality (`==`, [`Period::equals`]) compares the start instant and the
/// normalized interval and DST policy, so a period of 24 hours equals a
/// period of one day with the same start.
#[derive(Debug, Clone)]
pub struct Period {
    start: DateTime,
    interval: Duration,
    dst: PeriodDst,
    normalized_start: DateTime,
    normalized_interval: Duration,
    normalized_dst: PeriodDst,
}

impl Period {
    /// Create a period. `dst` defaults to `RegularLocalTime` and only has an
    /// effect when the start zone has DST.
    ///
    /// # Errors
    /// Returns `PeriodError::UnsupportedConfiguration` for a regular local
    /// time period in a DST zone whose normalized unit is below a day, when
    /// the amount is neither smaller than the next unit nor a divisor of the
    /// day (121 seconds fails; 90 minutes and 90 seconds are fine).
    pub fn new(start: DateTime, interval: Duration, dst: Option<PeriodDst>) -> Result<Period> {
        let dst = dst.unwrap_or_default();
        let normalized_interval = normalize_interval(interval)?;
        let relevant = dst_relevant(&start);
        if relevant && dst == PeriodDst::RegularLocalTime {
            check_local_time_interval(&normalized_interval)?;
        }
        let normalized_dst = if relevant {
            dst
        } else {
            PeriodDst::RegularIntervals
        };
        let normalized_start = clamp_day(
            &start,
            normalized_interval.unit(),
            false,
            normalized_dst,
        )?;

        debug!(
            start = %start,
            interval = %interval,
            normalized_interval = %normalized_interval,
            dst = %normalized_dst,
            "created period"
        );

        Ok(Period {
            start,
            interval,
            dst,
            normalized_start,
            normalized_interval,
            normalized_dst,
        })
    }

    /// Create a period from an amount and a unit.
    ///
    /// # Errors
    /// Returns `PeriodError::InvalidArgument` if `amount` is not positive,
    /// otherwise as [`Period::new`].
    pub fn from_amount(
        start: DateTime,
        amount: i64,
        unit: TimeUnit,
        dst: Option<PeriodDst>,
    ) -> Result<Period> {
        Period::new(start, Duration::new(amount, unit)?, dst)
    }

    pub fn start(&self) -> DateTime {
        self.start
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    #[deprecated(note = "use `interval().amount()`")]
    pub fn amount(&self) -> i64 {
        self.interval.amount()
    }

    #[deprecated(note = "use `interval().unit()`")]
    pub fn unit(&self) -> TimeUnit {
        self.interval.unit()
    }

    pub fn dst(&self) -> PeriodDst {
        self.dst
    }

    /// The interval after folding into larger units.
    pub fn normalized_interval(&self) -> Duration {
        self.normalized_interval
    }

    /// The DST policy actually applied.
    pub fn normalized_dst(&self) -> PeriodDst {
        self.normalized_dst
    }

    /// The first occurrence strictly after `from`, expressed in `from`'s zone.
    /// `from` need not be on a boundary.
    ///
    /// # Errors
    /// Returns `PeriodError::InvalidArgument` if exactly one of `from` and
    /// the start has a zone.
    pub fn find_first(&self, from: &DateTime) -> Result<DateTime> {
        self.check_awareness(from, "from date")?;
        if *from < self.start {
            return self.start.to_zone(from.zone());
        }

        let amount = self.normalized_interval.amount();
        let unit = self.normalized_interval.unit();
        if unit == TimeUnit::Week {
            return Err(unexpected_unit(unit));
        }
        let normal_from = clamp_day(
            &from.to_zone(self.start.zone())?,
            unit,
            true,
            self.normalized_dst,
        )?;

        let approx = match (amount == 1, self.normalized_dst) {
            (true, PeriodDst::RegularIntervals) => {
                let fields = normal_from
                    .utc_fields()
                    .splice(self.normalized_start.utc_fields(), unit);
                DateTime::from_utc(fields, self.normalized_start.zone())?
            }
            (true, PeriodDst::RegularLocalTime) => {
                let fields = normal_from
                    .fields()
                    .splice(self.normalized_start.fields(), unit);
                DateTime::new(fields, self.normalized_start.zone())?
            }
            (false, PeriodDst::RegularIntervals) => self.approx_utc(&normal_from, amount, unit)?,
            (false, PeriodDst::RegularLocalTime) => self.approx_local(&normal_from, amount, unit)?,
        };

        let result = self.step_past(approx, from)?.to_zone(from.zone())?;
        trace!(from = %from, result = %result, "found first occurrence");
        Ok(result)
    }

    /// The occurrence after `prev`. Same as `find_next_by(prev, 1)`.
    pub fn find_next(&self, prev: &DateTime) -> Result<Option<DateTime>> {
        self.find_next_by(prev, 1)
    }

    /// `prev` moved by `count` intervals, in `prev`'s zone.
    ///
    /// `prev` must be an occurrence; this steps without searching, so the
    /// answer for any other instant is meaningless. Returns `None` when
    /// stepping backwards from an instant at or before the start.
    pub fn find_next_by(&self, prev: &DateTime, count: i64) -> Result<Option<DateTime>> {
        self.check_awareness(prev, "prev date")?;
        if count < 0 && *prev <= self.start {
            return Ok(None);
        }
        let normalized_prev = clamp_day(
            &prev.to_zone(self.start.zone())?,
            self.normalized_interval.unit(),
            true,
            self.normalized_dst,
        )?;
        let next = self.settle(&self.advance(&normalized_prev, count)?)?;
        Ok(Some(next.to_zone(prev.zone())?))
    }

    pub fn find_prev(&self, next: &DateTime) -> Result<Option<DateTime>> {
        self.find_prev_by(next, 1)
    }

    /// `next` moved back by `count` intervals. `None` if that would go
    /// before the start.
    pub fn find_prev_by(&self, next: &DateTime, count: i64) -> Result<Option<DateTime>> {
        let back = count
            .checked_neg()
            .ok_or_else(|| PeriodError::InvalidArgument(format!("count out of range: {}", count)))?;
        self.find_next_by(next, back)
    }

    /// Whether `occurrence` is exactly on a period boundary. `None` is not.
    ///
    /// This runs a full [`Period::find_first`] search.
    pub fn is_boundary(&self, occurrence: Option<&DateTime>) -> Result<bool> {
        let Some(occurrence) = occurrence else {
            return Ok(false);
        };
        self.check_awareness(occurrence, "occurrence")?;
        let just_before = occurrence.sub(1, TimeUnit::Millisecond)?;
        Ok(self.find_first(&just_before)? == *occurrence)
    }

    /// The first occurrence after the current time of `source`.
    pub fn find_upcoming(&self, source: &dyn TimeSource) -> Result<DateTime> {
        let now = DateTime::now(source, self.start.zone())?;
        self.find_first(&now)
    }

    /// Same start instant, same normalized interval and DST policy.
    pub fn equals(&self, other: &Period) -> bool {
        self.start == other.start
            && self.normalized_interval == other.normalized_interval
            && self.normalized_dst == other.normalized_dst
    }

    /// Constructed from identical arguments.
    pub fn identical(&self, other: &Period) -> bool {
        self.start.identical(&other.start)
            && self.interval == other.interval
            && self.dst == other.dst
    }

    /// e.g. `2014-01-01T12:00:00.000+01:00/P1H`.
    pub fn to_iso_string(&self) -> String {
        format!(
            "{}/{}",
            self.start.to_iso_string(),
            self.interval.to_iso_string()
        )
    }

    pub fn inspect(&self) -> String {
        format!("[Period: {}]", self)
    }

    /// Approximate occurrence at or before the answer, for UTC stepping.
    fn approx_utc(&self, normal_from: &DateTime, amount: i64, unit: TimeUnit) -> Result<DateTime> {
        let start = &self.normalized_start;
        let periods = match unit {
            // the -1 keeps the estimate below the answer when the start's
            // day-of-month is later than the from date's
            TimeUnit::Month => {
                let (f, s) = (normal_from.utc_fields(), start.utc_fields());
                months_between(&f, &s).saturating_sub(1).max(0) / amount
            }
            TimeUnit::Year => {
                let (f, s) = (normal_from.utc_fields(), start.utc_fields());
                (i64::from(f.year - s.year) - 1).max(0) / amount
            }
            _ => elapsed_periods(normal_from, start, unit, amount)?,
        };
        start.add(checked_mul(periods, amount)?, unit)
    }

    /// Approximate occurrence at or before the answer, for local stepping.
    fn approx_local(&self, normal_from: &DateTime, amount: i64, unit: TimeUnit) -> Result<DateTime> {
        let start = &self.normalized_start;
        let zone = start.zone();
        let (f, s) = (normal_from.fields(), start.fields());
        match unit {
            TimeUnit::Millisecond | TimeUnit::Second | TimeUnit::Minute => {
                match phase_unit(unit, amount) {
                    // same phase in every larger unit: back up one of those
                    Some(larger) => DateTime::new(f.splice(s, larger), zone)?.sub_local(1, larger),
                    None => self.first_day_slot(normal_from, amount, unit),
                }
            }
            TimeUnit::Hour => self.first_day_slot(normal_from, amount, unit),
            TimeUnit::Day => {
                let periods = elapsed_periods(normal_from, start, unit, amount)?;
                start.add_local(checked_mul(periods, amount)?, unit)
            }
            TimeUnit::Month => {
                let periods = months_between(&f, &s).saturating_sub(1).max(0) / amount;
                let months = checked_mul(periods, amount)? + i64::from(s.month) - 1;
                let year = i32::try_from(i64::from(s.year) + months.div_euclid(12))
                    .map_err(|_| out_of_range(unit))?;
                // start day is at most 28 here, valid in every month
                let month = months.rem_euclid(12) as u32 + 1;
                DateTime::new(Fields { year, month, ..s }, zone)
            }
            TimeUnit::Year => {
                let periods = (i64::from(f.year - s.year) - 1).max(0) / amount;
                let year = i32::try_from(i64::from(s.year) + checked_mul(periods, amount)?)
                    .map_err(|_| out_of_range(unit))?;
                DateTime::new(Fields { year, ..s }, zone)
            }
            TimeUnit::Week => Err(unexpected_unit(unit)),
        }
    }

    /// The first slot after `from` of a sub-day regular local time period.
    ///
    /// Slots are laid out on the wall clock from the start's time of day,
    /// restarting every day, and only the slots that get compared are
    /// resolved to instants.
    fn first_day_slot(&self, from: &DateTime, amount: i64, unit: TimeUnit) -> Result<DateTime> {
        let from_local = from.local_naive();
        let time_of_day = self.normalized_start.local_naive().time();
        let step = checked_mul(unit.fixed_millis().ok_or_else(|| unexpected_unit(unit))?, amount)?;
        let slots = (units_per_day(unit)? + amount - 1) / amount;

        // a day's slots end before the next day's first one, so the answer
        // lies on the day before `from`, on its day or on the day after
        let mut date = from_local.date().pred_opt().ok_or_else(|| out_of_range(unit))?;
        for _ in 0..3 {
            let base = date.and_time(time_of_day);
            let first = if from_local < base {
                0
            } else {
                (from_local - base).num_milliseconds() / step + 1
            };
            if let Some(slot) = self.search_slots(base, first..slots, step, unit, from)? {
                return Ok(slot);
            }
            date = date.succ_opt().ok_or_else(|| out_of_range(unit))?;
        }
        Err(PeriodError::OutOfRange(format!(
            "no slot of {} after {}",
            self.normalized_interval, from
        )))
    }

    /// The first slot in `indexes` after `from`. Skipped slots only occur
    /// at the front of the range, so seconds and milliseconds can binary
    /// search it; minutes and hours step through.
    fn search_slots(
        &self,
        base: NaiveDateTime,
        indexes: Range<i64>,
        step: i64,
        unit: TimeUnit,
        from: &DateTime,
    ) -> Result<Option<DateTime>> {
        if matches!(unit, TimeUnit::Minute | TimeUnit::Hour) {
            for index in indexes {
                match self.slot(base, index, step)? {
                    Some(slot) if slot > *from => return Ok(Some(slot)),
                    _ => {}
                }
            }
            return Ok(None);
        }

        let (mut low, mut high) = (indexes.start, indexes.end);
        let mut probes = 0_u32;
        while low < high {
            probes += 1;
            let mid = low + (high - low) / 2;
            match self.slot(base, mid, step)? {
                Some(slot) if slot > *from => high = mid,
                _ => low = mid + 1,
            }
        }
        trace!(probes, slot = low, "slot search");
        if low >= indexes.end {
            return Ok(None);
        }
        self.slot(base, low, step)
    }

    /// Slot `index` of the day starting at `base`, or `None` when its
    /// wall-clock time does not exist.
    fn slot(&self, base: NaiveDateTime, index: i64, step: i64) -> Result<Option<DateTime>> {
        let zone = self.normalized_start.zone();
        let local = TimeDelta::try_milliseconds(checked_mul(index, step)?)
            .and_then(|offset| base.checked_add_signed(offset))
            .ok_or_else(|| PeriodError::OutOfRange(format!("slot {} after {}", index, base)))?;
        if zone.is_some_and(|zone| zone.is_gap(&local)) {
            return Ok(None);
        }
        DateTime::from_local_naive(local, zone).map(Some)
    }

    fn step_past(&self, mut approx: DateTime, from: &DateTime) -> Result<DateTime> {
        loop {
            let settled = self.settle(&approx)?;
            if settled > *from {
                return Ok(settled);
            }
            approx = self.advance(&approx, 1)?;
        }
    }

    fn advance(&self, from: &DateTime, count: i64) -> Result<DateTime> {
        let amount = checked_mul(self.normalized_interval.amount(), count)?;
        let unit = self.normalized_interval.unit();
        match self.normalized_dst {
            PeriodDst::RegularIntervals => from.add(amount, unit),
            PeriodDst::RegularLocalTime => from.add_local(amount, unit),
        }
    }

    /// Express `d` in the start zone and restore the start's day-of-month.
    fn settle(&self, d: &DateTime) -> Result<DateTime> {
        let d = d.to_zone(self.start.zone())?;
        let start_day = calendar_fields(&self.start, self.normalized_dst).day;
        let monthly = matches!(
            self.normalized_interval.unit(),
            TimeUnit::Month | TimeUnit::Year
        );
        if !monthly || start_day <= 28 {
            return Ok(d);
        }
        let fields = calendar_fields(&d, self.normalized_dst);
        let day = start_day.min(days_in_month(fields.year, fields.month));
        if day == fields.day {
            return Ok(d);
        }
        from_calendar_fields(Fields { day, ..fields }, d.zone(), self.normalized_dst)
    }

    fn check_awareness(&self, other: &DateTime, what: &str) -> Result<()> {
        if self.start.zone().is_some() != other.zone().is_some() {
            return Err(PeriodError::InvalidArgument(format!(
                "the {} and the start date must both be aware or both be unaware",
                what
            )));
        }
        Ok(())
    }
}

impl PartialEq for Period {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

impl fmt::Display for Period {
    /// e.g. "10 years, starting at 2014-03-01T12:00:00.000 Europe/Amsterdam,
    /// keeping regular local time". The policy is only shown when the start
    /// zone has DST.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, starting at {}", self.interval, self.start)?;
        if dst_relevant(&self.start) {
            write!(f, ", keeping {}", self.dst)?;
        }
        Ok(())
    }
}

/// Fold whole multiples into larger units and turn weeks into days.
fn normalize_interval(interval: Duration) -> Result<Duration> {
    const FOLDS: [(TimeUnit, TimeUnit, i64); 4] = [
        (TimeUnit::Millisecond, TimeUnit::Second, 1000),
        (TimeUnit::Second, TimeUnit::Minute, 60),
        (TimeUnit::Minute, TimeUnit::Hour, 60),
        (TimeUnit::Hour, TimeUnit::Day, 24),
    ];
    let mut amount = interval.amount();
    let mut unit = interval.unit();
    for (smaller, larger, factor) in FOLDS {
        if unit == smaller && amount >= factor && amount % factor == 0 {
            amount /= factor;
            unit = larger;
        }
    }
    if unit == TimeUnit::Week {
        amount = checked_mul(amount, 7)?;
        unit = TimeUnit::Day;
    }
    if unit == TimeUnit::Month && amount >= 12 && amount % 12 == 0 {
        amount /= 12;
        unit = TimeUnit::Year;
    }
    Duration::new(amount, unit)
}

/// Regular local time restarts every day, so a sub-day interval must fit in
/// a day and either stay below the next unit or divide the day evenly.
/// Whole multiples of the next unit were folded upward already.
fn check_local_time_interval(interval: &Duration) -> Result<()> {
    let unit = interval.unit();
    let next = match unit {
        TimeUnit::Millisecond => 1000,
        TimeUnit::Second | TimeUnit::Minute => 60,
        TimeUnit::Hour => 24,
        _ => return Ok(()),
    };
    let per_day = units_per_day(unit)?;
    let amount = interval.amount();
    if amount < per_day && (amount < next || per_day % amount == 0) {
        return Ok(());
    }
    debug!(interval = %interval, "rejected regular local time interval");
    Err(PeriodError::UnsupportedConfiguration(format!(
        "with regular local time, an interval of hours, minutes or (milli)seconds must be \
         less than the next unit or divide a day evenly, got {}",
        interval
    )))
}

fn dst_relevant(start: &DateTime) -> bool {
    start
        .zone()
        .is_some_and(|zone| zone.kind() == ZoneKind::Proper && zone.has_dst())
}

/// Clamp a day-of-month above 28 to 28 for monthly periods, and for yearly
/// periods in February or, with `any_month`, in every month.
fn clamp_day(d: &DateTime, unit: TimeUnit, any_month: bool, dst: PeriodDst) -> Result<DateTime> {
    let fields = calendar_fields(d, dst);
    let clamp = fields.day > 28
        && match unit {
            TimeUnit::Month => true,
            TimeUnit::Year => any_month || fields.month == 2,
            _ => false,
        };
    if !clamp {
        return Ok(*d);
    }
    from_calendar_fields(Fields { day: 28, ..fields }, d.zone(), dst)
}

/// The calendar that month and year arithmetic runs on.
fn calendar_fields(d: &DateTime, dst: PeriodDst) -> Fields {
    match dst {
        PeriodDst::RegularIntervals => d.utc_fields(),
        PeriodDst::RegularLocalTime => d.fields(),
    }
}

fn from_calendar_fields(fields: Fields, zone: Option<Zone>, dst: PeriodDst) -> Result<DateTime> {
    match dst {
        PeriodDst::RegularIntervals => DateTime::from_utc(fields, zone),
        PeriodDst::RegularLocalTime => DateTime::new(fields, zone),
    }
}

/// The next larger unit, if `amount` divides it so every one of those
/// units has the same slot phase.
fn phase_unit(unit: TimeUnit, amount: i64) -> Option<TimeUnit> {
    let (larger, size) = match unit {
        TimeUnit::Millisecond => (TimeUnit::Second, 1000),
        TimeUnit::Second => (TimeUnit::Minute, 60),
        TimeUnit::Minute => (TimeUnit::Hour, 60),
        _ => return None,
    };
    (amount < size && size % amount == 0).then_some(larger)
}

fn units_per_day(unit: TimeUnit) -> Result<i64> {
    match unit {
        TimeUnit::Millisecond | TimeUnit::Second | TimeUnit::Minute | TimeUnit::Hour => unit
            .fixed_millis()
            .map(|millis| MILLIS_PER_DAY / millis)
            .ok_or_else(|| unexpected_unit(unit)),
        _ => Err(unexpected_unit(unit)),
    }
}

/// Whole `amount`-sized periods of a fixed-length unit between two instants.
fn elapsed_periods(from: &DateTime, start: &DateTime, unit: TimeUnit, amount: i64) -> Result<i64> {
    let millis = unit.fixed_millis().ok_or_else(|| unexpected_unit(unit))?;
    let span = checked_mul(millis, amount)?;
    Ok(from.diff(start).num_milliseconds().div_euclid(span))
}

fn months_between(later: &Fields, earlier: &Fields) -> i64 {
    i64::from(later.year - earlier.year) * 12 + i64::from(later.month) - i64::from(earlier.month)
}

fn checked_mul(a: i64, b: i64) -> Result<i64> {
    a.checked_mul(b)
        .ok_or_else(|| PeriodError::OutOfRange(format!("{} * {} overflows", a, b)))
}

fn out_of_range(unit: TimeUnit) -> PeriodError {
    PeriodError::OutOfRange(format!("period arithmetic in {}s overflows", unit))
}

fn unexpected_unit(unit: TimeUnit) -> PeriodError {
    PeriodError::UnknownEnumValue(format!("unexpected unit after normalization: {}", unit))
}
