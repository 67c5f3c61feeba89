//! Time zones: UTC offset lookup for UTC and zone-local instants.
//!
//! Three kinds exist. `Local` follows the host's zone, `Offset` is a fixed
//! offset, and `Proper` wraps an IANA zone from `chrono-tz`. A proper zone
//! can be created with DST switched off, in which case only its standard
//! offset applies.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, OnceLock, PoisonError};

use chrono::{
    Days, FixedOffset, Local, LocalResult, NaiveDate, NaiveDateTime, Offset, TimeDelta,
    TimeZone as _,
};
use chrono_tz::{OffsetComponents, Tz};

use crate::error::{PeriodError, Result};

/// Names that resolve to UTC itself rather than to a zone that happens to
/// sit at offset zero part of the year.
const UTC_NAMES: &[&str] = &[
    "UTC",
    "UCT",
    "GMT",
    "GMT0",
    "GMT+0",
    "GMT-0",
    "Greenwich",
    "Universal",
    "Zulu",
    "Etc/UTC",
    "Etc/UCT",
    "Etc/GMT",
    "Etc/GMT0",
    "Etc/GMT+0",
    "Etc/GMT-0",
    "Etc/Greenwich",
    "Etc/Universal",
    "Etc/Zulu",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ZoneKind {
    /// The host's local zone.
    Local,
    /// A fixed offset from UTC.
    Offset,
    /// An IANA zone.
    Proper,
}

/// Which way a non-existent local time is pushed out of a DST gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Normalize {
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Repr {
    Local,
    Offset(FixedOffset),
    Proper {
        tz: Tz,
        dst: bool,
        observes_dst: bool,
    },
}

/// A time zone. Derived equality is the strict (`identical`) comparison;
/// see [`Zone::equals`] for the looser one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Zone {
    repr: Repr,
}

impl Zone {
    pub fn utc() -> Zone {
        Zone {
            repr: Repr::Proper {
                tz: Tz::UTC,
                dst: true,
                observes_dst: false,
            },
        }
    }

    pub fn local() -> Zone {
        Zone { repr: Repr::Local }
    }

    /// An IANA zone; with `dst == false` only its standard offset is used.
    pub fn proper(tz: Tz, dst: bool) -> Zone {
        Zone {
            repr: Repr::Proper {
                tz,
                dst,
                observes_dst: observes_dst(tz),
            },
        }
    }

    /// A fixed offset in minutes east of UTC.
    ///
    /// # Errors
    /// Returns `PeriodError::InvalidTimezone` if the offset is a day or more.
    pub fn offset_minutes(minutes: i32) -> Result<Zone> {
        if minutes.abs() >= 24 * 60 {
            return Err(PeriodError::InvalidTimezone(format!(
                "offset out of range: {} minutes",
                minutes
            )));
        }
        FixedOffset::east_opt(minutes * 60)
            .map(|offset| Zone {
                repr: Repr::Offset(offset),
            })
            .ok_or_else(|| {
                PeriodError::InvalidTimezone(format!("offset out of range: {} minutes", minutes))
            })
    }

    /// Resolve a zone from text: "localtime", "Z", an ISO offset such as
    /// "+01:30", "-0130" or "+01", or an IANA name such as "Europe/Amsterdam".
    ///
    /// # Errors
    /// Returns `PeriodError::InvalidTimezone` for empty, malformed,
    /// out-of-range or unknown names.
    pub fn named(name: &str, dst: bool) -> Result<Zone> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(PeriodError::InvalidTimezone("empty zone name".to_string()));
        }
        if trimmed == "localtime" {
            return Ok(Zone::local());
        }
        if trimmed == "Z" {
            return Zone::offset_minutes(0);
        }
        if trimmed.starts_with('+') || trimmed.starts_with('-') {
            let minutes = parse_offset(trimmed)
                .ok_or_else(|| PeriodError::InvalidTimezone(trimmed.to_string()))?;
            return Zone::offset_minutes(minutes);
        }
        let tz: Tz = trimmed
            .parse()
            .map_err(|_| PeriodError::InvalidTimezone(trimmed.to_string()))?;
        Ok(Zone::proper(tz, dst))
    }

    pub fn kind(&self) -> ZoneKind {
        match self.repr {
            Repr::Local => ZoneKind::Local,
            Repr::Offset(_) => ZoneKind::Offset,
            Repr::Proper { .. } => ZoneKind::Proper,
        }
    }

    /// The DST flag the zone was created with. Always true for non-proper zones.
    pub fn dst(&self) -> bool {
        match self.repr {
            Repr::Proper { dst, .. } => dst,
            _ => true,
        }
    }

    /// True iff this is a proper zone with DST switched on whose history
    /// ever applied daylight saving.
    pub fn has_dst(&self) -> bool {
        match self.repr {
            Repr::Proper {
                dst, observes_dst, ..
            } => dst && observes_dst,
            _ => false,
        }
    }

    /// True for offset zero and for the IANA aliases of UTC.
    pub fn is_utc(&self) -> bool {
        match self.repr {
            Repr::Local => false,
            Repr::Offset(offset) => offset.local_minus_utc() == 0,
            Repr::Proper { tz, .. } => UTC_NAMES.contains(&tz.name()),
        }
    }

    /// Same behavior: all spellings of UTC are equal, and the DST flag of a
    /// proper zone only matters if the zone has DST at all.
    pub fn equals(&self, other: &Zone) -> bool {
        if self.is_utc() && other.is_utc() {
            return true;
        }
        match (self.repr, other.repr) {
            (Repr::Local, Repr::Local) => true,
            (Repr::Offset(a), Repr::Offset(b)) => a == b,
            (
                Repr::Proper {
                    tz: a,
                    dst: dst_a,
                    observes_dst,
                },
                Repr::Proper { tz: b, dst: dst_b, .. },
            ) => a == b && (dst_a == dst_b || !observes_dst),
            _ => false,
        }
    }

    pub fn identical(&self, other: &Zone) -> bool {
        self == other
    }

    /// Offset in effect at the given UTC instant.
    pub fn offset_for_utc(&self, utc: &NaiveDateTime) -> FixedOffset {
        match self.repr {
            Repr::Local => Local.offset_from_utc_datetime(utc),
            Repr::Offset(offset) => offset,
            Repr::Proper { tz, dst: true, .. } => tz.offset_from_utc_datetime(utc).fix(),
            Repr::Proper { tz, dst: false, .. } => standard_offset(tz, utc),
        }
    }

    /// Offset for a zone-local time. Ambiguous times resolve to the earlier
    /// instant; times inside a gap use the offset from before the gap.
    pub fn offset_for_local(&self, local: &NaiveDateTime) -> FixedOffset {
        self.resolve(local)
            .unwrap_or_else(|| self.offset_for_utc(&day_before(local)))
    }

    /// Move a local time that does not exist out of the DST gap.
    pub(crate) fn normalize_local(&self, local: NaiveDateTime, direction: Normalize) -> NaiveDateTime {
        let Some(gap) = self.gap_at(&local) else {
            return local;
        };
        let shifted = match direction {
            Normalize::Up => local.checked_add_signed(gap),
            Normalize::Down => local.checked_sub_signed(gap),
        };
        shifted.unwrap_or(local)
    }

    /// Whether `local` falls in a DST gap and never shows on the wall clock.
    pub(crate) fn is_gap(&self, local: &NaiveDateTime) -> bool {
        self.resolve(local).is_none()
    }

    fn gap_at(&self, local: &NaiveDateTime) -> Option<TimeDelta> {
        if self.resolve(local).is_some() {
            return None;
        }
        let before = self.offset_for_utc(&day_before(local)).local_minus_utc();
        let after = self.offset_for_utc(&day_after(local)).local_minus_utc();
        (after > before).then(|| TimeDelta::seconds(i64::from(after - before)))
    }

    fn resolve(&self, local: &NaiveDateTime) -> Option<FixedOffset> {
        match self.repr {
            Repr::Local => earliest(Local.offset_from_local_datetime(local)),
            Repr::Offset(offset) => Some(offset),
            Repr::Proper { tz, dst: true, .. } => {
                earliest(tz.offset_from_local_datetime(local).map(|o| o.fix()))
            }
            Repr::Proper { tz, dst: false, .. } => Some(standard_offset(tz, local)),
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.repr {
            Repr::Local => f.write_str("localtime"),
            Repr::Offset(offset) => write!(f, "{}", offset),
            Repr::Proper {
                tz,
                dst,
                observes_dst,
            } => {
                f.write_str(tz.name())?;
                if !dst && observes_dst {
                    f.write_str(" without DST")?;
                }
                Ok(())
            }
        }
    }
}

/// Parse "+HH:MM", "+HHMM" or "+HH" (or the negative forms) into minutes.
fn parse_offset(text: &str) -> Option<i32> {
    let (sign, rest) = match text.split_at(1) {
        ("+", rest) => (1, rest),
        ("-", rest) => (-1, rest),
        _ => return None,
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let (hours, minutes) = match digits.len() {
        2 => (digits.parse::<i32>().ok()?, 0),
        4 => (digits[..2].parse::<i32>().ok()?, digits[2..].parse::<i32>().ok()?),
        _ => return None,
    };
    if minutes >= 60 {
        return None;
    }
    Some(sign * (hours * 60 + minutes))
}

fn earliest(result: LocalResult<FixedOffset>) -> Option<FixedOffset> {
    match result {
        LocalResult::Single(offset) => Some(offset),
        // the larger offset maps the local time to the earlier instant
        LocalResult::Ambiguous(a, b) => Some(if a.local_minus_utc() >= b.local_minus_utc() {
            a
        } else {
            b
        }),
        LocalResult::None => None,
    }
}

fn standard_offset(tz: Tz, at: &NaiveDateTime) -> FixedOffset {
    let offset = tz.offset_from_utc_datetime(at);
    i32::try_from(offset.base_utc_offset().num_seconds())
        .ok()
        .and_then(FixedOffset::east_opt)
        .unwrap_or_else(|| offset.fix())
}

fn day_before(at: &NaiveDateTime) -> NaiveDateTime {
    at.checked_sub_days(Days::new(1)).unwrap_or(*at)
}

fn day_after(at: &NaiveDateTime) -> NaiveDateTime {
    at.checked_add_days(Days::new(1)).unwrap_or(*at)
}

/// Whether the zone ever applied a DST save, sampled daily at noon UTC over
/// the range covered by the tz database rules. Computed once per zone.
fn observes_dst(tz: Tz) -> bool {
    static OBSERVED: OnceLock<Mutex<HashMap<Tz, bool>>> = OnceLock::new();
    let cache = OBSERVED.get_or_init(|| Mutex::new(HashMap::new()));
    if let Some(&known) = cache.lock().unwrap_or_else(PoisonError::into_inner).get(&tz) {
        return known;
    }
    let observed = scan_for_dst(tz);
    cache
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(tz, observed);
    observed
}

fn scan_for_dst(tz: Tz) -> bool {
    let (Some(first), Some(last)) = (
        NaiveDate::from_ymd_opt(1900, 1, 1),
        NaiveDate::from_ymd_opt(2037, 12, 31),
    ) else {
        return false;
    };
    first
        .iter_days()
        .take_while(|date| *date <= last)
        .filter_map(|date| date.and_hms_opt(12, 0, 0))
        .any(|noon| !tz.offset_from_utc_datetime(&noon).dst_offset().is_zero())
}
