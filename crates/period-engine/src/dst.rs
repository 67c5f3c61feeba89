//! DST policies for recurring periods.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{PeriodError, Result};

/// How a period repeats across Daylight Saving Time changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodDst {
    /// Keep a constant distance measured in UTC. An hourly period takes one
    /// real hour every time, even in a zone with DST.
    RegularIntervals,
    /// Keep occurrences at the same wall-clock position in the start zone.
    /// A daily period at 08:05 stays at 08:05, so some gaps are 23 or 25 hours.
    #[default]
    RegularLocalTime,
}

impl PeriodDst {
    /// Lenient conversion: a missing or unrecognized value is the default.
    pub fn from_raw(raw: Option<u8>) -> PeriodDst {
        raw.and_then(|value| PeriodDst::try_from(value).ok())
            .unwrap_or_default()
    }
}

impl TryFrom<u8> for PeriodDst {
    type Error = PeriodError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(PeriodDst::RegularIntervals),
            1 => Ok(PeriodDst::RegularLocalTime),
            other => Err(PeriodError::UnknownEnumValue(format!(
                "PeriodDst {}",
                other
            ))),
        }
    }
}

impl fmt::Display for PeriodDst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeriodDst::RegularIntervals => f.write_str("regular intervals"),
            PeriodDst::RegularLocalTime => f.write_str("regular local time"),
        }
    }
}
