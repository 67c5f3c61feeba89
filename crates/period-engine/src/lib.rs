//! # period-engine
//!
//! Calendar-aware recurring periods: "every 2 hours starting at 08:00
//! Europe/Amsterdam", "monthly from January 31st", "yearly from February 29th".
//!
//! Given any instant, a [`Period`] finds the first occurrence after it, and
//! steps forward and backward from a known occurrence. Month-end and leap-day
//! starts are clamped into shorter months, and a period either keeps a
//! constant UTC distance or keeps its wall-clock time across DST changes
//! (see [`PeriodDst`]).
//!
//! ## Modules
//!
//! - [`period`] — the [`Period`] type and its occurrence search
//! - [`datetime`] — instants with an optional zone, UTC and local arithmetic
//! - [`zone`] — IANA, fixed-offset and host-local zones
//! - [`duration`] — `(amount, unit)` intervals
//! - [`unit`] — time units and month-length helpers
//! - [`dst`] — DST policies
//! - [`clock`] — injectable sources of the current time
//! - [`error`] — Error types

pub mod clock;
pub mod datetime;
pub mod dst;
pub mod duration;
pub mod error;
pub mod period;
pub mod unit;
pub mod zone;

pub use clock::{FixedTimeSource, SystemTimeSource, TimeSource};
pub use datetime::{DateTime, Fields};
pub use dst::PeriodDst;
pub use duration::Duration;
pub use error::PeriodError;
pub use period::Period;
pub use unit::TimeUnit;
pub use zone::{Zone, ZoneKind};
