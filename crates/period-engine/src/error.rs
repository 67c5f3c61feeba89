//! Error types for period-engine operations.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PeriodError {
    /// A caller-supplied value violates a precondition: non-positive amount,
    /// unknown unit, mismatched zone-awareness, invalid calendar fields.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    /// The combination of interval and DST policy is not supported.
    #[error("Unsupported configuration: {0}")]
    UnsupportedConfiguration(String),

    #[error("Unknown enum value: {0}")]
    UnknownEnumValue(String),

    /// Calendar arithmetic left the representable date range.
    #[error("Out of range: {0}")]
    OutOfRange(String),
}

pub type Result<T> = std::result::Result<T, PeriodError>;
