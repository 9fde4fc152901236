//! Date and time utilities
//!
//! ISO 8601 conversion and epoch day numbers.

#![allow(dead_code)]

pub mod epoch;
pub mod iso;

use thiserror::Error;

/// Time conversion errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TimeError {
    #[error("Invalid ISO 8601 timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Unix timestamp out of range: {0}")]
    OutOfRange(i64),

    #[error("Day number out of range: {0}")]
    DayOutOfRange(i64),
}
