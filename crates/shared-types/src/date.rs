//! Canonical calendar-date type shared across the workspace.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A calendar date with no time-zone ambiguity.
///
/// Raw record values are converted into this type by the temporal
/// normalizer; nothing else in the pipeline parses dates. There is no
/// implicit "now"; callers that want today's date must construct it
/// explicitly and pass it in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalDate(NaiveDate);

impl CanonicalDate {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Construct from calendar components. Returns `None` for an invalid
    /// combination (e.g. February 30th).
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn day(&self) -> u32 {
        self.0.day()
    }

    pub fn as_naive(&self) -> NaiveDate {
        self.0
    }
}

impl fmt::Display for CanonicalDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

/// Raised when a raw value is not one of the recognized date
/// representations.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("unparseable date: {input}")]
pub struct UnparseableDate {
    pub input: String,
}
