// SPDX-License-Identifier: MIT OR Apache-2.0
//! The requested reporting window.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::AggregateError;

/// Days covered when the caller gives no start date.
pub const DEFAULT_WINDOW_DAYS: u64 = 30;

/// Inclusive `[start, end]` date window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// Earliest date of interest.
    pub start: NaiveDate,
    /// Latest date of interest; newer records are skipped.
    pub end: NaiveDate,
}

impl DateRange {
    /// Build a window, rejecting `start > end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, AggregateError> {
        if start > end {
            return Err(AggregateError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// The window of `days` days ending at `end` (`start = end - days`).
    #[must_use]
    pub fn ending_at(end: NaiveDate, days: u64) -> Self {
        let start = end.checked_sub_days(Days::new(days)).unwrap_or(NaiveDate::MIN);
        Self { start, end }
    }

    /// Resolve optional bounds the way the command line does: a missing end
    /// is `today`, a missing start is [`DEFAULT_WINDOW_DAYS`] before the end.
    pub fn resolve(
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        today: NaiveDate,
    ) -> Result<Self, AggregateError> {
        let end = end.unwrap_or(today);
        match start {
            Some(start) => Self::new(start, end),
            None => Ok(Self::ending_at(end, DEFAULT_WINDOW_DAYS)),
        }
    }

    /// Whether `date` falls inside the window.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} and {}", self.start, self.end)
    }
}
