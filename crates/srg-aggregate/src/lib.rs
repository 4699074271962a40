// SPDX-License-Identifier: MIT OR Apache-2.0
//! Daily success/failure aggregation for job-execution feeds.
//!
//! The feed is consumed one record at a time, newest first. See
//! [`DailyAggregator`] for the bucketing rules.
#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod daily;
pub mod range;
pub mod record;

pub use daily::{ControlSignal, DailyAggregator, DayBucket};
pub use range::{DEFAULT_WINDOW_DAYS, DateRange};
pub use record::{JobRecord, JobStatus, STATUS_FAILED, STATUS_SUCCEEDED};

use chrono::NaiveDate;

/// Errors raised while aggregating.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AggregateError {
    /// A record's timestamp does not begin with a `YYYY-MM-DD` date.
    #[error("invalid job start timestamp: {value:?}")]
    InvalidTimestamp {
        /// The offending timestamp.
        value: String,
    },

    /// The window's start lies after its end.
    #[error("start date {start} is after end date {end}")]
    InvalidRange {
        /// Requested start.
        start: NaiveDate,
        /// Requested end.
        end: NaiveDate,
    },
}
