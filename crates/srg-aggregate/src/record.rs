// SPDX-License-Identifier: MIT OR Apache-2.0
//! Job records as delivered by the reporting feed.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::AggregateError;

/// Wire value of a successful job.
pub const STATUS_SUCCEEDED: &str = "eJOB_SUCCEEDED";
/// Wire value of a failed job.
pub const STATUS_FAILED: &str = "eJOB_FAILED";

/// Outcome of one job run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JobStatus {
    /// Counted as a success.
    Succeeded,
    /// Counted as a failure.
    Failed,
    /// Any other state; counted toward the day's total only.
    Other(String),
}

impl From<String> for JobStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            STATUS_SUCCEEDED => Self::Succeeded,
            STATUS_FAILED => Self::Failed,
            _ => Self::Other(s),
        }
    }
}

impl From<&str> for JobStatus {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

impl From<JobStatus> for String {
    fn from(status: JobStatus) -> Self {
        match status {
            JobStatus::Succeeded => STATUS_SUCCEEDED.into(),
            JobStatus::Failed => STATUS_FAILED.into(),
            JobStatus::Other(s) => s,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Succeeded => f.write_str(STATUS_SUCCEEDED),
            Self::Failed => f.write_str(STATUS_FAILED),
            Self::Other(s) => f.write_str(s),
        }
    }
}

/// One job-execution record. Read-only input to the aggregator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    /// Free-form job description.
    #[serde(default)]
    pub description: String,
    /// ISO-8601-like start timestamp; the first ten characters are the date.
    #[serde(rename = "timeStarted")]
    pub time_started: String,
    /// Outcome.
    pub status: JobStatus,
}

impl JobRecord {
    /// Build a record.
    #[must_use]
    pub fn new(
        description: impl Into<String>,
        time_started: impl Into<String>,
        status: impl Into<JobStatus>,
    ) -> Self {
        Self {
            description: description.into(),
            time_started: time_started.into(),
            status: status.into(),
        }
    }

    /// Calendar date the job started on.
    pub fn start_date(&self) -> Result<NaiveDate, AggregateError> {
        let invalid = || AggregateError::InvalidTimestamp {
            value: self.time_started.clone(),
        };
        let day = self.time_started.get(..10).ok_or_else(invalid)?;
        NaiveDate::parse_from_str(day, "%Y-%m-%d").map_err(|_| invalid())
    }
}
