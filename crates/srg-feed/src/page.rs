// SPDX-License-Identifier: MIT OR Apache-2.0
//! One page of the job-report feed.

use serde::{Deserialize, Serialize};
use srg_aggregate::JobRecord;

use crate::FeedError;

/// Decoded page body: `{"job": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobPage {
    /// Records, newest first.
    #[serde(default)]
    pub job: Vec<JobRecord>,
}

/// A page as received: HTTP status plus the raw body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body.
    pub body: String,
}

impl FetchedPage {
    /// A `200` page carrying `records`.
    #[must_use]
    pub fn ok(records: Vec<JobRecord>) -> Self {
        let body = serde_json::to_string(&JobPage { job: records }).unwrap_or_default();
        Self { status: 200, body }
    }

    /// Whether the status is in the success range the server uses (≤ 200).
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status <= 200
    }

    /// Decode the body. `offset` is only used for error context.
    pub fn decode(&self, offset: u64) -> Result<JobPage, FeedError> {
        serde_json::from_str(&self.body).map_err(|source| FeedError::Decode { offset, source })
    }
}
