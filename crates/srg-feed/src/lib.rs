// SPDX-License-Identifier: MIT OR Apache-2.0
//! Job-report feed access and the paging driver.
//!
//! [`FeedClient`] logs in to the reporting server and fetches pages of job
//! records newest first. [`collect_daily_stats`] drives any
//! [`JobPageSource`] into a [`DailyAggregator`](srg_aggregate::DailyAggregator),
//! one awaited request at a time, until the aggregator signals stop or the
//! feed runs dry.
#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod client;
pub mod driver;
pub mod page;

pub use client::{ClientOptions, FeedClient};
pub use driver::{CollectOptions, CollectionReport, JobPageSource, collect_daily_stats};
pub use page::{FetchedPage, JobPage};

use srg_aggregate::AggregateError;

/// Errors raised while talking to the feed or draining it.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// Transport-level failure.
    #[error("request to {url} failed")]
    Http {
        /// Requested URL.
        url: String,
        /// Underlying client error.
        #[source]
        source: reqwest::Error,
    },

    /// The HTTP client could not be built.
    #[error("failed to build HTTP client")]
    Client(#[source] reqwest::Error),

    /// The server refused the credentials.
    #[error("login attempt failed with status {status}")]
    LoginRejected {
        /// HTTP status returned by the login call.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },

    /// A successful page did not decode as `{"job": [...]}`.
    #[error("could not decode job page at offset {offset}")]
    Decode {
        /// Offset of the page.
        offset: u64,
        /// Underlying decode error.
        #[source]
        source: serde_json::Error,
    },

    /// Too many anomalous pages in a row.
    #[error("{count} consecutive feed pages failed (last status {status})")]
    TooManyAnomalies {
        /// Consecutive anomalous pages.
        count: u32,
        /// Status of the last one.
        status: u16,
    },

    /// A record could not be aggregated.
    #[error(transparent)]
    Aggregate(#[from] AggregateError),
}
