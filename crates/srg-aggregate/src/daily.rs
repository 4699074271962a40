// SPDX-License-Identifier: MIT OR Apache-2.0
//! Per-day bucketing of a descending job feed.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::range::DateRange;
use crate::record::{JobRecord, JobStatus};
use crate::AggregateError;

/// What the caller should do after an [`DailyAggregator::ingest`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlSignal {
    /// Keep feeding records.
    Continue,
    /// The start of the window has been crossed; fetch nothing more.
    Stop,
}

/// Finalized statistics for one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayBucket {
    /// Calendar date.
    pub date: NaiveDate,
    /// Records counted for the day.
    pub total_jobs: u64,
    /// Records with [`JobStatus::Succeeded`].
    pub successes: u64,
    /// Records with [`JobStatus::Failed`].
    pub failures: u64,
    /// `successes / (total_jobs - 1) * 100`.
    pub success_pct: f64,
    /// `failures / (total_jobs - 1) * 100`.
    pub fail_pct: f64,
}

/// Counts for the day currently accumulating.
#[derive(Debug, Clone, PartialEq, Eq)]
struct OpenBucket {
    date: NaiveDate,
    total: u64,
    successes: u64,
    failures: u64,
}

impl OpenBucket {
    fn seeded(date: NaiveDate, status: &JobStatus) -> Self {
        let mut bucket = Self {
            date,
            total: 0,
            successes: 0,
            failures: 0,
        };
        bucket.count(status);
        bucket
    }

    fn count(&mut self, status: &JobStatus) {
        self.total += 1;
        match status {
            JobStatus::Succeeded => self.successes += 1,
            JobStatus::Failed => self.failures += 1,
            JobStatus::Other(_) => {}
        }
    }

    /// Close the day. The denominator is one less than the day's record
    /// count, floored at one.
    fn finalize(self) -> DayBucket {
        let denominator = self.total.saturating_sub(1).max(1) as f64;
        DayBucket {
            date: self.date,
            total_jobs: self.total,
            successes: self.successes,
            failures: self.failures,
            success_pct: self.successes as f64 / denominator * 100.0,
            fail_pct: self.failures as f64 / denominator * 100.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum State {
    NoBucketOpen,
    BucketOpen(OpenBucket),
    Stopped,
}

/// Streaming aggregator over records ordered by start date, newest first.
///
/// Records newer than the window end are skipped. Each date change closes
/// the open day; once a closed day lies before the window start the
/// aggregator answers [`ControlSignal::Stop`] and ignores anything further.
/// The day still open when the feed runs dry is not part of
/// [`finalize_results`](Self::finalize_results) unless
/// [`finalize_tail`](Self::finalize_tail) is called.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use srg_aggregate::{ControlSignal, DailyAggregator, DateRange, JobRecord};
///
/// let d = |day| NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
/// let mut agg = DailyAggregator::new(DateRange::new(d(2), d(3)).unwrap());
///
/// for (ts, status) in [
///     ("2024-01-03T10:00", "eJOB_SUCCEEDED"),
///     ("2024-01-03T09:00", "eJOB_FAILED"),
///     ("2024-01-03T08:00", "eJOB_SUCCEEDED"),
///     ("2024-01-02T23:00", "eJOB_SUCCEEDED"),
/// ] {
///     assert_eq!(agg.ingest(&JobRecord::new("job", ts, status)).unwrap(), ControlSignal::Continue);
/// }
///
/// let days = agg.finalize_results();
/// assert_eq!(days.len(), 1);
/// assert_eq!(days[0].success_pct, 100.0);
/// assert_eq!(days[0].fail_pct, 50.0);
/// ```
#[derive(Debug, Clone)]
pub struct DailyAggregator {
    range: DateRange,
    state: State,
    finished: Vec<DayBucket>,
    skipped: u64,
}

impl DailyAggregator {
    /// A fresh aggregator for `range`.
    #[must_use]
    pub fn new(range: DateRange) -> Self {
        Self {
            range,
            state: State::NoBucketOpen,
            finished: Vec::new(),
            skipped: 0,
        }
    }

    /// Switch to `range` and clear every accumulator.
    pub fn reset(&mut self, range: DateRange) {
        *self = Self::new(range);
    }

    /// The configured window.
    #[must_use]
    pub fn range(&self) -> DateRange {
        self.range
    }

    /// Whether [`ControlSignal::Stop`] has been signaled.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        matches!(self.state, State::Stopped)
    }

    /// Date of the day currently accumulating, if any.
    #[must_use]
    pub fn open_date(&self) -> Option<NaiveDate> {
        match &self.state {
            State::BucketOpen(open) => Some(open.date),
            _ => None,
        }
    }

    /// Records skipped for being newer than the window end.
    #[must_use]
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    /// Feed one record.
    ///
    /// Fails only when the record's timestamp carries no valid date.
    pub fn ingest(&mut self, record: &JobRecord) -> Result<ControlSignal, AggregateError> {
        if self.is_stopped() {
            return Ok(ControlSignal::Continue);
        }

        let date = record.start_date()?;
        if date > self.range.end {
            self.skipped += 1;
            trace!(target: "srg.aggregate", %date, end = %self.range.end, "record after window end skipped");
            return Ok(ControlSignal::Continue);
        }

        let (next, signal) = match std::mem::replace(&mut self.state, State::NoBucketOpen) {
            State::NoBucketOpen => (
                State::BucketOpen(OpenBucket::seeded(date, &record.status)),
                ControlSignal::Continue,
            ),
            State::BucketOpen(mut open) if open.date == date => {
                open.count(&record.status);
                (State::BucketOpen(open), ControlSignal::Continue)
            }
            State::BucketOpen(open) => {
                let closed = open.finalize();
                debug!(
                    target: "srg.aggregate",
                    day = %closed.date,
                    next = %date,
                    total = closed.total_jobs,
                    successes = closed.successes,
                    failures = closed.failures,
                    "day finalized"
                );
                let crossed = closed.date < self.range.start;
                self.finished.push(closed);
                if crossed {
                    (State::Stopped, ControlSignal::Stop)
                } else {
                    (
                        State::BucketOpen(OpenBucket::seeded(date, &record.status)),
                        ControlSignal::Continue,
                    )
                }
            }
            State::Stopped => (State::Stopped, ControlSignal::Continue),
        };
        self.state = next;
        Ok(signal)
    }

    /// Close the day still accumulating, if any, and return it.
    pub fn finalize_tail(&mut self) -> Option<&DayBucket> {
        match std::mem::replace(&mut self.state, State::NoBucketOpen) {
            State::BucketOpen(open) => {
                self.finished.push(open.finalize());
                self.finished.last()
            }
            other => {
                self.state = other;
                None
            }
        }
    }

    /// Finalized days in the order they were closed (newest first).
    #[must_use]
    pub fn finalize_results(&self) -> Vec<DayBucket> {
        self.finished.clone()
    }

    /// Consume the aggregator, returning the finalized days.
    #[must_use]
    pub fn into_results(self) -> Vec<DayBucket> {
        self.finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn rec(day: u32, status: &str) -> JobRecord {
        JobRecord::new("job", format!("2024-01-{day:02}T12:00:00"), status)
    }

    #[test]
    fn empty_feed_yields_nothing() {
        let agg = DailyAggregator::new(DateRange::new(d(1), d(3)).unwrap());
        assert!(agg.finalize_results().is_empty());
        assert_eq!(agg.open_date(), None);
    }

    #[test]
    fn first_record_opens_without_finalizing() {
        let mut agg = DailyAggregator::new(DateRange::new(d(1), d(3)).unwrap());
        agg.ingest(&rec(3, "eJOB_SUCCEEDED")).unwrap();
        assert_eq!(agg.open_date(), Some(d(3)));
        assert!(agg.finalize_results().is_empty());
    }

    #[test]
    fn other_status_counts_toward_total_only() {
        let mut agg = DailyAggregator::new(DateRange::new(d(1), d(3)).unwrap());
        for s in ["eJOB_SUCCEEDED", "eJOB_RUNNING", "eJOB_FAILED"] {
            agg.ingest(&rec(3, s)).unwrap();
        }
        agg.ingest(&rec(2, "eJOB_SUCCEEDED")).unwrap();
        let days = agg.finalize_results();
        assert_eq!(days[0].total_jobs, 3);
        assert_eq!(days[0].successes, 1);
        assert_eq!(days[0].failures, 1);
        assert_eq!(days[0].success_pct, 50.0);
    }

    #[test]
    fn single_record_day_uses_unit_denominator() {
        let mut agg = DailyAggregator::new(DateRange::new(d(1), d(3)).unwrap());
        agg.ingest(&rec(3, "eJOB_FAILED")).unwrap();
        agg.ingest(&rec(2, "eJOB_FAILED")).unwrap();
        let day = &agg.finalize_results()[0];
        assert_eq!(day.fail_pct, 100.0);
        assert_eq!(day.success_pct, 0.0);
    }

    #[test]
    fn finalize_tail_closes_open_day_once() {
        let mut agg = DailyAggregator::new(DateRange::new(d(1), d(3)).unwrap());
        for s in ["eJOB_SUCCEEDED", "eJOB_SUCCEEDED", "eJOB_FAILED"] {
            agg.ingest(&rec(1, s)).unwrap();
        }
        let tail = agg.finalize_tail().cloned().unwrap();
        assert_eq!(tail.date, d(1));
        assert_eq!(tail.total_jobs, 3);
        assert_eq!(tail.success_pct, 100.0);
        assert_eq!(tail.fail_pct, 50.0);
        assert!(agg.finalize_tail().is_none());
        assert_eq!(agg.finalize_results().len(), 1);
    }

    #[test]
    fn reset_clears_everything() {
        let mut agg = DailyAggregator::new(DateRange::new(d(1), d(3)).unwrap());
        agg.ingest(&rec(3, "eJOB_SUCCEEDED")).unwrap();
        agg.ingest(&rec(2, "eJOB_SUCCEEDED")).unwrap();
        agg.reset(DateRange::new(d(5), d(9)).unwrap());
        assert!(agg.finalize_results().is_empty());
        assert_eq!(agg.open_date(), None);
        assert_eq!(agg.range().start, d(5));
    }

    #[test]
    fn bad_timestamp_is_reported() {
        let mut agg = DailyAggregator::new(DateRange::new(d(1), d(3)).unwrap());
        let bad = JobRecord::new("job", "n/a", "eJOB_SUCCEEDED");
        assert!(agg.ingest(&bad).is_err());
        assert_eq!(agg.open_date(), None);
    }
}
