// SPDX-License-Identifier: MIT OR Apache-2.0
//! Drains a paged feed into a [`DailyAggregator`].

use async_trait::async_trait;
use srg_aggregate::{ControlSignal, DailyAggregator};
use srg_config::{DEFAULT_MAX_CONSECUTIVE_ANOMALIES, DEFAULT_PAGE_SIZE, RunConfig};
use srg_debug::LevelLogger;
use tracing::{info, warn};

use crate::page::FetchedPage;
use crate::FeedError;

/// Anything that can hand out pages of job records, newest first.
#[async_trait]
pub trait JobPageSource: Send {
    /// Fetch `count` records starting at `offset`.
    async fn fetch_page(&mut self, offset: u64, count: u32) -> Result<FetchedPage, FeedError>;

    /// Human-readable name of the request, for diagnostics.
    fn describe(&self, offset: u64, count: u32) -> String {
        format!("offset={offset} count={count}")
    }
}

/// Paging knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectOptions {
    /// Records requested per page.
    pub page_size: u32,
    /// Consecutive anomalous pages tolerated; 0 never aborts.
    pub max_consecutive_anomalies: u32,
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_consecutive_anomalies: DEFAULT_MAX_CONSECUTIVE_ANOMALIES,
        }
    }
}

impl From<&RunConfig> for CollectOptions {
    fn from(config: &RunConfig) -> Self {
        Self {
            page_size: config.page_size(),
            max_consecutive_anomalies: config.max_consecutive_anomalies(),
        }
    }
}

/// What a collection run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionReport {
    /// Pages requested.
    pub pages: u32,
    /// Records handed to the aggregator.
    pub records: u64,
    /// Pages whose status was outside the success range.
    pub anomalies: u32,
    /// Whether the aggregator signaled stop.
    pub stopped: bool,
}

/// Fetch pages and feed every record to `aggregator` until it signals
/// [`ControlSignal::Stop`] or the feed is exhausted (an empty page).
///
/// A page holding fewer records than requested is not the end: servers may
/// cap the page size below what was asked for. The next request starts
/// right after the last record received, and paging continues until a page
/// comes back empty.
///
/// A page with a status above 200 is logged and still processed when its
/// body decodes; when it does not, the page is skipped. After
/// `max_consecutive_anomalies` such pages in a row the run fails with
/// [`FeedError::TooManyAnomalies`]. With the limit at 0 nothing aborts, and
/// an anomalous page that cannot be decoded ends the feed instead.
pub async fn collect_daily_stats<S>(
    source: &mut S,
    aggregator: &mut DailyAggregator,
    logger: &mut LevelLogger,
    options: CollectOptions,
) -> Result<CollectionReport, FeedError>
where
    S: JobPageSource + ?Sized,
{
    let page_size = options.page_size.max(1);
    let mut report = CollectionReport::default();
    let mut offset: u64 = 0;
    let mut consecutive_anomalies: u32 = 0;

    logger.log(0, 1, "Starting data gathering loop.");
    loop {
        logger.log(
            0,
            2,
            &format!("URL for this request is {}", source.describe(offset, page_size)),
        );
        let fetched = source.fetch_page(offset, page_size).await?;
        let page_offset = offset;
        report.pages += 1;

        let page = if fetched.is_success() {
            consecutive_anomalies = 0;
            fetched.decode(page_offset)?
        } else {
            report.anomalies += 1;
            consecutive_anomalies += 1;
            logger.log(0, 2, &format!("Got {} for status ", fetched.status));
            logger.log(0, 3, &format!("Response was {}", fetched.body));
            warn!(
                target: "srg.feed",
                status = fetched.status,
                offset = page_offset,
                consecutive = consecutive_anomalies,
                "feed anomaly"
            );
            if options.max_consecutive_anomalies > 0
                && consecutive_anomalies >= options.max_consecutive_anomalies
            {
                return Err(FeedError::TooManyAnomalies {
                    count: consecutive_anomalies,
                    status: fetched.status,
                });
            }
            match fetched.decode(page_offset) {
                Ok(page) => page,
                Err(_) if options.max_consecutive_anomalies == 0 => {
                    warn!(
                        target: "srg.feed",
                        status = fetched.status,
                        offset = page_offset,
                        "undecodable anomalous page; treating as end of feed"
                    );
                    return Ok(report);
                }
                Err(_) => {
                    offset += u64::from(page_size);
                    continue;
                }
            }
        };

        if page.job.is_empty() {
            info!(target: "srg.feed", pages = report.pages, records = report.records, "feed exhausted");
            return Ok(report);
        }
        offset += page.job.len() as u64;

        logger.log(0, 2, "Processing job records");
        for job in &page.job {
            if logger.is_level_enabled(0, 5) {
                logger.log(0, 5, "   Current job has:");
                logger.log(0, 5, &format!("      description: {}", job.description));
                logger.log(0, 5, &format!("      timestarted: {}", job.time_started));
                logger.log(0, 5, &format!("      status: {}", job.status));
            }

            let open_before = aggregator.open_date();
            report.records += 1;
            let signal = aggregator.ingest(job)?;
            if let (Some(before), Some(after)) = (open_before, aggregator.open_date()) {
                if before != after {
                    logger.log(0, 3, &format!("Got new date {after}; closed {before}"));
                }
            }

            if signal == ControlSignal::Stop {
                logger.log(
                    0,
                    3,
                    &format!("Breaking out of loop on date {}", job.time_started),
                );
                report.stopped = true;
                info!(target: "srg.feed", pages = report.pages, records = report.records, "start of window reached");
                return Ok(report);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use srg_aggregate::{DateRange, JobRecord};
    use std::collections::VecDeque;

    /// Serves canned pages and records every request.
    struct Scripted {
        pages: VecDeque<FetchedPage>,
        requests: Vec<(u64, u32)>,
    }

    impl Scripted {
        fn new(pages: Vec<FetchedPage>) -> Self {
            Self {
                pages: pages.into(),
                requests: Vec::new(),
            }
        }
    }

    #[async_trait]
    impl JobPageSource for Scripted {
        async fn fetch_page(&mut self, offset: u64, count: u32) -> Result<FetchedPage, FeedError> {
            self.requests.push((offset, count));
            Ok(self.pages.pop_front().unwrap_or_else(|| FetchedPage::ok(vec![])))
        }
    }

    fn day(n: u32) -> String {
        format!("2024-01-{n:02}T08:00:00")
    }

    fn range(start: u32, end: u32) -> DateRange {
        let d = |n| NaiveDate::from_ymd_opt(2024, 1, n).unwrap();
        DateRange::new(d(start), d(end)).unwrap()
    }

    fn page_of(days: &[u32]) -> FetchedPage {
        FetchedPage::ok(
            days.iter()
                .map(|n| JobRecord::new("job", day(*n), "eJOB_SUCCEEDED"))
                .collect(),
        )
    }

    fn opts(page_size: u32, max: u32) -> CollectOptions {
        CollectOptions {
            page_size,
            max_consecutive_anomalies: max,
        }
    }

    #[tokio::test]
    async fn stops_requesting_after_stop_signal() {
        let mut source = Scripted::new(vec![
            page_of(&[9, 9, 8]),
            page_of(&[8, 7, 6]),
            page_of(&[5, 4, 3]),
        ]);
        let mut agg = DailyAggregator::new(range(8, 9));
        let mut logger = LevelLogger::disabled("test");

        let report = collect_daily_stats(&mut source, &mut agg, &mut logger, opts(3, 3))
            .await
            .unwrap();
        assert!(report.stopped);
        assert_eq!(report.pages, 2);
        assert_eq!(source.requests, vec![(0, 3), (3, 3)]);
        assert_eq!(agg.finalize_results().len(), 3);
    }

    #[tokio::test]
    async fn empty_page_ends_collection() {
        let mut source = Scripted::new(vec![page_of(&[3, 3]), page_of(&[2])]);
        let mut agg = DailyAggregator::new(range(1, 3));
        let mut logger = LevelLogger::disabled("test");

        let report = collect_daily_stats(&mut source, &mut agg, &mut logger, opts(2, 3))
            .await
            .unwrap();
        assert!(!report.stopped);
        assert_eq!(report.pages, 3);
        assert_eq!(report.records, 3);
        assert_eq!(source.requests, vec![(0, 2), (2, 2), (3, 2)]);
    }

    /// Slices a newest-first record list, never returning more than
    /// `cap` records per request whatever count was asked for.
    struct CappedFeed {
        records: Vec<JobRecord>,
        cap: usize,
        requests: Vec<(u64, u32)>,
    }

    #[async_trait]
    impl JobPageSource for CappedFeed {
        async fn fetch_page(&mut self, offset: u64, count: u32) -> Result<FetchedPage, FeedError> {
            self.requests.push((offset, count));
            let start = (offset as usize).min(self.records.len());
            let end = (start + (count as usize).min(self.cap)).min(self.records.len());
            Ok(FetchedPage::ok(self.records[start..end].to_vec()))
        }
    }

    #[tokio::test]
    async fn server_side_page_cap_does_not_end_collection() {
        let records: Vec<JobRecord> = [5, 5, 4, 4, 3, 3, 2, 2, 1]
            .iter()
            .map(|n| JobRecord::new("job", day(*n), "eJOB_SUCCEEDED"))
            .collect();
        let mut source = CappedFeed {
            records,
            cap: 2,
            requests: Vec::new(),
        };
        let mut agg = DailyAggregator::new(range(3, 5));
        let mut logger = LevelLogger::disabled("test");

        // Every page comes back short of the 500 asked for.
        let report = collect_daily_stats(&mut source, &mut agg, &mut logger, opts(500, 3))
            .await
            .unwrap();
        assert!(report.stopped);
        assert_eq!(report.pages, 5);
        assert_eq!(report.records, 9);
        // Offsets follow what was received, not what was asked for.
        assert_eq!(source.requests[..3], [(0, 500), (2, 500), (4, 500)]);

        let days: Vec<u32> = agg
            .finalize_results()
            .iter()
            .map(|b| chrono::Datelike::day(&b.date))
            .collect();
        assert_eq!(days, vec![5, 4, 3, 2]);
    }

    #[tokio::test]
    async fn empty_feed_is_one_request() {
        let mut source = Scripted::new(vec![]);
        let mut agg = DailyAggregator::new(range(1, 3));
        let mut logger = LevelLogger::disabled("test");

        let report = collect_daily_stats(&mut source, &mut agg, &mut logger, opts(500, 3))
            .await
            .unwrap();
        assert_eq!(report.pages, 1);
        assert!(agg.finalize_results().is_empty());
    }

    #[tokio::test]
    async fn anomalous_but_decodable_page_is_processed() {
        let mut bad = page_of(&[3, 3]);
        bad.status = 206;
        let mut source = Scripted::new(vec![bad, page_of(&[2])]);
        let mut agg = DailyAggregator::new(range(1, 3));
        let mut logger = LevelLogger::disabled("test");

        let report = collect_daily_stats(&mut source, &mut agg, &mut logger, opts(2, 3))
            .await
            .unwrap();
        assert_eq!(report.anomalies, 1);
        assert_eq!(report.records, 3);
    }

    #[tokio::test]
    async fn consecutive_anomalies_abort() {
        let broken = || FetchedPage {
            status: 503,
            body: "<html>unavailable</html>".into(),
        };
        let mut source = Scripted::new(vec![broken(), broken(), broken(), broken()]);
        let mut agg = DailyAggregator::new(range(1, 3));
        let mut logger = LevelLogger::disabled("test");

        let err = collect_daily_stats(&mut source, &mut agg, &mut logger, opts(2, 3))
            .await
            .unwrap_err();
        assert!(matches!(err, FeedError::TooManyAnomalies { count: 3, status: 503 }));
        assert_eq!(source.requests.len(), 3);
    }

    #[tokio::test]
    async fn anomaly_streak_resets_on_success() {
        let broken = || FetchedPage {
            status: 500,
            body: String::new(),
        };
        let mut source = Scripted::new(vec![
            broken(),
            page_of(&[3, 3]),
            broken(),
            page_of(&[2]),
        ]);
        let mut agg = DailyAggregator::new(range(1, 3));
        let mut logger = LevelLogger::disabled("test");

        let report = collect_daily_stats(&mut source, &mut agg, &mut logger, opts(2, 2))
            .await
            .unwrap();
        assert_eq!(report.anomalies, 2);
        assert_eq!(report.pages, 5);
        // Skipped pages still advance the offset.
        assert_eq!(source.requests[3], (6, 2));
    }

    /// Answers every request with the same maintenance page.
    struct AlwaysDown {
        requests: u32,
    }

    #[async_trait]
    impl JobPageSource for AlwaysDown {
        async fn fetch_page(&mut self, _offset: u64, _count: u32) -> Result<FetchedPage, FeedError> {
            self.requests += 1;
            Ok(FetchedPage {
                status: 503,
                body: "<html>down for maintenance</html>".into(),
            })
        }
    }

    #[tokio::test]
    async fn unlimited_anomalies_end_on_undecodable_page() {
        let mut source = AlwaysDown { requests: 0 };
        let mut agg = DailyAggregator::new(range(1, 3));
        let mut logger = LevelLogger::disabled("test");

        let report = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            collect_daily_stats(&mut source, &mut agg, &mut logger, opts(2, 0)),
        )
        .await
        .expect("collection must terminate")
        .unwrap();
        assert_eq!(source.requests, 1);
        assert_eq!(report.anomalies, 1);
        assert_eq!(report.records, 0);
        assert!(!report.stopped);
    }

    #[tokio::test]
    async fn unlimited_anomalies_still_process_decodable_pages() {
        let mut bad = page_of(&[3, 3]);
        bad.status = 500;
        let mut source = Scripted::new(vec![bad, page_of(&[2, 1])]);
        let mut agg = DailyAggregator::new(range(3, 3));
        let mut logger = LevelLogger::disabled("test");

        let report = collect_daily_stats(&mut source, &mut agg, &mut logger, opts(2, 0))
            .await
            .unwrap();
        assert_eq!(report.anomalies, 1);
        assert_eq!(report.records, 4);
        assert!(report.stopped);
    }

    #[tokio::test]
    async fn undecodable_success_page_is_an_error() {
        let mut source = Scripted::new(vec![FetchedPage {
            status: 200,
            body: "not json".into(),
        }]);
        let mut agg = DailyAggregator::new(range(1, 3));
        let mut logger = LevelLogger::disabled("test");

        let err = collect_daily_stats(&mut source, &mut agg, &mut logger, opts(2, 3))
            .await
            .unwrap_err();
        assert!(matches!(err, FeedError::Decode { offset: 0, .. }));
    }
}
