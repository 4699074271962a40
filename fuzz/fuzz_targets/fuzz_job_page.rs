// SPDX-License-Identifier: MIT OR Apache-2.0
//! Fuzz job-page decoding and aggregation.
//!
//! Arbitrary bodies are decoded as feed pages; whatever decodes is streamed
//! through a `DailyAggregator`, which must never panic and must signal
//! stop at most once.
#![no_main]
use chrono::NaiveDate;
use libfuzzer_sys::fuzz_target;
use srg_aggregate::{ControlSignal, DailyAggregator, DateRange};
use srg_feed::FetchedPage;

fuzz_target!(|data: &[u8]| {
    let page = FetchedPage {
        status: 200,
        body: String::from_utf8_lossy(data).into_owned(),
    };
    let Ok(page) = page.decode(0) else {
        return;
    };

    let (Some(start), Some(end)) = (
        NaiveDate::from_ymd_opt(2024, 1, 1),
        NaiveDate::from_ymd_opt(2024, 12, 31),
    ) else {
        return;
    };
    let Ok(range) = DateRange::new(start, end) else {
        return;
    };

    let mut agg = DailyAggregator::new(range);
    let mut stops = 0;
    for job in &page.job {
        if let Ok(ControlSignal::Stop) = agg.ingest(job) {
            stops += 1;
        }
    }
    assert!(stops <= 1);
    for day in agg.into_results() {
        assert!(day.successes + day.failures <= day.total_jobs);
    }
});
