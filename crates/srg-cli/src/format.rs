// SPDX-License-Identifier: MIT OR Apache-2.0
//! Text rendering for run results.

use srg_aggregate::DayBucket;

use crate::commands::RunSummary;

/// Per-day result line: `Date: <d>: Success: <x.1> Fail: <y>`.
pub fn day_line(day: &DayBucket) -> String {
    format!(
        "Date: {}: Success: {:.1} Fail: {:.6}",
        day.date, day.success_pct, day.fail_pct
    )
}

/// Final line printed on stdout.
pub fn summary_line(summary: &RunSummary) -> String {
    format!(
        "wrote {} day(s) between {} to {} ({} page(s), {} record(s))",
        summary.days.len(),
        summary.range,
        summary.output.display(),
        summary.collection.pages,
        summary.collection.records,
    )
}
