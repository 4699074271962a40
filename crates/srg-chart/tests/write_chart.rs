// SPDX-License-Identifier: MIT OR Apache-2.0
//! Writing the chart file.

use chrono::NaiveDate;
use srg_aggregate::DayBucket;
use srg_chart::{ChartError, ChartSeries, write_chart};

fn day(d: u32) -> DayBucket {
    DayBucket {
        date: NaiveDate::from_ymd_opt(2024, 2, d).unwrap(),
        total_jobs: 3,
        successes: 2,
        failures: 0,
        success_pct: 100.0,
        fail_pct: 0.0,
    }
}

#[test]
fn writes_html_file() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("success_rates.html");
    let series = ChartSeries::from_buckets(&[day(9), day(8)]);

    write_chart(&out, &series).unwrap();

    let html = std::fs::read_to_string(&out).unwrap();
    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("2024-02-09"));
    assert!(html.contains("2024-02-08"));
    assert!(html.contains("Plotly.newPlot"));
}

#[test]
fn overwrites_existing_file() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("chart.html");
    std::fs::write(&out, "stale").unwrap();

    write_chart(&out, &ChartSeries::default()).unwrap();
    assert!(!std::fs::read_to_string(&out).unwrap().contains("stale"));
}

#[test]
fn missing_directory_is_a_write_error() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("no/such/dir/chart.html");

    let err = write_chart(&out, &ChartSeries::default()).unwrap_err();
    assert!(matches!(err, ChartError::Write { .. }));
}
