// SPDX-License-Identifier: MIT OR Apache-2.0
//! Daily success-rate chart.
//!
//! [`ChartSeries`] turns finalized [`DayBucket`]s into two bar traces;
//! [`render_html`] embeds them in a self-contained page that loads
//! plotly.js from its CDN and stacks the bars per day.
#![deny(unsafe_code)]
#![warn(missing_docs)]

use askama::Template;
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::json;
use srg_aggregate::DayBucket;
use std::path::{Path, PathBuf};
use tracing::info;

/// Default chart title.
pub const DEFAULT_TITLE: &str = "Success Rate %";

/// plotly.js bundle referenced by the page.
pub const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

/// Errors raised while producing the chart file.
#[derive(Debug, thiserror::Error)]
pub enum ChartError {
    /// The trace data could not be serialized.
    #[error("failed to serialize chart data")]
    Serialize(#[from] serde_json::Error),

    /// The page template failed to render.
    #[error("failed to render chart page")]
    Render(#[from] askama::Error),

    /// The output file could not be written.
    #[error("failed to write chart to {path}")]
    Write {
        /// Destination path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Chart data: one x value per day and the two stacked y series.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartSeries {
    /// Days, in the order the buckets were given.
    pub dates: Vec<NaiveDate>,
    /// Success percentage per day.
    pub succeeded: Vec<f64>,
    /// Failure percentage per day.
    pub failed: Vec<f64>,
}

impl ChartSeries {
    /// Collect the series from finalized buckets.
    #[must_use]
    pub fn from_buckets(buckets: &[DayBucket]) -> Self {
        let mut series = Self::default();
        for b in buckets {
            series.dates.push(b.date);
            series.succeeded.push(b.success_pct);
            series.failed.push(b.fail_pct);
        }
        series
    }

    /// Number of days plotted.
    #[must_use]
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Whether there is nothing to plot.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    fn traces(&self) -> serde_json::Value {
        let x: Vec<String> = self.dates.iter().map(ToString::to_string).collect();
        json!([
            {"type": "bar", "name": "Succeeded", "x": x, "y": self.succeeded},
            {"type": "bar", "name": "Failed", "x": x, "y": self.failed},
        ])
    }
}

/// Page template; `templates/chart.html`.
#[derive(Template)]
#[template(path = "chart.html")]
struct ChartPage<'a> {
    title: &'a str,
    cdn: &'a str,
    data: String,
    layout: String,
}

/// Render the full HTML page.
///
/// The title is HTML-escaped in markup. The trace and layout JSON are
/// embedded in an inline script, so `<` is emitted as `\u003c` there.
pub fn render_html(series: &ChartSeries, title: &str) -> Result<String, ChartError> {
    let data = script_json(&series.traces())?;
    let layout = script_json(&json!({
        "barmode": "stack",
        "title": {"text": title},
        "xaxis": {"tickangle": -90, "type": "category"},
    }))?;
    let page = ChartPage {
        title,
        cdn: PLOTLY_CDN,
        data,
        layout,
    };
    Ok(page.render()?)
}

fn script_json(value: &serde_json::Value) -> Result<String, ChartError> {
    Ok(serde_json::to_string(value)?.replace('<', "\\u003c"))
}

/// Render `series` under [`DEFAULT_TITLE`] and write it to `path`.
pub fn write_chart(path: &Path, series: &ChartSeries) -> Result<(), ChartError> {
    let html = render_html(series, DEFAULT_TITLE)?;
    std::fs::write(path, html).map_err(|source| ChartError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    info!(target: "srg.chart", path = %path.display(), days = series.len(), "chart written");
    Ok(())
}
