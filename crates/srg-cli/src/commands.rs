// SPDX-License-Identifier: MIT OR Apache-2.0
//! The single `success-rate-graph` run.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use srg_aggregate::{DailyAggregator, DateRange, DayBucket};
use srg_chart::{ChartSeries, write_chart};
use srg_config::{ConnectionInfo, RunConfig, load_config, load_connection, validate_config};
use srg_debug::{LevelLogger, LoggerOptions};
use srg_feed::{ClientOptions, CollectOptions, CollectionReport, FeedClient, collect_daily_stats};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::format::day_line;

/// Name the level logger matches against definition entries.
pub const PROGRAM_NAME: &str = "success_rate_graph";

/// Resolved command-line input.
#[derive(Debug, Clone, Default)]
pub struct RunArgs {
    pub connection: PathBuf,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub config: Option<PathBuf>,
    pub debug_defs: Option<PathBuf>,
    pub out: Option<PathBuf>,
    pub include_partial_day: bool,
}

/// Outcome of a run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub range: DateRange,
    pub days: Vec<DayBucket>,
    pub collection: CollectionReport,
    pub output: PathBuf,
}

/// Log in, drain the feed over the resolved window and write the chart.
pub async fn cmd_run(args: RunArgs, today: NaiveDate) -> Result<RunSummary> {
    let config = load_config(args.config.as_deref()).context("load run settings")?;
    for w in validate_config(&config).context("validate run settings")? {
        warn!(target: "srg.config", "{w}");
    }

    let mut logger = init_logger(&args, &config)?;
    logger.log(0, 0, "Starting");
    debug!(target: "srg.debug", "level logger settings:\n{logger}");

    let conn = read_connection(&args.connection, &mut logger)?;

    let range = DateRange::resolve(args.start, args.end, today).context("resolve date window")?;
    logger.log(0, 1, &format!("Collecting jobs between {range}"));
    info!(target: "srg.feed", %range, "date window resolved");

    let mut client = FeedClient::new(&conn, ClientOptions::from(&config))?;
    client
        .login(&mut logger)
        .await
        .context("Login attempt failed")?;

    let mut aggregator = DailyAggregator::new(range);
    let collection = collect_daily_stats(
        &mut client,
        &mut aggregator,
        &mut logger,
        CollectOptions::from(&config),
    )
    .await
    .context("collect job records")?;

    if args.include_partial_day {
        if let Some(tail) = aggregator.finalize_tail() {
            debug!(target: "srg.aggregate", day = %tail.date, "partial day included");
        }
    }
    let days = aggregator.into_results();
    for day in &days {
        logger.log(0, 5, &day_line(day));
    }

    let output = args
        .out
        .clone()
        .unwrap_or_else(|| PathBuf::from(config.output()));
    write_chart(&output, &ChartSeries::from_buckets(&days))
        .with_context(|| format!("write chart {}", output.display()))?;
    logger.log(0, 0, "Finished");

    Ok(RunSummary {
        range,
        days,
        collection,
        output,
    })
}

fn init_logger(args: &RunArgs, config: &RunConfig) -> Result<LevelLogger> {
    let mut options = LoggerOptions::new(PROGRAM_NAME).env_var(config.debug_env_var());
    let defs = args
        .debug_defs
        .clone()
        .or_else(|| config.debug_definitions.as_ref().map(PathBuf::from));
    if let Some(path) = defs {
        options = options.definitions(path);
    }
    LevelLogger::initialize(options).context("initialize level logger")
}

fn read_connection(path: &Path, logger: &mut LevelLogger) -> Result<ConnectionInfo> {
    logger.log(1, 3, &format!("Got {} as connection file path.", path.display()));
    if !path.is_file() {
        anyhow::bail!(
            "Connection information file {} does not exist.",
            path.display()
        );
    }
    logger.log(0, 1, "Opening connection information file");
    let conn = load_connection(path)
        .with_context(|| format!("read connection information {}", path.display()))?;
    logger.log(0, 1, "Read connection information file");
    Ok(conn)
}
