// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]

mod commands;
mod format;

use anyhow::Result;
use chrono::{Local, NaiveDate};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::commands::RunArgs;

#[derive(Parser, Debug)]
#[command(
    name = "success-rate-graph",
    version,
    about = "Chart daily job success rates from a reporting server"
)]
struct Cli {
    /// Connection-info JSON file (credentials and master server).
    #[arg(short = 'c', long = "connection")]
    connection: PathBuf,

    /// First day of the window (YYYY-MM-DD). Defaults to 30 days before the end.
    #[arg(short = 's', long = "start", value_parser = parse_date)]
    start: Option<NaiveDate>,

    /// Last day of the window (YYYY-MM-DD). Defaults to today.
    #[arg(short = 'e', long = "end", value_parser = parse_date)]
    end: Option<NaiveDate>,

    /// Run settings TOML file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Debug-definition JSON file.
    #[arg(long = "debug-defs")]
    debug_defs: Option<PathBuf>,

    /// Chart output path (overrides the run settings).
    #[arg(long)]
    out: Option<PathBuf>,

    /// Also chart the oldest day, which the feed may have cut short.
    #[arg(long)]
    include_partial_day: bool,

    /// Enable debug logging.
    #[arg(long)]
    debug: bool,
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("expected YYYY-MM-DD: {e}"))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.debug {
        EnvFilter::new("srg=debug")
    } else {
        EnvFilter::new("srg=info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = RunArgs {
        connection: cli.connection,
        start: cli.start,
        end: cli.end,
        config: cli.config,
        debug_defs: cli.debug_defs,
        out: cli.out,
        include_partial_day: cli.include_partial_day,
    };
    let summary = commands::cmd_run(args, Local::now().date_naive()).await?;
    println!("{}", format::summary_line(&summary));
    Ok(())
}
