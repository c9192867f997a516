use chrono::FixedOffset;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::model::ResultsMode;

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunMode {
    /// Accept punches over http and serve live results.
    Serve,
    /// Re-export the results document on a fixed interval.
    ExportLoop,
    /// Export the results document once and exit.
    ExportOnce,
    /// Post simulated punches to a running server.
    Simulate,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[arg(short = 'm', long, value_enum, default_value_t = RunMode::Serve)]
    pub mode: RunMode,

    /// Sqlite file holding recorded punches. `:memory:` keeps them in memory.
    #[arg(long, value_name = "PUNCH_DB", default_value = "punches.db")]
    pub punch_db: String,

    /// Json export of the roster and competition data. Not needed in simulate mode.
    #[arg(
        short = 'r',
        long,
        value_name = "ROSTER_JSON",
        value_parser = crate::args::validation::check_readable_file_and_json
    )]
    pub roster: Option<PathBuf>,

    #[arg(short = 's', long, value_name = "STAGE", default_value = "1")]
    pub stage: String,

    #[arg(short = 'b', long, value_name = "ADDRESS", default_value = "0.0.0.0:8000")]
    pub bind: String,

    #[arg(
        short = 'o',
        long,
        value_name = "DIR",
        default_value = ".",
        value_parser = crate::args::validation::check_writable_dir
    )]
    pub output_dir: PathBuf,

    #[arg(long, value_name = "SECONDS", default_value_t = 30)]
    pub interval_secs: u64,

    #[arg(
        long,
        value_name = "MODE",
        default_value = "snapshot",
        value_parser = clap::value_parser!(ResultsMode)
    )]
    pub export_mode: ResultsMode,

    /// Wall-clock offset of the competition venue.
    #[arg(
        long,
        value_name = "OFFSET",
        default_value = "+02:00",
        allow_hyphen_values = true,
        value_parser = crate::args::validation::parse_utc_offset
    )]
    pub utc_offset: FixedOffset,

    // Only necessary for simulate mode.
    #[arg(long, value_name = "URL", default_value = "http://127.0.0.1:8000")]
    pub target: String,
    #[arg(long, value_name = "CHIP_NUMBER")]
    pub chip: Option<i64>,
    #[arg(long, value_name = "STATION_CODE", default_value_t = 0)]
    pub station: i64,
    #[arg(long, value_name = "COUNT", default_value_t = 1)]
    pub count: u32,
    #[arg(long, value_name = "MILLISECONDS", default_value_t = 500)]
    pub delay_ms: u64,
}

#[derive(Debug, Clone)]
pub struct CleanArgs {
    pub mode: RunMode,
    pub punch_db: String,
    /// Always set outside simulate mode.
    pub roster: Option<PathBuf>,
    pub stage: String,
    pub bind: String,
    pub output_dir: PathBuf,
    pub interval_secs: u64,
    pub export_mode: ResultsMode,
    pub utc_offset: FixedOffset,
    pub simulate: Option<SimulateArgs>,
}

#[derive(Debug, Clone)]
pub struct SimulateArgs {
    pub target: String,
    pub chip: i64,
    pub station: i64,
    pub count: u32,
    pub delay_ms: u64,
}
