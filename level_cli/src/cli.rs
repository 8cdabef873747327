//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use level_core::DisplayMode;
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "levelmon", version, about = "Capacitive liquid level monitor")]
pub struct Cli {
    /// Path to config TOML; built-in defaults apply when omitted
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Optional per-slot sensor table CSV (strict header `slot,scale,threshold`)
    #[arg(long = "sensor-table", value_name = "FILE")]
    pub sensor_table: Option<PathBuf>,

    /// Log as JSON lines instead of pretty
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "warn")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

/// Periodic output selected at power-up.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum ModeArg {
    /// No periodic output
    None,
    /// `%=.. mm=..` line per cycle
    Basic,
    /// CSV header then one row per cycle
    Csv,
}

impl From<ModeArg> for DisplayMode {
    fn from(m: ModeArg) -> Self {
        match m {
            ModeArg::None => DisplayMode::None,
            ModeArg::Basic => DisplayMode::Basic,
            ModeArg::Csv => DisplayMode::CsvInit,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the monitor: serial commands on stdin (or the configured port),
    /// telemetry on stdout
    Run {
        /// Stop after this many completed cycles
        #[arg(long, value_name = "N")]
        cycles: Option<u64>,
        /// Override the simulated liquid height (mm)
        #[arg(long = "fill-mm", value_name = "MM")]
        fill_mm: Option<u32>,
        /// Periodic output at start-up
        #[arg(long, value_enum, value_name = "MODE")]
        mode: Option<ModeArg>,
    },
    /// Print the stored empty-container calibration
    ShowCal,
    /// Quick health check: config, calibration store and one simulated scan
    SelfCheck,
}
