mod cli;
mod error_fmt;
mod monitor;

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use eyre::{Result, WrapErr};
use level_config::Config;

use crate::cli::{Cli, Commands, FILE_GUARD, JSON_MODE};
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};
use crate::monitor::{RunOptions, run_monitor, self_check, show_cal};

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    if let Err(e) = real_main(cli) {
        if JSON_MODE.get().copied().unwrap_or(false) {
            eprintln!("{}", format_error_json(&e));
        } else {
            eprintln!("{}", humanize(&e));
        }
        std::process::exit(exit_code_for_error(&e));
    }
}

fn real_main(cli: Cli) -> Result<()> {
    color_eyre::install()?;
    let cfg = load_config(cli.config.as_deref(), cli.sensor_table.as_deref())?;
    init_tracing(cli.json, &cli.log_level, &cfg.logging)?;
    tracing::debug!(?cfg, "config loaded");

    match cli.cmd {
        Commands::Run {
            cycles,
            fill_mm,
            mode,
        } => {
            let shutdown = Arc::new(AtomicBool::new(false));
            let flag = shutdown.clone();
            if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed)) {
                tracing::warn!(error = %e, "no Ctrl-C handler; stop with --cycles");
            }
            let opts = RunOptions {
                cycles,
                fill_mm,
                mode: mode.map(Into::into),
            };
            let summary = run_monitor(&cfg, &opts, shutdown)?;
            tracing::info!(cycles = summary.cycles, reason = ?summary.reason, "monitor stopped");
        }
        Commands::ShowCal => {
            let cal = show_cal(&cfg)?;
            if cli.json {
                println!("{}", serde_json::json!({ "baselines": cal.as_slice() }));
            } else {
                println!("{}", cal.display().trim_end());
            }
        }
        Commands::SelfCheck => {
            let report = self_check(&cfg)?;
            if cli.json {
                println!(
                    "{}",
                    serde_json::json!({
                        "status": "ok",
                        "sensors": report.sensors,
                        "baselines": report.baselines,
                        "reading": report.line,
                    })
                );
            } else {
                println!(
                    "Self-check OK: {} sensors, store readable, reading {}",
                    report.sensors, report.line
                );
            }
        }
    }
    Ok(())
}

fn load_config(path: Option<&Path>, sensor_table: Option<&Path>) -> Result<Config> {
    let mut cfg = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .wrap_err_with(|| format!("read config {}", path.display()))?;
            level_config::load_toml(&text)
                .map_err(|e| eyre::eyre!("parse config {}: {e}", path.display()))?
        }
        None => Config::default(),
    };
    if let Some(table) = sensor_table {
        cfg.apply_sensor_table(level_config::load_sensor_table_csv(table)?);
    }
    cfg.validate()?;
    Ok(cfg)
}

/// Console logs go to stderr so stdout stays the serial stream; the optional
/// `[logging] file` sink always writes JSON lines.
fn init_tracing(json: bool, level: &str, logging: &level_config::Logging) -> Result<()> {
    use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};
    use tracing_subscriber::prelude::*;

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();

    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    if json {
        layers.push(
            fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_filter(console_filter)
                .boxed(),
        );
    } else {
        layers.push(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_filter(console_filter)
                .boxed(),
        );
    }

    if let Some(file) = &logging.file {
        let path = Path::new(file);
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let name = path
            .file_name()
            .ok_or_else(|| eyre::eyre!("logging.file {file:?} has no file name"))?;
        let appender = match logging.rotation.as_deref() {
            Some("daily") => tracing_appender::rolling::daily(dir, name),
            Some("hourly") => tracing_appender::rolling::hourly(dir, name),
            _ => tracing_appender::rolling::never(dir, name),
        };
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = FILE_GUARD.set(guard);
        let file_level = logging.level.as_deref().unwrap_or("info");
        layers.push(
            fmt::layer()
                .json()
                .with_writer(writer)
                .with_filter(EnvFilter::new(file_level))
                .boxed(),
        );
    }

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .map_err(|e| eyre::eyre!("init tracing: {e}"))
}
