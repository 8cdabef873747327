//! Collaborator assembly and the three commands: run, show-cal, self-check.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use eyre::WrapErr;
use level_config::Config;
use level_core::error::LevelError;
use level_core::telemetry::{STORE_INIT_FAILED, render_basic};
use level_core::{
    CalibrationSet, CalibrationStore, DisplayMode, LevelMonitor, LevelPipeline, PipelineCfg,
    RunParams, RunSummary, SensorArray,
};
use level_hardware::{DEFAULT_CAPACITY, FileByteStore, SimulatedSensorStack, StreamSerial};
use level_traits::{MonotonicClock, SensorSource, SerialTransport};

pub struct RunOptions {
    pub cycles: Option<u64>,
    pub fill_mm: Option<u32>,
    pub mode: Option<DisplayMode>,
}

fn sensor_stack(cfg: &Config, fill_mm: Option<u32>) -> SimulatedSensorStack {
    SimulatedSensorStack::new(cfg.sensors.count, cfg.sensors.max_height_mm)
        .with_counts(cfg.simulation.dry_counts, cfg.simulation.wet_counts)
        .with_fill_mm(fill_mm.unwrap_or(cfg.simulation.fill_mm))
}

fn open_transport(cfg: &Config) -> eyre::Result<Box<dyn SerialTransport>> {
    match &cfg.serial.port {
        #[cfg(feature = "hardware")]
        Some(port) => {
            let t = level_hardware::SerialPortTransport::open(port, cfg.serial.baud_rate)
                .map_err(|e| LevelError::Io(e.to_string()))?;
            Ok(Box::new(t))
        }
        #[cfg(not(feature = "hardware"))]
        Some(port) => Err(eyre::eyre!(
            "serial.port = {port:?} needs a build with the `hardware` feature"
        )),
        None => Ok(Box::new(StreamSerial::stdio())),
    }
}

fn open_store(cfg: &Config, format_if_missing: bool) -> eyre::Result<FileByteStore> {
    FileByteStore::open(&cfg.storage.path, DEFAULT_CAPACITY, format_if_missing).map_err(|e| {
        let msg = e.to_string();
        let mapped = match e {
            level_hardware::HwError::StoreInit(m) => LevelError::StoreInit(m),
            _ => LevelError::StoreInit(msg),
        };
        eyre::Report::new(mapped)
    })
}

/// Run the monitor loop until Ctrl-C, the cycle cap or a fatal error.
pub fn run_monitor(
    cfg: &Config,
    opts: &RunOptions,
    shutdown: Arc<AtomicBool>,
) -> eyre::Result<RunSummary> {
    let mut transport = open_transport(cfg)?;
    let store = match open_store(cfg, cfg.storage.format_if_missing) {
        Ok(s) => s,
        Err(e) => {
            transport.write_str(STORE_INIT_FAILED);
            tracing::error!(error = %e, path = %cfg.storage.path, "calibration store unavailable");
            return Err(e);
        }
    };

    let mut builder = LevelMonitor::builder()
        .with_sensors(sensor_stack(cfg, opts.fill_mm))
        .with_store(store)
        .with_transport(transport)
        .with_pipeline((&cfg.sensors).into())
        .with_samples((&cfg.samples).into());
    if let Some(mode) = opts.mode {
        builder = builder.with_initial_mode(mode);
    }
    let mut monitor = builder.build().wrap_err("assemble monitor")?;
    tracing::debug!(?monitor, "monitor assembled");

    let params = RunParams {
        timing: (&cfg.timing).into(),
        max_cycles: opts.cycles,
        shutdown: Some(shutdown),
    };
    monitor.run(&MonotonicClock::new(), &params)
}

/// Stored baselines, as printed at start-up.
pub fn show_cal(cfg: &Config) -> eyre::Result<CalibrationSet> {
    let store = open_store(cfg, false)?;
    let mut cal = CalibrationStore::new(store, cfg.sensors.count);
    Ok(cal.load()?.clone())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelfCheckReport {
    pub sensors: usize,
    pub baselines: Vec<u32>,
    pub line: String,
}

/// Validate the pipeline config, read the calibration record without
/// formatting a missing store, and run one simulated scan through it.
pub fn self_check(cfg: &Config) -> eyre::Result<SelfCheckReport> {
    let pipeline_cfg: PipelineCfg = (&cfg.sensors).into();
    pipeline_cfg
        .validate()
        .map_err(eyre::Report::new)
        .wrap_err("sensor geometry")?;

    let store = open_store(cfg, false)?;
    let mut cal = CalibrationStore::new(store, pipeline_cfg.sensor_count);
    let baselines = cal.load()?.clone();

    let mut stack = sensor_stack(cfg, None);
    stack
        .start_scan()
        .map_err(|e| LevelError::Sensor(e.to_string()))?;
    let mut array = SensorArray::new(&pipeline_cfg).map_err(eyre::Report::new)?;
    array.capture(&stack);
    let est = LevelPipeline::new(&pipeline_cfg).process(&mut array, &baselines);

    Ok(SelfCheckReport {
        sensors: stack.sensor_count(),
        baselines: baselines.as_slice().to_vec(),
        line: render_basic(&est).trim_end().to_string(),
    })
}
