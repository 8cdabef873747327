//! The scan/report cycle (`MonitorCore`).
//!
//! Owns the sensor table, the calibration store, the protocol session and the
//! sample sequence, plus the three collaborators. Each completed scan runs one
//! cycle: capture raw counts, restart the scan, honour a pending calibration,
//! compute the level, print the periodic line, take one operator command and
//! finally service the sample sequence.

use eyre::WrapErr;
use level_traits::{ByteStore, SensorSource, SerialTransport};

use crate::calibration::{CalibrationSet, CalibrationStore};
use crate::error::{LevelError, Report, Result};
use crate::hw_error::map_sensor_error;
use crate::pipeline::{LevelEstimate, LevelPipeline, SensorArray};
use crate::protocol::{DisplayMode, ProtocolSession};
use crate::status::CycleStatus;
use crate::telemetry::{
    self, BANNER, COMMAND_HELP, RESET_NOTICE, STORE_READ_FAILED, STORE_WRITE_FAILED,
    SampleSequence,
};

/// Unified core for both the boxed and the statically dispatched monitor.
pub struct MonitorCore<S: SensorSource, B: ByteStore, T: SerialTransport> {
    pub(crate) sensors: S,
    pub(crate) calibration: CalibrationStore<B>,
    pub(crate) transport: T,
    pub(crate) array: SensorArray,
    pub(crate) pipeline: LevelPipeline,
    pub(crate) session: ProtocolSession,
    pub(crate) samples: SampleSequence,
    pub(crate) last: Option<LevelEstimate>,
    pub(crate) cycles: u64,
    pub(crate) started: bool,
    pub(crate) halted: bool,
}

impl<S: SensorSource, B: ByteStore, T: SerialTransport> core::fmt::Debug for MonitorCore<S, B, T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MonitorCore")
            .field("slots", &self.array.len())
            .field("mode", &self.session.mode())
            .field("cycles", &self.cycles)
            .field("halted", &self.halted)
            .finish()
    }
}

impl<S: SensorSource, B: ByteStore, T: SerialTransport> MonitorCore<S, B, T> {
    /// Print the banner and command help, load and show the stored
    /// calibration, then start the first scan.
    ///
    /// A store read failure halts the monitor.
    pub fn start(&mut self) -> Result<()> {
        if self.halted {
            return Err(Report::new(LevelError::Halted));
        }
        self.transport.write_str(BANNER);
        self.transport.write_str(COMMAND_HELP);
        if let Err(e) = self.calibration.load().map(|_| ()) {
            return Err(self.halt(STORE_READ_FAILED, e));
        }
        let shown = self.calibration.display();
        self.transport.write_str(&shown);
        self.kick_scan()?;
        self.started = true;
        tracing::info!(slots = self.array.len(), "monitor started");
        Ok(())
    }

    /// Run one cycle if the scan engine has finished, otherwise report busy.
    ///
    /// Starts the monitor first if [`start`](Self::start) was never called.
    pub fn poll(&mut self) -> Result<CycleStatus> {
        if self.halted {
            return Err(Report::new(LevelError::Halted));
        }
        if !self.started {
            self.start()?;
        }
        if self.sensors.is_busy() {
            return Ok(CycleStatus::Busy);
        }
        self.run_cycle().map(CycleStatus::Completed)
    }

    fn run_cycle(&mut self) -> Result<LevelEstimate> {
        self.array.capture(&self.sensors);
        self.kick_scan()?;

        if self.session.take_cal_request() {
            // shown before the write, so a failed save still lists the counts
            let counts = self.array.raw_counts();
            let shown = CalibrationSet::from_baselines(&counts)?.display();
            self.transport.write_str(&shown);
            if let Err(e) = self.calibration.save(&counts) {
                return Err(self.halt(STORE_WRITE_FAILED, e));
            }
        }

        let est = self
            .pipeline
            .process(&mut self.array, self.calibration.baselines());
        self.render_periodic(&est);
        self.session.poll(&mut self.transport);
        self.service_samples(&est);

        self.last = Some(est);
        self.cycles += 1;
        Ok(est)
    }

    fn kick_scan(&mut self) -> Result<()> {
        self.sensors
            .start_scan()
            .map_err(|e| Report::new(map_sensor_error(&*e)))
            .wrap_err("starting sensor scan")
    }

    fn render_periodic(&mut self, est: &LevelEstimate) {
        match self.session.mode() {
            DisplayMode::None => {}
            DisplayMode::Basic => {
                let line = telemetry::render_basic(est);
                self.transport.write_str(&line);
            }
            DisplayMode::CsvInit => {
                let header = telemetry::render_csv_header(self.array.len());
                self.transport.write_str(&header);
                self.session.set_mode(DisplayMode::Csv);
            }
            DisplayMode::Csv => {
                let row = telemetry::render_csv_row(&self.array, est);
                self.transport.write_str(&row);
            }
        }
    }

    fn service_samples(&mut self, est: &LevelEstimate) {
        if self.session.store_requested() {
            self.session.set_mode(DisplayMode::None);
            let label = self.samples.current_label();
            let rows = self.samples.capture(&self.array, est);
            self.transport.write_str(&rows);
            self.session.clear_store_request();
            tracing::info!(label, cursor = self.samples.cursor(), "sample captured");
        }
        if self.session.reset_requested() {
            self.samples.reset();
            self.transport.write_str(RESET_NOTICE);
            self.session.clear_sample_flags();
            tracing::info!("sample sequence reset");
        }
    }

    /// Enter the permanent halted state after a fatal error.
    fn halt(&mut self, message: &str, err: Report) -> Report {
        self.halted = true;
        self.transport.write_str(message);
        tracing::error!(error = %err, "fatal store error, monitor halted");
        err
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Completed cycles since construction.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Estimate of the most recent cycle.
    pub fn last_estimate(&self) -> Option<LevelEstimate> {
        self.last
    }

    pub fn mode(&self) -> DisplayMode {
        self.session.mode()
    }

    pub fn session(&self) -> &ProtocolSession {
        &self.session
    }

    pub fn samples(&self) -> &SampleSequence {
        &self.samples
    }

    pub fn sensor_array(&self) -> &SensorArray {
        &self.array
    }

    pub fn baselines(&self) -> &CalibrationSet {
        self.calibration.baselines()
    }

    pub fn pipeline(&self) -> &LevelPipeline {
        &self.pipeline
    }

    pub fn sensors(&self) -> &S {
        &self.sensors
    }

    pub fn sensors_mut(&mut self) -> &mut S {
        &mut self.sensors
    }

    pub fn store(&self) -> &B {
        self.calibration.store()
    }

    pub fn store_mut(&mut self) -> &mut B {
        self.calibration.store_mut()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Hand back the collaborators.
    pub fn into_parts(self) -> (S, B, T) {
        let Self {
            sensors,
            calibration,
            transport,
            ..
        } = self;
        (sensors, calibration.into_store(), transport)
    }
}
