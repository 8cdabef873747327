//! Type-state builder for `LevelMonitor` and generic `build_monitor` constructor.
//!
//! `build()` only exists once the sensor source, byte store and transport are
//! set; `try_build()` is always available and reports what is missing.

use std::marker::PhantomData;

use level_traits::{ByteStore, SensorSource, SerialTransport, clock::Clock};

use crate::calibration::{CalibrationSet, CalibrationStore};
use crate::config::{PipelineCfg, SampleCfg};
use crate::error::{BuildError, Report, Result};
use crate::monitor::MonitorCore;
use crate::pipeline::{LevelEstimate, LevelPipeline, SensorArray};
use crate::protocol::{DisplayMode, ProtocolSession};
use crate::runner::{self, RunParams, RunSummary};
use crate::status::CycleStatus;
use crate::telemetry::SampleSequence;

type DynCore = MonitorCore<Box<dyn SensorSource>, Box<dyn ByteStore>, Box<dyn SerialTransport>>;

// ── Public dynamic-dispatch wrapper ──────────────────────────────────────────

/// Boxed monitor; the collaborators are chosen at runtime.
pub struct LevelMonitor {
    pub(crate) inner: DynCore,
}

impl core::fmt::Debug for LevelMonitor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LevelMonitor")
            .field("slots", &self.inner.array.len())
            .field("mode", &self.inner.session.mode())
            .field("cycles", &self.inner.cycles)
            .field("halted", &self.inner.halted)
            .finish()
    }
}

impl LevelMonitor {
    pub fn builder() -> LevelMonitorBuilder<Missing, Missing, Missing> {
        LevelMonitorBuilder::default()
    }

    /// Banner, help, calibration load and first scan.
    pub fn start(&mut self) -> Result<()> {
        self.inner.start()
    }

    /// One cycle if the scan finished.
    pub fn poll(&mut self) -> Result<CycleStatus> {
        self.inner.poll()
    }

    /// Cooperative loop until shutdown or the cycle cap.
    pub fn run(&mut self, clock: &dyn Clock, params: &RunParams) -> Result<RunSummary> {
        runner::run(&mut self.inner, clock, params)
    }

    pub fn is_halted(&self) -> bool {
        self.inner.is_halted()
    }

    pub fn cycles(&self) -> u64 {
        self.inner.cycles()
    }

    pub fn last_estimate(&self) -> Option<LevelEstimate> {
        self.inner.last_estimate()
    }

    pub fn mode(&self) -> DisplayMode {
        self.inner.mode()
    }

    pub fn baselines(&self) -> &CalibrationSet {
        self.inner.baselines()
    }

    pub fn sensor_array(&self) -> &SensorArray {
        self.inner.sensor_array()
    }

    pub fn samples(&self) -> &SampleSequence {
        self.inner.samples()
    }
}

// ── Type-state markers ───────────────────────────────────────────────────────

pub struct Missing;
pub struct Set;

/// Builder for `LevelMonitor`. Geometry is validated on `build()`.
pub struct LevelMonitorBuilder<S, B, T> {
    sensors: Option<Box<dyn SensorSource>>,
    store: Option<Box<dyn ByteStore>>,
    transport: Option<Box<dyn SerialTransport>>,
    pipeline: Option<PipelineCfg>,
    samples: Option<SampleCfg>,
    mode: Option<DisplayMode>,
    _s: PhantomData<S>,
    _b: PhantomData<B>,
    _t: PhantomData<T>,
}

impl Default for LevelMonitorBuilder<Missing, Missing, Missing> {
    fn default() -> Self {
        Self {
            sensors: None,
            store: None,
            transport: None,
            pipeline: None,
            samples: None,
            mode: None,
            _s: PhantomData,
            _b: PhantomData,
            _t: PhantomData,
        }
    }
}

/// Validate the configuration and assemble a `MonitorCore`.
///
/// Shared by `LevelMonitorBuilder::try_build()` and `build_monitor()`.
fn validate_and_build<S: SensorSource, B: ByteStore, T: SerialTransport>(
    sensors: S,
    store: B,
    transport: T,
    pipeline: PipelineCfg,
    samples: SampleCfg,
    mode: DisplayMode,
) -> Result<MonitorCore<S, B, T>> {
    pipeline.validate().map_err(Report::new)?;
    samples.validate().map_err(Report::new)?;
    if sensors.sensor_count() < pipeline.sensor_count {
        return Err(Report::new(BuildError::InvalidConfig(
            "sensor source reports fewer slots than sensor_count",
        )));
    }

    let array = SensorArray::new(&pipeline).map_err(Report::new)?;
    let samples = SampleSequence::new(&samples).map_err(Report::new)?;
    let mut session = ProtocolSession::new();
    session.set_mode(mode);

    Ok(MonitorCore {
        sensors,
        calibration: CalibrationStore::new(store, pipeline.sensor_count),
        transport,
        array,
        pipeline: LevelPipeline::new(&pipeline),
        session,
        samples,
        last: None,
        cycles: 0,
        started: false,
        halted: false,
    })
}

impl<S, B, T> LevelMonitorBuilder<S, B, T> {
    /// Fallible build available in any type-state.
    pub fn try_build(self) -> Result<LevelMonitor> {
        let sensors = self
            .sensors
            .ok_or_else(|| Report::new(BuildError::MissingSensors))?;
        let store = self
            .store
            .ok_or_else(|| Report::new(BuildError::MissingStore))?;
        let transport = self
            .transport
            .ok_or_else(|| Report::new(BuildError::MissingTransport))?;

        let inner = validate_and_build(
            sensors,
            store,
            transport,
            self.pipeline.unwrap_or_default(),
            self.samples.unwrap_or_default(),
            self.mode.unwrap_or_default(),
        )?;
        Ok(LevelMonitor { inner })
    }

    pub fn with_pipeline(mut self, pipeline: PipelineCfg) -> Self {
        self.pipeline = Some(pipeline);
        self
    }

    pub fn with_samples(mut self, samples: SampleCfg) -> Self {
        self.samples = Some(samples);
        self
    }

    /// Periodic output at power-up; `Basic` unless set.
    pub fn with_initial_mode(mut self, mode: DisplayMode) -> Self {
        self.mode = Some(mode);
        self
    }
}

// Setters that advance type-state
impl<B, T> LevelMonitorBuilder<Missing, B, T> {
    pub fn with_sensors(
        self,
        sensors: impl SensorSource + 'static,
    ) -> LevelMonitorBuilder<Set, B, T> {
        LevelMonitorBuilder {
            sensors: Some(Box::new(sensors)),
            store: self.store,
            transport: self.transport,
            pipeline: self.pipeline,
            samples: self.samples,
            mode: self.mode,
            _s: PhantomData,
            _b: PhantomData,
            _t: PhantomData,
        }
    }
}

impl<S, T> LevelMonitorBuilder<S, Missing, T> {
    pub fn with_store(self, store: impl ByteStore + 'static) -> LevelMonitorBuilder<S, Set, T> {
        LevelMonitorBuilder {
            sensors: self.sensors,
            store: Some(Box::new(store)),
            transport: self.transport,
            pipeline: self.pipeline,
            samples: self.samples,
            mode: self.mode,
            _s: PhantomData,
            _b: PhantomData,
            _t: PhantomData,
        }
    }
}

impl<S, B> LevelMonitorBuilder<S, B, Missing> {
    pub fn with_transport(
        self,
        transport: impl SerialTransport + 'static,
    ) -> LevelMonitorBuilder<S, B, Set> {
        LevelMonitorBuilder {
            sensors: self.sensors,
            store: self.store,
            transport: Some(Box::new(transport)),
            pipeline: self.pipeline,
            samples: self.samples,
            mode: self.mode,
            _s: PhantomData,
            _b: PhantomData,
            _t: PhantomData,
        }
    }
}

impl LevelMonitorBuilder<Set, Set, Set> {
    /// Validate and build. Only available once all collaborators are set.
    pub fn build(self) -> Result<LevelMonitor> {
        self.try_build()
    }
}

/// Statically dispatched monitor.
pub type LevelMonitorG<S, B, T> = MonitorCore<S, B, T>;

/// Build a `LevelMonitorG` from concrete collaborators.
pub fn build_monitor<S, B, T>(
    sensors: S,
    store: B,
    transport: T,
    pipeline: PipelineCfg,
    samples: SampleCfg,
) -> Result<LevelMonitorG<S, B, T>>
where
    S: SensorSource,
    B: ByteStore,
    T: SerialTransport,
{
    validate_and_build(
        sensors,
        store,
        transport,
        pipeline,
        samples,
        DisplayMode::default(),
    )
}
