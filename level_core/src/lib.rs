#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Capacitive liquid level monitor core (hardware-agnostic).
//!
//! The scan engine, the calibration byte store and the serial link are reached
//! only through the `level_traits` traits.
//!
//! ## Architecture
//!
//! - **Fixed point**: 24.8 levels and 8.8 gains (`fixed_point`)
//! - **Calibration**: per-slot empty-container baselines and their record (`calibration`)
//! - **Pipeline**: raw counts to active count, height and percent (`pipeline`)
//! - **Protocol**: line commands and display mode (`protocol`)
//! - **Telemetry**: periodic lines and the bench sample sequence (`telemetry`)
//! - **Cycle**: `MonitorCore`, the builder and the run loop
//!
//! ## Fixed-Point Arithmetic
//!
//! No floating point anywhere: heights and percentages are `i32` with 8
//! fractional bits, so a level of `0x2680` reads `38.5`.

pub mod builder;
pub mod calibration;
pub mod config;
pub mod conversions;
pub mod error;
pub mod fixed_point;
pub mod hw_error;
pub mod mocks;
pub mod monitor;
pub mod pipeline;
pub mod protocol;
pub mod runner;
pub mod status;
pub mod telemetry;

pub use builder::{LevelMonitor, LevelMonitorBuilder, LevelMonitorG, Missing, Set, build_monitor};
pub use calibration::{CalibrationSet, CalibrationStore};
pub use config::{PipelineCfg, SampleCfg, Timing};
pub use error::{BuildError, LevelError, Report, Result};
pub use monitor::MonitorCore;
pub use pipeline::{LevelEstimate, LevelPipeline, SensorArray, SensorSlot};
pub use protocol::{Command, DisplayMode, ProtocolSession};
pub use runner::{RunParams, RunSummary, StopReason};
pub use status::CycleStatus;
pub use telemetry::SampleSequence;
