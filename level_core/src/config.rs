//! Configuration types for the level monitor.
//!
//! These are the runtime configuration structs used by `LevelMonitor`.
//! They are separate from the TOML-deserialized config in `level_config`.

use crate::error::BuildError;
use crate::fixed_point::UNITY_GAIN;

/// Capacity of every per-slot table.
pub const MAX_SENSORS: usize = 32;
/// Capacity of the sample capture sequence.
pub const MAX_SAMPLES: usize = 64;

pub const DEFAULT_SENSOR_COUNT: usize = 12;
pub const DEFAULT_MAX_HEIGHT_MM: u32 = 153;
/// Submersion cutoff; a slot is wet once `processed > threshold / 2`.
pub const DEFAULT_THRESHOLD: u32 = 142;
/// Gain of the bottom slot (1.8125 in 8.8).
pub const DEFAULT_FIRST_GAIN: u16 = 0x01D0;
/// Gain of the top slot (1.75 in 8.8).
pub const DEFAULT_LAST_GAIN: u16 = 0x01C0;

/// Preset fill heights (mm) of the bench test sequence.
pub const DEFAULT_AXIS_LABELS: [i16; 20] = [
    -5, 0, 10, 20, 30, 40, 50, 60, 70, 80, 90, 100, 110, 120, 130, 140, 150, 153, 160, 0,
];

/// Per-slot gain table for `count` slots: tuned end slots, unity interior.
pub fn default_scale_table(count: usize) -> Vec<u16> {
    (0..count)
        .map(|i| match i {
            0 => DEFAULT_FIRST_GAIN,
            i if i + 1 == count => DEFAULT_LAST_GAIN,
            _ => UNITY_GAIN,
        })
        .collect()
}

/// Sensor stack geometry and normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineCfg {
    pub sensor_count: usize,
    /// Height of the full stack in whole millimetres.
    pub max_height_mm: u32,
    /// 8.8 gain per slot.
    pub scale: Vec<u16>,
    /// Submersion cutoff per slot.
    pub threshold: Vec<u32>,
}

impl PipelineCfg {
    /// Defaults for a stack of `count` slots.
    pub fn with_sensor_count(count: usize) -> Self {
        Self {
            sensor_count: count,
            max_height_mm: DEFAULT_MAX_HEIGHT_MM,
            scale: default_scale_table(count),
            threshold: vec![DEFAULT_THRESHOLD; count],
        }
    }

    pub fn validate(&self) -> Result<(), BuildError> {
        if !(2..=MAX_SENSORS).contains(&self.sensor_count) {
            return Err(BuildError::InvalidConfig("sensor_count must be in 2..=32"));
        }
        if self.max_height_mm == 0 || self.max_height_mm > 10_000 {
            return Err(BuildError::InvalidConfig("max_height_mm must be in 1..=10000"));
        }
        if self.scale.len() != self.sensor_count {
            return Err(BuildError::InvalidConfig(
                "scale table length must equal sensor_count",
            ));
        }
        if self.threshold.len() != self.sensor_count {
            return Err(BuildError::InvalidConfig(
                "threshold table length must equal sensor_count",
            ));
        }
        if self.scale.contains(&0) {
            return Err(BuildError::InvalidConfig("scale entries must be > 0"));
        }
        Ok(())
    }
}

impl Default for PipelineCfg {
    fn default() -> Self {
        Self::with_sensor_count(DEFAULT_SENSOR_COUNT)
    }
}

/// Bench test sequence labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleCfg {
    pub axis_labels: Vec<i16>,
}

impl SampleCfg {
    pub fn validate(&self) -> Result<(), BuildError> {
        if self.axis_labels.is_empty() {
            return Err(BuildError::InvalidConfig("axis_labels must not be empty"));
        }
        if self.axis_labels.len() > MAX_SAMPLES {
            return Err(BuildError::InvalidConfig("axis_labels holds at most 64 entries"));
        }
        Ok(())
    }
}

impl Default for SampleCfg {
    fn default() -> Self {
        Self {
            axis_labels: DEFAULT_AXIS_LABELS.to_vec(),
        }
    }
}

/// Cycle pacing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timing {
    /// Pause after each reported cycle; throttles the serial data log.
    pub cycle_delay_ms: u64,
    /// Pause between busy polls of the scan engine.
    pub poll_interval_ms: u64,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            cycle_delay_ms: 100,
            poll_interval_ms: 1,
        }
    }
}
