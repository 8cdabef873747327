//! Per-cycle transform from raw scan counts to a fill level.
//!
//! raw → baseline-subtracted diff → gain-normalized value → submersion test →
//! weighted active count → height and percent, all in integer fixed point.

use heapless::Vec as FixedVec;
use level_traits::SensorSource;

use crate::calibration::CalibrationSet;
use crate::config::{MAX_SENSORS, PipelineCfg};
use crate::error::BuildError;
use crate::fixed_point::{apply_gain, mm_to_fixed, sensor_height};

/// One electrode of the stack.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SensorSlot {
    /// Latest scan count.
    pub raw: u32,
    /// Empty-container count subtracted from `raw`.
    pub baseline: u32,
    /// `raw - baseline`, floored at 0.
    pub diff: u32,
    /// 8.8 normalization gain.
    pub scale: u16,
    /// `(diff * scale) >> 8`.
    pub processed: u32,
    /// Submersion cutoff; compared against `processed` after halving.
    pub threshold: u32,
    /// Height contribution when submerged: 1 for end slots, 2 otherwise.
    pub weight: u8,
}

impl SensorSlot {
    #[inline]
    pub fn is_submerged(&self) -> bool {
        self.processed > self.threshold / 2
    }
}

/// Fixed-capacity stack of sensor slots, bottom slot first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorArray {
    slots: FixedVec<SensorSlot, MAX_SENSORS>,
}

impl SensorArray {
    /// Build the stack described by `cfg`; fails on an invalid geometry.
    pub fn new(cfg: &PipelineCfg) -> Result<Self, BuildError> {
        cfg.validate()?;
        let last = cfg.sensor_count - 1;
        let mut slots = FixedVec::new();
        for i in 0..cfg.sensor_count {
            let slot = SensorSlot {
                scale: cfg.scale[i],
                threshold: cfg.threshold[i],
                weight: if i == 0 || i == last { 1 } else { 2 },
                ..SensorSlot::default()
            };
            slots
                .push(slot)
                .map_err(|_| BuildError::InvalidConfig("sensor_count exceeds capacity"))?;
        }
        Ok(Self { slots })
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slots(&self) -> &[SensorSlot] {
        &self.slots
    }

    pub fn slot(&self, index: usize) -> Option<&SensorSlot> {
        self.slots.get(index)
    }

    /// Copy the latest counts out of a finished scan.
    pub fn capture(&mut self, source: &impl SensorSource) {
        for (i, slot) in self.slots.iter_mut().enumerate() {
            slot.raw = source.raw_count(i);
        }
    }

    /// Set raw counts directly; extra values are ignored, missing ones read 0.
    pub fn set_raw(&mut self, counts: &[u32]) {
        for (i, slot) in self.slots.iter_mut().enumerate() {
            slot.raw = counts.get(i).copied().unwrap_or(0);
        }
    }

    pub fn raw_counts(&self) -> Vec<u32> {
        self.slots.iter().map(|s| s.raw).collect()
    }

    /// Largest possible weighted active count: `2 * (n - 2) + 2`.
    pub fn max_active_count(&self) -> u32 {
        self.slots.iter().map(|s| u32::from(s.weight)).sum()
    }
}

/// Fill level derived from one cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LevelEstimate {
    /// Weighted count of submerged slots.
    pub active_count: u32,
    /// Liquid height, 24.8 millimetres.
    pub height_mm: i32,
    /// Fill, 24.8 percent.
    pub percent: i32,
}

/// Geometry constants and the per-cycle level computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelPipeline {
    max_height_mm: u32,
    sensor_height: i32,
}

impl LevelPipeline {
    pub fn new(cfg: &PipelineCfg) -> Self {
        Self {
            max_height_mm: cfg.max_height_mm,
            sensor_height: sensor_height(cfg.max_height_mm, cfg.sensor_count),
        }
    }

    /// Height of one interior slot, 24.8.
    pub fn sensor_height(&self) -> i32 {
        self.sensor_height
    }

    /// Full-scale height, 24.8.
    pub fn max_height(&self) -> i32 {
        mm_to_fixed(self.max_height_mm)
    }

    /// Run steps 1–6 over `sensors` using `baselines`, updating every slot.
    pub fn process(&self, sensors: &mut SensorArray, baselines: &CalibrationSet) -> LevelEstimate {
        let mut active_count = 0u32;
        for (i, slot) in sensors.slots.iter_mut().enumerate() {
            slot.baseline = baselines.baseline(i);
            slot.diff = slot.raw.saturating_sub(slot.baseline);
            slot.processed = apply_gain(slot.diff, slot.scale);
            if slot.is_submerged() {
                active_count += u32::from(slot.weight);
            }
        }
        let (height_mm, percent) = self.level_from_active(active_count);
        tracing::debug!(active_count, height_mm, percent, "level computed");
        LevelEstimate {
            active_count,
            height_mm,
            percent,
        }
    }

    /// Height and percent (both 24.8) for a weighted active count.
    ///
    /// Heights within a quarter slot of full scale snap to full scale so a
    /// fully submerged stack reads exactly 100%.
    pub fn level_from_active(&self, active_count: u32) -> (i32, i32) {
        let half_slot = i64::from(self.sensor_height >> 1);
        let max = i64::from(self.max_height());
        let mut height = i64::from(active_count) * half_slot;
        if height > max - i64::from(self.sensor_height >> 2) {
            height = max;
        }
        let percent = height * 100 / i64::from(self.max_height_mm.max(1));
        (clamp_i32(height), clamp_i32(percent))
    }
}

#[inline]
fn clamp_i32(v: i64) -> i32 {
    i32::try_from(v).unwrap_or(if v < 0 { i32::MIN } else { i32::MAX })
}
