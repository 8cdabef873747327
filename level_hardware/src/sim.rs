//! Simulated capacitive stack driven by a liquid height.
//!
//! Each slot covers a band of the container: interior slots one full pitch
//! centred on their position, the two end slots half a pitch. A slot reports
//! `dry + (wet - dry) * covered / pitch`, so end slots never gain more than
//! half the interior swing, like the real half-height electrodes.

use std::cell::Cell;
use std::rc::Rc;

use level_traits::{BoxError, SensorSource};

use crate::error::HwError;

/// Shared handle to the simulated liquid height in millimetres.
#[derive(Debug, Clone, Default)]
pub struct FillHandle(Rc<Cell<u32>>);

impl FillHandle {
    pub fn set_mm(&self, mm: u32) {
        self.0.set(mm);
    }

    pub fn mm(&self) -> u32 {
        self.0.get()
    }
}

pub struct SimulatedSensorStack {
    count: usize,
    max_height_mm: u32,
    dry: u32,
    wet: u32,
    fill: FillHandle,
    scan_polls: u32,
    remaining: Cell<u32>,
    latched: Vec<u32>,
    scans: u64,
    fail_next: bool,
}

impl SimulatedSensorStack {
    pub fn new(count: usize, max_height_mm: u32) -> Self {
        let mut s = Self {
            count,
            max_height_mm,
            dry: 1000,
            wet: 1200,
            fill: FillHandle::default(),
            scan_polls: 0,
            remaining: Cell::new(0),
            latched: Vec::new(),
            scans: 0,
            fail_next: false,
        };
        s.latch();
        s
    }

    /// Counts of a dry and a fully covered interior slot.
    pub fn with_counts(mut self, dry: u32, wet: u32) -> Self {
        self.dry = dry;
        self.wet = wet.max(dry);
        self.latch();
        self
    }

    /// Keep every scan busy for `polls` calls to `is_busy`.
    pub fn with_scan_polls(mut self, polls: u32) -> Self {
        self.scan_polls = polls;
        self
    }

    pub fn with_fill_mm(self, mm: u32) -> Self {
        self.fill.set_mm(mm);
        let mut s = self;
        s.latch();
        s
    }

    /// Handle for changing the height while the stack is owned elsewhere.
    pub fn fill_handle(&self) -> FillHandle {
        self.fill.clone()
    }

    /// Make the next `start_scan` fail with `HwError::Scan`.
    pub fn fail_next_scan(&mut self) {
        self.fail_next = true;
    }

    pub fn scans(&self) -> u64 {
        self.scans
    }

    /// Count slot `slot` reports with the liquid at `fill_mm`.
    pub fn count_at(&self, slot: usize, fill_mm: u32) -> u32 {
        let full = u64::from(self.max_height_mm) << 8;
        let pitch = (full / (self.count.saturating_sub(1).max(1) as u64)).max(1);
        let centre = slot as u64 * pitch;
        let lo = centre.saturating_sub(pitch / 2);
        let hi = (centre + pitch / 2).min(full).max(lo);
        let level = (u64::from(fill_mm) << 8).min(full);
        let covered = level.clamp(lo, hi) - lo;
        let swing = u64::from(self.wet.saturating_sub(self.dry));
        let gain = u32::try_from(swing * covered / pitch).unwrap_or(u32::MAX);
        self.dry.saturating_add(gain)
    }

    fn latch(&mut self) {
        let fill = self.fill.mm();
        self.latched = (0..self.count).map(|i| self.count_at(i, fill)).collect();
    }
}

impl SensorSource for SimulatedSensorStack {
    fn sensor_count(&self) -> usize {
        self.count
    }

    fn start_scan(&mut self) -> Result<(), BoxError> {
        if std::mem::take(&mut self.fail_next) {
            return Err(HwError::Scan("scan engine did not start".into()).into());
        }
        self.latch();
        self.scans += 1;
        self.remaining.set(self.scan_polls);
        tracing::trace!(fill_mm = self.fill.mm(), "simulated scan");
        Ok(())
    }

    fn is_busy(&self) -> bool {
        let left = self.remaining.get();
        if left == 0 {
            return false;
        }
        self.remaining.set(left - 1);
        true
    }

    fn raw_count(&self, slot: usize) -> u32 {
        self.latched.get(slot).copied().unwrap_or(self.dry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_full_counts() {
        let s = SimulatedSensorStack::new(12, 153);
        assert!((0..12).all(|i| s.count_at(i, 0) == 1000));
        assert_eq!(s.count_at(0, 153), 1100);
        assert_eq!(s.count_at(5, 153), 1200);
        assert!(s.count_at(11, 153) >= 1099);
    }

    #[test]
    fn scan_latches_current_fill() {
        let mut s = SimulatedSensorStack::new(12, 153);
        let fill = s.fill_handle();
        fill.set_mm(153);
        assert_eq!(s.raw_count(5), 1000);
        s.start_scan().unwrap();
        assert_eq!(s.raw_count(5), 1200);
    }
}
