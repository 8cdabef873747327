//! Empty-container calibration: the per-slot baselines and their persisted record.
//!
//! The record is a flat run of little-endian `u32`, one per slot, at logical
//! offset 0 of the byte store. No header and no version field.

use eyre::WrapErr;
use heapless::Vec as FixedVec;
use level_traits::ByteStore;

use crate::config::MAX_SENSORS;
use crate::error::{LevelError, Result};
use crate::fixed_point::render_decimal;
use crate::hw_error::map_store_error;

/// Logical offset of the calibration record.
pub const RECORD_OFFSET: usize = 0;
/// Size of one persisted baseline.
pub const BASELINE_BYTES: usize = core::mem::size_of::<u32>();

/// Byte length of the record for `count` slots.
#[inline]
pub fn record_len(count: usize) -> usize {
    count * BASELINE_BYTES
}

/// Baseline per slot, as loaded from or written to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalibrationSet {
    baselines: FixedVec<u32, MAX_SENSORS>,
}

impl CalibrationSet {
    /// All-zero baselines for `count` slots (clamped to capacity).
    pub fn zeroed(count: usize) -> Self {
        let mut baselines = FixedVec::new();
        for _ in 0..count.min(MAX_SENSORS) {
            let _ = baselines.push(0);
        }
        Self { baselines }
    }

    pub fn from_baselines(values: &[u32]) -> Result<Self> {
        let baselines = FixedVec::from_slice(values).map_err(|()| {
            eyre::Report::new(LevelError::Config(format!(
                "{} baselines exceed capacity {MAX_SENSORS}",
                values.len()
            )))
        })?;
        Ok(Self { baselines })
    }

    pub fn len(&self) -> usize {
        self.baselines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.baselines.is_empty()
    }

    pub fn baseline(&self, slot: usize) -> u32 {
        self.baselines.get(slot).copied().unwrap_or(0)
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.baselines
    }

    /// Serialize to the persisted layout.
    pub fn encode(&self) -> Vec<u8> {
        self.baselines.iter().flat_map(|b| b.to_le_bytes()).collect()
    }

    /// Parse a record holding exactly `count` baselines.
    pub fn decode(bytes: &[u8], count: usize) -> std::result::Result<Self, LevelError> {
        let need = record_len(count);
        if count > MAX_SENSORS || bytes.len() != need {
            return Err(LevelError::Storage(format!(
                "calibration record is {} bytes, expected {need}",
                bytes.len()
            )));
        }
        let mut baselines = FixedVec::new();
        for chunk in bytes.chunks_exact(BASELINE_BYTES) {
            let mut word = [0u8; BASELINE_BYTES];
            word.copy_from_slice(chunk);
            let _ = baselines.push(u32::from_le_bytes(word));
        }
        Ok(Self { baselines })
    }

    /// Diagnostic line: `EmptyCal=` then every baseline followed by a comma.
    pub fn display(&self) -> String {
        let mut line = String::from("EmptyCal=");
        for &b in &self.baselines {
            line.push_str(&render_decimal(i64::from(b), 0));
            line.push(',');
        }
        line.push_str("\r\n");
        line
    }
}

/// Owns the byte store and the in-memory copy of the baselines.
pub struct CalibrationStore<B: ByteStore> {
    store: B,
    set: CalibrationSet,
}

impl<B: ByteStore> core::fmt::Debug for CalibrationStore<B> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CalibrationStore")
            .field("baselines", &self.set.as_slice())
            .finish()
    }
}

impl<B: ByteStore> CalibrationStore<B> {
    /// Wrap `store`; baselines stay zero until [`load`](Self::load).
    pub fn new(store: B, count: usize) -> Self {
        Self {
            store,
            set: CalibrationSet::zeroed(count),
        }
    }

    pub fn baselines(&self) -> &CalibrationSet {
        &self.set
    }

    pub fn store(&self) -> &B {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut B {
        &mut self.store
    }

    pub fn into_store(self) -> B {
        self.store
    }

    /// Read the persisted record, replacing the in-memory baselines.
    pub fn load(&mut self) -> Result<&CalibrationSet> {
        let count = self.set.len();
        let mut buf = vec![0u8; record_len(count)];
        self.store
            .read_record(RECORD_OFFSET, &mut buf)
            .map_err(|e| eyre::Report::new(map_store_error(&*e)))
            .wrap_err("reading calibration record")?;
        self.set = CalibrationSet::decode(&buf, count).map_err(eyre::Report::new)?;
        tracing::info!(baselines = ?self.set.as_slice(), "calibration loaded");
        Ok(&self.set)
    }

    /// Adopt `counts` as the new baselines and commit them as one record.
    ///
    /// The in-memory copy is replaced first; the write blocks until the store
    /// reports the record committed.
    pub fn save(&mut self, counts: &[u32]) -> Result<()> {
        if counts.len() != self.set.len() {
            return Err(eyre::Report::new(LevelError::Config(format!(
                "calibration needs {} counts, got {}",
                self.set.len(),
                counts.len()
            ))));
        }
        self.set = CalibrationSet::from_baselines(counts)?;
        let record = self.set.encode();
        self.store
            .write_record(RECORD_OFFSET, &record)
            .map_err(|e| eyre::Report::new(map_store_error(&*e)))
            .wrap_err("writing calibration record")?;
        tracing::info!(baselines = ?self.set.as_slice(), "calibration saved");
        Ok(())
    }

    /// Same as [`CalibrationSet::display`] for the current baselines.
    pub fn display(&self) -> String {
        self.set.display()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::MemoryByteStore;

    #[test]
    fn record_is_little_endian_words() {
        let set = CalibrationSet::from_baselines(&[1, 0x0102_0304]).unwrap();
        assert_eq!(set.encode(), vec![1, 0, 0, 0, 4, 3, 2, 1]);
        assert_eq!(CalibrationSet::decode(&set.encode(), 2).unwrap(), set);
    }

    #[test]
    fn short_record_is_a_storage_error() {
        let err = CalibrationSet::decode(&[0u8; 7], 2).unwrap_err();
        assert!(matches!(err, LevelError::Storage(_)));
    }

    #[test]
    fn display_trails_each_value_with_comma() {
        let set = CalibrationSet::from_baselines(&[10, 0, 7]).unwrap();
        assert_eq!(set.display(), "EmptyCal=10,0,7,\r\n");
    }

    #[test]
    fn save_then_load_round_trips_through_store() {
        let mut cal = CalibrationStore::new(MemoryByteStore::new(64), 3);
        cal.save(&[100, 200, 300]).unwrap();

        let image = cal.store().snapshot();
        let mut fresh = CalibrationStore::new(MemoryByteStore::with_image(image), 3);
        let loaded = fresh.load().unwrap();
        assert_eq!(loaded.as_slice(), &[100, 200, 300]);
    }

    #[test]
    fn save_rejects_wrong_count() {
        let mut cal = CalibrationStore::new(MemoryByteStore::new(64), 3);
        assert!(cal.save(&[1, 2]).is_err());
        assert_eq!(cal.baselines().as_slice(), &[0, 0, 0]);
    }

    #[test]
    fn load_failure_is_storage_error() {
        let mut store = MemoryByteStore::new(64);
        store.fail_reads(true);
        let mut cal = CalibrationStore::new(store, 3);
        let err = cal.load().unwrap_err();
        let typed = err.downcast_ref::<LevelError>().expect("typed error");
        assert!(typed.is_fatal());
    }
}
