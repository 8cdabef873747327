//! In-memory collaborators for tests and host demos.

use std::collections::VecDeque;

use level_traits::{BoxError, ByteStore, SensorSource, SerialTransport};

/// Byte store backed by a `Vec<u8>` image.
///
/// Writes are staged and only committed once every byte landed, the way a
/// redundant-copy emulated EEPROM behaves; an injected fault mid-write leaves
/// the committed image untouched.
#[derive(Debug, Clone)]
pub struct MemoryByteStore {
    image: Vec<u8>,
    fail_reads: bool,
    fail_write_after: Option<usize>,
    writes: usize,
}

impl MemoryByteStore {
    /// Blank store of `capacity` zero bytes.
    pub fn new(capacity: usize) -> Self {
        Self::with_image(vec![0; capacity])
    }

    pub fn with_image(image: Vec<u8>) -> Self {
        Self {
            image,
            fail_reads: false,
            fail_write_after: None,
            writes: 0,
        }
    }

    /// Copy of the committed image.
    pub fn snapshot(&self) -> Vec<u8> {
        self.image.clone()
    }

    pub fn fail_reads(&mut self, fail: bool) {
        self.fail_reads = fail;
    }

    /// Make the next write die after `bytes` bytes were staged.
    pub fn fail_next_write_after(&mut self, bytes: usize) {
        self.fail_write_after = Some(bytes);
    }

    /// Number of committed writes.
    pub fn writes(&self) -> usize {
        self.writes
    }

    fn bounds(&self, offset: usize, len: usize) -> Result<core::ops::Range<usize>, BoxError> {
        let end = offset
            .checked_add(len)
            .filter(|&end| end <= self.image.len())
            .ok_or_else(|| -> BoxError {
                format!(
                    "record {offset}+{len} exceeds store capacity {}",
                    self.image.len()
                )
                .into()
            })?;
        Ok(offset..end)
    }
}

impl ByteStore for MemoryByteStore {
    fn read_record(&mut self, offset: usize, buf: &mut [u8]) -> Result<(), BoxError> {
        if self.fail_reads {
            return Err("store read failed".into());
        }
        let range = self.bounds(offset, buf.len())?;
        buf.copy_from_slice(&self.image[range]);
        Ok(())
    }

    fn write_record(&mut self, offset: usize, bytes: &[u8]) -> Result<(), BoxError> {
        let range = self.bounds(offset, bytes.len())?;
        let mut staged = self.image.clone();
        if let Some(limit) = self.fail_write_after.take() {
            let partial = limit.min(bytes.len());
            staged[range.start..range.start + partial].copy_from_slice(&bytes[..partial]);
            return Err(format!("write interrupted after {partial} bytes").into());
        }
        staged[range].copy_from_slice(bytes);
        self.image = staged;
        self.writes += 1;
        Ok(())
    }
}

/// Serial link with scripted input and captured output.
#[derive(Debug, Default, Clone)]
pub struct MockSerial {
    rx: VecDeque<u8>,
    tx: Vec<u8>,
    reject_next: usize,
}

impl MockSerial {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue bytes as if typed by the operator.
    pub fn push_input(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes.iter().copied());
    }

    /// Everything written so far, lossily decoded.
    pub fn output(&self) -> String {
        String::from_utf8_lossy(&self.tx).into_owned()
    }

    /// Take and clear the captured output.
    pub fn take_output(&mut self) -> String {
        let out = self.output();
        self.tx.clear();
        out
    }

    /// Refuse the next `n` `write_byte` calls, simulating a full TX FIFO.
    pub fn reject_writes(&mut self, n: usize) {
        self.reject_next = n;
    }

    pub fn pending_input(&self) -> usize {
        self.rx.len()
    }
}

impl SerialTransport for MockSerial {
    fn bytes_available(&mut self) -> usize {
        self.rx.len()
    }

    fn read_byte(&mut self) -> Option<u8> {
        self.rx.pop_front()
    }

    fn write_byte(&mut self, byte: u8) -> bool {
        if self.reject_next > 0 {
            self.reject_next -= 1;
            return false;
        }
        self.tx.push(byte);
        true
    }
}

/// Sensor source returning preset counts.
///
/// Each scan stays busy for `busy_polls` calls to `is_busy`.
#[derive(Debug, Clone)]
pub struct FixedSensors {
    counts: Vec<u32>,
    busy_polls: u32,
    remaining: std::cell::Cell<u32>,
    scans: usize,
}

impl FixedSensors {
    pub fn new(counts: Vec<u32>) -> Self {
        Self {
            counts,
            busy_polls: 0,
            remaining: std::cell::Cell::new(0),
            scans: 0,
        }
    }

    pub fn with_busy_polls(mut self, polls: u32) -> Self {
        self.busy_polls = polls;
        self
    }

    pub fn set_counts(&mut self, counts: &[u32]) {
        self.counts.clear();
        self.counts.extend_from_slice(counts);
    }

    pub fn set_count(&mut self, slot: usize, count: u32) {
        if let Some(c) = self.counts.get_mut(slot) {
            *c = count;
        }
    }

    /// Number of scans started.
    pub fn scans(&self) -> usize {
        self.scans
    }
}

impl SensorSource for FixedSensors {
    fn sensor_count(&self) -> usize {
        self.counts.len()
    }

    fn start_scan(&mut self) -> Result<(), BoxError> {
        self.scans += 1;
        self.remaining.set(self.busy_polls);
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
        self.counts.get(slot).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interrupted_write_keeps_committed_image() {
        let mut store = MemoryByteStore::new(8);
        store.write_record(0, &[1; 8]).unwrap();
        store.fail_next_write_after(3);
        assert!(store.write_record(0, &[2; 8]).is_err());
        assert_eq!(store.snapshot(), vec![1; 8]);
        assert_eq!(store.writes(), 1);
    }

    #[test]
    fn out_of_bounds_record_is_rejected() {
        let mut store = MemoryByteStore::new(4);
        let mut buf = [0u8; 8];
        assert!(store.read_record(0, &mut buf).is_err());
        assert!(store.write_record(2, &[0; 4]).is_err());
    }

    #[test]
    fn serial_write_str_retries_rejected_bytes() {
        let mut serial = MockSerial::new();
        serial.reject_writes(3);
        serial.write_str("ok");
        assert_eq!(serial.output(), "ok");
    }

    #[test]
    fn sensors_report_busy_for_configured_polls() {
        let mut s = FixedSensors::new(vec![1, 2]).with_busy_polls(2);
        s.start_scan().unwrap();
        assert!(s.is_busy());
        assert!(s.is_busy());
        assert!(!s.is_busy());
        assert_eq!(s.raw_count(1), 2);
        assert_eq!(s.raw_count(9), 0);
    }
}
