//! Collaborator traits for the level monitor.
//!
//! The scan engine, the calibration byte store and the serial link are all
//! opaque to the core; anything implementing these traits can drive it.

pub mod clock;

pub use clock::{Clock, MonotonicClock};

/// Error type used at every trait boundary.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Capacitive scan engine producing one raw count per sensor slot.
pub trait SensorSource {
    /// Number of slots this source reports.
    fn sensor_count(&self) -> usize;

    /// Kick off a scan of every widget. Must not block.
    fn start_scan(&mut self) -> Result<(), BoxError>;

    /// True while a scan is still in progress.
    fn is_busy(&self) -> bool;

    /// Raw count of `slot` from the last completed scan.
    fn raw_count(&self, slot: usize) -> u32;
}

/// Key-value byte store holding the calibration record.
///
/// `write_record` is blocking: it returns only once the bytes are committed.
pub trait ByteStore {
    fn read_record(&mut self, offset: usize, buf: &mut [u8]) -> Result<(), BoxError>;
    fn write_record(&mut self, offset: usize, bytes: &[u8]) -> Result<(), BoxError>;
}

/// Byte-oriented serial link.
pub trait SerialTransport {
    /// Number of received bytes ready to be read without blocking.
    fn bytes_available(&mut self) -> usize;

    /// Next received byte, if any.
    fn read_byte(&mut self) -> Option<u8>;

    /// Queue one byte for transmission; `false` when the TX side is full.
    fn write_byte(&mut self, byte: u8) -> bool;

    /// Write a whole string, retrying each byte until accepted.
    fn write_str(&mut self, text: &str) {
        for &b in text.as_bytes() {
            while !self.write_byte(b) {
                std::hint::spin_loop();
            }
        }
    }
}

impl<T: SensorSource + ?Sized> SensorSource for Box<T> {
    fn sensor_count(&self) -> usize {
        (**self).sensor_count()
    }
    fn start_scan(&mut self) -> Result<(), BoxError> {
        (**self).start_scan()
    }
    fn is_busy(&self) -> bool {
        (**self).is_busy()
    }
    fn raw_count(&self, slot: usize) -> u32 {
        (**self).raw_count(slot)
    }
}

impl<T: ByteStore + ?Sized> ByteStore for Box<T> {
    fn read_record(&mut self, offset: usize, buf: &mut [u8]) -> Result<(), BoxError> {
        (**self).read_record(offset, buf)
    }
    fn write_record(&mut self, offset: usize, bytes: &[u8]) -> Result<(), BoxError> {
        (**self).write_record(offset, bytes)
    }
}

impl<T: SerialTransport + ?Sized> SerialTransport for Box<T> {
    fn bytes_available(&mut self) -> usize {
        (**self).bytes_available()
    }
    fn read_byte(&mut self) -> Option<u8> {
        (**self).read_byte()
    }
    fn write_byte(&mut self, byte: u8) -> bool {
        (**self).write_byte(byte)
    }
    fn write_str(&mut self, text: &str) {
        (**self).write_str(text)
    }
}
