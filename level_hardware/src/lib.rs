//! Concrete collaborators for the level monitor: a simulated sensor stack,
//! a file-backed calibration store and serial transports.

pub mod error;
pub mod file_store;
#[cfg(feature = "hardware")]
pub mod serial_port;
pub mod sim;
pub mod stream;
pub mod util;

pub use error::HwError;
pub use file_store::{DEFAULT_CAPACITY, FileByteStore};
#[cfg(feature = "hardware")]
pub use serial_port::SerialPortTransport;
pub use sim::{FillHandle, SimulatedSensorStack};
pub use stream::StreamSerial;
