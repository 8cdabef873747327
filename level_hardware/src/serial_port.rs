//! Serial transport on a real UART via the `serialport` crate.

use std::io::{Read, Write};
use std::time::Duration;

use level_traits::SerialTransport;
use serialport::SerialPort;

use crate::error::{HwError, Result};
use crate::util::write_all_retrying;

pub struct SerialPortTransport {
    port: Box<dyn SerialPort>,
}

impl SerialPortTransport {
    pub fn open(port_name: &str, baud_rate: u32) -> Result<Self> {
        let port = serialport::new(port_name, baud_rate)
            .timeout(Duration::from_millis(10))
            .open()
            .map_err(|e| HwError::Serial(format!("open {port_name}: {e}")))?;
        tracing::info!(port = port_name, baud_rate, "serial port opened");
        Ok(Self { port })
    }
}

impl SerialTransport for SerialPortTransport {
    fn bytes_available(&mut self) -> usize {
        self.port
            .bytes_to_read()
            .map_or(0, |n| usize::try_from(n).unwrap_or(usize::MAX))
    }

    fn read_byte(&mut self) -> Option<u8> {
        if self.bytes_available() == 0 {
            return None;
        }
        let mut b = [0u8; 1];
        match self.port.read(&mut b) {
            Ok(1) => Some(b[0]),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(error = %e, "serial read failed");
                None
            }
        }
    }

    fn write_byte(&mut self, byte: u8) -> bool {
        match self.port.write(&[byte]) {
            Ok(1) => true,
            Ok(_) => false,
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => false,
            Err(e) => {
                tracing::warn!(error = %e, "serial write failed");
                true
            }
        }
    }

    // A stalled TX side times out after 10 ms; keep going until the whole
    // line is out.
    fn write_str(&mut self, text: &str) {
        if let Err(e) = write_all_retrying(&mut self.port, text.as_bytes()) {
            tracing::warn!(error = %e, "serial write failed");
        }
    }
}
