//! Line command protocol.
//!
//! Bytes arrive one at a time from the serial transport. Printable bytes above
//! `'0'` are echoed and buffered; CR or LF completes a line, which is matched
//! against the command table. Note that `'0'` itself and every control byte
//! are neither echoed nor buffered.

use heapless::Vec as FixedVec;
use level_traits::SerialTransport;

/// Capacity of the receive line buffer; excess bytes are dropped.
pub const LINE_CAPACITY: usize = 32;

pub const COMMAND_ERROR: &str = "Command Error\r\n";

/// Periodic output selected by the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayMode {
    /// No periodic line.
    None,
    /// Percent and height.
    #[default]
    Basic,
    /// CSV header pending; becomes `Csv` once the header went out.
    CsvInit,
    /// Per-slot diagnostics.
    Csv,
}

/// One completed command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `cal`
    Calibrate,
    /// `stop`
    Stop,
    /// `csv`
    Csv,
    /// `basic`
    Basic,
    /// empty line
    StoreSample,
    /// `reset`
    ResetSamples,
    /// anything else
    Unknown,
}

impl Command {
    /// Case-sensitive match of a completed line.
    pub fn parse(line: &[u8]) -> Self {
        match line {
            b"cal" => Command::Calibrate,
            b"stop" => Command::Stop,
            b"csv" => Command::Csv,
            b"basic" => Command::Basic,
            b"" => Command::StoreSample,
            b"reset" => Command::ResetSamples,
            _ => Command::Unknown,
        }
    }
}

#[inline]
fn is_terminator(byte: u8) -> bool {
    byte == b'\r' || byte == b'\n'
}

/// Receive-side state: line buffer, display mode and one-shot flags.
#[derive(Debug, Clone, Default)]
pub struct ProtocolSession {
    line: FixedVec<u8, LINE_CAPACITY>,
    mode: DisplayMode,
    cal_requested: bool,
    store_next: bool,
    reset_seq: bool,
    /// Terminator that ended the previous line, while no other byte followed it.
    last_terminator: Option<u8>,
}

impl ProtocolSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> DisplayMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: DisplayMode) {
        if self.mode != mode {
            tracing::info!(from = ?self.mode, to = ?mode, "display mode");
        }
        self.mode = mode;
    }

    /// Bytes collected for the line in progress.
    pub fn buffered(&self) -> &[u8] {
        &self.line
    }

    pub fn cal_requested(&self) -> bool {
        self.cal_requested
    }

    /// Clear and return the calibration request.
    pub fn take_cal_request(&mut self) -> bool {
        core::mem::take(&mut self.cal_requested)
    }

    pub fn store_requested(&self) -> bool {
        self.store_next
    }

    pub fn reset_requested(&self) -> bool {
        self.reset_seq
    }

    pub fn clear_store_request(&mut self) {
        self.store_next = false;
    }

    /// Clear both sample-sequence flags.
    pub fn clear_sample_flags(&mut self) {
        self.store_next = false;
        self.reset_seq = false;
    }

    /// Feed one received byte.
    ///
    /// Returns the byte to echo (if any) and the command completed by it (if
    /// any). A CR directly after an LF, or an LF directly after a CR, closes
    /// nothing: `"cal\r\n"` is a single command.
    pub fn feed(&mut self, byte: u8) -> (Option<u8>, Option<Command>) {
        if is_terminator(byte) {
            if let Some(prev) = self.last_terminator.take()
                && prev != byte
            {
                return (None, None);
            }
            let cmd = Command::parse(&self.line);
            self.line.clear();
            self.last_terminator = Some(byte);
            return (None, Some(cmd));
        }
        self.last_terminator = None;
        if byte > b'0' {
            // full buffer: drop silently
            let _ = self.line.push(byte);
            return (Some(byte), None);
        }
        (None, None)
    }

    /// Update mode and flags for a completed command.
    ///
    /// Returns `false` for an unknown command; nothing changes in that case.
    pub fn apply(&mut self, cmd: Command) -> bool {
        match cmd {
            Command::Calibrate => self.cal_requested = true,
            Command::Stop => self.set_mode(DisplayMode::None),
            Command::Csv => self.set_mode(DisplayMode::CsvInit),
            Command::Basic => self.set_mode(DisplayMode::Basic),
            Command::StoreSample => {
                self.store_next = true;
                self.set_mode(DisplayMode::None);
            }
            Command::ResetSamples => {
                self.reset_seq = true;
                self.set_mode(DisplayMode::None);
            }
            Command::Unknown => return false,
        }
        true
    }

    /// Drain received bytes until one command completes or the transport
    /// runs dry. Echoes as it goes and answers unknown commands in place.
    pub fn poll<T: SerialTransport + ?Sized>(&mut self, transport: &mut T) -> Option<Command> {
        while transport.bytes_available() > 0 {
            let Some(byte) = transport.read_byte() else {
                break;
            };
            let (echo, cmd) = self.feed(byte);
            if let Some(b) = echo {
                while !transport.write_byte(b) {
                    std::hint::spin_loop();
                }
            }
            if let Some(cmd) = cmd {
                if !self.apply(cmd) {
                    tracing::warn!("unknown command");
                    transport.write_str(COMMAND_ERROR);
                } else {
                    tracing::debug!(?cmd, "command");
                }
                return Some(cmd);
            }
        }
        None
    }
}
