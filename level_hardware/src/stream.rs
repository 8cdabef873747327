//! Serial transport over a pair of byte streams (stdin/stdout by default).
//!
//! A reader thread drains the input stream into a bounded channel so that
//! `bytes_available` and `read_byte` never block the monitor loop.

use std::io::{Read, Write};
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, bounded};
use level_traits::SerialTransport;

use crate::util::write_all_retrying;

/// Bytes buffered between the reader thread and the monitor.
pub const RX_CAPACITY: usize = 1024;

pub struct StreamSerial<W: Write> {
    rx: Receiver<u8>,
    out: W,
    reader: Option<JoinHandle<()>>,
}

impl StreamSerial<std::io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(std::io::stdin(), std::io::stdout())
    }
}

impl<W: Write> StreamSerial<W> {
    pub fn new<R: Read + Send + 'static>(input: R, out: W) -> Self {
        let (tx, rx) = bounded(RX_CAPACITY);
        let reader = std::thread::Builder::new()
            .name("serial-rx".into())
            .spawn(move || {
                let mut input = input;
                let mut buf = [0u8; 64];
                loop {
                    let n = match input.read(&mut buf) {
                        Ok(0) => break,
                        Ok(n) => n,
                        Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                        Err(e) => {
                            tracing::warn!(error = %e, "serial input closed");
                            break;
                        }
                    };
                    for &b in &buf[..n] {
                        // blocks while the monitor is behind; drops out once it is gone
                        if tx.send(b).is_err() {
                            return;
                        }
                    }
                }
                tracing::debug!("serial input reached end of stream");
            })
            .ok();
        if reader.is_none() {
            tracing::error!("could not spawn serial reader thread");
        }
        Self { rx, out, reader }
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    fn join_finished(&mut self) {
        if self.reader.as_ref().is_some_and(JoinHandle::is_finished)
            && let Some(handle) = self.reader.take()
        {
            let _ = handle.join();
        }
    }
}

impl<W: Write> Drop for StreamSerial<W> {
    fn drop(&mut self) {
        let _ = self.out.flush();
        // a reader blocked on stdin cannot be woken; only reap a finished one
        self.join_finished();
    }
}

impl<W: Write> SerialTransport for StreamSerial<W> {
    fn bytes_available(&mut self) -> usize {
        self.rx.len()
    }

    fn read_byte(&mut self) -> Option<u8> {
        self.rx.try_recv().ok()
    }

    // Echoed bytes must show up at once, so every byte is flushed. A closed
    // output is logged and the byte discarded; reporting `false` would have
    // callers retry forever.
    fn write_byte(&mut self, byte: u8) -> bool {
        let res = write_all_retrying(&mut self.out, &[byte]).and_then(|()| Ok(self.out.flush()?));
        if let Err(e) = res {
            tracing::warn!(error = %e, "serial output write failed");
        }
        true
    }

    fn write_str(&mut self, text: &str) {
        let res =
            write_all_retrying(&mut self.out, text.as_bytes()).and_then(|()| Ok(self.out.flush()?));
        if let Err(e) = res {
            tracing::warn!(error = %e, "serial output write failed");
        }
    }
}
