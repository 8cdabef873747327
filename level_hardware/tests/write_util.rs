use std::io::{self, ErrorKind, Write};

use level_hardware::HwError;
use level_hardware::util::write_all_retrying;
use rstest::rstest;

/// Accepts at most `chunk` bytes per call and fails every other call with
/// `kind`, like a UART whose TX buffer keeps filling up.
struct StallingSink {
    written: Vec<u8>,
    chunk: usize,
    kind: ErrorKind,
    stall_next: bool,
}

impl Write for StallingSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.stall_next = !self.stall_next;
        if !self.stall_next {
            return Err(io::Error::from(self.kind));
        }
        let n = buf.len().min(self.chunk);
        self.written.extend_from_slice(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[rstest]
#[case(ErrorKind::TimedOut)]
#[case(ErrorKind::WouldBlock)]
#[case(ErrorKind::Interrupted)]
fn stalls_do_not_truncate_a_line(#[case] kind: ErrorKind) {
    let line = "1000,0,0,".repeat(12) + "0,0.0,0.0\r\n";
    let mut sink = StallingSink {
        written: Vec::new(),
        chunk: 7,
        kind,
        stall_next: false,
    };
    write_all_retrying(&mut sink, line.as_bytes()).unwrap();
    assert_eq!(sink.written, line.as_bytes());
}

#[test]
fn hard_errors_are_returned() {
    struct Closed;
    impl Write for Closed {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(ErrorKind::BrokenPipe))
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }
    let err = write_all_retrying(&mut Closed, b"x").unwrap_err();
    assert!(matches!(err, HwError::Io(e) if e.kind() == ErrorKind::BrokenPipe));
}
