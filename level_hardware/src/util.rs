use std::io::{ErrorKind, Write};

use crate::error::Result;

/// Write every byte of `bytes`, retrying while the sink reports a full TX
/// side (`TimedOut`, `WouldBlock`, `Interrupted` or a zero-length write).
/// Any other error is returned with the remainder unwritten.
pub fn write_all_retrying(out: &mut (impl Write + ?Sized), bytes: &[u8]) -> Result<()> {
    let mut rest = bytes;
    while !rest.is_empty() {
        match out.write(rest) {
            Ok(0) => std::hint::spin_loop(),
            Ok(n) => rest = &rest[n..],
            Err(e)
                if matches!(
                    e.kind(),
                    ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted
                ) =>
            {
                std::hint::spin_loop();
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}
