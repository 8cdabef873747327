#![no_main]
use level_core::protocol::{LINE_CAPACITY, ProtocolSession};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut session = ProtocolSession::new();
    for &b in data {
        let (_echo, cmd) = session.feed(b);
        if let Some(cmd) = cmd {
            session.apply(cmd);
        }
        assert!(session.buffered().len() <= LINE_CAPACITY);
    }
});
