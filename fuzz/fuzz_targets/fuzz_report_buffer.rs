//! Fuzz target: `BoundedBuffer` append/replace sequences
//!
//! Splits the input into UTF-8 chunks and drives `push_str` / `replace` /
//! `clear`, verifying:
//! - No panics, including on multi-byte boundaries
//! - Length never exceeds capacity
//! - A truncated buffer is exactly full and ends in the marker tail
//!
//! cargo fuzz run fuzz_report_buffer

#![no_main]

use libfuzzer_sys::fuzz_target;
use solarcoil::report::BoundedBuffer;

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    let mut buf = BoundedBuffer::<48>::new();

    for (i, chunk) in text.split('\n').enumerate() {
        match i % 7 {
            5 => {
                let _ = buf.replace(chunk);
            }
            6 => buf.clear(),
            _ => {
                let _ = buf.push_str(chunk);
            }
        }
        assert!(buf.len() <= buf.capacity());
        if buf.is_truncated() {
            assert_eq!(buf.len(), buf.capacity());
            assert!(buf.as_str().ends_with("~~~"));
        }
    }
});
