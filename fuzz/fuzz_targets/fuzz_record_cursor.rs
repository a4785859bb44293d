#![no_main]

use blockdex::index::RecordCursor;
use libfuzzer_sys::fuzz_target;
use std::io::Cursor;

fuzz_target!(|data: &[u8]| {
    // Decoding arbitrary bytes must end in records or an error, never a panic
    let len = data.len() as u64;
    for record in RecordCursor::with_len(Cursor::new(data), "fuzz", len) {
        if record.is_err() {
            break;
        }
    }
    for record in RecordCursor::new(Cursor::new(data), "fuzz") {
        if record.is_err() {
            break;
        }
    }
});
