//! Fuzz target for the delimited-text parser.
//!
//! Malformed input must produce an error, never a panic, with and without
//! delimiter auto-detection.

#![no_main]

use benchtop::{FormatHint, Parser};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 100_000 {
        return;
    }

    let parser = Parser::new();
    let _ = parser.parse_bytes(data, &FormatHint::default());
    for delimiter in [b',', b';', b'\t'] {
        let _ = parser.parse_bytes(data, &FormatHint::delimited(delimiter));
    }
});
