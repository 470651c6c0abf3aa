//! Fuzz target for date detection and parsing.

#![no_main]

use benchtop::profile::{looks_like_date, parse_datetime};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if s.len() > 1_000 {
            return;
        }
        let _ = looks_like_date(s);
        let _ = parse_datetime(s);
    }
});
