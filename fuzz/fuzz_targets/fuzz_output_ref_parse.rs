//! Fuzz target: OutputRef text parsing
//!
//! Any string either fails to parse or parses to a reference whose canonical
//! form parses back to the same reference.
//!
//! Run: cargo +nightly fuzz run fuzz_output_ref_parse

#![no_main]
use bsq_core::OutputRef;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(r) = s.parse::<OutputRef>() {
            let again: OutputRef = r.to_string().parse().expect("canonical form must parse");
            assert_eq!(again, r);
        }
    }
});
