//! Fuzz target for the XML object decoder.
//!
//! Run with:
//! cargo +nightly fuzz run fuzz_xml_decode -- -max_total_time=600

#![no_main]

use idgate_serializer::prelude::*;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };

    let _ = deserialize_from_xml(input, false);

    let mut count = 0usize;
    let _ = XmlObjectReader::new(input.as_bytes(), true).read_all(&mut |_value: Value| {
        count += 1;
        count < 1000
    });
});
