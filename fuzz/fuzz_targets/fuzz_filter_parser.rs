//! Fuzz target for the filter expression parser.
//!
//! Arbitrary text must either fail to parse or yield a filter whose text
//! form parses again.
//!
//! Run with:
//! cargo +nightly fuzz run fuzz_filter_parser -- -max_total_time=600

#![no_main]

use idgate_connector::prelude::*;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(filter) = parse_query_filter::<String>(input) {
        let reparsed = parse_query_filter::<String>(&filter.to_string());
        assert!(reparsed.is_ok(), "text form of {input:?} did not parse");
    }

    let _ = parse_query_filter::<JsonPointer>(input);
});
