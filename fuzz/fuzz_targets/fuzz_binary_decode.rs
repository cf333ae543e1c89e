//! Fuzz target for the binary object decoder.
//!
//! Corrupt streams must surface as errors, never as panics or unbounded
//! allocation.
//!
//! Run with:
//! cargo +nightly fuzz run fuzz_binary_decode -- -max_total_time=600

#![no_main]

use idgate_serializer::prelude::*;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut framed = b"IDGB\x01".to_vec();
    framed.extend_from_slice(data);

    let Ok(mut reader) = BinaryObjectReader::new(framed.as_slice()) else {
        return;
    };
    while let Ok(Some(value)) = reader.next_object() {
        // Anything decoded must encode again
        let bytes = serialize_to_bytes(&value).expect("decoded value re-encodes");
        assert_eq!(deserialize_from_bytes(&bytes).ok(), Some(value));
    }
});
