//! Fuzzes the generic-protocol descriptor parser.
//!
//! Run with:
//!   cargo +nightly fuzz run fuzz_descriptor_xml
#![no_main]
use fgfs_generic::FieldMap;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Errors are expected, panics are not.
    if let Ok(raw) = std::str::from_utf8(data)
        && let Ok(map) = FieldMap::parse_str(raw)
    {
        for (index, field) in map.iter().enumerate() {
            assert_eq!(field.position, index);
        }
    }
});
