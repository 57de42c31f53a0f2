//! Fuzzes frame assembly and positional decoding into a registry.
//!
//! Run with:
//!   cargo +nightly fuzz run fuzz_frame_decode
#![no_main]
use std::sync::Arc;

use fgfs_generic::{
    Conversion, FieldConversion, FieldMap, FieldSpec, FrameAssembler, FrameDecoder,
    IngestCounters, VariableBinder,
};
use fgfs_registry::{MemoryRegistry, ValueKind};
use libfuzzer_sys::fuzz_target;

fn spec(position: usize, key: &str, conversion: FieldConversion) -> FieldSpec {
    FieldSpec {
        position,
        name: Some(key.to_string()),
        key: Some(key.to_string()),
        conversion,
    }
}

fuzz_target!(|data: &[u8]| {
    let registry = MemoryRegistry::new();
    for (key, kind) in [
        ("ALT", ValueKind::Float),
        ("GEAR", ValueKind::Int),
        ("ON", ValueKind::Bool),
        ("ID", ValueKind::Text),
    ] {
        if registry.define(key, kind).is_err() {
            return;
        }
    }

    let map = Arc::new(FieldMap::new(
        vec![
            spec(0, "ALT", FieldConversion::Apply(Conversion::Scale { factor: 0.3048 })),
            spec(1, "GEAR", FieldConversion::None),
            spec(2, "ON", FieldConversion::None),
            spec(3, "ID", FieldConversion::Apply(Conversion::FahrenheitToCelsius)),
        ],
        None,
    ));
    let (bound, _) = VariableBinder::bind(map.as_ref(), &registry);
    let decoder = FrameDecoder::new(map, bound, ',', Arc::new(IngestCounters::new()));

    // Feed in uneven pieces to exercise partial frames.
    let mut assembler = FrameAssembler::new(256);
    for chunk in data.chunks(7) {
        assembler.push(chunk, |event| {
            decoder.dispatch(event);
        });
    }
});
