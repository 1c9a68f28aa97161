//! Fuzz target for JSON dataset parsing.

#![no_main]

use libfuzzer_sys::fuzz_target;
use putt_common::PuttingData;

fuzz_target!(|data: &[u8]| {
    if let Ok(dataset) = serde_json::from_slice::<PuttingData>(data) {
        // Validation must return an error, never panic.
        let _ = dataset.validate();
    }
});
