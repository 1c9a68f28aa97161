//! Fuzz target for run configuration parsing.
//!
//! Tests that TOML and JSON configuration parsing and validation handle
//! arbitrary input without panicking.

#![no_main]

use libfuzzer_sys::fuzz_target;
use putt_config::{ConfigFormat, RunConfig};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let _ = RunConfig::from_str_as(text, ConfigFormat::Toml);
    let _ = RunConfig::from_str_as(text, ConfigFormat::Json);
});
