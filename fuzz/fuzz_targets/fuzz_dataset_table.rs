//! Fuzz target for text-table dataset parsing.
//!
//! Any input must parse or fail with a data error; parsed tables that
//! validate must also build a model.

#![no_main]

use libfuzzer_sys::fuzz_target;
use putt_common::{parse_table, DistanceUnit, PuttingData};
use putt_config::SigmaPrior;
use putt_core::model::PuttingModel;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    for unit in [DistanceUnit::Inches, DistanceUnit::Feet] {
        if let Ok(observations) = parse_table(text, unit) {
            let dataset = PuttingData::with_standard_constants(observations);
            if let Ok(model) = PuttingModel::new(&dataset, SigmaPrior::default()) {
                let _ = model.log_posterior_density(0.03);
            }
        }
    }
});
