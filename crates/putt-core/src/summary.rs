//! Empirical success rates with binomial standard errors.

use putt_common::{Error, PuttingData};
use serde::{Deserialize, Serialize};

/// One distance bin of the data summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub distance: f64,
    pub attempts: u64,
    pub successes: u64,
    /// `successes / attempts`.
    pub proportion: f64,
    /// `sqrt(p (1 - p) / attempts)`.
    pub se: f64,
    /// `proportion - k·se`, clamped to `[0, 1]`.
    pub lower: f64,
    /// `proportion + k·se`, clamped to `[0, 1]`.
    pub upper: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSummary {
    pub se_multiplier: f64,
    pub total_attempts: u64,
    pub total_successes: u64,
    pub overall_proportion: f64,
    pub rows: Vec<SummaryRow>,
}

/// Summarize a dataset; error bars are `±se_multiplier` standard errors.
pub fn summarize_data(data: &PuttingData, se_multiplier: f64) -> Result<DataSummary, Error> {
    data.validate()?;
    let rows: Vec<SummaryRow> = data
        .observations
        .iter()
        .map(|obs| {
            let p = obs.proportion();
            let se = (p * (1.0 - p) / obs.attempts as f64).sqrt();
            SummaryRow {
                distance: obs.distance,
                attempts: obs.attempts,
                successes: obs.successes,
                proportion: p,
                se,
                lower: (p - se_multiplier * se).clamp(0.0, 1.0),
                upper: (p + se_multiplier * se).clamp(0.0, 1.0),
            }
        })
        .collect();
    let total_attempts = data.total_attempts()?;
    let total_successes = data.total_successes()?;
    Ok(DataSummary {
        se_multiplier,
        total_attempts,
        total_successes,
        overall_proportion: total_successes as f64 / total_attempts as f64,
        rows,
    })
}
