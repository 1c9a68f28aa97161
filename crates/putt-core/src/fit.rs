//! The fit pipeline: dataset in, [`FitReport`] out.
//!
//! Stages run in order, each inside its own tracing span:
//!
//! 1. `validate`: build the model (data and domain errors stop here)
//! 2. `sample`: run the configured chains
//! 3. `diagnose`: convergence diagnostics, warnings logged at WARN
//! 4. `predictive`: posterior predictive curves and observation comparison
//! 5. `summarize`: empirical data summary
//!
//! Convergence warnings never fail the fit; callers check
//! [`FitReport::is_converged`].

use chrono::{DateTime, Utc};
use putt_common::{Error, PuttingData, SCHEMA_VERSION};
use putt_config::{ConfigSnapshot, RunConfig, SigmaPrior};
use serde::{Deserialize, Serialize};
use tracing::{info, info_span, warn};

use crate::diagnostics::{diagnose, DiagnosticReport};
use crate::model::PuttingModel;
use crate::predictive::{posterior_predictive, PosteriorPredictive};
use crate::sampler::{run_chains, PosteriorDraws, PosteriorSampler};
use crate::summary::{summarize_data, DataSummary};

/// Where a fit came from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provenance {
    pub tool_version: String,
    pub config: ConfigSnapshot,
    pub sampler: String,
    /// Base seed; recorded even when it was drawn from OS entropy.
    pub base_seed: u64,
    pub chain_seeds: Vec<u64>,
}

/// The fitted model in brief.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSummary {
    pub prior: SigmaPrior,
    pub ball_diameter: f64,
    pub hole_diameter: f64,
    pub clearance: f64,
    pub observations: usize,
    pub total_attempts: u64,
    /// Posterior mean of sigma in radians.
    pub sigma_mean: f64,
    /// Posterior median of sigma in degrees.
    pub sigma_degrees_median: f64,
    /// 90% central interval of sigma in degrees.
    pub sigma_degrees_interval: [f64; 2],
    /// Log posterior density at the posterior mean.
    pub log_density_at_mean: f64,
}

/// Everything a fit produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitReport {
    pub schema_version: String,
    pub generated_at: DateTime<Utc>,
    pub provenance: Provenance,
    pub model: ModelSummary,
    pub diagnostics: DiagnosticReport,
    pub predictive: PosteriorPredictive,
    pub data: DataSummary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draws: Option<PosteriorDraws>,
}

/// Knobs that do not belong in the run configuration.
#[derive(Debug, Clone, Default)]
pub struct FitOptions {
    /// Snapshot recorded as provenance; a defaults-only snapshot of the run
    /// configuration when unset.
    pub snapshot: Option<ConfigSnapshot>,
    /// Keep the raw draws in the report.
    pub include_draws: bool,
}

/// Fit `data` with `config` using `sampler`.
pub fn fit(
    data: &PuttingData,
    config: &RunConfig,
    sampler: &dyn PosteriorSampler,
) -> Result<FitReport, Error> {
    fit_with(data, config, sampler, FitOptions::default())
}

/// [`fit`] with explicit provenance and output options.
pub fn fit_with(
    data: &PuttingData,
    config: &RunConfig,
    sampler: &dyn PosteriorSampler,
    options: FitOptions,
) -> Result<FitReport, Error> {
    let model = {
        let _span = info_span!("validate", observations = data.observations.len()).entered();
        PuttingModel::new(data, config.prior)?
    };

    let draws = {
        let _span = info_span!("sample", sampler = sampler.name()).entered();
        run_chains(sampler, &model, &config.sampler)?
    };

    let diagnostics = {
        let _span = info_span!("diagnose", draws = draws.total_draws()).entered();
        let report = diagnose(&draws, &config.diagnostics)?;
        for warning in &report.warnings {
            warn!(kind = warning_kind(warning), "{}", warning);
        }
        report
    };

    let predictive = {
        let _span = info_span!("predictive", grid_points = config.predictive.grid_points).entered();
        posterior_predictive(&model, &draws, &config.predictive)?
    };

    let data_summary = {
        let _span = info_span!("summarize").entered();
        summarize_data(data, config.predictive.se_multiplier)?
    };

    let sigma = &diagnostics.sigma.summary;
    let degrees = &diagnostics.sigma_degrees;
    let constants = model.constants();
    let model_summary = ModelSummary {
        prior: config.prior,
        ball_diameter: data.ball_diameter,
        hole_diameter: data.hole_diameter,
        clearance: constants.clearance(),
        observations: data.observations.len(),
        total_attempts: data_summary.total_attempts,
        sigma_mean: sigma.mean,
        sigma_degrees_median: degrees.q50,
        sigma_degrees_interval: [degrees.q05, degrees.q95],
        log_density_at_mean: model.log_posterior_density(sigma.mean)?,
    };

    info!(
        sigma_mean = sigma.mean,
        sigma_degrees = degrees.q50,
        rhat = diagnostics.sigma.rhat,
        ess = diagnostics.sigma.ess,
        warnings = diagnostics.warnings.len(),
        "Fit complete"
    );

    let snapshot = options.snapshot.unwrap_or_else(|| {
        ConfigSnapshot::new(&putt_config::LoadedConfig::defaults(), config)
    });

    Ok(FitReport {
        schema_version: SCHEMA_VERSION.to_string(),
        generated_at: Utc::now(),
        provenance: Provenance {
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            config: snapshot,
            sampler: draws.sampler.clone(),
            base_seed: draws.base_seed,
            chain_seeds: draws.chain_seeds(),
        },
        model: model_summary,
        diagnostics,
        predictive,
        data: data_summary,
        draws: options.include_draws.then_some(draws),
    })
}

fn warning_kind(warning: &crate::diagnostics::ConvergenceWarning) -> &'static str {
    use crate::diagnostics::ConvergenceWarning::*;
    match warning {
        HighRhat { .. } => "high_rhat",
        RhatUndefined { .. } => "rhat_undefined",
        LowEssRatio { .. } => "low_ess_ratio",
        Divergences { .. } => "divergences",
        TreedepthSaturated { .. } => "treedepth_saturated",
        LowEbfmi { .. } => "low_ebfmi",
    }
}

impl FitReport {
    pub fn is_converged(&self) -> bool {
        self.diagnostics.is_converged()
    }

    pub fn to_json(&self) -> Result<String, Error> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(json)?)
    }

    /// One line for quick status checks.
    pub fn render_summary(&self) -> String {
        let d = &self.diagnostics;
        let status = if self.is_converged() {
            "converged".to_string()
        } else {
            format!("{} warning(s)", d.warnings.len())
        };
        format!(
            "sigma={:.5} rad ({:.3} deg, 90% [{:.3}, {:.3}]) rhat={} ess={} {} [{} x {} draws, {}]",
            self.model.sigma_mean,
            self.model.sigma_degrees_median,
            self.model.sigma_degrees_interval[0],
            self.model.sigma_degrees_interval[1],
            fmt_opt(d.sigma.rhat, 3),
            fmt_opt(d.sigma.ess, 0),
            status,
            d.chains,
            d.draws_per_chain.first().copied().unwrap_or_default(),
            self.provenance.sampler,
        )
    }

    /// Markdown tables for humans.
    pub fn render_markdown(&self) -> String {
        let d = &self.diagnostics;
        let s = &d.sigma.summary;
        let deg = &d.sigma_degrees;
        let mut lines = Vec::new();

        lines.push("# Putting precision fit".to_string());
        lines.push(String::new());
        lines.push(format!(
            "Sampler `{}`, {} chains, base seed {}, prior {} (scale {}).",
            self.provenance.sampler,
            d.chains,
            self.provenance.base_seed,
            self.model.prior.name(),
            self.model.prior.scale(),
        ));
        lines.push(format!(
            "{} distance bins, {} attempts; clearance {:.3} in.",
            self.model.observations, self.model.total_attempts, self.model.clearance
        ));
        lines.push(String::new());

        lines.push("## Posterior".to_string());
        lines.push(String::new());
        lines.push("| parameter | mean | sd | 5% | 50% | 95% |".to_string());
        lines.push("|---|---|---|---|---|---|".to_string());
        lines.push(format!(
            "| sigma (rad) | {:.5} | {} | {:.5} | {:.5} | {:.5} |",
            s.mean,
            fmt_opt(s.sd, 5),
            s.q05,
            s.q50,
            s.q95
        ));
        lines.push(format!(
            "| sigma (deg) | {:.4} | {} | {:.4} | {:.4} | {:.4} |",
            deg.mean,
            fmt_opt(deg.sd, 4),
            deg.q05,
            deg.q50,
            deg.q95
        ));
        lines.push(String::new());

        lines.push("## Diagnostics".to_string());
        lines.push(String::new());
        lines.push("| R-hat | ESS | ESS ratio | MCSE | divergences | max depth hits |".to_string());
        lines.push("|---|---|---|---|---|---|".to_string());
        lines.push(format!(
            "| {} | {} | {} | {} | {} | {} |",
            fmt_opt(d.sigma.rhat, 4),
            fmt_opt(d.sigma.ess, 1),
            fmt_opt(d.sigma.ess_ratio, 3),
            fmt_opt(d.sigma.mcse_mean, 6),
            d.transitions.divergences.count,
            d.transitions.treedepth.saturated,
        ));
        lines.push(String::new());
        if d.warnings.is_empty() {
            lines.push("No convergence warnings.".to_string());
        } else {
            lines.push("Warnings:".to_string());
            for w in &d.warnings {
                lines.push(format!("- {w}"));
            }
        }
        lines.push(String::new());

        lines.push("## Fit vs data".to_string());
        lines.push(String::new());
        lines
            .push("| distance | attempts | successes | observed | predicted | sd | z |".to_string());
        lines.push("|---|---|---|---|---|---|---|".to_string());
        for obs in &self.predictive.observations {
            lines.push(format!(
                "| {:.0} | {} | {} | {:.3} | {:.3} | {:.4} | {} |",
                obs.distance,
                obs.attempts,
                obs.successes,
                obs.empirical,
                obs.mean_predicted,
                obs.sd_predicted,
                fmt_opt(obs.standardized_residual, 2),
            ));
        }

        lines.join("\n")
    }
}

fn fmt_opt(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) => format!("{v:.decimals$}"),
        None => "n/a".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::{AdaptiveMetropolis, Nuts};
    use putt_common::{published_dataset, DataError, DomainError, Observation};

    fn small_config(seed: u64) -> RunConfig {
        let mut config = RunConfig::default();
        config.sampler.chains = 2;
        config.sampler.iterations = 200;
        config.sampler.seed = Some(seed);
        config.predictive.grid_points = 20;
        config
    }

    #[test]
    fn fit_attaches_provenance_and_summaries() {
        let report = fit(&published_dataset(), &small_config(11), &Nuts).unwrap();
        assert_eq!(report.schema_version, SCHEMA_VERSION);
        assert_eq!(report.provenance.sampler, "nuts");
        assert_eq!(report.provenance.base_seed, 11);
        assert_eq!(report.provenance.chain_seeds, vec![11, 12]);
        assert_eq!(report.diagnostics.total_draws, 200);
        assert_eq!(report.predictive.grid.distance.len(), 20);
        assert_eq!(report.data.rows.len(), 19);
        assert_eq!(report.model.observations, 19);
        assert!(report.draws.is_none());
        assert!(report.model.sigma_mean > 0.02 && report.model.sigma_mean < 0.035);
        assert!(report.model.log_density_at_mean.is_finite());
    }

    #[test]
    fn draws_kept_on_request() {
        let options = FitOptions {
            include_draws: true,
            ..FitOptions::default()
        };
        let report =
            fit_with(&published_dataset(), &small_config(3), &AdaptiveMetropolis::default(), options)
                .unwrap();
        let draws = report.draws.as_ref().unwrap();
        assert_eq!(draws.sampler, "metropolis");
        assert_eq!(draws.total_draws(), report.diagnostics.total_draws);
    }

    #[test]
    fn invalid_data_fails_before_sampling() {
        let bad = PuttingData::with_standard_constants(vec![Observation::new(24.0, 10, 11)]);
        assert!(matches!(
            fit(&bad, &small_config(0), &Nuts),
            Err(Error::Data(DataError::SuccessesExceedAttempts { .. }))
        ));
        let short = PuttingData::with_standard_constants(vec![Observation::new(1.0, 10, 5)]);
        assert!(matches!(
            fit(&short, &small_config(0), &Nuts),
            Err(Error::Domain(DomainError::DistanceTooShort { .. }))
        ));
    }

    #[test]
    fn renderers_mention_key_numbers() {
        let report = fit(&published_dataset(), &small_config(5), &Nuts).unwrap();
        let line = report.render_summary();
        assert!(line.starts_with("sigma="));
        assert!(line.contains("nuts"));
        let md = report.render_markdown();
        assert!(md.contains("## Diagnostics"));
        assert_eq!(md.matches("\n| 24 |").count(), 1);
    }

    #[test]
    fn report_json_round_trip() {
        let report = fit(&published_dataset(), &small_config(9), &Nuts).unwrap();
        let back = FitReport::from_json(&report.to_json().unwrap()).unwrap();
        assert_eq!(back.diagnostics, report.diagnostics);
        assert_eq!(back.predictive, report.predictive);
        assert_eq!(back.provenance.chain_seeds, report.provenance.chain_seeds);
    }
}
