//! Golf Putting Precision CLI
//!
//! The `putt` binary, handling:
//! - Posterior fits of the angular error model (`fit`)
//! - Point evaluations of the log posterior (`density`)
//! - Empirical summaries and fake-data simulation (`summary`, `simulate`)
//! - Configuration inspection (`config show`, `config validate`)
//!
//! Payloads go to stdout, logs and structured errors to stderr.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use putt_common::error::StructuredError;
use putt_common::{
    is_json_document, parse_dataset, parse_table, published_dataset, DistanceUnit, Error,
    OutputFormat, PuttingData, SCHEMA_VERSION,
};
use putt_config::validate::validate_sampler;
use putt_config::{
    load_resolved, ConfigSnapshot, ConstantsConfig, LoadedConfig, RunConfig, SamplerKind,
    ValidationError,
};
use putt_core::exit_codes::ExitCode;
use putt_core::logging::{init_logging, LogConfig, LogFormat, LogLevel};
use putt_core::model::{sigma_degrees, PuttingModel};
use putt_core::sampler::sampler_for;
use putt_core::simulate::{design_of, simulate};
use putt_core::summary::summarize_data;
use putt_core::{fit_with, FitOptions};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::{debug, info};

/// Golf putting precision: fit angular aiming error from putting data
#[derive(Parser)]
#[command(name = "putt")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Run configuration file (TOML or JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "json", env = "PUTT_FORMAT")]
    format: OutputFormat,

    /// Log level (overrides PUTT_LOG and RUST_LOG)
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,

    /// Log format on stderr
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fit the model: posterior draws, diagnostics, and predictive curves
    Fit(FitArgs),
    /// Evaluate the log prior, likelihood, and posterior at given sigmas
    Density(DensityArgs),
    /// Empirical success rates with standard-error bars
    Summary(DataArgs),
    /// Simulate a dataset from a known sigma
    Simulate(SimulateArgs),
    /// Configuration management
    Config(ConfigArgs),
}

#[derive(Args, Debug)]
struct DataArgs {
    /// Dataset file (JSON or text table); the published dataset when omitted
    data: Option<PathBuf>,

    /// Unit of the distance column
    #[arg(long, value_enum, default_value_t = DistanceUnit::Inches)]
    unit: DistanceUnit,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SamplerArg {
    Nuts,
    Metropolis,
}

impl From<SamplerArg> for SamplerKind {
    fn from(arg: SamplerArg) -> Self {
        match arg {
            SamplerArg::Nuts => SamplerKind::Nuts,
            SamplerArg::Metropolis => SamplerKind::Metropolis,
        }
    }
}

#[derive(Args, Debug)]
struct FitArgs {
    #[command(flatten)]
    data: DataArgs,

    /// Sampling strategy
    #[arg(long, value_enum)]
    sampler: Option<SamplerArg>,

    /// Number of chains
    #[arg(long)]
    chains: Option<usize>,

    /// Iterations per chain, warm-up included
    #[arg(long)]
    iterations: Option<usize>,

    /// Warm-up iterations per chain
    #[arg(long)]
    warmup: Option<usize>,

    /// Base seed; chain c uses seed + c
    #[arg(long, env = "PUTT_SEED")]
    seed: Option<u64>,

    /// Initial sigma for every chain
    #[arg(long = "init")]
    initial_value: Option<f64>,

    /// Maximum NUTS tree depth
    #[arg(long)]
    max_depth: Option<u32>,

    /// Target acceptance statistic for step-size adaptation
    #[arg(long)]
    target_accept: Option<f64>,

    /// Keep warm-up transitions in the draws
    #[arg(long)]
    save_warmup: bool,

    /// Include raw draws in the JSON report
    #[arg(long)]
    include_draws: bool,
}

#[derive(Args, Debug)]
struct DensityArgs {
    #[command(flatten)]
    data: DataArgs,

    /// Sigma values in radians (comma separated)
    #[arg(long, value_delimiter = ',', required = true, allow_negative_numbers = true)]
    sigma: Vec<f64>,
}

#[derive(Args, Debug)]
struct SimulateArgs {
    /// Dataset whose distances and attempts are reused; the published one when omitted
    #[arg(long = "design")]
    design: Option<PathBuf>,

    /// Unit of the design's distance column
    #[arg(long, value_enum, default_value_t = DistanceUnit::Inches)]
    unit: DistanceUnit,

    /// True sigma in radians
    #[arg(long, allow_negative_numbers = true)]
    sigma: f64,

    /// RNG seed; drawn from OS entropy when omitted
    #[arg(long, env = "PUTT_SEED")]
    seed: Option<u64>,
}

#[derive(Args, Debug)]
struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show the effective configuration and where it came from
    Show,
    /// Validate a configuration file
    Validate {
        /// File to validate; the resolved configuration when omitted
        path: Option<PathBuf>,
    },
}

// ============================================================================
// Errors
// ============================================================================

/// Anything a command can fail with, mapped to an exit code at the top.
#[derive(Debug)]
enum CliError {
    Run(Error),
    Config(ValidationError),
    Args(String),
}

impl From<Error> for CliError {
    fn from(err: Error) -> Self {
        CliError::Run(err)
    }
}

impl From<ValidationError> for CliError {
    fn from(err: ValidationError) -> Self {
        CliError::Config(err)
    }
}

impl CliError {
    fn exit_code(&self) -> ExitCode {
        match self {
            CliError::Run(e) => ExitCode::from(e),
            CliError::Config(e) => ExitCode::from(e),
            CliError::Args(_) => ExitCode::ArgsError,
        }
    }

    fn structured(&self) -> serde_json::Value {
        match self {
            CliError::Run(e) => serde_json::json!(StructuredError::from(e)),
            CliError::Config(e) => serde_json::json!({
                "code": e.code(),
                "category": "config",
                "message": e.to_string(),
                "remediation": "Run 'putt config validate' to locate the problem, or remove the config file to use defaults.",
            }),
            CliError::Args(message) => serde_json::json!({
                "code": ExitCode::ArgsError.as_i32(),
                "category": "args",
                "message": message,
                "remediation": "See 'putt --help' for valid arguments.",
            }),
        }
    }

    fn message(&self) -> String {
        match self {
            CliError::Run(e) => e.to_string(),
            CliError::Config(e) => e.to_string(),
            CliError::Args(m) => m.clone(),
        }
    }
}

/// Report an error on stderr in the requested format.
fn output_error(global: &GlobalOpts, error: &CliError) -> ExitCode {
    let exit_code = error.exit_code();
    match global.format {
        OutputFormat::Json => {
            let response = serde_json::json!({
                "schema_version": SCHEMA_VERSION,
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "status": "error",
                "exit_code": exit_code.code_name(),
                "error": error.structured(),
            });
            match serde_json::to_string_pretty(&response) {
                Ok(text) => eprintln!("{text}"),
                Err(_) => eprintln!("error: {}", error.message()),
            }
        }
        OutputFormat::Summary => eprintln!("[{}] {}", exit_code.code_name(), error.message()),
        OutputFormat::Md => {
            eprintln!("# Error");
            eprintln!();
            eprintln!("{}", error.message());
        }
    }
    exit_code
}

// ============================================================================
// Entry point
// ============================================================================

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = match err.kind() {
                clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                    ExitCode::Clean
                }
                _ => ExitCode::ArgsError,
            };
            let _ = err.print();
            std::process::exit(code.as_i32());
        }
    };

    init_logging(&LogConfig::from_env(
        cli.global.log_level,
        cli.global.log_format,
    ));

    let result = match &cli.command {
        Commands::Fit(args) => run_fit(&cli.global, args),
        Commands::Density(args) => run_density(&cli.global, args),
        Commands::Summary(args) => run_summary(&cli.global, args),
        Commands::Simulate(args) => run_simulate(&cli.global, args),
        Commands::Config(args) => match &args.command {
            ConfigCommands::Show => run_config_show(&cli.global),
            ConfigCommands::Validate { path } => run_config_validate(&cli.global, path.as_deref()),
        },
    };

    let exit_code = match result {
        Ok(code) => code,
        Err(err) => output_error(&cli.global, &err),
    };
    std::process::exit(exit_code.as_i32());
}

// ============================================================================
// Shared helpers
// ============================================================================

fn load_config(global: &GlobalOpts) -> Result<LoadedConfig, CliError> {
    let loaded = load_resolved(global.config.as_deref())?;
    debug!(
        source = %loaded.source,
        path = ?loaded.path,
        "Configuration resolved"
    );
    Ok(loaded)
}

/// Load a dataset. Text tables and the built-in dataset take the configured
/// ball and hole sizes; JSON documents carry their own.
fn load_data(
    path: Option<&Path>,
    unit: DistanceUnit,
    constants: &ConstantsConfig,
) -> Result<PuttingData, Error> {
    let Some(path) = path else {
        return Ok(PuttingData::new(
            constants.ball_diameter,
            constants.hole_diameter,
            published_dataset().observations,
        ));
    };
    let content = std::fs::read_to_string(path)?;
    let data = if is_json_document(&content) {
        parse_dataset(&content, unit)?
    } else {
        PuttingData::new(
            constants.ball_diameter,
            constants.hole_diameter,
            parse_table(&content, unit)?,
        )
    };
    debug!(
        path = %path.display(),
        bins = data.observations.len(),
        "Dataset loaded"
    );
    Ok(data)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ============================================================================
// Commands
// ============================================================================

fn run_fit(global: &GlobalOpts, args: &FitArgs) -> Result<ExitCode, CliError> {
    let loaded = load_config(global)?;
    let mut config = loaded.config.clone();
    apply_sampler_overrides(&mut config, args);
    validate_sampler(&config.sampler).map_err(|e| CliError::Args(e.to_string()))?;

    let data = load_data(args.data.data.as_deref(), args.data.unit, &config.constants)?;
    let sampler = sampler_for(config.sampler.kind);
    info!(
        sampler = sampler.name(),
        bins = data.observations.len(),
        "Fitting"
    );

    let options = FitOptions {
        snapshot: Some(ConfigSnapshot::new(&loaded, &config)),
        include_draws: args.include_draws,
    };
    let report = fit_with(&data, &config, sampler.as_ref(), options)?;

    match global.format {
        OutputFormat::Json => println!("{}", report.to_json()?),
        OutputFormat::Md => println!("{}", report.render_markdown()),
        OutputFormat::Summary => println!("{}", report.render_summary()),
    }

    Ok(if report.is_converged() {
        ExitCode::Clean
    } else {
        ExitCode::ConvergenceWarnings
    })
}

fn apply_sampler_overrides(config: &mut RunConfig, args: &FitArgs) {
    let sampler = &mut config.sampler;
    if let Some(kind) = args.sampler {
        sampler.kind = kind.into();
    }
    if let Some(chains) = args.chains {
        sampler.chains = chains;
    }
    if let Some(iterations) = args.iterations {
        sampler.iterations = iterations;
    }
    if args.warmup.is_some() {
        sampler.warmup = args.warmup;
    }
    if args.seed.is_some() {
        sampler.seed = args.seed;
    }
    if args.initial_value.is_some() {
        sampler.initial_value = args.initial_value;
    }
    if let Some(depth) = args.max_depth {
        sampler.max_tree_depth = depth;
    }
    if let Some(target) = args.target_accept {
        sampler.target_accept = target;
    }
    if args.save_warmup {
        sampler.save_warmup = true;
    }
}

#[derive(Debug, Serialize)]
struct DensityPoint {
    sigma: f64,
    sigma_degrees: f64,
    log_prior: f64,
    log_likelihood: f64,
    log_posterior: f64,
    gradient: f64,
}

fn run_density(global: &GlobalOpts, args: &DensityArgs) -> Result<ExitCode, CliError> {
    let loaded = load_config(global)?;
    let config = loaded.config;
    let data = load_data(args.data.data.as_deref(), args.data.unit, &config.constants)?;
    let model = PuttingModel::new(&data, config.prior)?;

    let points = args
        .sigma
        .iter()
        .map(|&sigma| {
            Ok(DensityPoint {
                sigma,
                sigma_degrees: sigma_degrees(sigma),
                log_prior: model.log_prior(sigma),
                log_likelihood: model.log_likelihood(sigma)?,
                log_posterior: model.log_posterior_density(sigma)?,
                gradient: model.log_posterior_gradient(sigma)?,
            })
        })
        .collect::<Result<Vec<_>, Error>>()?;

    match global.format {
        OutputFormat::Json => print_json(&serde_json::json!({
            "schema_version": SCHEMA_VERSION,
            "prior": config.prior,
            "observations": data.observations.len(),
            "points": points,
        }))?,
        OutputFormat::Md => {
            println!("| sigma | degrees | log prior | log likelihood | log posterior | gradient |");
            println!("|---|---|---|---|---|---|");
            for p in &points {
                println!(
                    "| {} | {:.4} | {:.6} | {:.6} | {:.6} | {:.4} |",
                    p.sigma,
                    p.sigma_degrees,
                    p.log_prior,
                    p.log_likelihood,
                    p.log_posterior,
                    p.gradient
                );
            }
        }
        OutputFormat::Summary => {
            for p in &points {
                println!("sigma={} log_posterior={:.6}", p.sigma, p.log_posterior);
            }
        }
    }
    Ok(ExitCode::Clean)
}

fn run_summary(global: &GlobalOpts, args: &DataArgs) -> Result<ExitCode, CliError> {
    let config = load_config(global)?.config;
    let data = load_data(args.data.as_deref(), args.unit, &config.constants)?;
    let summary = summarize_data(&data, config.predictive.se_multiplier)?;

    match global.format {
        OutputFormat::Json => print_json(&summary)?,
        OutputFormat::Md => {
            println!("| distance | attempts | successes | proportion | se | lower | upper |");
            println!("|---|---|---|---|---|---|---|");
            for r in &summary.rows {
                println!(
                    "| {} | {} | {} | {:.4} | {:.4} | {:.4} | {:.4} |",
                    r.distance, r.attempts, r.successes, r.proportion, r.se, r.lower, r.upper
                );
            }
        }
        OutputFormat::Summary => println!(
            "{} bins, {} / {} holed ({:.1}%)",
            summary.rows.len(),
            summary.total_successes,
            summary.total_attempts,
            summary.overall_proportion * 100.0
        ),
    }
    Ok(ExitCode::Clean)
}

fn run_simulate(global: &GlobalOpts, args: &SimulateArgs) -> Result<ExitCode, CliError> {
    let config = load_config(global)?.config;
    let template = load_data(args.design.as_deref(), args.unit, &config.constants)?;
    let constants = template.validate()?;
    let seed = args.seed.unwrap_or_else(rand::random);
    let mut rng = StdRng::seed_from_u64(seed);
    let fake = simulate(&constants, &design_of(&template), args.sigma, &mut rng)?;
    info!(seed, sigma = args.sigma, "Simulated dataset");

    match global.format {
        OutputFormat::Json => print_json(&fake)?,
        OutputFormat::Md => {
            println!("# sigma = {}, seed = {}", args.sigma, seed);
            println!("distance attempts successes");
            for o in &fake.observations {
                println!("{} {} {}", o.distance, o.attempts, o.successes);
            }
        }
        OutputFormat::Summary => {
            let holed = fake.total_successes().map_err(Error::from)?;
            let attempts = fake.total_attempts().map_err(Error::from)?;
            println!(
                "simulated {} bins, {} / {} holed (sigma={}, seed={})",
                fake.observations.len(),
                holed,
                attempts,
                args.sigma,
                seed
            );
        }
    }
    Ok(ExitCode::Clean)
}

fn run_config_show(global: &GlobalOpts) -> Result<ExitCode, CliError> {
    let loaded = load_config(global)?;
    let snapshot = ConfigSnapshot::new(&loaded, &loaded.config);

    match global.format {
        OutputFormat::Json => print_json(&serde_json::json!({
            "schema_version": SCHEMA_VERSION,
            "generated_at": chrono::Utc::now().to_rfc3339(),
            "source": snapshot.source,
            "path": snapshot.path,
            "file_hash": snapshot.file_hash,
            "effective_hash": snapshot.effective_hash,
            "config": loaded.config,
        }))?,
        OutputFormat::Md => {
            println!("# putt config show");
            println!();
            match &snapshot.path {
                Some(path) => println!("Source: {} ({})", path, snapshot.source),
                None => println!("Source: **built-in defaults**"),
            }
            println!();
            println!("```toml");
            print!("{}", loaded.config.to_toml()?);
            println!("```");
        }
        OutputFormat::Summary => println!(
            "config: source={} path={} id={}",
            snapshot.source,
            snapshot.path.as_deref().unwrap_or("-"),
            snapshot.short_id()
        ),
    }
    Ok(ExitCode::Clean)
}

fn run_config_validate(global: &GlobalOpts, path: Option<&Path>) -> Result<ExitCode, CliError> {
    let (config, shown_path) = match path {
        Some(p) => (RunConfig::from_file(p)?, Some(p.display().to_string())),
        None => {
            let loaded = load_config(global)?;
            let shown = loaded.path.as_ref().map(|p| p.display().to_string());
            (loaded.config, shown)
        }
    };

    match global.format {
        OutputFormat::Json => print_json(&serde_json::json!({
            "schema_version": SCHEMA_VERSION,
            "generated_at": chrono::Utc::now().to_rfc3339(),
            "status": "valid",
            "path": shown_path,
            "using_defaults": shown_path.is_none(),
            "config_schema_version": config.schema_version,
        }))?,
        OutputFormat::Md => {
            println!("# Configuration Validation");
            println!();
            println!("Status: valid");
            match &shown_path {
                Some(p) => println!("File: {p}"),
                None => println!("File: using built-in defaults"),
            }
        }
        OutputFormat::Summary => println!("config validate: OK"),
    }
    Ok(ExitCode::Clean)
}
