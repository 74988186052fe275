use std::path::PathBuf;

use clap::{ArgAction, Args, Command, FromArgMatches as _};

use crate::config::RunConfig;
use crate::error::SirError;
use crate::integrator::integrate_with_options;
use crate::log::{debug, info, LevelFilter, LogSpec};
use crate::quantizer::{quantize, Quantized};
use crate::report::ReportOptions;
use crate::trajectory::Trajectory;

/// Default cli arguments for the sir-quant runner
#[derive(Args, Debug, Default)]
pub struct BaseArgs {
    /// Optional path for a JSON run configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Optional directory for CSV report output
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Prefix prepended to report file names
    #[arg(long, default_value = "")]
    pub file_prefix: String,

    /// Log level specification, e.g. `info` or `sir_quant::integrator=trace,warn`
    #[arg(long)]
    pub log_level: Option<String>,

    /// Increase logging verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl BaseArgs {
    /// The logging specification implied by `--log-level` or, failing that, `-v`.
    ///
    /// # Errors
    ///
    /// Returns `SirError::Config` if `--log-level` does not parse.
    pub fn log_spec(&self) -> Result<LogSpec, SirError> {
        if let Some(spec) = &self.log_level {
            return spec.parse();
        }
        let global = match self.verbose {
            0 => None,
            1 => Some(LevelFilter::Info),
            2 => Some(LevelFilter::Debug),
            _ => Some(LevelFilter::Trace),
        };
        Ok(LogSpec {
            global,
            modules: Vec::new(),
        })
    }
}

/// Everything a run produces.
#[derive(Debug)]
pub struct RunOutput {
    pub config: RunConfig,
    pub trajectory: Trajectory,
    /// `I(t) / N`, the quantizer's input
    pub signal: Vec<f64>,
    pub quantized: Quantized,
    /// Paths of the reports written, if any
    pub reports: Vec<PathBuf>,
}

impl RunOutput {
    /// The lines the binary prints to stdout.
    #[must_use]
    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("indices: {:?}", self.quantized.indices),
            format!("quanta: {:?}", self.quantized.quanta),
        ];
        if let Some((time, infected)) = self.trajectory.peak() {
            lines.push(format!("peak infected: {infected:.3} at day {time:.3}"));
        }
        lines
    }
}

fn create_cli() -> Command {
    let cli = Command::new("sir-quant")
        .about("Integrates an SIR epidemic and quantizes the infected-fraction curve");
    BaseArgs::augment_args(cli)
}

/// Runs integrator then quantizer for `config`.
///
/// # Errors
///
/// Returns the first validation, integration, or quantization error.
pub fn run(config: &RunConfig) -> Result<(Trajectory, Vec<f64>, Quantized), SirError> {
    config.validate()?;
    let grid = config.time.grid()?;
    let params = &config.parameters;
    info!(
        "integrating SIR with N = {}, beta = {}, gamma = {} (R0 = {:.3}) over {} points",
        params.total_population,
        params.transmission_rate,
        params.recovery_rate,
        params.basic_reproduction_number(),
        grid.len()
    );
    let trajectory =
        integrate_with_options(params, &config.initial_state(), &grid, &config.integrator)?;
    debug!(
        "max conservation error {:e}",
        trajectory.max_conservation_error()
    );

    let quantizer = config.quantizer.build()?;
    let signal = trajectory.infected_fraction();
    let quantized = quantize(&signal, quantizer.partitions(), quantizer.codebook())?;
    info!(
        "quantized {} samples into {} regions (mse {:e})",
        signal.len(),
        quantizer.regions(),
        quantized.mean_squared_error(&signal)
    );
    Ok((trajectory, signal, quantized))
}

/// Parses command line arguments and runs.
///
/// # Errors
///
/// Returns an error if argument parsing, configuration, or the run fails
pub fn run_with_args() -> Result<RunOutput, Box<dyn std::error::Error>> {
    let matches = create_cli().get_matches();
    let args = BaseArgs::from_arg_matches(&matches)?;
    Ok(run_with_args_internal(&args)?)
}

fn run_with_args_internal(args: &BaseArgs) -> Result<RunOutput, SirError> {
    let log_spec = args.log_spec()?;
    if log_spec != LogSpec::default() {
        log_spec.apply();
    }

    // Optionally load the run configuration from a file
    let config = match &args.config {
        Some(path) => {
            info!("Loading run configuration from: {}", path.display());
            RunConfig::from_path(path)?
        }
        None => RunConfig::default(),
    };

    let (trajectory, signal, quantized) = run(&config)?;

    // Optionally write reports
    let mut reports = Vec::new();
    if let Some(dir) = &args.output_dir {
        let options = ReportOptions::new(dir).file_prefix(args.file_prefix.clone());
        reports.push(options.write_trajectory(&trajectory)?);
        reports.push(options.write_quantized(trajectory.times(), &signal, &quantized)?);
    }

    Ok(RunOutput {
        config,
        trajectory,
        signal,
        quantized,
        reports,
    })
}
