// src/cli.rs
use abayes_utils::evaluator::WinProbabilityMethod;
use clap::{Parser, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "abayes", version, about = "Bayesian evaluation of a two-arm A/B experiment")]
pub struct Cli {
    #[arg(
        value_name = "RECORDS",
        required_unless_present = "control_trials",
        help = "CSV file with one row per user and the columns group, clicked, converted"
    )]
    pub records: Option<String>,

    #[arg(
        long,
        short,
        default_value = "abayes",
        value_name = "OUT",
        help = "Output directory"
    )]
    pub out: String,

    #[arg(
        long,
        value_name = "CONTROL_TRIALS",
        requires_all = ["control_successes", "variant_trials", "variant_successes"],
        conflicts_with = "records",
        help = "Use explicit counts instead of a records file: control impressions"
    )]
    pub control_trials: Option<u64>,

    #[arg(long, value_name = "CONTROL_SUCCESSES", help = "Control successes")]
    pub control_successes: Option<u64>,

    #[arg(long, value_name = "VARIANT_TRIALS", help = "Variant impressions")]
    pub variant_trials: Option<u64>,

    #[arg(long, value_name = "VARIANT_SUCCESSES", help = "Variant successes")]
    pub variant_successes: Option<u64>,

    #[arg(
        value_enum,
        long,
        default_value = "ctr",
        help = "Metric the explicit counts describe"
    )]
    pub metric: MetricArg,

    #[arg(
        value_enum,
        long,
        default_value = "analytic",
        help = "How the probability that B beats A is computed"
    )]
    pub method: MethodArg,

    #[arg(long, default_value = "200000", help = "Monte Carlo draws per arm")]
    pub samples: usize,

    #[arg(long, help = "Seed for Monte Carlo sampling")]
    pub seed: Option<u64>,

    #[arg(long, default_value = "1", help = "Prior pseudo-successes of the Beta prior")]
    pub prior_successes: u32,

    #[arg(long, default_value = "1", help = "Prior pseudo-failures of the Beta prior")]
    pub prior_failures: u32,

    #[arg(
        long,
        default_value = "0.95",
        help = "Win probability required to recommend rolling out the variant"
    )]
    pub threshold: f64,

    #[arg(
        long,
        default_value = "500",
        help = "Number of points in the posterior density grid, 0 disables the grid"
    )]
    pub grid_points: usize,

    #[arg(long, help = "Also write the summary as JSON")]
    pub json: bool,

    #[arg(
        value_enum,
        long,
        default_value = "normal",
        value_name = "VERBOSITY",
        help = "Verbosity level"
    )]
    pub verbosity: LogLevel,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum MetricArg {
    Ctr,
    Cvr,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum MethodArg {
    Analytic,
    MonteCarlo,
}

impl From<MethodArg> for WinProbabilityMethod {
    fn from(method: MethodArg) -> Self {
        match method {
            MethodArg::Analytic => WinProbabilityMethod::Analytic,
            MethodArg::MonteCarlo => WinProbabilityMethod::MonteCarlo,
        }
    }
}

#[derive(ValueEnum, Clone, Debug)]
pub enum LogLevel {
    Verbose,
    Normal,
    Silent,
}
