use abayes_utils::decision::Recommendation;
use abayes_utils::evaluator::{self, EvaluatorConfig};
use abayes_utils::metric::Metric;
use abayes_utils::posterior::Posterior;
use abayes_utils::records::{self, ArmCounts, ExperimentCounts};
use anyhow::{anyhow, Result};
use itertools::Itertools;
use log::{debug, info, warn};
use std::path::Path;
use std::time::Instant;
use strum::IntoEnumIterator;

use crate::cli;
use crate::data::MetricSummary;
use crate::io::{self, PosteriorGridWriter, SummaryWriter};

const CREDIBLE_LEVEL: f64 = 0.95;
// Mass covered by the posterior density grid
const GRID_LEVEL: f64 = 0.9999;

pub fn evaluator_config(args: &cli::Cli) -> EvaluatorConfig {
    EvaluatorConfig {
        method: args.method.into(),
        samples: args.samples,
        seed: args.seed,
        prior_successes: args.prior_successes,
        prior_failures: args.prior_failures,
    }
}

/// Metrics to evaluate together with their per-arm counts
fn load_counts(args: &cli::Cli) -> Result<(ExperimentCounts, Vec<Metric>)> {
    if let Some(path) = &args.records {
        info!("Loading user records from: {}", path);
        let counts = records::load_experiment_counts(Path::new(path))?;
        return Ok((counts, Metric::iter().collect()));
    }

    let (control_trials, control_successes, variant_trials, variant_successes) = match (
        args.control_trials,
        args.control_successes,
        args.variant_trials,
        args.variant_successes,
    ) {
        (Some(ct), Some(cs), Some(vt), Some(vs)) => (ct, cs, vt, vs),
        _ => return Err(anyhow!("Either a records file or all four arm counts are required")),
    };
    let metric = match args.metric {
        cli::MetricArg::Ctr => Metric::Ctr,
        cli::MetricArg::Cvr => Metric::Cvr,
    };
    let (control, variant) = match metric {
        Metric::Ctr => (
            ArmCounts::new(control_trials, control_successes, 0),
            ArmCounts::new(variant_trials, variant_successes, 0),
        ),
        Metric::Cvr => (
            ArmCounts::new(control_trials, 0, control_successes),
            ArmCounts::new(variant_trials, 0, variant_successes),
        ),
    };
    Ok((ExperimentCounts::from_arm_counts(control, variant), vec![metric]))
}

pub fn summarise_metric(
    counts: &ExperimentCounts,
    metric: Metric,
    config: &EvaluatorConfig,
    threshold: f64,
) -> Result<MetricSummary> {
    let (control, variant) = counts
        .observations(metric)
        .map_err(|e| anyhow!("Could not build {} observations: {}", metric, e))?;
    let comparison = evaluator::evaluate(&control, &variant, config)?;
    let recommendation = Recommendation::from_comparison(&comparison, threshold)?;
    let credible_interval_control = comparison.posterior_control.credible_interval(CREDIBLE_LEVEL)?;
    let credible_interval_variant = comparison.posterior_variant.credible_interval(CREDIBLE_LEVEL)?;
    Ok(MetricSummary::new(
        metric,
        control,
        variant,
        comparison,
        recommendation,
        credible_interval_control,
        credible_interval_variant,
    ))
}

/// Densities of both posteriors over the range holding nearly all of their mass
pub fn posterior_grids(
    control: &Posterior,
    variant: &Posterior,
    points: usize,
) -> Result<(Vec<(f64, f64)>, Vec<(f64, f64)>)> {
    let (control_low, control_high) = control.credible_interval(GRID_LEVEL)?;
    let (variant_low, variant_high) = variant.credible_interval(GRID_LEVEL)?;
    let lower = control_low.min(variant_low);
    let upper = control_high.max(variant_high);
    debug!("Posterior grid over [{:.6}, {:.6}] with {} points", lower, upper, points);
    Ok((
        control.density_grid(lower, upper, points),
        variant.density_grid(lower, upper, points),
    ))
}

fn log_summary(summary: &MetricSummary) {
    let comparison = &summary.comparison;
    let relative = match comparison.relative_uplift() {
        Ok(uplift) => format!("{:+.2}%", uplift * 100.0),
        Err(e) => {
            warn!("{}: {}", summary.metric, e);
            "N/A".to_string()
        }
    };
    info!(
        "{}: A {:.2}% | B {:.2}% | uplift {:+.2} pp ({}) | P(B > A) = {:.2}%",
        summary.metric,
        comparison.rate_control * 100.0,
        comparison.rate_variant * 100.0,
        comparison.absolute_uplift * 100.0,
        relative,
        comparison.win_probability * 100.0,
    );
    info!("{}: {}", summary.metric, summary.recommendation);
}

pub fn run(args: &cli::Cli) -> Result<()> {
    let global_timer = Instant::now();
    let config = evaluator_config(args);
    config.validate()?;

    let (counts, metrics) = load_counts(args)?;
    info!(
        "Evaluating {} with the {} method",
        metrics.iter().map(|m| m.to_string()).join(", "),
        config.method
    );

    let mut summaries = Vec::with_capacity(metrics.len());
    for metric in metrics {
        let timer = Instant::now();
        let summary = summarise_metric(&counts, metric, &config, args.threshold)?;
        log_summary(&summary);
        debug!("Evaluated {} in {:?}", metric, timer.elapsed());
        summaries.push(summary);
    }

    let outdir = Path::new(&args.out);
    let summary_path = outdir.join("ab_summary.tsv");
    let mut summary_writer = SummaryWriter::new(&summary_path)?;
    summary_writer.write_header()?;
    summary_writer.write_records_iter(summaries.iter())?;
    info!("Wrote summary to: {}", summary_path.display());

    if args.grid_points > 0 {
        for summary in &summaries {
            let (control_grid, variant_grid) = posterior_grids(
                &summary.comparison.posterior_control,
                &summary.comparison.posterior_variant,
                args.grid_points,
            )?;
            let grid_path = outdir.join(format!("posterior_grid_{}.tsv", summary.metric.to_string()));
            let mut grid_writer = PosteriorGridWriter::new(&grid_path)?;
            grid_writer.write_header()?;
            grid_writer.write_grid(&control_grid, &variant_grid)?;
            info!("Wrote posterior grid to: {}", grid_path.display());
        }
    }

    if args.json {
        let json_path = outdir.join("ab_summary.json");
        io::write_json(&json_path, &summaries)?;
        info!("Wrote JSON summary to: {}", json_path.display());
    }

    info!("Finished in {:?}", global_timer.elapsed());
    Ok(())
}
