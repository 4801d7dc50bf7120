//! Bayesian evaluation of a two-arm experiment.
//!
//! Turns the control and variant [`ArmObservation`]s into observed rates,
//! uplift and the posterior probability that the variant's true rate is
//! higher than the control's.
use crate::error::{EvaluationError, Result};
use crate::observation::ArmObservation;
use crate::posterior::Posterior;
use log::debug;
use rand::distributions::Distribution;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

pub const DEFAULT_SAMPLES: usize = 200_000;

/// How P(variant > control) is computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WinProbabilityMethod {
    /// Exact sum over the Beta posteriors
    #[default]
    Analytic,
    /// Fraction of paired posterior draws where the variant wins
    MonteCarlo,
}

impl fmt::Display for WinProbabilityMethod {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            WinProbabilityMethod::Analytic => write!(f, "analytic"),
            WinProbabilityMethod::MonteCarlo => write!(f, "monte_carlo"),
        }
    }
}

impl FromStr for WinProbabilityMethod {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "analytic" | "exact" => Ok(WinProbabilityMethod::Analytic),
            "monte_carlo" | "monte-carlo" | "sampling" => Ok(WinProbabilityMethod::MonteCarlo),
            _ => anyhow::bail!("Invalid win probability method: {}", s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluatorConfig {
    pub method: WinProbabilityMethod,
    /// Draws per arm when sampling
    pub samples: usize,
    pub seed: Option<u64>,
    pub prior_successes: u32,
    pub prior_failures: u32,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            method: WinProbabilityMethod::default(),
            samples: DEFAULT_SAMPLES,
            seed: None,
            prior_successes: 1,
            prior_failures: 1,
        }
    }
}

impl EvaluatorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.samples == 0 && self.method == WinProbabilityMethod::MonteCarlo {
            return Err(EvaluationError::InvalidConfig(
                "number of samples must be greater than zero".to_string(),
            ));
        }
        if self.prior_successes == 0 || self.prior_failures == 0 {
            return Err(EvaluationError::InvalidConfig(format!(
                "prior pseudo-counts must be at least 1, got ({}, {})",
                self.prior_successes, self.prior_failures
            )));
        }
        Ok(())
    }

    pub fn prior(&self) -> Posterior {
        Posterior {
            alpha: self.prior_successes as f64,
            beta: self.prior_failures as f64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonResult {
    pub rate_control: f64,
    pub rate_variant: f64,
    pub absolute_uplift: f64,
    #[serde(rename = "relative_uplift")]
    relative: Option<f64>,
    pub win_probability: f64,
    pub method: WinProbabilityMethod,
    pub posterior_control: Posterior,
    pub posterior_variant: Posterior,
}

impl ComparisonResult {
    /// Absolute uplift relative to the control rate. Fails when the control
    /// rate is zero.
    pub fn relative_uplift(&self) -> Result<f64> {
        self.relative.ok_or(EvaluationError::DivisionByZero)
    }
}

pub fn relative_uplift(rate_control: f64, rate_variant: f64) -> Result<f64> {
    if rate_control == 0.0 {
        return Err(EvaluationError::DivisionByZero);
    }
    Ok((rate_variant - rate_control) / rate_control)
}

/// Evaluate the experiment with a generator seeded from `config.seed`, or
/// from entropy when no seed is set.
pub fn evaluate(
    control: &ArmObservation,
    variant: &ArmObservation,
    config: &EvaluatorConfig,
) -> Result<ComparisonResult> {
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    evaluate_with_rng(control, variant, config, &mut rng)
}

pub fn evaluate_with_rng<R: Rng + ?Sized>(
    control: &ArmObservation,
    variant: &ArmObservation,
    config: &EvaluatorConfig,
    rng: &mut R,
) -> Result<ComparisonResult> {
    control.validate()?;
    variant.validate()?;
    config.validate()?;

    let rate_control = control.rate();
    let rate_variant = variant.rate();
    let absolute_uplift = rate_variant - rate_control;
    let relative = relative_uplift(rate_control, rate_variant).ok();

    let prior = config.prior();
    let posterior_control = Posterior::from_observation(control, &prior);
    let posterior_variant = Posterior::from_observation(variant, &prior);
    debug!(
        "Posterior control: α = {}, β = {}; variant: α = {}, β = {}",
        posterior_control.alpha,
        posterior_control.beta,
        posterior_variant.alpha,
        posterior_variant.beta
    );

    let win_probability = match config.method {
        WinProbabilityMethod::Analytic => {
            win_probability_analytic(&posterior_control, &posterior_variant)?
        }
        WinProbabilityMethod::MonteCarlo => win_probability_monte_carlo(
            &posterior_control,
            &posterior_variant,
            config.samples,
            rng,
        )?,
    };
    debug!("P(variant > control) = {:.6} ({})", win_probability, config.method);

    Ok(ComparisonResult {
        rate_control,
        rate_variant,
        absolute_uplift,
        relative,
        win_probability,
        method: config.method,
        posterior_control,
        posterior_variant,
    })
}

pub fn win_probability_analytic(control: &Posterior, variant: &Posterior) -> Result<f64> {
    variant.prob_greater_than(control)
}

/// Monte Carlo estimate of P(variant > control) from `samples` paired draws
pub fn win_probability_monte_carlo<R: Rng + ?Sized>(
    control: &Posterior,
    variant: &Posterior,
    samples: usize,
    rng: &mut R,
) -> Result<f64> {
    if samples == 0 {
        return Err(EvaluationError::InvalidConfig(
            "number of samples must be greater than zero".to_string(),
        ));
    }
    let control_distribution = control.distribution()?;
    let variant_distribution = variant.distribution()?;
    let mut wins = 0usize;
    for _ in 0..samples {
        let x_control = control_distribution.sample(rng);
        let x_variant = variant_distribution.sample(rng);
        if x_variant > x_control {
            wins += 1;
        }
    }
    Ok(wins as f64 / samples as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observations(control: (u64, u64), variant: (u64, u64)) -> (ArmObservation, ArmObservation) {
        (
            ArmObservation::new(control.0, control.1).unwrap(),
            ArmObservation::new(variant.0, variant.1).unwrap(),
        )
    }

    fn monte_carlo_config(seed: u64) -> EvaluatorConfig {
        EvaluatorConfig {
            method: WinProbabilityMethod::MonteCarlo,
            seed: Some(seed),
            ..EvaluatorConfig::default()
        }
    }

    #[test]
    fn test_default_config() {
        let config = EvaluatorConfig::default();
        assert_eq!(config.method, WinProbabilityMethod::Analytic);
        assert_eq!(config.samples, 200_000);
        assert_eq!(config.seed, None);
        assert_eq!(config.prior(), Posterior::uniform());
    }

    #[test]
    fn test_rates_and_uplift() {
        let (control, variant) = observations((100_000, 3276), (100_000, 3905));
        let result = evaluate(&control, &variant, &EvaluatorConfig::default()).unwrap();
        assert!((result.rate_control - 0.03276).abs() < 1e-12);
        assert!((result.rate_variant - 0.03905).abs() < 1e-12);
        assert!((result.absolute_uplift - 0.00629).abs() < 1e-12);
        assert!((result.relative_uplift().unwrap() - 0.192).abs() < 1e-3);
        assert!(result.win_probability > 0.9999);
        assert!(result.win_probability <= 1.0);
        assert_eq!(result.posterior_control.alpha, 3277.0);
        assert_eq!(result.posterior_variant.beta, 96_096.0);
    }

    #[test]
    fn test_identical_arms_analytic() {
        let (control, variant) = observations((100_000, 3276), (100_000, 3276));
        let result = evaluate(&control, &variant, &EvaluatorConfig::default()).unwrap();
        assert!((result.win_probability - 0.5).abs() < 1e-9);
        assert_eq!(result.absolute_uplift, 0.0);
    }

    #[test]
    fn test_identical_arms_monte_carlo() {
        let (control, variant) = observations((100_000, 3276), (100_000, 3276));
        let result = evaluate(&control, &variant, &monte_carlo_config(42)).unwrap();
        assert!((result.win_probability - 0.5).abs() < 0.01);
    }

    #[test]
    fn test_monte_carlo_same_seed_is_identical() {
        let (control, variant) = observations((10_000, 310), (10_000, 335));
        let first = evaluate(&control, &variant, &monte_carlo_config(1234)).unwrap();
        let second = evaluate(&control, &variant, &monte_carlo_config(1234)).unwrap();
        assert_eq!(
            first.win_probability.to_bits(),
            second.win_probability.to_bits()
        );
    }

    #[test]
    fn test_monte_carlo_different_seeds_agree() {
        let (control, variant) = observations((10_000, 310), (10_000, 335));
        let first = evaluate(&control, &variant, &monte_carlo_config(1)).unwrap();
        let second = evaluate(&control, &variant, &monte_carlo_config(2)).unwrap();
        assert!((first.win_probability - second.win_probability).abs() < 0.01);
    }

    #[test]
    fn test_monte_carlo_matches_analytic() {
        let (control, variant) = observations((10_000, 310), (10_000, 335));
        let exact = evaluate(&control, &variant, &EvaluatorConfig::default()).unwrap();
        let sampled = evaluate(&control, &variant, &monte_carlo_config(99)).unwrap();
        assert!((exact.win_probability - sampled.win_probability).abs() < 0.01);
    }

    #[test]
    fn test_win_probability_monotone_in_variant_successes() {
        let config = EvaluatorConfig::default();
        let control = ArmObservation::new(5_000, 150).unwrap();
        let mut previous = 0.0;
        for successes in (100..=200).step_by(10) {
            let variant = ArmObservation::new(5_000, successes).unwrap();
            let result = evaluate(&control, &variant, &config).unwrap();
            assert!(result.win_probability >= previous);
            assert!((0.0..=1.0).contains(&result.win_probability));
            previous = result.win_probability;
        }
    }

    #[test]
    fn test_zero_control_rate_flags_division_by_zero() {
        let (control, variant) = observations((1_000, 0), (1_000, 5));
        let result = evaluate(&control, &variant, &EvaluatorConfig::default()).unwrap();
        assert_eq!(result.rate_control, 0.0);
        assert!((result.absolute_uplift - 0.005).abs() < 1e-12);
        assert_eq!(
            result.relative_uplift(),
            Err(EvaluationError::DivisionByZero)
        );
        assert!(result.win_probability > 0.9);
    }

    #[test]
    fn test_relative_uplift() {
        assert!((relative_uplift(0.04, 0.05).unwrap() - 0.25).abs() < 1e-12);
        assert_eq!(relative_uplift(0.0, 0.05), Err(EvaluationError::DivisionByZero));
    }

    #[test]
    fn test_invalid_config() {
        let (control, variant) = observations((100, 10), (100, 12));
        let config = EvaluatorConfig {
            samples: 0,
            ..monte_carlo_config(3)
        };
        assert!(matches!(
            evaluate(&control, &variant, &config),
            Err(EvaluationError::InvalidConfig(_))
        ));
        let config = EvaluatorConfig {
            prior_failures: 0,
            ..EvaluatorConfig::default()
        };
        assert!(evaluate(&control, &variant, &config).is_err());
    }

    #[test]
    fn test_method_from_str() {
        assert_eq!(
            "analytic".parse::<WinProbabilityMethod>().unwrap(),
            WinProbabilityMethod::Analytic
        );
        assert_eq!(
            "monte-carlo".parse::<WinProbabilityMethod>().unwrap(),
            WinProbabilityMethod::MonteCarlo
        );
        assert!("bootstrap".parse::<WinProbabilityMethod>().is_err());
    }
}
