use crate::error::{EvaluationError, Result};
use crate::observation::ArmObservation;
use log::debug;
use rand::distributions::Distribution;
use rand::Rng;
use serde::{Deserialize, Serialize};
use statrs::distribution::{Beta as BetaDistribution, ContinuousCDF};
use statrs::function::beta::ln_beta;

/// Beta posterior over the success rate of one experiment arm
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Posterior {
    pub alpha: f64,
    pub beta: f64,
}

impl Posterior {
    pub fn new(alpha: f64, beta: f64) -> Result<Self> {
        if !(alpha > 0.0 && alpha.is_finite() && beta > 0.0 && beta.is_finite()) {
            return Err(EvaluationError::InvalidPosterior { alpha, beta });
        }
        Ok(Self { alpha, beta })
    }

    /// Uniform Beta(1, 1) prior
    pub fn uniform() -> Self {
        Self {
            alpha: 1.0,
            beta: 1.0,
        }
    }

    /// Conjugate update with `successes` successes and `failures` failures
    pub fn update(&mut self, successes: u64, failures: u64) {
        self.alpha += successes as f64;
        self.beta += failures as f64;
    }

    pub fn from_observation(observation: &ArmObservation, prior: &Posterior) -> Self {
        let mut posterior = *prior;
        posterior.update(observation.successes(), observation.failures());
        posterior
    }

    pub fn mean(&self) -> f64 {
        self.alpha / (self.alpha + self.beta)
    }

    pub fn variance(&self) -> f64 {
        let numerator = self.alpha * self.beta;
        let denominator = (self.alpha + self.beta).powf(2.0) * (self.alpha + self.beta + 1.0);
        numerator / denominator
    }

    pub fn standard_deviation(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn log_beta(&self) -> f64 {
        ln_beta(self.alpha, self.beta)
    }

    pub fn log_pdf(&self, x: f64) -> f64 {
        if x < 0.0 || x > 1.0 {
            return f64::NEG_INFINITY;
        }
        xlogy(self.alpha - 1.0, x) + xlogy(self.beta - 1.0, 1.0 - x) - self.log_beta()
    }

    pub fn pdf(&self, x: f64) -> f64 {
        if x < 0.0 || x > 1.0 {
            return 0.0;
        }
        self.log_pdf(x).exp()
    }

    pub fn distribution(&self) -> Result<BetaDistribution> {
        BetaDistribution::new(self.alpha, self.beta).map_err(|_| {
            EvaluationError::InvalidPosterior {
                alpha: self.alpha,
                beta: self.beta,
            }
        })
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<f64> {
        Ok(self.distribution()?.sample(rng))
    }

    /// Equal-tailed credible interval holding `level` of the posterior mass
    pub fn credible_interval(&self, level: f64) -> Result<(f64, f64)> {
        if !(level > 0.0 && level < 1.0) {
            return Err(EvaluationError::InvalidConfig(format!(
                "credible level must lie in (0, 1), got {}",
                level
            )));
        }
        let distribution = self.distribution()?;
        let tail = (1.0 - level) / 2.0;
        Ok((
            distribution.inverse_cdf(tail),
            distribution.inverse_cdf(1.0 - tail),
        ))
    }

    /// Evenly spaced (x, density) pairs over [lower, upper]
    pub fn density_grid(&self, lower: f64, upper: f64, points: usize) -> Vec<(f64, f64)> {
        let lower = lower.max(0.0);
        let upper = upper.min(1.0);
        match points {
            0 => vec![],
            1 => vec![(lower, self.pdf(lower))],
            _ => {
                let step = (upper - lower) / (points - 1) as f64;
                (0..points)
                    .map(|i| {
                        let x = lower + step * i as f64;
                        (x, self.pdf(x))
                    })
                    .collect()
            }
        }
    }

    /// Exact P(X > Y) for X ~ self and Y ~ other.
    ///
    /// Needs an integral alpha on the side being summed over. The sum runs
    /// over whichever posterior has the smaller alpha.
    pub fn prob_greater_than(&self, other: &Posterior) -> Result<f64> {
        let probability = if self.alpha <= other.alpha {
            prob_first_exceeds(self, other)?
        } else {
            1.0 - prob_first_exceeds(other, self)?
        };
        Ok(probability.clamp(0.0, 1.0))
    }
}

impl Default for Posterior {
    fn default() -> Self {
        Self::uniform()
    }
}

// a * ln(x), taken as zero when a is zero so the density is finite at the edges
fn xlogy(a: f64, x: f64) -> f64 {
    if a == 0.0 { 0.0 } else { a * x.ln() }
}

// P(X_b > X_a) = sum_{i=0}^{alpha_b - 1} B(alpha_a + i, beta_a + beta_b)
//                / ((beta_b + i) B(1 + i, beta_b) B(alpha_a, beta_a))
fn prob_first_exceeds(b: &Posterior, a: &Posterior) -> Result<f64> {
    if b.alpha.fract() != 0.0 {
        return Err(EvaluationError::InvalidPosterior {
            alpha: b.alpha,
            beta: b.beta,
        });
    }
    let n_terms = b.alpha as u64;
    debug!(
        "Summing {} terms for P(Beta({}, {}) > Beta({}, {}))",
        n_terms, b.alpha, b.beta, a.alpha, a.beta
    );
    let log_beta_a = a.log_beta();
    let total = (0..n_terms)
        .map(|i| {
            let i = i as f64;
            let log_term = ln_beta(a.alpha + i, a.beta + b.beta)
                - (b.beta + i).ln()
                - ln_beta(1.0 + i, b.beta)
                - log_beta_a;
            log_term.exp()
        })
        .sum::<f64>();
    Ok(total)
}
