use crate::error::{EvaluationError, Result};
use serde::Serialize;

/// Aggregated trial/success counts for one experiment arm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ArmObservation {
    trials: u64,
    successes: u64,
}

impl ArmObservation {
    pub fn new(trials: u64, successes: u64) -> Result<Self> {
        let observation = Self { trials, successes };
        observation.validate()?;
        Ok(observation)
    }

    pub fn validate(&self) -> Result<()> {
        if self.trials == 0 {
            return Err(EvaluationError::InvalidObservation {
                trials: self.trials,
                successes: self.successes,
                reason: "trials must be greater than zero",
            });
        }
        if self.successes > self.trials {
            return Err(EvaluationError::InvalidObservation {
                trials: self.trials,
                successes: self.successes,
                reason: "successes cannot exceed trials",
            });
        }
        Ok(())
    }

    pub fn trials(&self) -> u64 {
        self.trials
    }

    pub fn successes(&self) -> u64 {
        self.successes
    }

    pub fn failures(&self) -> u64 {
        self.trials - self.successes
    }

    /// Observed success rate, always in [0, 1]
    pub fn rate(&self) -> f64 {
        self.successes as f64 / self.trials as f64
    }
}
