use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvaluationError {
    #[error("Invalid observation (trials={trials}, successes={successes}): {reason}")]
    InvalidObservation {
        trials: u64,
        successes: u64,
        reason: &'static str,
    },

    /// Relative uplift requested while the control rate is zero
    #[error("Relative uplift is undefined when the control rate is zero")]
    DivisionByZero,

    #[error("Invalid Beta parameters: α = {alpha}, β = {beta}")]
    InvalidPosterior { alpha: f64, beta: f64 },

    #[error("Invalid evaluator configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T, E = EvaluationError> = std::result::Result<T, E>;
