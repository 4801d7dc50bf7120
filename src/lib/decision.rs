use crate::error::{EvaluationError, Result};
use crate::evaluator::ComparisonResult;
use serde::Serialize;
use std::fmt;

pub const DEFAULT_THRESHOLD: f64 = 0.95;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Recommendation {
    RollOutVariant,
    KeepControl,
    Inconclusive,
}

impl Recommendation {
    /// Roll out when P(variant > control) reaches `threshold`, keep the
    /// control when it falls to `1 - threshold`.
    pub fn from_win_probability(win_probability: f64, threshold: f64) -> Result<Self> {
        if !(threshold > 0.5 && threshold < 1.0) {
            return Err(EvaluationError::InvalidConfig(format!(
                "decision threshold must lie in (0.5, 1), got {}",
                threshold
            )));
        }
        if win_probability >= threshold {
            Ok(Recommendation::RollOutVariant)
        } else if win_probability <= 1.0 - threshold {
            Ok(Recommendation::KeepControl)
        } else {
            Ok(Recommendation::Inconclusive)
        }
    }

    pub fn from_comparison(result: &ComparisonResult, threshold: f64) -> Result<Self> {
        Self::from_win_probability(result.win_probability, threshold)
    }

    pub fn to_string(&self) -> &'static str {
        match self {
            Recommendation::RollOutVariant => "roll_out_variant",
            Recommendation::KeepControl => "keep_control",
            Recommendation::Inconclusive => "inconclusive",
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Recommendation::RollOutVariant => write!(f, "Roll out Variant B to 100% of traffic"),
            Recommendation::KeepControl => write!(f, "Keep Control A"),
            Recommendation::Inconclusive => write!(f, "Inconclusive, keep collecting data"),
        }
    }
}
