use anyhow::{bail, Result};
use serde::Serialize;
use std::{fmt, str::FromStr};
use strum_macros::EnumIter;

/// Rate metrics tracked per experiment arm. Both use impressions as trials.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Copy, Serialize, EnumIter)]
pub enum Metric {
    /// Click-through rate, clicks / impressions
    Ctr,
    /// Conversion rate, conversions / impressions
    Cvr,
}

impl Metric {
    pub fn to_string(&self) -> &'static str {
        match self {
            Metric::Ctr => "ctr",
            Metric::Cvr => "cvr",
        }
    }

    /// Name of the record flag counted as a success
    pub fn success_field(&self) -> &'static str {
        match self {
            Metric::Ctr => "clicked",
            Metric::Cvr => "converted",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Metric::Ctr => write!(f, "CTR"),
            Metric::Cvr => write!(f, "CVR"),
        }
    }
}

impl FromStr for Metric {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ctr" | "clicked" => Ok(Metric::Ctr),
            "cvr" | "converted" => Ok(Metric::Cvr),
            _ => bail!("Invalid metric: {}", s),
        }
    }
}
