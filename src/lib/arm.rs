use anyhow::{bail, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::{fmt, str::FromStr};
use strum_macros::EnumIter;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Copy, Serialize, EnumIter)]
pub enum Arm {
    Control,
    Variant,
}

impl Arm {
    /// Group label used in the experiment records
    pub fn to_group_label(&self) -> &'static str {
        match self {
            Arm::Control => "A",
            Arm::Variant => "B",
        }
    }

    pub fn to_string(&self) -> &'static str {
        match self {
            Arm::Control => "control",
            Arm::Variant => "variant",
        }
    }
}

impl fmt::Display for Arm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Arm::Control => write!(f, "Control (A)"),
            Arm::Variant => write!(f, "Variant (B)"),
        }
    }
}

impl FromStr for Arm {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "a" | "control" => Ok(Arm::Control),
            "b" | "variant" => Ok(Arm::Variant),
            _ => bail!("Invalid group label: {}", s),
        }
    }
}

impl<'de> Deserialize<'de> for Arm {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let label = String::deserialize(deserializer)?;
        label.parse::<Arm>().map_err(serde::de::Error::custom)
    }
}
