use crate::arm::Arm;
use crate::error::EvaluationError;
use crate::metric::Metric;
use crate::observation::ArmObservation;
use ahash::AHashMap as HashMap;
use anyhow::{anyhow, bail, Result};
use csv::{ReaderBuilder, Trim};
use log::{debug, info};
use serde::{Deserialize, Deserializer, Serialize};
use std::fs::File;
use std::io::Read as IoRead;
use std::path::Path;

/// One exposed user in the experiment. Extra columns in the input are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct UserRecord {
    pub group: Arm,
    #[serde(deserialize_with = "deserialize_flag")]
    pub clicked: bool,
    #[serde(deserialize_with = "deserialize_flag")]
    pub converted: bool,
}

impl UserRecord {
    pub fn is_success(&self, metric: Metric) -> bool {
        match metric {
            Metric::Ctr => self.clicked,
            Metric::Cvr => self.converted,
        }
    }
}

pub fn parse_flag(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "1.0" | "true" | "t" | "yes" | "y" => Ok(true),
        "0" | "0.0" | "false" | "f" | "no" | "n" => Ok(false),
        _ => bail!("Invalid flag value: {}", raw),
    }
}

fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_flag(&raw).map_err(serde::de::Error::custom)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ArmCounts {
    pub impressions: u64,
    pub clicks: u64,
    pub conversions: u64,
}

impl ArmCounts {
    pub fn new(impressions: u64, clicks: u64, conversions: u64) -> Self {
        Self {
            impressions,
            clicks,
            conversions,
        }
    }

    pub fn successes(&self, metric: Metric) -> u64 {
        match metric {
            Metric::Ctr => self.clicks,
            Metric::Cvr => self.conversions,
        }
    }

    pub fn observation(&self, metric: Metric) -> Result<ArmObservation, EvaluationError> {
        ArmObservation::new(self.impressions, self.successes(metric))
    }
}

/// Per-arm impression, click and conversion totals
#[derive(Debug, Clone, Default)]
pub struct ExperimentCounts {
    counts: HashMap<Arm, ArmCounts>,
}

impl ExperimentCounts {
    pub fn new() -> Self {
        Self {
            counts: HashMap::new(),
        }
    }

    pub fn from_arm_counts(control: ArmCounts, variant: ArmCounts) -> Self {
        let mut counts = HashMap::new();
        counts.insert(Arm::Control, control);
        counts.insert(Arm::Variant, variant);
        Self { counts }
    }

    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a UserRecord>,
    {
        let mut counts = Self::new();
        for record in records {
            counts.push(record);
        }
        counts
    }

    pub fn push(&mut self, record: &UserRecord) {
        let entry = self.counts.entry(record.group).or_default();
        entry.impressions += 1;
        entry.clicks += record.clicked as u64;
        entry.conversions += record.converted as u64;
    }

    pub fn arm(&self, arm: Arm) -> ArmCounts {
        self.counts.get(&arm).copied().unwrap_or_default()
    }

    pub fn total_impressions(&self) -> u64 {
        self.counts.values().map(|c| c.impressions).sum()
    }

    /// Control and variant observations for `metric`
    pub fn observations(
        &self,
        metric: Metric,
    ) -> Result<(ArmObservation, ArmObservation), EvaluationError> {
        let control = self.arm(Arm::Control).observation(metric)?;
        let variant = self.arm(Arm::Variant).observation(metric)?;
        Ok((control, variant))
    }
}

/// Parse comma-separated user records with a header row
pub fn read_user_records<R: IoRead>(inner: R) -> Result<Vec<UserRecord>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(inner);
    let mut records = Vec::new();
    for (i, result) in reader.deserialize::<UserRecord>().enumerate() {
        let record = result.map_err(|e| anyhow!("Could not parse record {}: {}", i + 1, e))?;
        records.push(record);
    }
    debug!("Parsed {} user records", records.len());
    Ok(records)
}

pub fn load_experiment_counts(path: &Path) -> Result<ExperimentCounts> {
    let file = File::open(path)
        .map_err(|e| anyhow!("Could not open records file: {} ({})", path.display(), e))?;
    let records = read_user_records(file)?;
    let counts = ExperimentCounts::from_records(records.iter());
    info!(
        "Loaded {} records ({} control, {} variant)",
        counts.total_impressions(),
        counts.arm(Arm::Control).impressions,
        counts.arm(Arm::Variant).impressions
    );
    Ok(counts)
}
