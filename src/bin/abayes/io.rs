use std::fs::File;
use std::path::Path;
use anyhow::{anyhow, Result};
use csv::{WriterBuilder, Writer};
use log::debug;

use crate::data::MetricSummary;

pub struct SummaryWriter {
    file: File,
    writer: Writer<File>,
}

impl SummaryWriter {
    pub fn new(path: &Path) -> Result<Self> {
        let file = File::create(path)
            .map_err(|e| anyhow!("Could not create summary file: {} ({})", path.display(), e))?;
        let writer = WriterBuilder::new()
            .delimiter(b'\t')
            .has_headers(true)
            .from_writer(file.try_clone()?);
        Ok(Self { file, writer })
    }

    pub fn write_header(&mut self) -> Result<()> {
        self.writer.write_record(&[
            "metric",
            "control_trials",
            "control_successes",
            "variant_trials",
            "variant_successes",
            "rate_control",
            "rate_variant",
            "absolute_uplift",
            "relative_uplift",
            "win_probability",
            "ci_control_low",
            "ci_control_high",
            "ci_variant_low",
            "ci_variant_high",
            "method",
            "recommendation",
        ])?;
        self.writer.flush()?;
        Ok(())
    }

    pub fn write_record(&mut self, summary: &MetricSummary) -> Result<()> {
        let comparison = &summary.comparison;
        self.writer.write_record(&[
            summary.metric.to_string().to_string(),
            summary.control.trials().to_string(),
            summary.control.successes().to_string(),
            summary.variant.trials().to_string(),
            summary.variant.successes().to_string(),
            format!("{:.6}", comparison.rate_control),
            format!("{:.6}", comparison.rate_variant),
            format!("{:.6}", comparison.absolute_uplift),
            summary.relative_uplift_string(),
            format!("{:.6}", comparison.win_probability),
            format!("{:.6}", summary.credible_interval_control.0),
            format!("{:.6}", summary.credible_interval_control.1),
            format!("{:.6}", summary.credible_interval_variant.0),
            format!("{:.6}", summary.credible_interval_variant.1),
            comparison.method.to_string(),
            summary.recommendation.to_string().to_string(),
        ])?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        self.file.sync_all()?;
        Ok(())
    }

    pub fn write_records_iter<'a, I>(&mut self, summaries: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a MetricSummary>,
    {
        for summary in summaries {
            self.write_record(summary)?;
        }
        self.flush()?;
        Ok(())
    }
}

/// Density of both posteriors evaluated on a shared grid
pub struct PosteriorGridWriter {
    file: File,
    writer: Writer<File>,
}

impl PosteriorGridWriter {
    pub fn new(path: &Path) -> Result<Self> {
        let file = File::create(path)
            .map_err(|e| anyhow!("Could not create grid file: {} ({})", path.display(), e))?;
        let writer = WriterBuilder::new()
            .delimiter(b'\t')
            .has_headers(true)
            .from_writer(file.try_clone()?);
        Ok(Self { file, writer })
    }

    pub fn write_header(&mut self) -> Result<()> {
        self.writer.write_record(&["x", "pdf_control", "pdf_variant"])?;
        Ok(())
    }

    pub fn write_grid(&mut self, control: &[(f64, f64)], variant: &[(f64, f64)]) -> Result<()> {
        if control.len() != variant.len() {
            return Err(anyhow!(
                "Posterior grids differ in length: {} vs {}",
                control.len(),
                variant.len()
            ));
        }
        for (&(x, pdf_control), &(_, pdf_variant)) in control.iter().zip(variant.iter()) {
            self.writer.write_record(&[
                format!("{:.8}", x),
                format!("{:.6}", pdf_control),
                format!("{:.6}", pdf_variant),
            ])?;
        }
        debug!("Wrote {} grid points", control.len());
        self.writer.flush()?;
        self.file.sync_all()?;
        Ok(())
    }
}

pub fn write_json(path: &Path, summaries: &[MetricSummary]) -> Result<()> {
    let file = File::create(path)
        .map_err(|e| anyhow!("Could not create JSON file: {} ({})", path.display(), e))?;
    serde_json::to_writer_pretty(file, summaries)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use abayes_utils::decision::Recommendation;
    use abayes_utils::evaluator::{evaluate, EvaluatorConfig};
    use abayes_utils::metric::Metric;
    use abayes_utils::observation::ArmObservation;
    use tempfile::tempdir;

    fn summary(control_successes: u64) -> MetricSummary {
        let control = ArmObservation::new(1000, control_successes).unwrap();
        let variant = ArmObservation::new(1000, 40).unwrap();
        let comparison = evaluate(&control, &variant, &EvaluatorConfig::default()).unwrap();
        let recommendation = Recommendation::from_comparison(&comparison, 0.95).unwrap();
        MetricSummary::new(
            Metric::Ctr,
            control,
            variant,
            comparison,
            recommendation,
            (0.01, 0.03),
            (0.03, 0.05),
        )
    }

    #[test]
    fn test_summary_writer() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ab_summary.tsv");
        let mut writer = SummaryWriter::new(&path).unwrap();
        writer.write_header().unwrap();
        writer.write_records_iter(vec![summary(20), summary(0)].iter()).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("metric\tcontrol_trials"));
        let fields: Vec<&str> = lines[1].split('\t').collect();
        assert_eq!(fields.len(), 16);
        assert_eq!(fields[0], "ctr");
        assert_eq!(fields[5], "0.020000");
        assert_eq!(fields[8], "1.000000");
        assert_eq!(fields[14], "analytic");
        assert_eq!(fields[15], "roll_out_variant");
        let fields: Vec<&str> = lines[2].split('\t').collect();
        assert_eq!(fields[8], "NA");
    }

    #[test]
    fn test_grid_writer() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("grid.tsv");
        let mut writer = PosteriorGridWriter::new(&path).unwrap();
        writer.write_header().unwrap();
        writer
            .write_grid(&[(0.0, 1.0), (1.0, 1.0)], &[(0.0, 0.0), (1.0, 2.0)])
            .unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "x\tpdf_control\tpdf_variant");
        assert_eq!(lines[2], "1.00000000\t1.000000\t2.000000");
        assert!(writer.write_grid(&[(0.0, 1.0)], &[]).is_err());
    }

    #[test]
    fn test_write_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ab_summary.json");
        write_json(&path, &[summary(20)]).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value[0]["metric"], "Ctr");
        assert_eq!(value[0]["recommendation"], "RollOutVariant");
        assert_eq!(value[0]["control"]["trials"], 1000);
        assert!(value[0]["comparison"]["relative_uplift"].as_f64().is_some());
    }
}
