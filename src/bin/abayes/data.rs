use abayes_utils::decision::Recommendation;
use abayes_utils::evaluator::ComparisonResult;
use abayes_utils::metric::Metric;
use abayes_utils::observation::ArmObservation;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct MetricSummary {
    pub metric: Metric,
    pub control: ArmObservation,
    pub variant: ArmObservation,
    pub comparison: ComparisonResult,
    pub recommendation: Recommendation,
    pub credible_interval_control: (f64, f64),
    pub credible_interval_variant: (f64, f64),
}

impl MetricSummary {
    pub fn new(
        metric: Metric,
        control: ArmObservation,
        variant: ArmObservation,
        comparison: ComparisonResult,
        recommendation: Recommendation,
        credible_interval_control: (f64, f64),
        credible_interval_variant: (f64, f64),
    ) -> Self {
        Self {
            metric,
            control,
            variant,
            comparison,
            recommendation,
            credible_interval_control,
            credible_interval_variant,
        }
    }

    /// Relative uplift formatted for display, `NA` when undefined
    pub fn relative_uplift_string(&self) -> String {
        match self.comparison.relative_uplift() {
            Ok(uplift) => format!("{:.6}", uplift),
            Err(_) => "NA".to_string(),
        }
    }
}
