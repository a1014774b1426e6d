use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Serialize, Deserialize)]
pub struct RunInsights {
    pub provider: String,
    pub repository: String,
    pub collected_at: DateTime<Utc>,
    pub total_runs: usize,
    pub skipped_records: usize,
    pub lifetime_average_seconds: f64,
    pub series: ChartSeries,
    pub warnings: Vec<AggregationWarning>,
}

/// Flat, axis-aligned series ready for a charting layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub monthly: MonthlySeries,
    /// `[total_failures, total_successes]` across all month buckets.
    pub lifetime_totals: [usize; 2],
    pub runs: RunSeries,
    pub steps: StepSeries,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonthlySeries {
    pub labels: Vec<String>,
    pub success: Vec<usize>,
    pub failure: Vec<usize>,
    pub average_duration: Vec<f64>,
    pub deviation_from_lifetime: Vec<f64>,
    pub lifetime_average: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSeries {
    pub labels: Vec<String>,
    pub durations: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepSeries {
    pub labels: Vec<String>,
    pub failure_ratio: Vec<f64>,
    pub success_ratio: Vec<f64>,
}

/// Non-fatal problem found in a single run record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationWarning {
    /// Position of the run in the sorted input.
    pub run_index: usize,
    pub run_id: Option<u64>,
    #[serde(flatten)]
    pub kind: WarningKind,
}

#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WarningKind {
    /// The run has no steps, so no duration can be derived.
    #[error("run has no steps")]
    MissingSteps,
    #[error("invalid {field} timestamp: {value:?}")]
    InvalidTimestamp {
        field: String,
        value: Option<String>,
    },
    #[error("unrecognized conclusion: {value:?}")]
    UnrecognizedConclusion {
        value: Option<String>,
    },
}

impl WarningKind {
    /// Whether the warning caused part of the run's data to be dropped.
    pub fn skips_data(&self) -> bool {
        matches!(self, Self::MissingSteps | Self::InvalidTimestamp { .. })
    }
}
