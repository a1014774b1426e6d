pub mod duration;
pub mod month;
pub mod run_aggregator;
pub mod series;
pub mod step_aggregator;

use indexmap::IndexMap;
use log::warn;

use crate::insights::{AggregationWarning, ChartSeries};
use crate::models::Run;
use month::MonthBucket;
use run_aggregator::{aggregate_runs, LifetimeStats};
use step_aggregator::{aggregate_steps, StepStats};

/// Result of a single aggregation pass. Every pass owns fresh accumulators.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub total_runs: usize,
    pub buckets: Vec<MonthBucket>,
    pub lifetime: LifetimeStats,
    pub steps: IndexMap<String, StepStats>,
    pub series: ChartSeries,
    pub warnings: Vec<AggregationWarning>,
}

impl Analysis {
    /// Runs that lost some of their data to a malformed record.
    pub fn skipped_records(&self) -> usize {
        self.warnings.iter().filter(|w| w.kind.skips_data()).count()
    }
}

pub fn analyze(mut runs: Vec<Run>) -> Analysis {
    sort_by_creation(&mut runs);

    let run_aggregate = aggregate_runs(&runs);
    let steps = aggregate_steps(&runs);
    let series = series::project(&run_aggregate, &steps);

    for warning in &run_aggregate.warnings {
        warn!(
            "Run #{} (id: {:?}): {}",
            warning.run_index, warning.run_id, warning.kind
        );
    }

    Analysis {
        total_runs: runs.len(),
        buckets: run_aggregate.buckets,
        lifetime: run_aggregate.lifetime,
        steps,
        series,
        warnings: run_aggregate.warnings,
    }
}

/// Stable sort by `created_at` ascending; undated runs go last.
fn sort_by_creation(runs: &mut [Run]) {
    runs.sort_by_cached_key(|run| {
        let created_at = run.created_at();
        (created_at.is_none(), created_at)
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Conclusion, Step};

    fn run(id: u64, created_at: &str, conclusion: &str, seconds: i64) -> Run {
        let start = chrono::DateTime::parse_from_rfc3339(created_at).unwrap();
        let end = start + chrono::Duration::seconds(seconds);
        Run {
            id: Some(id),
            started_at: Some(created_at.to_string()),
            created_at: Some(created_at.to_string()),
            conclusion: Conclusion::from(conclusion),
            steps: vec![Step {
                name: "build".to_string(),
                conclusion: Conclusion::from(conclusion),
                started_at: Some(start.to_rfc3339()),
                completed_at: Some(end.to_rfc3339()),
            }],
        }
    }

    #[test]
    fn test_analyze_sorts_by_creation_time() {
        let runs = vec![
            run(2, "2024-02-05T10:00:00Z", "success", 150),
            run(1, "2024-01-05T10:00:00Z", "failure", 50),
        ];

        let analysis = analyze(runs);

        assert_eq!(analysis.series.monthly.labels, vec!["January '24", "February '24"]);
        assert_eq!(analysis.series.runs.durations, vec![50.0, 150.0]);
        assert_eq!(analysis.lifetime.lifetime_average, 100.0);
        assert_eq!(analysis.series.lifetime_totals, [1, 1]);
    }

    #[test]
    fn test_undated_runs_sort_last_in_input_order() {
        let mut undated_a = run(10, "2024-03-01T00:00:00Z", "success", 1);
        undated_a.created_at = None;
        let mut undated_b = run(11, "2024-03-02T00:00:00Z", "success", 2);
        undated_b.created_at = Some("soon".to_string());
        let mut runs = vec![
            undated_a,
            run(1, "2024-01-05T10:00:00Z", "success", 3),
            undated_b,
        ];

        sort_by_creation(&mut runs);

        let ids: Vec<_> = runs.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![Some(1), Some(10), Some(11)]);
    }

    #[test]
    fn test_analyze_is_idempotent() {
        let runs = vec![
            run(1, "2024-01-05T10:00:00Z", "success", 100),
            run(2, "2024-01-07T10:00:00Z", "cancelled", 35),
            run(3, "2024-03-01T10:00:00Z", "failure", 12),
        ];

        let first = serde_json::to_string(&analyze(runs.clone()).series).unwrap();
        let second = serde_json::to_string(&analyze(runs).series).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_analyze_empty_input() {
        let analysis = analyze(Vec::new());

        assert_eq!(analysis.total_runs, 0);
        assert!(analysis.buckets.is_empty());
        assert!(analysis.steps.is_empty());
        assert_eq!(analysis.lifetime.lifetime_average, 0.0);
        assert_eq!(analysis.series, ChartSeries::default());
        assert_eq!(analysis.skipped_records(), 0);
    }

    #[test]
    fn test_skipped_records_counts_only_data_loss() {
        let mut stepless = run(1, "2024-01-05T10:00:00Z", "success", 0);
        stepless.steps.clear();
        let unknown = run(2, "2024-01-06T10:00:00Z", "neutral", 10);

        let analysis = analyze(vec![stepless, unknown]);

        assert_eq!(analysis.warnings.len(), 2);
        assert_eq!(analysis.skipped_records(), 1);
        assert_eq!(analysis.buckets[0].success_count, 1);
    }
}
