use indexmap::IndexMap;

use crate::models::{Conclusion, Run};

#[derive(Debug, Clone, PartialEq)]
pub struct StepStats {
    pub name: String,
    pub success_count: usize,
    pub failure_count: usize,
    pub total_count: usize,
}

impl StepStats {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            success_count: 0,
            failure_count: 0,
            total_count: 0,
        }
    }

    /// Anything other than `success` counts as a failure for steps.
    fn record(&mut self, conclusion: &Conclusion) {
        self.total_count += 1;
        if conclusion.is_success() {
            self.success_count += 1;
        } else {
            self.failure_count += 1;
        }
    }

    pub fn failure_ratio(&self) -> f64 {
        ratio(self.failure_count, self.total_count)
    }

    pub fn success_ratio(&self) -> f64 {
        ratio(self.success_count, self.total_count)
    }
}

#[allow(clippy::cast_precision_loss)]
fn ratio(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    count as f64 / total as f64
}

/// Per-step-name outcome counters across every run, keyed by exact name in
/// first-seen order. Run order does not affect the counts.
pub fn aggregate_steps(runs: &[Run]) -> IndexMap<String, StepStats> {
    runs.iter()
        .flat_map(|run| run.steps.iter())
        .fold(IndexMap::new(), |mut stats, step| {
            stats
                .entry(step.name.clone())
                .or_insert_with(|| StepStats::new(&step.name))
                .record(&step.conclusion);
            stats
        })
}
