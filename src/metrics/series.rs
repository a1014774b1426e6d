use chrono::{DateTime, Datelike, FixedOffset, Timelike};
use indexmap::IndexMap;

use super::run_aggregator::RunAggregate;
use super::step_aggregator::StepStats;
use crate::insights::{ChartSeries, MonthlySeries, RunSeries, StepSeries};

/// Flattens aggregator output into parallel series. Inputs are only read.
pub fn project(runs: &RunAggregate, steps: &IndexMap<String, StepStats>) -> ChartSeries {
    ChartSeries {
        monthly: project_monthly(runs),
        lifetime_totals: lifetime_totals(runs),
        runs: project_runs(runs),
        steps: project_steps(steps),
    }
}

fn project_monthly(runs: &RunAggregate) -> MonthlySeries {
    let lifetime_average = runs.lifetime.lifetime_average;

    runs.buckets
        .iter()
        .fold(MonthlySeries::default(), |mut series, bucket| {
            series.labels.push(bucket.label.clone());
            series.success.push(bucket.success_count);
            series.failure.push(bucket.failure_count);
            series.average_duration.push(bucket.average_duration);
            series
                .deviation_from_lifetime
                .push(bucket.average_duration - lifetime_average);
            series.lifetime_average.push(lifetime_average);
            series
        })
}

fn lifetime_totals(runs: &RunAggregate) -> [usize; 2] {
    runs.buckets.iter().fold([0, 0], |[failures, successes], bucket| {
        [
            failures + bucket.failure_count,
            successes + bucket.success_count,
        ]
    })
}

fn project_runs(runs: &RunAggregate) -> RunSeries {
    RunSeries {
        labels: runs
            .run_durations
            .iter()
            .map(|run| run_label(&run.started_at))
            .collect(),
        durations: runs.run_durations.iter().map(|run| run.seconds).collect(),
    }
}

fn project_steps(steps: &IndexMap<String, StepStats>) -> StepSeries {
    steps
        .values()
        .fold(StepSeries::default(), |mut series, stats| {
            series.labels.push(stats.name.clone());
            series.failure_ratio.push(stats.failure_ratio());
            series.success_ratio.push(stats.success_ratio());
            series
        })
}

/// `M/D HH:MM` of the run's first step start, e.g. `4/18 19:23`.
fn run_label(timestamp: &DateTime<FixedOffset>) -> String {
    format!(
        "{}/{} {:02}:{:02}",
        timestamp.month(),
        timestamp.day(),
        timestamp.hour(),
        timestamp.minute()
    )
}
