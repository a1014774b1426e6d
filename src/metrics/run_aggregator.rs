use chrono::{DateTime, FixedOffset, Local, TimeZone};
use indexmap::IndexMap;
use log::debug;

use super::duration::{average, elapsed_seconds};
use super::month::{month_key, new_bucket, MonthBucket};
use crate::insights::{AggregationWarning, WarningKind};
use crate::models::{parse_timestamp, Run};

#[derive(Debug, Clone, PartialEq)]
pub struct LifetimeStats {
    pub all_durations: Vec<f64>,
    pub lifetime_average: f64,
}

impl LifetimeStats {
    fn from_durations(all_durations: Vec<f64>) -> Self {
        let lifetime_average = average(&all_durations);
        Self {
            all_durations,
            lifetime_average,
        }
    }
}

/// Duration of one run, kept in processing order for the per-run series.
#[derive(Debug, Clone, PartialEq)]
pub struct RunDuration {
    /// First step's start, in the calendar timezone.
    pub started_at: DateTime<FixedOffset>,
    pub seconds: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunAggregate {
    /// Buckets in first-seen order.
    pub buckets: Vec<MonthBucket>,
    pub lifetime: LifetimeStats,
    pub run_durations: Vec<RunDuration>,
    pub warnings: Vec<AggregationWarning>,
}

/// Groups runs into month buckets of the host's local calendar.
pub fn aggregate_runs(runs: &[Run]) -> RunAggregate {
    aggregate_runs_in(runs, &Local)
}

/// Groups runs into month buckets and accumulates lifetime durations.
/// Month keys and run labels use the calendar of `tz`.
///
/// Buckets are emitted in the order their month is first seen, so callers
/// wanting calendar order must sort `runs` by creation time beforehand.
///
/// A run whose own `started_at` is missing or unparseable has no month, so
/// it is left out of every counter here. A run without steps is still
/// counted; it only lacks a duration.
pub fn aggregate_runs_in<Tz: TimeZone>(runs: &[Run], tz: &Tz) -> RunAggregate {
    let mut buckets: IndexMap<String, MonthBucket> = IndexMap::new();
    let mut all_durations = Vec::with_capacity(runs.len());
    let mut run_durations = Vec::with_capacity(runs.len());
    let mut warnings = Vec::new();

    for (run_index, run) in runs.iter().enumerate() {
        let warning_for = |kind| AggregationWarning {
            run_index,
            run_id: run.id,
            kind,
        };

        let Some(started_at) = run.started_at().map(|ts| in_calendar(&ts, tz)) else {
            warnings.push(warning_for(WarningKind::InvalidTimestamp {
                field: "started_at".to_string(),
                value: run.started_at.clone(),
            }));
            continue;
        };

        let bucket = buckets
            .entry(month_key(&started_at))
            .or_insert_with(|| new_bucket(&started_at));

        if !bucket.record_outcome(&run.conclusion) {
            warnings.push(warning_for(WarningKind::UnrecognizedConclusion {
                value: run.conclusion.as_str().map(str::to_string),
            }));
        }

        match run_elapsed_seconds(run) {
            Ok((first_step_start, seconds)) => {
                if seconds < 0.0 {
                    debug!(
                        "Run {run_index} in {} finished before it started ({seconds}s)",
                        bucket.key
                    );
                }
                bucket.record_duration(seconds);
                all_durations.push(seconds);
                run_durations.push(RunDuration {
                    started_at: in_calendar(&first_step_start, tz),
                    seconds,
                });
            }
            Err(kind) => warnings.push(warning_for(kind)),
        }
    }

    RunAggregate {
        buckets: buckets.into_values().collect(),
        lifetime: LifetimeStats::from_durations(all_durations),
        run_durations,
        warnings,
    }
}

fn in_calendar<Tz: TimeZone>(
    timestamp: &DateTime<FixedOffset>,
    tz: &Tz,
) -> DateTime<FixedOffset> {
    timestamp.with_timezone(tz).fixed_offset()
}

/// The first step's start and the wall-clock seconds from it to the last
/// step's completion. Intermediate steps are not consulted.
fn run_elapsed_seconds(
    run: &Run,
) -> Result<(DateTime<FixedOffset>, f64), WarningKind> {
    let (Some(first), Some(last)) = (run.steps.first(), run.steps.last()) else {
        return Err(WarningKind::MissingSteps);
    };

    let start = parse_timestamp(first.started_at.as_deref()).ok_or_else(|| {
        WarningKind::InvalidTimestamp {
            field: "steps[0].started_at".to_string(),
            value: first.started_at.clone(),
        }
    })?;

    let end = parse_timestamp(last.completed_at.as_deref()).ok_or_else(|| {
        WarningKind::InvalidTimestamp {
            field: format!("steps[{}].completed_at", run.steps.len() - 1),
            value: last.completed_at.clone(),
        }
    })?;

    let seconds = elapsed_seconds(&start, &end);
    Ok((start, seconds))
}
