use chrono::{DateTime, FixedOffset};

/// Signed seconds from `start` to `end`. An `end` before `start` yields a
/// negative value.
pub fn elapsed_seconds(start: &DateTime<FixedOffset>, end: &DateTime<FixedOffset>) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let millis = end.signed_duration_since(*start).num_milliseconds() as f64;
    millis / 1000.0
}

/// Arithmetic mean rounded to one decimal place, or `0.0` when empty.
pub fn average(durations: &[f64]) -> f64 {
    if durations.is_empty() {
        return 0.0;
    }

    #[allow(clippy::cast_precision_loss)]
    let mean = durations.iter().sum::<f64>() / durations.len() as f64;
    round_to_tenth(mean)
}

fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
