use chrono::{DateTime, FixedOffset};

use super::duration::average;
use crate::models::{Conclusion, Outcome};

/// All runs that started in one calendar month of one year.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthBucket {
    pub key: String,
    pub label: String,
    pub durations: Vec<f64>,
    pub success_count: usize,
    pub failure_count: usize,
    pub total_count: usize,
    pub average_duration: f64,
}

impl MonthBucket {
    /// Counts the run's outcome. Returns `false` when the conclusion is not
    /// one the run counters recognize.
    pub fn record_outcome(&mut self, conclusion: &Conclusion) -> bool {
        match conclusion.run_outcome() {
            Some(Outcome::Success) => self.success_count += 1,
            Some(Outcome::Failure) => self.failure_count += 1,
            None => return false,
        }
        self.total_count += 1;
        true
    }

    pub fn record_duration(&mut self, seconds: f64) {
        self.durations.push(seconds);
        self.average_duration = average(&self.durations);
    }
}

/// Canonical bucket key, e.g. `january24`.
pub fn month_key(timestamp: &DateTime<FixedOffset>) -> String {
    timestamp.format("%B%y").to_string().to_lowercase()
}

/// Display label, e.g. `January '24`.
pub fn month_label(timestamp: &DateTime<FixedOffset>) -> String {
    timestamp.format("%B '%y").to_string()
}

pub fn new_bucket(timestamp: &DateTime<FixedOffset>) -> MonthBucket {
    MonthBucket {
        key: month_key(timestamp),
        label: month_label(timestamp),
        durations: Vec::new(),
        success_count: 0,
        failure_count: 0,
        total_count: 0,
        average_duration: 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(raw: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(raw).unwrap()
    }

    #[test]
    fn test_month_key_format() {
        assert_eq!(month_key(&ts("2024-01-15T10:00:00Z")), "january24");
        assert_eq!(month_key(&ts("2023-12-31T23:59:59Z")), "december23");
        assert_eq!(month_key(&ts("2005-09-01T00:00:00Z")), "september05");
    }

    #[test]
    fn test_month_key_distinguishes_years() {
        let jan_24 = month_key(&ts("2024-01-15T10:00:00Z"));
        let jan_25 = month_key(&ts("2025-01-15T10:00:00Z"));

        assert_eq!(jan_24, "january24");
        assert_eq!(jan_25, "january25");
        assert_ne!(jan_24, jan_25);
    }

    #[test]
    fn test_month_key_is_stable() {
        let timestamp = ts("2024-06-03T08:30:00Z");

        assert_eq!(month_key(&timestamp), month_key(&timestamp));
    }

    #[test]
    fn test_month_uses_timestamp_offset_calendar() {
        // January 31st in UTC, but bucketed by its own offset
        let timestamp = ts("2024-02-01T00:30:00+02:00");

        assert_eq!(month_key(&timestamp), "february24");
    }

    #[test]
    fn test_month_label_format() {
        assert_eq!(month_label(&ts("2024-01-15T10:00:00Z")), "January '24");
        assert_eq!(month_label(&ts("2023-11-02T10:00:00Z")), "November '23");
    }

    #[test]
    fn test_new_bucket_is_empty() {
        let bucket = new_bucket(&ts("2024-03-10T10:00:00Z"));

        assert_eq!(bucket.key, "march24");
        assert_eq!(bucket.label, "March '24");
        assert!(bucket.durations.is_empty());
        assert_eq!(bucket.success_count, 0);
        assert_eq!(bucket.failure_count, 0);
        assert_eq!(bucket.total_count, 0);
        assert_eq!(bucket.average_duration, 0.0);
    }

    #[test]
    fn test_record_outcome_counts_cancelled_as_failure() {
        let mut bucket = new_bucket(&ts("2024-03-10T10:00:00Z"));

        assert!(bucket.record_outcome(&Conclusion::Success));
        assert!(bucket.record_outcome(&Conclusion::Failure));
        assert!(bucket.record_outcome(&Conclusion::Cancelled));

        assert_eq!(bucket.success_count, 1);
        assert_eq!(bucket.failure_count, 2);
        assert_eq!(bucket.total_count, 3);
    }

    #[test]
    fn test_record_outcome_ignores_unknown_conclusions() {
        let mut bucket = new_bucket(&ts("2024-03-10T10:00:00Z"));

        assert!(!bucket.record_outcome(&Conclusion::from("skipped")));
        assert!(!bucket.record_outcome(&Conclusion::Missing));

        assert_eq!(bucket.total_count, 0);
        assert_eq!(bucket.success_count + bucket.failure_count, 0);
    }

    #[test]
    fn test_record_duration_keeps_average_in_sync() {
        let mut bucket = new_bucket(&ts("2024-03-10T10:00:00Z"));

        bucket.record_duration(100.0);
        assert_eq!(bucket.average_duration, 100.0);

        bucket.record_duration(200.0);
        assert_eq!(bucket.average_duration, 150.0);
        assert_eq!(bucket.durations, vec![100.0, 200.0]);
    }
}
