use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// A single CI workflow run as delivered by a run source.
///
/// Timestamps are kept as raw strings so a bad value only affects the run
/// that carries it; the aggregators parse them with [`parse_timestamp`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub conclusion: Conclusion,
    pub steps: Vec<Step>,
}

/// One unit of work inside a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub conclusion: Conclusion,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
}

/// Terminal status of a run or step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "Option<String>")]
pub enum Conclusion {
    Success,
    Failure,
    Cancelled,
    Other(String),
    #[default]
    Missing,
}

/// Success/failure classification used by the run counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

impl Conclusion {
    /// Three-way run classification: `cancelled` counts as a failure and
    /// anything unrecognized is left out of the counters.
    pub fn run_outcome(&self) -> Option<Outcome> {
        match self {
            Self::Success => Some(Outcome::Success),
            Self::Failure | Self::Cancelled => Some(Outcome::Failure),
            Self::Other(_) | Self::Missing => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Success => Some("success"),
            Self::Failure => Some("failure"),
            Self::Cancelled => Some("cancelled"),
            Self::Other(value) => Some(value.as_str()),
            Self::Missing => None,
        }
    }
}

impl From<&str> for Conclusion {
    fn from(value: &str) -> Self {
        match value {
            "success" => Self::Success,
            "failure" => Self::Failure,
            "cancelled" => Self::Cancelled,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<Option<String>> for Conclusion {
    fn from(value: Option<String>) -> Self {
        value.as_deref().map_or(Self::Missing, Self::from)
    }
}

impl From<Conclusion> for Option<String> {
    fn from(value: Conclusion) -> Self {
        value.as_str().map(str::to_string)
    }
}

pub fn parse_timestamp(value: Option<&str>) -> Option<DateTime<FixedOffset>> {
    value.and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
}

impl Run {
    pub fn started_at(&self) -> Option<DateTime<FixedOffset>> {
        parse_timestamp(self.started_at.as_deref())
    }

    pub fn created_at(&self) -> Option<DateTime<FixedOffset>> {
        parse_timestamp(self.created_at.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_github_style_run() {
        let json = r#"{
            "id": 42,
            "started_at": "2024-01-15T10:00:00Z",
            "created_at": "2024-01-15T09:59:58Z",
            "conclusion": "success",
            "head_branch": "main",
            "steps": [
                {
                    "name": "Set up job",
                    "number": 1,
                    "conclusion": "success",
                    "started_at": "2024-01-15T10:00:01Z",
                    "completed_at": "2024-01-15T10:00:03Z"
                }
            ]
        }"#;

        let run: Run = serde_json::from_str(json).unwrap();

        assert_eq!(run.id, Some(42));
        assert_eq!(run.conclusion, Conclusion::Success);
        assert_eq!(run.steps.len(), 1);
        assert_eq!(run.steps[0].name, "Set up job");
        assert!(run.started_at().is_some());
    }

    #[test]
    fn test_null_and_absent_conclusion_are_missing() {
        let null: Run = serde_json::from_str(r#"{"conclusion": null, "steps": []}"#).unwrap();
        let absent: Run = serde_json::from_str(r#"{"steps": []}"#).unwrap();

        assert_eq!(null.conclusion, Conclusion::Missing);
        assert_eq!(absent.conclusion, Conclusion::Missing);
    }

    #[test]
    fn test_run_requires_steps_field() {
        let result = serde_json::from_str::<Run>(r#"{"conclusion": "success"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_conclusion_is_preserved() {
        let conclusion = Conclusion::from("timed_out");

        assert_eq!(conclusion, Conclusion::Other("timed_out".to_string()));
        assert_eq!(conclusion.as_str(), Some("timed_out"));
        assert_eq!(conclusion.run_outcome(), None);
    }

    #[test]
    fn test_run_outcome_classification() {
        assert_eq!(Conclusion::Success.run_outcome(), Some(Outcome::Success));
        assert_eq!(Conclusion::Failure.run_outcome(), Some(Outcome::Failure));
        assert_eq!(Conclusion::Cancelled.run_outcome(), Some(Outcome::Failure));
        assert_eq!(Conclusion::Missing.run_outcome(), None);
    }

    #[test]
    fn test_conclusion_serializes_back_to_string() {
        let json = serde_json::to_string(&Conclusion::Cancelled).unwrap();
        assert_eq!(json, r#""cancelled""#);

        let json = serde_json::to_string(&Conclusion::Missing).unwrap();
        assert_eq!(json, "null");
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        assert!(parse_timestamp(Some("not a date")).is_none());
        assert!(parse_timestamp(None).is_none());
        assert!(parse_timestamp(Some("2024-03-01T12:00:00+02:00")).is_some());
    }
}
