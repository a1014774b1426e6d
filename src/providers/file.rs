use std::path::PathBuf;

use log::info;
use serde::Deserialize;

use super::RunSource;
use crate::error::{Result, RunLensError};
use crate::models::Run;

/// Runs read from a JSON document on disk.
pub struct FileSource {
    path: PathBuf,
    repository: Option<String>,
}

/// Accepted document shapes: the backend envelope `[{"runs": [...]}]` or a
/// plain array of runs.
#[derive(Deserialize)]
#[serde(untagged)]
enum RunDocument {
    Envelopes(Vec<RunEnvelope>),
    Runs(Vec<Run>),
}

#[derive(Deserialize)]
struct RunEnvelope {
    runs: Vec<Run>,
}

impl FileSource {
    pub fn new(path: PathBuf, repository: Option<String>) -> Self {
        Self { path, repository }
    }
}

impl RunSource for FileSource {
    fn provider_name(&self) -> &'static str {
        "File"
    }

    fn repository(&self) -> String {
        self.repository
            .clone()
            .unwrap_or_else(|| self.path.display().to_string())
    }

    async fn fetch_runs(&self) -> Result<Vec<Run>> {
        info!("Reading workflow runs from: {}", self.path.display());

        let contents = tokio::fs::read_to_string(&self.path).await?;
        let runs = parse_run_document(&contents)?;

        info!("Loaded {} workflow runs", runs.len());
        Ok(runs)
    }
}

pub fn parse_run_document(contents: &str) -> Result<Vec<Run>> {
    let value: serde_json::Value = serde_json::from_str(contents)?;

    let document = serde_json::from_value::<RunDocument>(value).map_err(|_| {
        RunLensError::InvalidInput(
            "expected an array of runs or an array of {\"runs\": [...]} objects".to_string(),
        )
    })?;

    Ok(match document {
        RunDocument::Envelopes(envelopes) => {
            envelopes.into_iter().flat_map(|e| e.runs).collect()
        }
        RunDocument::Runs(runs) => runs,
    })
}
