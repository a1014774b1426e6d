pub mod file;
pub mod github;

use chrono::Utc;
use log::{info, warn};

use crate::error::Result;
use crate::insights::RunInsights;
use crate::metrics;
use crate::models::Run;

/// Somewhere raw workflow runs can be fetched from.
#[allow(async_fn_in_trait)]
pub trait RunSource {
    fn provider_name(&self) -> &'static str;

    fn repository(&self) -> String;

    async fn fetch_runs(&self) -> Result<Vec<Run>>;
}

/// Fetches runs once and aggregates them. A failed fetch is returned as-is
/// and nothing is aggregated.
pub async fn collect_insights<S: RunSource>(source: &S) -> Result<RunInsights> {
    let repository = source.repository();
    info!("Starting insights collection for repository: {repository}");

    let runs = source.fetch_runs().await?;

    if runs.is_empty() {
        warn!("No workflow runs found for repository: {repository}");
    }

    let analysis = metrics::analyze(runs);
    info!(
        "Aggregated {} runs ({} timed) into {} month buckets and {} distinct steps",
        analysis.total_runs,
        analysis.lifetime.all_durations.len(),
        analysis.buckets.len(),
        analysis.steps.len()
    );

    let skipped_records = analysis.skipped_records();
    if skipped_records > 0 {
        warn!("Skipped data from {skipped_records} malformed runs");
    }

    Ok(RunInsights {
        provider: source.provider_name().to_string(),
        repository,
        collected_at: Utc::now(),
        total_runs: analysis.total_runs,
        skipped_records,
        lifetime_average_seconds: analysis.lifetime.lifetime_average,
        series: analysis.series,
        warnings: analysis.warnings,
    })
}
