use futures::{stream, StreamExt, TryStreamExt};
use log::{debug, info};

use super::client::{GitHubClient, WorkflowRunDto};
use crate::auth::Token;
use crate::error::Result;
use crate::models::{Conclusion, Run};
use crate::providers::RunSource;

const CONCURRENCY: usize = 10;
const RUNS_PER_PAGE: u32 = 100;

pub struct GitHubProvider {
    client: GitHubClient,
    owner: String,
    repo: String,
    limit: usize,
    branch: Option<String>,
}

impl GitHubProvider {
    pub fn new(base_url: &str, owner: String, repo: String, token: Option<Token>) -> Result<Self> {
        let client = GitHubClient::new(base_url, token)?;

        Ok(Self {
            client,
            owner,
            repo,
            limit: 50,
            branch: None,
        })
    }

    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    #[must_use]
    pub fn with_branch(mut self, branch: Option<String>) -> Self {
        self.branch = branch;
        self
    }

    async fn fetch_workflow_runs(&self) -> Result<Vec<Run>> {
        let mut all_runs = Vec::with_capacity(self.limit);
        let mut page = 1;
        let per_page = u32::try_from(self.limit)
            .unwrap_or(RUNS_PER_PAGE)
            .clamp(1, RUNS_PER_PAGE);

        info!("Fetching up to {} workflow runs...", self.limit);

        while all_runs.len() < self.limit {
            let listed = self
                .client
                .fetch_workflow_runs_page(
                    &self.owner,
                    &self.repo,
                    page,
                    per_page,
                    self.branch.as_deref(),
                )
                .await?;

            if listed.is_empty() {
                info!("No more workflow runs returned by API, stopping");
                break;
            }

            let last_page = listed.len() < per_page as usize;
            let remaining = self.limit - all_runs.len();

            // Jobs are fetched concurrently but collected in listing order
            let runs: Vec<Run> = stream::iter(listed.into_iter().take(remaining))
                .map(|run| self.with_steps(run))
                .buffered(CONCURRENCY)
                .try_collect()
                .await?;

            let fetched_count = runs.len();
            all_runs.extend(runs);

            info!(
                "Page {page}: fetched {fetched_count} workflow runs (total: {})",
                all_runs.len()
            );

            if last_page {
                break;
            }

            page += 1;
        }

        Ok(all_runs)
    }

    /// Attach the steps of every job in the run, in job order.
    async fn with_steps(&self, run: WorkflowRunDto) -> Result<Run> {
        let jobs = self
            .client
            .fetch_run_jobs(&self.owner, &self.repo, run.id)
            .await?;

        debug!(
            "Run {}: jobs [{}]",
            run.id,
            jobs.iter()
                .map(|job| job.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );

        Ok(Run {
            id: Some(run.id),
            started_at: run.run_started_at,
            created_at: run.created_at,
            conclusion: Conclusion::from(run.conclusion),
            steps: jobs.into_iter().flat_map(|job| job.steps).collect(),
        })
    }
}

impl RunSource for GitHubProvider {
    fn provider_name(&self) -> &'static str {
        "GitHub"
    }

    fn repository(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    async fn fetch_runs(&self) -> Result<Vec<Run>> {
        self.fetch_workflow_runs().await
    }
}
