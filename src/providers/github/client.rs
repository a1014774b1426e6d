use reqwest::header::ACCEPT;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

use crate::auth::Token;
use crate::error::{Result, RunLensError};
use crate::models::Step;

const JOBS_PER_PAGE: u32 = 100;

pub struct GitHubClient {
    client: Client,
    api_url: Url,
    token: Option<Token>,
}

#[derive(Debug, Deserialize)]
struct WorkflowRunsPage {
    workflow_runs: Vec<WorkflowRunDto>,
}

#[derive(Debug, Deserialize)]
pub struct WorkflowRunDto {
    pub id: u64,
    #[serde(default)]
    pub conclusion: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub run_started_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JobsPage {
    total_count: usize,
    jobs: Vec<JobDto>,
}

#[derive(Debug, Deserialize)]
pub struct JobDto {
    pub name: String,
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl GitHubClient {
    pub fn new(base_url: &str, token: Option<Token>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("runlens/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RunLensError::Config(format!("Failed to create HTTP client: {e}")))?;

        let api_url = Url::parse(base_url)
            .map_err(|e| RunLensError::Config(format!("Invalid base URL: {e}")))?;

        if api_url.cannot_be_a_base() {
            return Err(RunLensError::Config(format!(
                "Invalid base URL: {base_url}"
            )));
        }

        Ok(Self {
            client,
            api_url,
            token,
        })
    }

    fn auth_request(&self, request: RequestBuilder) -> RequestBuilder {
        if let Some(token) = &self.token {
            request.bearer_auth(token.as_str())
        } else {
            request
        }
    }

    /// Appends percent-encoded path segments to the API base URL.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|()| RunLensError::Config(format!("Invalid base URL: {}", self.api_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let request = self
            .auth_request(request)
            .header(ACCEPT, "application/vnd.github+json");

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RunLensError::Api(format!("{status} - {body}")));
        }

        Ok(response.json::<T>().await?)
    }

    /// Fetch one page of completed workflow runs, newest first.
    pub async fn fetch_workflow_runs_page(
        &self,
        owner: &str,
        repo: &str,
        page: u32,
        per_page: u32,
        branch: Option<&str>,
    ) -> Result<Vec<WorkflowRunDto>> {
        let url = self.endpoint(&["repos", owner, repo, "actions", "runs"])?;

        let mut request = self
            .client
            .get(url)
            .query(&[("status", "completed")])
            .query(&[("page", page), ("per_page", per_page)]);
        if let Some(branch) = branch {
            request = request.query(&[("branch", branch)]);
        }

        let body: WorkflowRunsPage = self.get_json(request).await?;
        Ok(body.workflow_runs)
    }

    /// Fetch every job of a workflow run, following pagination.
    pub async fn fetch_run_jobs(
        &self,
        owner: &str,
        repo: &str,
        run_id: u64,
    ) -> Result<Vec<JobDto>> {
        let run_id = run_id.to_string();
        let url = self.endpoint(&["repos", owner, repo, "actions", "runs", &run_id, "jobs"])?;

        let mut jobs = Vec::new();
        let mut page = 1;

        loop {
            let request = self
                .client
                .get(url.clone())
                .query(&[("page", page), ("per_page", JOBS_PER_PAGE)]);

            let body: JobsPage = self.get_json(request).await?;
            let fetched = body.jobs.len();
            jobs.extend(body.jobs);

            if fetched == 0 || jobs.len() >= body.total_count {
                break;
            }

            page += 1;
        }

        Ok(jobs)
    }
}
