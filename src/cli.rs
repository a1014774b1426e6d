use anyhow::Result;
use clap::{Parser, Subcommand};
use log::info;
use std::path::PathBuf;

use crate::auth::Token;
use crate::insights::RunInsights;
use crate::providers::file::FileSource;
use crate::providers::github::GitHubProvider;
use crate::providers::collect_insights;

#[derive(Parser)]
#[command(name = "runlens")]
#[command(author, version, about = "CI workflow run statistics", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output file path (defaults to stdout)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Pretty print JSON output
    #[arg(short, long, global = true, default_value_t = false)]
    pretty: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate workflow runs from the GitHub Actions API
    Github {
        /// GitHub API token (optional, required for private repositories)
        #[arg(short, long, env = "GITHUB_TOKEN", hide_env_values = true)]
        token: Option<String>,

        /// GitHub API base URL
        #[arg(short, long, default_value = "https://api.github.com")]
        url: String,

        /// Repository owner (user or organization)
        #[arg(short = 'O', long)]
        owner: String,

        /// Repository name
        #[arg(short, long)]
        repo: String,

        /// Number of completed workflow runs to analyze
        #[arg(short, long, default_value_t = 50)]
        limit: usize,

        /// Branch name to filter workflow runs (optional)
        #[arg(short, long)]
        branch: Option<String>,
    },

    /// Aggregate workflow runs from a local JSON document
    File {
        /// Path to a JSON array of runs, or of {"runs": [...]} objects
        #[arg(short, long)]
        input: PathBuf,

        /// Repository name to report (defaults to the input path)
        #[arg(short, long)]
        repository: Option<String>,
    },
}

impl Cli {
    pub async fn execute(&self) -> Result<()> {
        let insights = match &self.command {
            Commands::Github {
                token,
                url,
                owner,
                repo,
                limit,
                branch,
            } => {
                info!("Collecting GitHub insights for repository: {owner}/{repo}");

                let provider = GitHubProvider::new(
                    url,
                    owner.clone(),
                    repo.clone(),
                    Token::from_optional(token.as_deref()),
                )?
                .with_limit(*limit)
                .with_branch(branch.clone());

                collect_insights(&provider).await?
            }
            Commands::File { input, repository } => {
                let source = FileSource::new(input.clone(), repository.clone());
                collect_insights(&source).await?
            }
        };

        self.write_output(&insights)
    }

    fn write_output(&self, insights: &RunInsights) -> Result<()> {
        let json_output = if self.pretty {
            serde_json::to_string_pretty(insights)?
        } else {
            serde_json::to_string(insights)?
        };

        if let Some(output_path) = &self.output {
            std::fs::write(output_path, json_output)?;
            info!("Insights written to: {}", output_path.display());
        } else {
            println!("{json_output}");
        }

        Ok(())
    }
}
