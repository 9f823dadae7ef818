//! Two-repository comparison.

use std::time::Duration;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};

use rlens_core::types::RepoDescriptor;
use rlens_core::{Config, FetchOrchestrator, GitHubClient};

use crate::cli::CompareArgs;
use crate::output;

pub async fn execute(args: CompareArgs, config: &Config) -> Result<()> {
    let left: RepoDescriptor = args.left.parse()?;
    let right: RepoDescriptor = args.right.parse()?;

    let github = GitHubClient::new(&config.github)?;
    let orchestrator = FetchOrchestrator::new(github);

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(format!("Comparing {left} with {right}..."));
    spinner.enable_steady_tick(Duration::from_millis(80));

    let result = orchestrator.fetch_comparison(&left, &right).await;
    spinner.finish_and_clear();

    let (left_profile, right_profile) = result?;
    output::render_comparison(&left_profile, &right_profile);
    Ok(())
}
