//! Single-repository report: fetch, sequence insights, render.

use std::time::Duration;

use anyhow::Result;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use rlens_core::insight::{GenerationClient, InsightInputs, InsightSequencer};
use rlens_core::types::{InsightSet, RepoDescriptor, RepoReport};
use rlens_core::{Config, FetchOrchestrator, GitHubClient};

use crate::cli::ReportArgs;
use crate::output;

pub async fn execute(args: ReportArgs, config: &Config) -> Result<()> {
    let descriptor: RepoDescriptor = args.repo.parse()?;

    let github = GitHubClient::new(&config.github)?;
    let orchestrator = FetchOrchestrator::new(github);

    let spinner = progress_spinner(format!("Fetching {descriptor}..."));
    let report = match orchestrator.fetch_report(&descriptor).await {
        Ok(report) => report,
        Err(err) => {
            spinner.finish_and_clear();
            return Err(err.into());
        }
    };
    spinner.finish_and_clear();
    tracing::debug!(
        "fetched {}: {} languages, {} activity weeks, {} contributors",
        descriptor,
        report.languages.as_ref().map_or(0, |l| l.len()),
        report.commit_activity.len(),
        report.contributors.len(),
    );

    let insights = if args.no_insights {
        InsightSet::default()
    } else {
        generate_insights(&report, config).await?
    };

    if args.json {
        #[derive(Serialize)]
        struct JsonReport<'a> {
            #[serde(flatten)]
            report: &'a RepoReport,
            insights: &'a InsightSet,
        }
        println!(
            "{}",
            serde_json::to_string_pretty(&JsonReport {
                report: &report,
                insights: &insights,
            })?
        );
        return Ok(());
    }

    output::render_report(&report, &insights);
    Ok(())
}

/// Run the insight sequencer when a generation credential is configured.
///
/// A missing credential downgrades to a warning: the metadata report is
/// still worth rendering on its own.
async fn generate_insights(report: &RepoReport, config: &Config) -> Result<InsightSet> {
    let client = match GenerationClient::new(&config.generation) {
        Ok(client) => client,
        Err(err) => {
            eprintln!("{}", format!("⚠ insights unavailable: {err}").yellow());
            return Ok(InsightSet::default());
        }
    };

    let spinner = progress_spinner("Generating insights...".to_string());
    let sequencer = InsightSequencer::new(client);
    let insights = sequencer
        .run(InsightInputs {
            snapshot: &report.snapshot,
            languages: report.languages.as_ref(),
            contributors: &report.contributors,
            readme: report.readme.as_deref(),
        })
        .await?;
    spinner.finish_and_clear();

    if insights.is_empty() {
        eprintln!(
            "{}",
            "⚠ no insights could be generated; showing metadata only".yellow()
        );
    }
    Ok(insights)
}

fn progress_spinner(message: String) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}
