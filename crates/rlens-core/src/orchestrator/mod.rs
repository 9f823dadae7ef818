//! Fetch orchestration.
//!
//! Turns one submitted descriptor into a [`RepoReport`], applying the
//! partial-failure policy: the primary snapshot fetch is the only fatal
//! one; languages, contributors, and commit activity are best-effort
//! enrichment that degrade independently. The enrichment fetches run
//! concurrently and all settle before the report is assembled, so no
//! failure blocks another's result from being used.

use tracing::{debug, warn};

use crate::error::Result;
use crate::github::{GitHubClient, activity};
use crate::types::{
    CommitActivityWeek, Contributor, LanguageBreakdown, RepoDescriptor, RepoProfile, RepoReport,
};

/// Orchestrates the metadata fetches for one search.
#[derive(Clone)]
pub struct FetchOrchestrator {
    github: GitHubClient,
}

impl FetchOrchestrator {
    pub fn new(github: GitHubClient) -> Self {
        Self { github }
    }

    /// Fetch everything for one repository.
    ///
    /// The snapshot fetch happens first and its failure aborts the whole
    /// search. The three enrichment fetches then run concurrently; the
    /// README is fetched last, best-effort. The returned report may carry
    /// any subset of enrichment data.
    pub async fn fetch_report(&self, descriptor: &RepoDescriptor) -> Result<RepoReport> {
        let snapshot = self.github.get_repository(descriptor).await?;
        debug!("fetched snapshot for {}", descriptor);

        let (languages, commit_activity, contributors) = tokio::join!(
            self.fetch_languages(descriptor),
            self.fetch_commit_activity(descriptor),
            self.fetch_contributors(descriptor),
        );
        let readme = self.fetch_readme_text(descriptor).await;

        Ok(RepoReport {
            snapshot,
            languages,
            commit_activity,
            contributors,
            readme,
        })
    }

    /// Languages are enrichment: a failure means "unavailable", never fatal.
    async fn fetch_languages(&self, descriptor: &RepoDescriptor) -> Option<LanguageBreakdown> {
        match self.github.get_languages(descriptor).await {
            Ok(languages) => Some(languages),
            Err(err) => {
                warn!("failed to fetch languages for {}: {}", descriptor, err);
                None
            }
        }
    }

    /// Contributors are enrichment: any failure yields an empty list.
    async fn fetch_contributors(&self, descriptor: &RepoDescriptor) -> Vec<Contributor> {
        match self.github.get_contributors(descriptor).await {
            Ok(contributors) => contributors,
            Err(err) => {
                warn!("failed to fetch contributors for {}: {}", descriptor, err);
                Vec::new()
            }
        }
    }

    /// Commit activity drives the polling state machine to a terminal
    /// state. Every terminal state yields a (possibly empty) series.
    async fn fetch_commit_activity(&self, descriptor: &RepoDescriptor) -> Vec<CommitActivityWeek> {
        activity::poll(|| self.github.probe_commit_activity(descriptor)).await
    }

    /// README text is best-effort; absence is a normal outcome, not an
    /// error.
    async fn fetch_readme_text(&self, descriptor: &RepoDescriptor) -> Option<String> {
        match self.github.get_readme(descriptor).await {
            Ok(text) => Some(text),
            Err(err) => {
                debug!("no README for {}: {}", descriptor, err);
                None
            }
        }
    }

    /// Fetch the two sides of a comparison.
    ///
    /// Each side's snapshot is fatal for that side (the error names the
    /// repository); languages degrade as usual.
    pub async fn fetch_comparison(
        &self,
        left: &RepoDescriptor,
        right: &RepoDescriptor,
    ) -> Result<(RepoProfile, RepoProfile)> {
        let left = self.fetch_profile(left).await?;
        let right = self.fetch_profile(right).await?;
        Ok((left, right))
    }

    async fn fetch_profile(&self, descriptor: &RepoDescriptor) -> Result<RepoProfile> {
        let snapshot = self.github.get_repository(descriptor).await?;
        let languages = self.fetch_languages(descriptor).await;
        Ok(RepoProfile {
            snapshot,
            languages,
        })
    }
}
