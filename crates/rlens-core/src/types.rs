//! Core data model: descriptors, snapshots, enrichment data, and insights.
//!
//! Snapshot and enrichment types mirror the GitHub REST API responses
//! field-for-field; that wire shape is a compatibility boundary, not a
//! design choice. Everything is created fresh per search and discarded
//! wholesale when a new search starts.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Owner + name pair identifying a repository to query.
///
/// Immutable once a search is submitted; both segments must be non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoDescriptor {
    pub owner: String,
    pub repo: String,
}

impl RepoDescriptor {
    /// Create a descriptor, rejecting empty owner or repository names.
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Result<Self, Error> {
        let owner = owner.into();
        let repo = repo.into();
        if owner.trim().is_empty() || repo.trim().is_empty() {
            return Err(Error::InvalidDescriptor(
                "owner and repository name must be non-empty".to_string(),
            ));
        }
        Ok(Self { owner, repo })
    }
}

impl fmt::Display for RepoDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

impl FromStr for RepoDescriptor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        let (owner, repo) = s.split_once('/').ok_or_else(|| {
            Error::InvalidDescriptor(format!("expected owner/repo, got '{s}'"))
        })?;
        if repo.contains('/') {
            return Err(Error::InvalidDescriptor(format!(
                "expected a single owner/repo pair, got '{s}'"
            )));
        }
        Self::new(owner, repo)
    }
}

/// Repository owner as returned by the metadata service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoOwner {
    pub login: String,
}

/// License descriptor as returned by the metadata service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct License {
    pub key: String,
    pub name: String,
}

/// Point-in-time metadata record for a repository.
///
/// Mirror of `GET /repos/{owner}/{repo}`. Produced once per successful
/// top-level fetch and read-only afterward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoSnapshot {
    pub name: String,
    pub full_name: String,
    pub owner: RepoOwner,
    pub description: Option<String>,
    pub language: Option<String>,
    pub stargazers_count: u64,
    pub forks_count: u64,
    pub open_issues_count: u64,
    pub watchers_count: u64,
    /// Repository size in kilobytes.
    pub size: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub license: Option<License>,
    pub default_branch: String,
    pub html_url: String,
}

/// Language name to byte count, as returned by the languages endpoint.
///
/// Percentage shares are always derived from the current map so they can
/// never drift from the byte counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LanguageBreakdown(BTreeMap<String, u64>);

/// One language entry with its recomputed share of the total.
#[derive(Debug, Clone, PartialEq)]
pub struct LanguageShare {
    pub language: String,
    pub bytes: u64,
    pub percent: f64,
}

impl LanguageBreakdown {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &u64)> {
        self.0.iter()
    }

    /// Total code size in bytes, summed over all languages.
    pub fn total_bytes(&self) -> u64 {
        self.0.values().sum()
    }

    pub fn bytes_for(&self, language: &str) -> u64 {
        self.0.get(language).copied().unwrap_or(0)
    }

    /// Percentage share of one language, recomputed from current totals.
    /// Returns 0.0 for an unknown language or an empty breakdown.
    pub fn share_of(&self, language: &str) -> f64 {
        let total = self.total_bytes();
        if total == 0 {
            return 0.0;
        }
        self.bytes_for(language) as f64 / total as f64 * 100.0
    }

    /// All entries with recomputed shares, largest first.
    pub fn shares(&self) -> Vec<LanguageShare> {
        let mut shares: Vec<LanguageShare> = self
            .0
            .iter()
            .map(|(language, bytes)| LanguageShare {
                language: language.clone(),
                bytes: *bytes,
                percent: self.share_of(language),
            })
            .collect();
        shares.sort_by(|a, b| b.bytes.cmp(&a.bytes).then_with(|| a.language.cmp(&b.language)));
        shares
    }
}

impl From<BTreeMap<String, u64>> for LanguageBreakdown {
    fn from(map: BTreeMap<String, u64>) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, u64)> for LanguageBreakdown {
    fn from_iter<I: IntoIterator<Item = (String, u64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// One week of commit activity, mirror of the stats endpoint payload.
///
/// `week` is the epoch-seconds start of the week. The series holds up to
/// 52 entries, oldest first, and may legitimately be empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitActivityWeek {
    pub week: i64,
    pub total: u64,
    #[serde(default)]
    pub days: Vec<u64>,
}

/// One contributor record, source-sorted by descending contribution count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contributor {
    pub login: String,
    pub contributions: u64,
}

/// Narrative insights, any subset of which may be absent.
///
/// A missing field means its stage was skipped or failed after retries;
/// that is not an error by itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsightSet {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository_summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language_analysis: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contribution_analysis: Option<String>,
}

impl InsightSet {
    pub fn is_empty(&self) -> bool {
        self.repository_summary.is_none()
            && self.language_analysis.is_none()
            && self.contribution_analysis.is_none()
    }
}

/// Everything one search produced. The display layer must render with any
/// subset of the enrichment data present.
#[derive(Debug, Clone, Serialize)]
pub struct RepoReport {
    pub snapshot: RepoSnapshot,
    pub languages: Option<LanguageBreakdown>,
    pub commit_activity: Vec<CommitActivityWeek>,
    pub contributors: Vec<Contributor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub readme: Option<String>,
}

/// One side of a two-repository comparison.
#[derive(Debug, Clone, Serialize)]
pub struct RepoProfile {
    pub snapshot: RepoSnapshot,
    pub languages: Option<LanguageBreakdown>,
}

#[cfg(test)]
pub(crate) fn sample_snapshot() -> RepoSnapshot {
    use chrono::TimeZone;

    RepoSnapshot {
        name: "demo".to_string(),
        full_name: "octocat/demo".to_string(),
        owner: RepoOwner {
            login: "octocat".to_string(),
        },
        description: Some("A demo repository".to_string()),
        language: Some("JavaScript".to_string()),
        stargazers_count: 42,
        forks_count: 7,
        open_issues_count: 3,
        watchers_count: 42,
        size: 1024,
        created_at: Utc.with_ymd_and_hms(2019, 4, 2, 12, 0, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2024, 11, 20, 8, 30, 0).unwrap(),
        license: Some(License {
            key: "mit".to_string(),
            name: "MIT License".to_string(),
        }),
        default_branch: "main".to_string(),
        html_url: "https://github.com/octocat/demo".to_string(),
    }
}
