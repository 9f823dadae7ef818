//! Prompt construction for the three insight stages.
//!
//! Each builder embeds derived figures (shares, totals, averages) that are
//! recomputed from the current data on every call; nothing here is cached
//! or stored.

use chrono::Datelike;

use crate::types::{Contributor, LanguageBreakdown, RepoSnapshot};

/// How much README text the summary stage may see.
pub(crate) const README_EXCERPT_CHARS: usize = 1500;

/// How many contributors the contribution stage names individually.
pub(crate) const TOP_CONTRIBUTORS: usize = 5;

/// Derived figures for the language-analysis prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct LanguageStats {
    pub primary_language: String,
    /// Primary language's percentage share of total bytes.
    pub primary_share: f64,
    pub total_bytes: u64,
}

impl LanguageStats {
    pub fn compute(snapshot: &RepoSnapshot, languages: &LanguageBreakdown) -> Self {
        let primary_language = snapshot
            .language
            .clone()
            .unwrap_or_else(|| "Unknown".to_string());
        Self {
            primary_share: languages.share_of(&primary_language),
            total_bytes: languages.total_bytes(),
            primary_language,
        }
    }
}

/// Derived figures for the contribution-analysis prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct ContributionStats {
    pub contributor_count: usize,
    pub total_contributions: u64,
    pub average_contributions: f64,
    /// Top contributor's percentage share of all contributions.
    pub top_share: f64,
}

impl ContributionStats {
    pub fn compute(contributors: &[Contributor]) -> Self {
        let total_contributions: u64 = contributors.iter().map(|c| c.contributions).sum();
        let contributor_count = contributors.len();
        let average_contributions = if contributor_count == 0 {
            0.0
        } else {
            total_contributions as f64 / contributor_count as f64
        };
        let top_share = if total_contributions == 0 {
            0.0
        } else {
            contributors
                .first()
                .map(|c| c.contributions as f64 / total_contributions as f64 * 100.0)
                .unwrap_or(0.0)
        };
        Self {
            contributor_count,
            total_contributions,
            average_contributions,
            top_share,
        }
    }
}

/// Stage 1: repository summary.
pub fn repository_summary(snapshot: &RepoSnapshot, readme: Option<&str>) -> String {
    let readme_excerpt = readme
        .map(|text| truncate_chars(text, README_EXCERPT_CHARS).to_string())
        .unwrap_or_else(|| "No README available".to_string());

    format!(
        "Analyze this GitHub repository and provide a comprehensive, insightful summary (3-4 sentences):\n\
        \n\
        Repository Name: {name}\n\
        Description: {description}\n\
        Primary Language: {language}\n\
        Stars: {stars}\n\
        Forks: {forks}\n\
        Open Issues: {issues}\n\
        Last Updated: {updated}\n\
        README Content: {readme_excerpt}\n\
        \n\
        Provide insights about:\n\
        1. The repository's primary purpose and target audience\n\
        2. Key features and capabilities based on the description and README\n\
        3. The project's maturity and community engagement level\n\
        4. Potential use cases and significance in the developer ecosystem\n\
        \n\
        Write in a professional yet engaging tone, highlighting what makes this repository noteworthy.",
        name = snapshot.name,
        description = snapshot
            .description
            .as_deref()
            .unwrap_or("No description provided"),
        language = snapshot.language.as_deref().unwrap_or("Unknown"),
        stars = snapshot.stargazers_count,
        forks = snapshot.forks_count,
        issues = snapshot.open_issues_count,
        updated = snapshot.updated_at.format("%Y-%m-%d"),
    )
}

/// Stage 2: technology stack analysis. Requires a non-empty breakdown.
pub fn language_analysis(snapshot: &RepoSnapshot, languages: &LanguageBreakdown) -> String {
    let stats = LanguageStats::compute(snapshot, languages);
    let listing = languages
        .shares()
        .iter()
        .map(|share| format!("{}: {} bytes", share.language, share.bytes))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "Analyze this repository's technology stack and provide detailed insights (3-4 sentences):\n\
        \n\
        Repository: {name}\n\
        Primary Language: {language} ({share:.1}% of codebase)\n\
        Language Breakdown: {listing}\n\
        Total Code Size: {total} bytes\n\
        \n\
        Provide analysis on:\n\
        1. Technology stack composition and architecture patterns\n\
        2. What the language choices reveal about the project's domain and requirements\n\
        3. Potential advantages and considerations of this tech stack\n\
        4. How the stack aligns with modern development practices and industry trends\n\
        \n\
        Focus on practical insights that would be valuable for developers considering using or contributing to this project.",
        name = snapshot.name,
        language = stats.primary_language,
        share = stats.primary_share,
        listing = listing,
        total = group_digits(stats.total_bytes),
    )
}

/// Stage 3: collaboration and contribution analysis. Requires a non-empty
/// contributor list.
pub fn contribution_analysis(snapshot: &RepoSnapshot, contributors: &[Contributor]) -> String {
    let stats = ContributionStats::compute(contributors);
    let top_listing = contributors
        .iter()
        .take(TOP_CONTRIBUTORS)
        .map(|c| format!("{}: {} contributions", c.login, c.contributions))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "Analyze this repository's collaboration and contribution patterns (3-4 sentences):\n\
        \n\
        Repository: {name}\n\
        Total Contributors: {count}\n\
        Total Contributions: {total}\n\
        Average Contributions per Contributor: {average:.1}\n\
        Top Contributors: {top_listing}\n\
        Top Contributor Share: {top_share:.1}% of total contributions\n\
        Repository Age: Created {year}\n\
        \n\
        Provide insights on:\n\
        1. Collaboration health and community engagement patterns\n\
        2. Contribution distribution and potential bottlenecks\n\
        3. Project maintenance activity and sustainability indicators\n\
        4. Recommendations for improving community participation\n\
        \n\
        Assess whether this is a healthy, sustainable open-source project and what factors contribute to its current state.",
        name = snapshot.name,
        count = stats.contributor_count,
        total = group_digits(stats.total_contributions),
        average = stats.average_contributions,
        top_listing = top_listing,
        top_share = stats.top_share,
        year = snapshot.created_at.year(),
    )
}

/// Truncate on a char boundary; byte slicing could split a UTF-8 sequence.
fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Group digits in threes, the way the original dashboard displayed totals.
fn group_digits(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
