//! Terminal rendering for reports and comparisons.
//!
//! The display layer renders whatever subset of data arrived; every section
//! degrades to a short "unavailable" line when its data is absent.

use chrono::{DateTime, Utc};
use colored::Colorize;

use rlens_core::types::{
    CommitActivityWeek, InsightSet, LanguageBreakdown, RepoProfile, RepoReport, RepoSnapshot,
};

pub fn render_report(report: &RepoReport, insights: &InsightSet) {
    render_stats(&report.snapshot);
    render_languages(report.languages.as_ref());
    render_commit_activity(&report.commit_activity);
    render_insights(insights);
}

fn render_stats(snapshot: &RepoSnapshot) {
    println!();
    println!("{}", snapshot.full_name.cyan().bold());
    if let Some(ref description) = snapshot.description {
        println!("{description}");
    }
    println!("{}", "─".repeat(60));
    println!(
        "  {} stars   {} forks   {} watchers   {} open issues",
        format_count(snapshot.stargazers_count).yellow(),
        format_count(snapshot.forks_count),
        format_count(snapshot.watchers_count),
        format_count(snapshot.open_issues_count),
    );
    println!(
        "  Language: {}   Size: {} KB   Branch: {}",
        snapshot.language.as_deref().unwrap_or("unknown"),
        group_digits(snapshot.size),
        snapshot.default_branch,
    );
    if let Some(ref license) = snapshot.license {
        println!("  License: {}", license.name);
    }
    println!(
        "  Created: {}   Updated: {}",
        format_date(&snapshot.created_at),
        format_date(&snapshot.updated_at),
    );
}

fn render_languages(languages: Option<&LanguageBreakdown>) {
    println!();
    println!("{}", "Languages".cyan().bold());
    let Some(languages) = languages.filter(|l| !l.is_empty()) else {
        println!("  {}", "no language data available".dimmed());
        return;
    };
    for share in languages.shares() {
        println!(
            "  {:<16} {:>12} bytes  {:>5.1}%",
            share.language,
            group_digits(share.bytes),
            share.percent,
        );
    }
}

fn render_commit_activity(weeks: &[CommitActivityWeek]) {
    println!();
    println!("{}", "Commit activity".cyan().bold());
    if weeks.is_empty() {
        println!("  {}", "no commit activity data available".dimmed());
        return;
    }
    let total: u64 = weeks.iter().map(|w| w.total).sum();
    let active = weeks.iter().filter(|w| w.total > 0).count();
    println!(
        "  {} commits over the last {} weeks ({} active weeks)",
        group_digits(total),
        weeks.len(),
        active,
    );
    if let Some(busiest) = weeks.iter().max_by_key(|w| w.total) {
        if busiest.total > 0 {
            println!(
                "  Busiest week: {} ({} commits)",
                format_week(busiest.week),
                busiest.total,
            );
        }
    }
}

fn render_insights(insights: &InsightSet) {
    if insights.is_empty() {
        return;
    }
    println!();
    println!("{}", "AI Insights".cyan().bold());
    let sections = [
        ("Repository Summary", &insights.repository_summary),
        ("Technology Stack Analysis", &insights.language_analysis),
        ("Contribution Analysis", &insights.contribution_analysis),
    ];
    for (heading, body) in sections {
        if let Some(text) = body {
            println!();
            println!("  {}", heading.bold());
            for line in text.lines() {
                println!("  {line}");
            }
        }
    }
}

pub fn render_comparison(left: &RepoProfile, right: &RepoProfile) {
    println!();
    println!("{}", "Repository Comparison".cyan().bold());
    println!("{}", "─".repeat(60));

    // lower is better for open issues only
    let metrics: [(&str, u64, u64, bool); 4] = [
        (
            "Stars",
            left.snapshot.stargazers_count,
            right.snapshot.stargazers_count,
            false,
        ),
        (
            "Forks",
            left.snapshot.forks_count,
            right.snapshot.forks_count,
            false,
        ),
        (
            "Watchers",
            left.snapshot.watchers_count,
            right.snapshot.watchers_count,
            false,
        ),
        (
            "Open Issues",
            left.snapshot.open_issues_count,
            right.snapshot.open_issues_count,
            true,
        ),
    ];

    // no styling inside padded cells; escape codes would break alignment
    println!(
        "  {:<14} {:>20} {:>20}",
        "", left.snapshot.name, right.snapshot.name,
    );
    for (name, left_value, right_value, lower_wins) in metrics {
        let (left_mark, right_mark) = winner_marks(left_value, right_value, lower_wins);
        println!(
            "  {:<14} {:>19}{} {:>19}{}",
            name,
            format_count(left_value),
            left_mark,
            format_count(right_value),
            right_mark,
        );
    }

    for profile in [left, right] {
        println!();
        println!("  {}", profile.snapshot.full_name.bold());
        match profile.languages.as_ref().filter(|l| !l.is_empty()) {
            Some(languages) => {
                let listing = languages
                    .shares()
                    .iter()
                    .map(|s| format!("{} {:.1}%", s.language, s.percent))
                    .collect::<Vec<_>>()
                    .join(", ");
                println!("    {listing}");
            }
            None => println!("    {}", "no language data".dimmed()),
        }
    }
}

fn winner_marks(left: u64, right: u64, lower_wins: bool) -> (&'static str, &'static str) {
    let left_wins = if lower_wins { left < right } else { left > right };
    let right_wins = if lower_wins { right < left } else { right > left };
    (
        if left_wins { "*" } else { " " },
        if right_wins { "*" } else { " " },
    )
}

/// Abbreviate large counts: 1.2K, 3.4M.
pub fn format_count(n: u64) -> String {
    if n >= 1_000_000 {
        format!("{:.1}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.1}K", n as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}

/// Group digits in threes.
pub fn group_digits(n: u64) -> String {
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

fn format_date(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d").to_string()
}

/// Week-start epoch seconds to a date.
fn format_week(epoch_seconds: i64) -> String {
    DateTime::<Utc>::from_timestamp(epoch_seconds, 0)
        .map(|ts| format_date(&ts))
        .unwrap_or_else(|| epoch_seconds.to_string())
}
