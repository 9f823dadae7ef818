//! CLI argument definitions using clap derive macros.

use clap::{Args, Parser, Subcommand};

/// Repository insight CLI
///
/// Fetches GitHub repository statistics and AI narrative insights.
#[derive(Parser, Debug)]
#[command(name = "rlens")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch one repository and generate narrative insights
    Report(ReportArgs),

    /// Compare two repositories side by side
    Compare(CompareArgs),

    /// Check configuration and credentials
    Doctor,

    /// Show version
    Version,
}

#[derive(Args, Debug)]
pub struct ReportArgs {
    /// Repository in owner/repo form
    pub repo: String,

    /// Skip narrative insight generation
    #[arg(long)]
    pub no_insights: bool,

    /// Emit the report as JSON instead of formatted text
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct CompareArgs {
    /// First repository in owner/repo form
    pub left: String,

    /// Second repository in owner/repo form
    pub right: String,
}
