//! rlens-core - Core library for rlens
//!
//! Fetches repository metadata from the GitHub REST API and sequences
//! narrative insight generation against an OpenAI-compatible
//! chat-completions service:
//!
//! - **types**: data model (descriptors, snapshots, enrichment, insights)
//! - **config**: injected configuration and credentials
//! - **github**: wire-level metadata client and commit-activity polling
//! - **insight**: generation client, prompts, and the stage sequencer
//! - **orchestrator**: fetch orchestration and partial-failure policy

pub mod config;
pub mod error;
pub mod github;
pub mod insight;
pub mod orchestrator;
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use error::{Error, Result};
pub use github::GitHubClient;
pub use insight::{GenerationClient, InsightInputs, InsightSequencer};
pub use orchestrator::FetchOrchestrator;
pub use types::{InsightSet, RepoDescriptor, RepoReport};
