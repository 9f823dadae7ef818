//! Narrative insight generation.
//!
//! A thin client for an OpenAI-compatible chat-completions service plus the
//! sequencer that turns fetched metadata into an [`InsightSet`]:
//!
//! - **prompts**: prompt construction and the derived figures they embed
//! - **sequencer**: strict stage ordering, inter-stage pacing, rate-limit
//!   retries

pub mod prompts;
pub mod sequencer;

pub use prompts::{ContributionStats, LanguageStats};
pub use sequencer::{InsightInputs, InsightSequencer};

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::GenerationConfig;
use crate::error::{Error, Result};

/// Text-generation seam.
///
/// The production implementation is [`GenerationClient`]; the sequencer is
/// generic over this trait so tests can drive it with scripted fakes.
/// One call is one generation request; rate-limit retry policy belongs to
/// the caller.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Chat-completions request body. Field-for-field mirror of the provider
/// API; this is a compatibility boundary.
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

/// Client for the narrative-generation service.
#[derive(Clone)]
pub struct GenerationClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl GenerationClient {
    /// Build a client from injected configuration.
    ///
    /// Fails with [`Error::MissingApiKey`] when no credential is configured.
    /// That is the one insight failure surfaced as an overall error rather
    /// than a silently omitted stage.
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or(Error::MissingApiKey)?;
        Ok(Self {
            http: reqwest::Client::new(),
            endpoint: chat_completions_endpoint(&config.api_url),
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }
}

#[async_trait]
impl TextGenerator for GenerationClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        debug!(
            "generation request: model={} prompt_len={}",
            self.model,
            prompt.len()
        );
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        let status = resp.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let detail = resp.text().await.unwrap_or_default();
            return Err(Error::RateLimited(format!("{status}: {detail}")));
        }
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            return Err(Error::Generation(format!("{status}: {detail}")));
        }

        let parsed: ChatResponse = resp.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| Error::Decode("generation response contained no message content".into()))
    }
}

/// Accept either a bare base URL or one already pointing into /v1/.
fn chat_completions_endpoint(base: &str) -> String {
    if base.contains("/v1/") {
        base.to_string()
    } else {
        format!("{}/v1/chat/completions", base.trim_end_matches('/'))
    }
}
