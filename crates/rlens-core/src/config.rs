//! Configuration management for rlens.
//!
//! Configuration is loaded from multiple sources with precedence:
//! 1. Environment variables (RLENS_*)
//! 2. Config file (~/.config/rlens/config.toml)
//! 3. Default values
//!
//! Credentials are injected here at process start and never mutated, so
//! the fetch orchestrator and insight sequencer stay unit-testable with
//! fake services.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Metadata service settings
    #[serde(default)]
    pub github: GithubConfig,

    /// Narrative-generation service settings
    #[serde(default)]
    pub generation: GenerationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubConfig {
    /// Base URL for the GitHub REST API
    #[serde(default = "default_github_api_url")]
    pub api_url: String,

    /// Bearer token for elevated rate limits (optional)
    pub token: Option<String>,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_url: default_github_api_url(),
            token: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Base URL of an OpenAI-compatible chat-completions service
    #[serde(default = "default_generation_api_url")]
    pub api_url: String,

    /// API credential; insights are unavailable without one
    pub api_key: Option<String>,

    /// Model identifier
    #[serde(default = "default_generation_model")]
    pub model: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Completion token ceiling
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_url: default_generation_api_url(),
            api_key: None,
            model: default_generation_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

fn default_github_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_generation_api_url() -> String {
    "https://api.groq.com/openai".to_string()
}

fn default_generation_model() -> String {
    "llama-3.3-70b-versatile".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    1024
}

impl Config {
    /// Path to the config file, honoring the RLENS_CONFIG_DIR override.
    pub fn config_path() -> PathBuf {
        let dir = std::env::var("RLENS_CONFIG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::config_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join("rlens")
            });
        dir.join("config.toml")
    }

    /// Load configuration from file or defaults, then apply environment
    /// variable overrides.
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        let mut config = if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            toml::from_str(&raw)
                .map_err(|e| Error::Config(format!("failed to parse {}: {e}", path.display())))?
        } else {
            Self::default()
        };
        config.apply_env();
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("RLENS_GITHUB_API_URL") {
            self.github.api_url = url;
        }
        if let Some(token) =
            env_non_empty("RLENS_GITHUB_TOKEN").or_else(|| env_non_empty("GITHUB_TOKEN"))
        {
            self.github.token = Some(token);
        }
        if let Ok(url) = std::env::var("RLENS_GENERATION_API_URL") {
            self.generation.api_url = url;
        }
        if let Some(key) =
            env_non_empty("RLENS_GENERATION_API_KEY").or_else(|| env_non_empty("GROQ_API_KEY"))
        {
            self.generation.api_key = Some(key);
        }
        if let Ok(model) = std::env::var("RLENS_GENERATION_MODEL") {
            self.generation.model = model;
        }
    }
}

fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.github.api_url, "https://api.github.com");
        assert!(config.github.token.is_none());
        assert_eq!(config.generation.model, "llama-3.3-70b-versatile");
        assert_eq!(config.generation.temperature, 0.7);
        assert_eq!(config.generation.max_tokens, 1024);
        assert!(config.generation.api_key.is_none());
    }

    #[test]
    fn test_parse_partial_config_file() {
        let raw = r#"
            [github]
            token = "ghp_abc123"

            [generation]
            api_key = "gsk_xyz"
            model = "llama-3.1-8b-instant"
        "#;
        let config: Config = toml::from_str(raw).unwrap();
        assert_eq!(config.github.token.as_deref(), Some("ghp_abc123"));
        assert_eq!(config.github.api_url, "https://api.github.com");
        assert_eq!(config.generation.model, "llama-3.1-8b-instant");
        assert_eq!(config.generation.max_tokens, 1024);
    }

    // file loading and env precedence share RLENS_CONFIG_DIR, so they run
    // as one sequential test to keep the environment mutations isolated
    #[test]
    fn test_config_load_file_and_env_precedence() {
        let temp_dir = tempfile::tempdir().unwrap();
        std::fs::write(
            temp_dir.path().join("config.toml"),
            "[generation]\napi_key = \"gsk_from_file\"\n",
        )
        .unwrap();

        let old_dir = env::var("RLENS_CONFIG_DIR").ok();
        let old_key = env::var("RLENS_GENERATION_API_KEY").ok();
        // SAFETY: This test runs in isolation and we restore the env vars afterward
        unsafe { env::set_var("RLENS_CONFIG_DIR", temp_dir.path()) };

        let config = Config::load().unwrap();
        assert_eq!(config.generation.api_key.as_deref(), Some("gsk_from_file"));

        // SAFETY: as above
        unsafe { env::set_var("RLENS_GENERATION_API_KEY", "gsk_from_env") };

        let config = Config::load().unwrap();
        assert_eq!(config.generation.api_key.as_deref(), Some("gsk_from_env"));

        // Cleanup
        // SAFETY: Restoring environment to previous state
        unsafe {
            if let Some(val) = old_dir {
                env::set_var("RLENS_CONFIG_DIR", val);
            } else {
                env::remove_var("RLENS_CONFIG_DIR");
            }
            if let Some(val) = old_key {
                env::set_var("RLENS_GENERATION_API_KEY", val);
            } else {
                env::remove_var("RLENS_GENERATION_API_KEY");
            }
        }
    }
}
