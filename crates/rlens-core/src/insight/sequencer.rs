//! Sequenced insight generation.
//!
//! The three stages run strictly in order with a pause after each
//! successful stage. The generation service enforces a shared
//! requests-per-minute ceiling, so this serialization is a correctness
//! requirement: running stages concurrently would violate the limit even
//! though the runtime would happily allow it.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::insight::{TextGenerator, prompts};
use crate::types::{Contributor, InsightSet, LanguageBreakdown, RepoSnapshot};

/// Pause between a successful stage and the next request.
pub const STAGE_PAUSE: Duration = Duration::from_secs(1);

/// Attempts per stage, counting the first call.
const MAX_STAGE_ATTEMPTS: u32 = 2;

/// Backoff before retrying a rate-limited stage: 2s, 4s.
fn stage_backoff(attempt: u32) -> Duration {
    Duration::from_secs(2u64.saturating_pow(attempt))
}

/// Inputs for one sequencing run. Everything but the snapshot is optional
/// enrichment; a stage whose inputs are missing or empty is skipped, which
/// is not an error.
#[derive(Debug, Clone, Copy)]
pub struct InsightInputs<'a> {
    pub snapshot: &'a RepoSnapshot,
    pub languages: Option<&'a LanguageBreakdown>,
    pub contributors: &'a [Contributor],
    pub readme: Option<&'a str>,
}

/// Runs the insight stages against a [`TextGenerator`].
pub struct InsightSequencer<G> {
    generator: G,
}

impl<G: TextGenerator> InsightSequencer<G> {
    pub fn new(generator: G) -> Self {
        Self { generator }
    }

    /// Run the stages in order, collecting whichever succeed.
    ///
    /// A stage that fails after retries is logged and omitted from the
    /// result; it never blocks later stages. An error return means no
    /// stage could even be attempted; the per-stage guards swallow
    /// everything else.
    pub async fn run(&self, inputs: InsightInputs<'_>) -> Result<InsightSet> {
        let mut insights = InsightSet::default();

        let prompt = prompts::repository_summary(inputs.snapshot, inputs.readme);
        if let Some(text) = self.run_stage("repository summary", &prompt).await {
            insights.repository_summary = Some(text);
            tokio::time::sleep(STAGE_PAUSE).await;
        }

        match inputs.languages {
            Some(languages) if !languages.is_empty() => {
                let prompt = prompts::language_analysis(inputs.snapshot, languages);
                if let Some(text) = self.run_stage("language analysis", &prompt).await {
                    insights.language_analysis = Some(text);
                    tokio::time::sleep(STAGE_PAUSE).await;
                }
            }
            _ => debug!("no language data; skipping language analysis stage"),
        }

        if inputs.contributors.is_empty() {
            debug!("no contributor data; skipping contribution analysis stage");
        } else {
            let prompt = prompts::contribution_analysis(inputs.snapshot, inputs.contributors);
            if let Some(text) = self.run_stage("contribution analysis", &prompt).await {
                insights.contribution_analysis = Some(text);
            }
        }

        Ok(insights)
    }

    /// One stage: retry only on a rate-limit signal, then give up quietly.
    async fn run_stage(&self, stage: &str, prompt: &str) -> Option<String> {
        for attempt in 1..=MAX_STAGE_ATTEMPTS {
            match self.generator.generate(prompt).await {
                Ok(text) => {
                    info!("generated {stage}");
                    return Some(text);
                }
                Err(err) if err.is_rate_limit() && attempt < MAX_STAGE_ATTEMPTS => {
                    let delay = stage_backoff(attempt);
                    warn!(
                        "rate limited during {stage} (attempt {attempt}/{MAX_STAGE_ATTEMPTS}); retrying in {delay:?}"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => {
                    warn!("failed to generate {stage}: {err}");
                    return None;
                }
            }
        }
        warn!("{stage} still rate limited after {MAX_STAGE_ATTEMPTS} attempts; omitting");
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::types::sample_snapshot;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Pops one scripted response per call and records the prompts it saw.
    struct ScriptedGenerator {
        responses: Mutex<VecDeque<Result<String>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedGenerator {
        fn new(responses: Vec<Result<String>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }

        fn prompt(&self, index: usize) -> String {
            self.prompts.lock().unwrap()[index].clone()
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        async fn generate(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(Error::Generation("script exhausted".into())))
        }
    }

    fn rate_limited() -> Result<String> {
        Err(Error::RateLimited("429: too many requests".into()))
    }

    fn languages() -> LanguageBreakdown {
        [("JavaScript".to_string(), 800), ("CSS".to_string(), 200)]
            .into_iter()
            .collect()
    }

    fn contributors() -> Vec<Contributor> {
        vec![
            Contributor {
                login: "alice".to_string(),
                contributions: 90,
            },
            Contributor {
                login: "bob".to_string(),
                contributions: 10,
            },
        ]
    }

    #[tokio::test(start_paused = true)]
    async fn all_stages_populate_when_generation_succeeds() {
        let generator = ScriptedGenerator::new(vec![
            Ok("summary text".to_string()),
            Ok("language text".to_string()),
            Ok("contribution text".to_string()),
        ]);
        let snapshot = sample_snapshot();
        let languages = languages();
        let contributors = contributors();
        let sequencer = InsightSequencer::new(generator);

        let insights = sequencer
            .run(InsightInputs {
                snapshot: &snapshot,
                languages: Some(&languages),
                contributors: &contributors,
                readme: Some("# Demo"),
            })
            .await
            .unwrap();

        assert_eq!(insights.repository_summary.as_deref(), Some("summary text"));
        assert_eq!(insights.language_analysis.as_deref(), Some("language text"));
        assert_eq!(
            insights.contribution_analysis.as_deref(),
            Some("contribution text")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn empty_breakdown_skips_language_stage() {
        let generator = ScriptedGenerator::new(vec![
            Ok("summary text".to_string()),
            Ok("contribution text".to_string()),
        ]);
        let snapshot = sample_snapshot();
        let empty = LanguageBreakdown::default();
        let contributors = contributors();
        let sequencer = InsightSequencer::new(generator);

        let insights = sequencer
            .run(InsightInputs {
                snapshot: &snapshot,
                languages: Some(&empty),
                contributors: &contributors,
                readme: None,
            })
            .await
            .unwrap();

        assert!(insights.repository_summary.is_some());
        assert!(insights.language_analysis.is_none());
        assert!(insights.contribution_analysis.is_some());
        assert_eq!(sequencer.generator.calls(), 2);
        // the second call must be the contribution stage, not language
        assert!(
            sequencer
                .generator
                .prompt(1)
                .contains("collaboration and contribution patterns")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limited_stage_retries_transparently() {
        let generator = ScriptedGenerator::new(vec![
            rate_limited(),
            Ok("summary text".to_string()),
        ]);
        let snapshot = sample_snapshot();
        let sequencer = InsightSequencer::new(generator);

        let insights = sequencer
            .run(InsightInputs {
                snapshot: &snapshot,
                languages: None,
                contributors: &[],
                readme: None,
            })
            .await
            .unwrap();

        assert_eq!(insights.repository_summary.as_deref(), Some("summary text"));
        assert_eq!(sequencer.generator.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_stage_is_omitted_without_error() {
        let generator = ScriptedGenerator::new(vec![
            rate_limited(),
            rate_limited(),
            Ok("contribution text".to_string()),
        ]);
        let snapshot = sample_snapshot();
        let contributors = contributors();
        let sequencer = InsightSequencer::new(generator);

        let insights = sequencer
            .run(InsightInputs {
                snapshot: &snapshot,
                languages: None,
                contributors: &contributors,
                readme: None,
            })
            .await
            .unwrap();

        // stage 1 burned both attempts; stage 3 still ran
        assert!(insights.repository_summary.is_none());
        assert_eq!(
            insights.contribution_analysis.as_deref(),
            Some("contribution text")
        );
        assert_eq!(sequencer.generator.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn non_rate_limit_failure_does_not_retry() {
        let generator = ScriptedGenerator::new(vec![
            Err(Error::Generation("model not found".into())),
            Ok("contribution text".to_string()),
        ]);
        let snapshot = sample_snapshot();
        let contributors = contributors();
        let sequencer = InsightSequencer::new(generator);

        let insights = sequencer
            .run(InsightInputs {
                snapshot: &snapshot,
                languages: None,
                contributors: &contributors,
                readme: None,
            })
            .await
            .unwrap();

        assert!(insights.repository_summary.is_none());
        assert!(insights.contribution_analysis.is_some());
        assert_eq!(sequencer.generator.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn pauses_follow_only_successful_stages() {
        use tokio::time::Instant;

        // stage 1 fails outright, stages 2 and 3 succeed:
        // one pause after stage 2, none after the final stage
        let generator = ScriptedGenerator::new(vec![
            Err(Error::Generation("model not found".into())),
            Ok("language text".to_string()),
            Ok("contribution text".to_string()),
        ]);
        let snapshot = sample_snapshot();
        let languages = languages();
        let contributors = contributors();
        let sequencer = InsightSequencer::new(generator);

        let start = Instant::now();
        let insights = sequencer
            .run(InsightInputs {
                snapshot: &snapshot,
                languages: Some(&languages),
                contributors: &contributors,
                readme: None,
            })
            .await
            .unwrap();

        assert!(insights.language_analysis.is_some());
        assert_eq!(start.elapsed(), STAGE_PAUSE);
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limit_backoff_delays_by_schedule() {
        use tokio::time::Instant;

        let generator = ScriptedGenerator::new(vec![
            rate_limited(),
            Ok("summary text".to_string()),
        ]);
        let snapshot = sample_snapshot();
        let sequencer = InsightSequencer::new(generator);

        let start = Instant::now();
        sequencer
            .run(InsightInputs {
                snapshot: &snapshot,
                languages: None,
                contributors: &[],
                readme: None,
            })
            .await
            .unwrap();

        // 2s retry backoff plus the 1s post-success pause
        assert_eq!(start.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn message_content_counts_as_rate_limit_signal() {
        let generator = ScriptedGenerator::new(vec![
            Err(Error::Generation("you have exceeded your quota".into())),
            Ok("summary text".to_string()),
        ]);
        let snapshot = sample_snapshot();
        let sequencer = InsightSequencer::new(generator);

        let insights = sequencer
            .run(InsightInputs {
                snapshot: &snapshot,
                languages: None,
                contributors: &[],
                readme: None,
            })
            .await
            .unwrap();

        assert!(insights.repository_summary.is_some());
        assert_eq!(sequencer.generator.calls(), 2);
    }
}
