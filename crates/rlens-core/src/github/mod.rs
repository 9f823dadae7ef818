//! GitHub REST API client.
//!
//! Wire-level access to the repository metadata endpoints. Request and
//! response shapes mirror the provider field-for-field; the partial-failure
//! policy (what is fatal, what merely degrades) lives in the orchestrator.

pub mod activity;

use std::time::Duration;

use base64::Engine;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

use crate::config::GithubConfig;
use crate::error::{Error, Result};
use crate::types::{CommitActivityWeek, Contributor, LanguageBreakdown, RepoDescriptor, RepoSnapshot};

const GITHUB_ACCEPT: &str = "application/vnd.github.v3+json";
const USER_AGENT: &str = concat!("rlens/", env!("CARGO_PKG_VERSION"));

/// Client for the repository metadata service.
#[derive(Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

/// One probe of the commit-activity endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivityProbe {
    /// The weekly series is computed and available.
    Ready(Vec<CommitActivityWeek>),
    /// The server is still computing the stats; retry later, honoring the
    /// hint when one was provided.
    Processing { retry_after: Option<Duration> },
}

impl GitHubClient {
    pub fn new(config: &GithubConfig) -> Result<Self> {
        let http = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            http,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        let mut req = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .header(reqwest::header::ACCEPT, GITHUB_ACCEPT);
        if let Some(ref token) = self.token {
            req = req.header(reqwest::header::AUTHORIZATION, format!("token {token}"));
        }
        req
    }

    /// `GET /repos/{owner}/{repo}`
    ///
    /// The one lookup whose failure aborts a whole search; every error path
    /// surfaces as [`Error::RepositoryLookup`].
    pub async fn get_repository(&self, descriptor: &RepoDescriptor) -> Result<RepoSnapshot> {
        debug!("fetching repository {}", descriptor);
        let lookup_err = |message: String| Error::RepositoryLookup {
            owner: descriptor.owner.clone(),
            repo: descriptor.repo.clone(),
            message,
        };

        let resp = self
            .get(&format!("/repos/{}/{}", descriptor.owner, descriptor.repo))
            .send()
            .await
            .map_err(|e| lookup_err(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            let detail = api_error_message(resp).await;
            return Err(lookup_err(format!("{status}: {detail}")));
        }
        resp.json().await.map_err(|e| lookup_err(e.to_string()))
    }

    /// `GET /repos/{owner}/{repo}/languages`
    pub async fn get_languages(&self, descriptor: &RepoDescriptor) -> Result<LanguageBreakdown> {
        debug!("fetching languages for {}", descriptor);
        let resp = self
            .get(&format!(
                "/repos/{}/{}/languages",
                descriptor.owner, descriptor.repo
            ))
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let detail = api_error_message(resp).await;
            return Err(Error::Decode(format!("languages lookup {status}: {detail}")));
        }
        Ok(resp.json().await?)
    }

    /// `GET /repos/{owner}/{repo}/contributors`
    ///
    /// A non-array body (the service answers 204 with no body for empty
    /// repositories) decodes as an empty list.
    pub async fn get_contributors(&self, descriptor: &RepoDescriptor) -> Result<Vec<Contributor>> {
        debug!("fetching contributors for {}", descriptor);
        let resp = self
            .get(&format!(
                "/repos/{}/{}/contributors",
                descriptor.owner, descriptor.repo
            ))
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let detail = api_error_message(resp).await;
            return Err(Error::Decode(format!(
                "contributors lookup {status}: {detail}"
            )));
        }
        let body = resp.text().await?;
        Ok(parse_contributors(&body))
    }

    /// `GET /repos/{owner}/{repo}/readme`
    ///
    /// Returns the decoded README text. The payload carries newline-wrapped
    /// base64 in its `content` field.
    pub async fn get_readme(&self, descriptor: &RepoDescriptor) -> Result<String> {
        debug!("fetching README for {}", descriptor);
        #[derive(Deserialize)]
        struct ReadmeResponse {
            content: String,
        }

        let resp = self
            .get(&format!(
                "/repos/{}/{}/readme",
                descriptor.owner, descriptor.repo
            ))
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let detail = api_error_message(resp).await;
            return Err(Error::Decode(format!("readme lookup {status}: {detail}")));
        }
        let payload: ReadmeResponse = resp.json().await?;
        decode_readme_content(&payload.content)
    }

    /// `GET /repos/{owner}/{repo}/stats/commit_activity`
    ///
    /// Issues a single probe. HTTP status is never treated as failure here:
    /// any response whose body is not a JSON array of weeks counts as
    /// "still computing" (202, null or empty body, object body). Only
    /// transport failures return an error; the poller decides what to do
    /// with either outcome.
    pub async fn probe_commit_activity(&self, descriptor: &RepoDescriptor) -> Result<ActivityProbe> {
        debug!("probing commit activity for {}", descriptor);
        let resp = self
            .get(&format!(
                "/repos/{}/{}/stats/commit_activity",
                descriptor.owner, descriptor.repo
            ))
            .send()
            .await?;
        let status = resp.status();
        let retry_after = resp
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs);
        let body = resp.text().await?;
        Ok(classify_activity_body(status, retry_after, &body))
    }
}

/// Extract the provider's `{"message": "..."}` error detail, if any.
async fn api_error_message(resp: reqwest::Response) -> String {
    #[derive(Deserialize)]
    struct ApiError {
        message: String,
    }
    match resp.json::<ApiError>().await {
        Ok(err) => err.message,
        Err(_) => "no error detail".to_string(),
    }
}

/// Decide whether a commit-activity response is the final series or a
/// "still computing" signal.
///
/// Detection is deliberately permissive: an explicit 202, a null or empty
/// body, and any non-array body all count as processing. The provider's
/// behavior across repository ages is not fully specified, so this must
/// not be narrowed.
pub(crate) fn classify_activity_body(
    status: StatusCode,
    retry_after: Option<Duration>,
    body: &str,
) -> ActivityProbe {
    if status == StatusCode::ACCEPTED {
        return ActivityProbe::Processing { retry_after };
    }
    match serde_json::from_str::<Vec<CommitActivityWeek>>(body) {
        Ok(weeks) => ActivityProbe::Ready(weeks),
        Err(_) => ActivityProbe::Processing { retry_after },
    }
}

/// Contributor payloads decode leniently: anything that is not an array of
/// contributor records yields an empty list.
pub(crate) fn parse_contributors(body: &str) -> Vec<Contributor> {
    serde_json::from_str(body).unwrap_or_default()
}

/// Decode the base64 `content` field of a readme payload. The service wraps
/// the encoding with newlines, which strict decoders reject, so whitespace
/// is stripped first.
pub(crate) fn decode_readme_content(content: &str) -> Result<String> {
    let compact: String = content.split_whitespace().collect();
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(compact)
        .map_err(|e| Error::Decode(format!("invalid base64 README payload: {e}")))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
