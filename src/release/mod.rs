//! Latest-release lookup against a GitHub-compatible registry.
//!
//! Every call issues a fresh request; nothing is cached. The only field the
//! updater depends on is `tag_name`, the tag the local checkout is compared
//! against and switched to.
//!
//! ```text
//! GET {base_url}/repos/{owner}/{name}/releases/latest
//! Accept: application/vnd.github+json
//! ```

use crate::config::RegistryConfig;
use crate::constants::{PENDING_RELEASE_AUTHOR, PENDING_RELEASE_SUMMARY};
use crate::core::{UpdateResult, UpdaterError};
use crate::git::RepositoryIdentity;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

const GITHUB_JSON: &str = "application/vnd.github+json";

/// Below this many remaining API calls a warning is logged.
const RATE_LIMIT_WARNING_THRESHOLD: u32 = 10;

/// One candidate update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseDescriptor {
    pub tag: String,
    pub author: String,
    pub summary: String,
}

impl ReleaseDescriptor {
    /// The descriptor reported for a pending update, where only the tag is authoritative.
    pub fn pending(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            author: PENDING_RELEASE_AUTHOR.to_string(),
            summary: PENDING_RELEASE_SUMMARY.to_string(),
        }
    }
}

/// HTTP client for the release registry.
#[derive(Debug, Clone)]
pub struct ReleaseClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ReleaseClient {
    /// Creates a client with default settings against `base_url`.
    pub fn new(base_url: impl Into<String>) -> UpdateResult<Self> {
        Self::from_config(&RegistryConfig {
            base_url: base_url.into(),
            ..RegistryConfig::default()
        })
    }

    pub fn from_config(config: &RegistryConfig) -> UpdateResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_JSON));

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| UpdaterError::ConfigError {
                message: format!("Failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone().filter(|t| !t.is_empty()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn latest_release_url(&self, identity: &RepositoryIdentity) -> String {
        format!(
            "{}/repos/{}/{}/releases/latest",
            self.base_url, identity.owner, identity.name
        )
    }

    /// Fetches the latest published release of `identity`.
    ///
    /// # Errors
    ///
    /// - [`UpdaterError::RegistryUnreachable`] on transport failure or timeout
    /// - [`UpdaterError::RegistryError`] on a non-success status
    /// - [`UpdaterError::MalformedResponse`] when the body is not JSON or has no usable `tag_name`
    pub async fn fetch_latest_release(
        &self,
        identity: &RepositoryIdentity,
    ) -> UpdateResult<ReleaseDescriptor> {
        let url = self.latest_release_url(identity);
        tracing::debug!(target: "release", "GET {}", url);

        let mut request = self.client.get(&url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let unreachable = |e: reqwest::Error| UpdaterError::RegistryUnreachable {
            url: url.clone(),
            reason: e.to_string(),
        };

        let response = request.send().await.map_err(unreachable)?;

        let remaining = response
            .headers()
            .get("x-ratelimit-remaining")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<u32>().ok());
        if let Some(remaining) = remaining.filter(|r| *r < RATE_LIMIT_WARNING_THRESHOLD) {
            tracing::warn!(target: "release", "Registry rate limit low: {} requests remaining", remaining);
        }

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!(target: "release", "Registry returned {}: {}", status, body.trim());
            return Err(UpdaterError::RegistryError {
                status_code: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        let body = response.text().await.map_err(unreachable)?;
        let descriptor = parse_release(&body)?;
        tracing::debug!(target: "release", "Latest release of {} is {}", identity, descriptor.tag);
        Ok(descriptor)
    }
}

fn parse_release(body: &str) -> UpdateResult<ReleaseDescriptor> {
    let malformed = |reason: String| UpdaterError::MalformedResponse { reason };

    let value: Value =
        serde_json::from_str(body).map_err(|e| malformed(format!("body is not JSON: {e}")))?;

    let tag = match value.get("tag_name") {
        None | Some(Value::Null) => return Err(malformed("missing `tag_name` field".to_string())),
        Some(Value::String(tag)) if tag.trim().is_empty() => {
            return Err(malformed("`tag_name` is empty".to_string()));
        }
        Some(Value::String(tag)) => tag.clone(),
        Some(other) => return Err(malformed(format!("`tag_name` is not a string: {other}"))),
    };

    let text = |pointer: &str| {
        value.pointer(pointer).and_then(Value::as_str).unwrap_or_default().to_string()
    };

    Ok(ReleaseDescriptor {
        tag,
        author: text("/author/login"),
        summary: text("/name"),
    })
}
