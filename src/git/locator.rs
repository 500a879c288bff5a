//! Canonical remote identity of the source checkout.
//!
//! The release registry is addressed by `owner/name`, which is recovered from
//! the URL of the canonical remote every time it is needed. Nothing is cached,
//! so a reconfigured remote is picked up on the next call.
//!
//! Normalization turns the accepted remote shapes into one HTTPS form:
//!
//! ```text
//! git@github.com:foo/bar.git            -> https://github.com/foo/bar
//! ssh://git@github.com/foo/bar.git      -> https://github.com/foo/bar
//! https://token@github.com/foo/bar.git  -> https://github.com/foo/bar
//! ```
//!
//! The path of the normalized URL must then have exactly two segments.

use super::GitRepo;
use crate::core::{UpdateResult, UpdaterError};
use crate::runner::{CommandRunner, Executor, SystemExecutor};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

/// `user@host:path`, the scp-like syntax git accepts for SSH remotes.
static SCP_REMOTE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9._-]+@([^:/\s]+):/?(.+)$").ok());

/// `ssh://[user@]host[:port]/path`
static SSH_URL_REMOTE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^ssh://(?:[^@/\s]+@)?([^:/\s]+)(?::\d+)?/(.+)$").ok());

/// Owner and name of a hosted repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepositoryIdentity {
    pub owner: String,
    pub name: String,
}

impl fmt::Display for RepositoryIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// A remote resolved to its browsable URL and identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedRemote {
    /// Normalized HTTPS URL without credentials or `.git` suffix.
    pub web_url: String,
    pub identity: RepositoryIdentity,
}

/// Rewrites a remote URL into HTTPS form without credentials, `.git` suffix or
/// trailing slash. URLs of unknown shape are returned trimmed but otherwise as-is.
pub fn normalize_remote_url(url: &str) -> String {
    let url = url.trim();

    let https = if let Some(caps) = SSH_URL_REMOTE.as_ref().and_then(|re| re.captures(url)) {
        format!("https://{}/{}", &caps[1], &caps[2])
    } else if let Some(caps) = SCP_REMOTE.as_ref().and_then(|re| re.captures(url)) {
        format!("https://{}/{}", &caps[1], &caps[2])
    } else {
        strip_auth_from_url(url)
    };

    let trimmed = https.trim_end_matches('/');
    trimmed.strip_suffix(".git").unwrap_or(trimmed).to_string()
}

/// Removes `user[:password]@` from an HTTP(S) URL.
fn strip_auth_from_url(url: &str) -> String {
    for scheme in ["https://", "http://"] {
        if let Some(rest) = url.strip_prefix(scheme) {
            let authority_end = rest.find('/').unwrap_or(rest.len());
            if let Some(at_pos) = rest[..authority_end].rfind('@') {
                return format!("{scheme}{}", &rest[at_pos + 1..]);
            }
        }
    }
    url.to_string()
}

/// Parses the identity out of any accepted remote URL.
///
/// # Errors
///
/// [`UpdaterError::UnrecognizedRemoteFormat`] when the URL is neither SSH nor
/// HTTPS shaped, or its path does not have exactly two segments.
pub fn parse_remote_identity(url: &str) -> UpdateResult<RepositoryIdentity> {
    resolve_url(url).map(|resolved| resolved.identity)
}

fn resolve_url(url: &str) -> UpdateResult<ResolvedRemote> {
    let unrecognized = |reason: &str| UpdaterError::UnrecognizedRemoteFormat {
        url: strip_auth_from_url(url.trim()),
        reason: reason.to_string(),
    };

    let web_url = normalize_remote_url(url);
    let rest = web_url
        .strip_prefix("https://")
        .or_else(|| web_url.strip_prefix("http://"))
        .ok_or_else(|| unrecognized("expected an SSH or HTTPS remote URL"))?;

    let (host, path) = rest
        .split_once('/')
        .ok_or_else(|| unrecognized("URL has no repository path"))?;
    if host.is_empty() {
        return Err(unrecognized("URL has no host"));
    }

    let segments: Vec<&str> = path.split('/').collect();
    match segments.as_slice() {
        [owner, name] if !owner.is_empty() && !name.is_empty() => Ok(ResolvedRemote {
            identity: RepositoryIdentity {
                owner: (*owner).to_string(),
                name: (*name).to_string(),
            },
            web_url: web_url.clone(),
        }),
        _ => Err(unrecognized(&format!(
            "expected exactly two path segments (owner/name), found {}",
            segments.iter().filter(|s| !s.is_empty()).count()
        ))),
    }
}

/// Resolves the canonical remote of the source checkout.
pub struct RepoLocator<E = SystemExecutor> {
    repo: GitRepo<E>,
    remote: String,
}

impl<E> Clone for RepoLocator<E> {
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            remote: self.remote.clone(),
        }
    }
}

impl<E: Executor> RepoLocator<E> {
    pub fn new(runner: CommandRunner<E>, remote: impl Into<String>) -> Self {
        Self {
            repo: GitRepo::new(runner),
            remote: remote.into(),
        }
    }

    pub fn remote_name(&self) -> &str {
        &self.remote
    }

    /// Reads the remote URL and resolves it.
    ///
    /// # Errors
    ///
    /// [`UpdaterError::NoRemoteConfigured`], [`UpdaterError::UnrecognizedRemoteFormat`],
    /// or [`UpdaterError::CommandFailed`] from git itself.
    pub async fn resolve_remote(&self) -> UpdateResult<ResolvedRemote> {
        let url = self.repo.remote_url(&self.remote).await?;
        let resolved = resolve_url(&url)?;
        tracing::debug!(
            target: "upgrade",
            "Remote '{}' resolves to {}",
            self.remote,
            resolved.identity
        );
        Ok(resolved)
    }

    pub async fn resolve_remote_identity(&self) -> UpdateResult<RepositoryIdentity> {
        Ok(self.resolve_remote().await?.identity)
    }
}
