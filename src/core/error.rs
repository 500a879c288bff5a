//! Error handling for tagsync
//!
//! The updater distinguishes two layers of errors:
//! 1. [`UpdaterError`] - the strongly-typed taxonomy returned by every core operation
//!    (runner, locator, release client, controller)
//! 2. [`ErrorContext`] - a wrapper that adds user-facing details and suggestions for the CLI
//!
//! Core errors are never retried, wrapped, or downgraded on their way up. A registry failure
//! surfaces as a registry failure, never as "up to date". The CLI converts whatever reaches it
//! with [`user_friendly_error`].
//!
//! # Examples
//!
//! ```rust,no_run
//! use tagsync::core::{UpdaterError, user_friendly_error};
//!
//! let error = UpdaterError::RegistryError {
//!     status_code: 404,
//!     status_text: "Not Found".to_string(),
//! };
//! let ctx = user_friendly_error(anyhow::Error::from(error));
//! ctx.display(); // colored error with suggestion
//! ```

use colored::Colorize;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Result alias used by all core operations.
pub type UpdateResult<T> = std::result::Result<T, UpdaterError>;

/// How a failed subprocess ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ExitInfo {
    /// The process ran and exited with a non-zero code.
    Code(i32),
    /// The process was terminated without an exit code (e.g. by a signal).
    Signal,
    /// The process could not be started at all.
    SpawnFailed(String),
}

impl fmt::Display for ExitInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Code(code) => write!(f, "exit code {code}"),
            Self::Signal => write!(f, "terminated by signal"),
            Self::SpawnFailed(reason) => write!(f, "could not be started: {reason}"),
        }
    }
}

/// Every failure the updater core can report.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UpdaterError {
    /// A subprocess exited non-zero or could not be spawned.
    #[error("Command `{tool} {}` failed: {exit_info}", .args.join(" "))]
    CommandFailed {
        tool: String,
        args: Vec<String>,
        exit_info: ExitInfo,
        stderr: String,
    },

    /// The canonical remote is not configured in the local repository.
    #[error("No remote named '{remote}' is configured")]
    NoRemoteConfigured { remote: String },

    /// The remote URL is neither SSH nor HTTPS shaped, or has the wrong number of path segments.
    #[error("Unrecognized remote URL '{url}': {reason}")]
    UnrecognizedRemoteFormat { url: String, reason: String },

    /// The release registry could not be reached.
    #[error("Release registry unreachable at {url}: {reason}")]
    RegistryUnreachable { url: String, reason: String },

    /// The release registry answered with a non-success status.
    #[error("Release registry returned {status_code} {status_text}")]
    RegistryError { status_code: u16, status_text: String },

    /// The release registry answered successfully but without a usable tag.
    #[error("Malformed release registry response: {reason}")]
    MalformedResponse { reason: String },

    /// Another check, update, or build is already running on this repository.
    #[error("An update operation is already in progress for {path}")]
    UpdateInProgress { path: String },

    /// No version-controlled source root could be located.
    #[error("No source checkout found above {start}")]
    SourceRootNotFound { start: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// The cross-process repository lock could not be taken.
    #[error("Failed to lock {path}: {reason}")]
    LockFailed { path: String, reason: String },

    /// A panic or task failure caught at the presentation boundary.
    #[error("Internal error: {message}")]
    Internal { message: String },

    /// Foreign error surfaced only for display purposes.
    #[error("{message}")]
    Other { message: String },
}

impl UpdaterError {
    /// Stable snake_case identifier matching the serialized `kind` tag.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::CommandFailed { .. } => "command_failed",
            Self::NoRemoteConfigured { .. } => "no_remote_configured",
            Self::UnrecognizedRemoteFormat { .. } => "unrecognized_remote_format",
            Self::RegistryUnreachable { .. } => "registry_unreachable",
            Self::RegistryError { .. } => "registry_error",
            Self::MalformedResponse { .. } => "malformed_response",
            Self::UpdateInProgress { .. } => "update_in_progress",
            Self::SourceRootNotFound { .. } => "source_root_not_found",
            Self::ConfigError { .. } => "config_error",
            Self::LockFailed { .. } => "lock_failed",
            Self::Internal { .. } => "internal",
            Self::Other { .. } => "other",
        }
    }
}

/// An [`UpdaterError`] together with optional details and a suggested fix.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error.
    pub error: UpdaterError,
    /// Actionable advice for the user.
    pub suggestion: Option<String>,
    /// Additional explanation of what went wrong.
    pub details: Option<String>,
}

impl ErrorContext {
    #[must_use]
    pub const fn new(error: UpdaterError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error to stderr with terminal colors.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error into an [`ErrorContext`] with a suggestion where one is known.
///
/// Errors that wrap an [`UpdaterError`] anywhere in their chain get a tailored
/// message; everything else is rendered with its full context chain.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(updater_error) = error.chain().find_map(|e| e.downcast_ref::<UpdaterError>()) {
        return create_error_context(updater_error.clone());
    }

    ErrorContext::new(UpdaterError::Other {
        message: format!("{error:#}"),
    })
}

fn create_error_context(error: UpdaterError) -> ErrorContext {
    match &error {
        UpdaterError::CommandFailed {
            tool,
            exit_info: ExitInfo::SpawnFailed(_),
            ..
        } => {
            let suggestion = format!(
                "Install '{tool}' and make sure it is on PATH. Inside a Flatpak sandbox the tool must be installed on the host"
            );
            ErrorContext::new(error).with_suggestion(suggestion)
        }

        UpdaterError::CommandFailed { stderr, .. } => {
            let details = stderr.trim().to_string();
            let ctx = ErrorContext::new(error).with_suggestion(
                "Run the command manually inside the source checkout to see the full output",
            );
            if details.is_empty() {
                ctx
            } else {
                ctx.with_details(details)
            }
        }

        UpdaterError::NoRemoteConfigured { remote } => {
            let suggestion =
                format!("Add the remote with 'git remote add {remote} <url>' or set 'remote' in the config file");
            ErrorContext::new(error).with_suggestion(suggestion)
        }

        UpdaterError::UnrecognizedRemoteFormat { .. } => ErrorContext::new(error)
            .with_suggestion("The remote must look like https://host/owner/repo or git@host:owner/repo")
            .with_details("Only SSH and HTTPS remotes with exactly an owner and a repository name are supported"),

        UpdaterError::RegistryUnreachable { .. } => ErrorContext::new(error)
            .with_suggestion("Check your internet connection and the registry base_url in the config file"),

        UpdaterError::RegistryError { status_code: 404, .. } => ErrorContext::new(error)
            .with_suggestion("Make sure the repository exists and has at least one published release")
            .with_details("The registry reports no latest release for this repository"),

        UpdaterError::RegistryError {
            status_code: 401 | 403,
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Set registry.token in the config file to authenticate and raise the rate limit"),

        UpdaterError::RegistryError { .. } => ErrorContext::new(error)
            .with_suggestion("The registry may be temporarily unavailable. Try again later"),

        UpdaterError::MalformedResponse { .. } => ErrorContext::new(error)
            .with_details("The latest release has no 'tag_name' field"),

        UpdaterError::UpdateInProgress { .. } => ErrorContext::new(error)
            .with_suggestion("Wait for the running update to finish and try again"),

        UpdaterError::SourceRootNotFound { .. } => ErrorContext::new(error)
            .with_suggestion("Pass --source-root or set 'source_root' in the config file"),

        UpdaterError::LockFailed { .. } => ErrorContext::new(error)
            .with_suggestion("Check that the lock directory is writable or set 'sandbox.lock_dir'"),

        UpdaterError::ConfigError { .. }
        | UpdaterError::Internal { .. }
        | UpdaterError::Other { .. } => ErrorContext::new(error),
    }
}
