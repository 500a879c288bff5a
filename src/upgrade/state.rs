//! Lifecycle of one updater session.
//!
//! ```text
//! Unknown -> Checked{UpToDate | UpdateAvailable} -> Applying -> Applied{rebuild}
//! ```
//!
//! Nothing is persisted; a new process starts at [`UpdateState::Unknown`].

use crate::release::ReleaseDescriptor;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Result of comparing the local head with the latest release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "release", rename_all = "snake_case")]
pub enum CheckOutcome {
    UpToDate,
    UpdateAvailable(ReleaseDescriptor),
}

impl CheckOutcome {
    /// Pending updates as a list: empty, or the single latest release.
    pub fn updates(&self) -> Vec<ReleaseDescriptor> {
        match self {
            Self::UpToDate => Vec::new(),
            Self::UpdateAvailable(release) => vec![release.clone()],
        }
    }

    pub const fn is_update_available(&self) -> bool {
        matches!(self, Self::UpdateAvailable(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RebuildStatus {
    Succeeded,
    Failed,
}

impl RebuildStatus {
    pub const fn from_success(success: bool) -> Self {
        if success { Self::Succeeded } else { Self::Failed }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum UpdateState {
    /// No check has completed in this session, or the last apply failed.
    #[default]
    Unknown,
    Checked {
        local_head: String,
        outcome: CheckOutcome,
        checked_at: DateTime<Utc>,
    },
    /// A switch is in flight.
    Applying { since: DateTime<Utc> },
    Applied {
        tag: String,
        /// Whether the switch actually moved the working tree.
        changed: bool,
        rebuild: Option<RebuildStatus>,
    },
}

impl UpdateState {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Checked { .. } => "checked",
            Self::Applying { .. } => "applying",
            Self::Applied { .. } => "applied",
        }
    }

    pub const fn is_applying(&self) -> bool {
        matches!(self, Self::Applying { .. })
    }

    /// Tag of the last successful apply.
    pub fn applied_tag(&self) -> Option<&str> {
        match self {
            Self::Applied { tag, .. } => Some(tag),
            _ => None,
        }
    }
}
