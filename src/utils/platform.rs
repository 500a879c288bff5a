//! Platform detection and path helpers.
//!
//! The one piece of environment-awareness the updater has lives here:
//! [`ExecutionEnvironment`] decides, once at startup, whether host tools must be
//! launched through the sandbox escape launcher. The value is handed to
//! [`CommandRunner`](crate::runner::CommandRunner) and nothing else inspects it.

use crate::constants::{MACOS_EXTRA_PATH, SANDBOX_MARKER_VAR};
use crate::core::{UpdateResult, UpdaterError};
use anyhow::Result;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Where the updater process is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionEnvironment {
    /// Tools are spawned directly.
    Native,
    /// Tools are spawned on the host through the sandbox escape launcher.
    Sandboxed,
}

impl ExecutionEnvironment {
    /// Detect the environment of the current process.
    ///
    /// Call this once at startup and pass the result along; it reads the
    /// platform identifier and the Flatpak marker variable.
    #[must_use]
    pub fn detect() -> Self {
        let marker = std::env::var(SANDBOX_MARKER_VAR).ok();
        Self::detect_from(std::env::consts::OS, marker.as_deref())
    }

    /// Pure detection from a platform identifier and the sandbox marker value.
    ///
    /// Only Linux has the Flatpak sandbox; an empty marker counts as absent.
    #[must_use]
    pub fn detect_from(os: &str, sandbox_marker: Option<&str>) -> Self {
        match sandbox_marker {
            Some(id) if os == "linux" && !id.is_empty() => Self::Sandboxed,
            _ => Self::Native,
        }
    }

    #[must_use]
    pub const fn is_sandboxed(self) -> bool {
        matches!(self, Self::Sandboxed)
    }
}

impl fmt::Display for ExecutionEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native => write!(f, "native"),
            Self::Sandboxed => write!(f, "sandboxed"),
        }
    }
}

#[must_use]
pub const fn is_windows() -> bool {
    cfg!(windows)
}

#[must_use]
pub const fn is_macos() -> bool {
    cfg!(target_os = "macos")
}

/// Returns the user's home directory.
pub fn get_home_dir() -> Result<PathBuf> {
    dirs::home_dir().ok_or_else(|| {
        let platform_help = if is_windows() {
            "On Windows: Check that the USERPROFILE environment variable is set"
        } else {
            "On Unix/Linux: Check that the HOME environment variable is set"
        };
        anyhow::anyhow!("Could not determine home directory.\n\n{platform_help}")
    })
}

/// Expands `~` and environment variables in a configured path.
///
/// ```rust,no_run
/// use tagsync::utils::platform::resolve_path;
///
/// let root = resolve_path("~/src/app")?;
/// let locks = resolve_path("$XDG_RUNTIME_DIR/tagsync")?;
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn resolve_path(path: &str) -> Result<PathBuf> {
    let expanded = shellexpand::full(path)
        .map_err(|e| anyhow::anyhow!("Failed to expand path '{path}': {e}"))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

/// Finds the checkout that contains `start`.
///
/// Walks up from `start` (inclusive) and returns the first directory holding a
/// `.git` entry. Both directories and `.git` files (worktrees, submodules) count.
pub fn discover_source_root(start: &Path) -> UpdateResult<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(".git").exists())
        .map(Path::to_path_buf)
        .ok_or_else(|| UpdaterError::SourceRootNotFound {
            start: start.display().to_string(),
        })
}

/// Finds the checkout the running binary was built from.
///
/// Resolution is relative to the executable, never to the current directory,
/// so the updater behaves the same wherever it is launched from.
pub fn source_root_from_executable() -> UpdateResult<PathBuf> {
    let exe = std::env::current_exe().map_err(|e| UpdaterError::SourceRootNotFound {
        start: format!("<current executable: {e}>"),
    })?;
    // Follow symlinks so an installed link points back into the checkout
    let exe = std::fs::canonicalize(&exe).unwrap_or(exe);
    let exe_dir = exe.parent().unwrap_or(&exe);
    discover_source_root(exe_dir)
}

/// `PATH` value to give subprocesses, if it must differ from ours.
///
/// GUI-launched processes on macOS do not inherit `/usr/local/bin`, where git
/// and node usually live.
#[must_use]
pub fn host_path_override() -> Option<String> {
    if !is_macos() {
        return None;
    }
    let current = std::env::var("PATH").unwrap_or_default();
    Some(prepend_path_entry(MACOS_EXTRA_PATH, &current))
}

fn prepend_path_entry(entry: &str, path: &str) -> String {
    if path.is_empty() {
        entry.to_string()
    } else {
        format!("{entry}:{path}")
    }
}
