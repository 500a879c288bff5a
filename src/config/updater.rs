//! The updater configuration file.
//!
//! Every field has a default, so a missing file simply means defaults.
//!
//! ```toml
//! # Overrides discovery from the executable location
//! source_root = "~/src/app"
//! remote = "origin"
//!
//! [registry]
//! base_url = "https://api.github.com"
//! token = "ghp_xxxxxxxxxxxx"
//! timeout_secs = 30
//!
//! [build]
//! program = "node"
//! args = ["scripts/build/build.mjs"]
//! dev_flag = "--dev"
//!
//! [markers]
//! switch_changed = "Updated build"
//! build_failed = "Build failed"
//!
//! [sandbox]
//! launcher = "flatpak-spawn"
//! lock_dir = "$XDG_RUNTIME_DIR/tagsync"
//! ```

use crate::constants::{
    CONFIG_PATH_ENV, DEFAULT_BUILD_FAILED_MARKER, DEFAULT_BUILD_PROGRAM, DEFAULT_BUILD_SCRIPT,
    DEFAULT_DEV_FLAG, DEFAULT_REGISTRY_TIMEOUT_SECS, DEFAULT_REGISTRY_URL, DEFAULT_REMOTE,
    DEFAULT_SANDBOX_LAUNCHER, DEFAULT_SWITCH_CHANGED_MARKER,
};
use crate::upgrade::OutputMarkers;
use crate::utils::platform::{get_home_dir, resolve_path};
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdaterConfig {
    /// Source checkout to update; discovered from the executable when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_root: Option<String>,

    /// Remote whose URL identifies the upstream repository.
    pub remote: String,

    pub registry: RegistryConfig,
    pub build: BuildConfig,
    pub markers: MarkerConfig,
    pub sandbox: SandboxConfig,
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            source_root: None,
            remote: DEFAULT_REMOTE.to_string(),
            registry: RegistryConfig::default(),
            build: BuildConfig::default(),
            markers: MarkerConfig::default(),
            sandbox: SandboxConfig::default(),
        }
    }
}

/// Release registry access.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub base_url: String,

    /// Bearer token, needed for private repositories and higher rate limits.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    pub timeout_secs: u64,

    pub user_agent: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_REGISTRY_URL.to_string(),
            token: None,
            timeout_secs: DEFAULT_REGISTRY_TIMEOUT_SECS,
            user_agent: concat!("tagsync/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// The external build entry point, run from the source root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    pub program: String,
    pub args: Vec<String>,
    /// Appended to `args` for development builds.
    pub dev_flag: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            program: DEFAULT_BUILD_PROGRAM.to_string(),
            args: vec![DEFAULT_BUILD_SCRIPT.to_string()],
            dev_flag: DEFAULT_DEV_FLAG.to_string(),
        }
    }
}

impl BuildConfig {
    /// Arguments for one build run.
    pub fn argv(&self, dev: bool) -> Vec<String> {
        let mut argv = self.args.clone();
        if dev && !self.dev_flag.is_empty() {
            argv.push(self.dev_flag.clone());
        }
        argv
    }
}

/// Output text that signals a result the exit code does not carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerConfig {
    pub switch_changed: String,
    pub build_failed: String,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            switch_changed: DEFAULT_SWITCH_CHANGED_MARKER.to_string(),
            build_failed: DEFAULT_BUILD_FAILED_MARKER.to_string(),
        }
    }
}

impl From<&MarkerConfig> for OutputMarkers {
    fn from(config: &MarkerConfig) -> Self {
        Self::new(config.switch_changed.clone(), config.build_failed.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
    pub launcher: String,

    /// Directory for cross-process lock files.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lock_dir: Option<String>,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            launcher: DEFAULT_SANDBOX_LAUNCHER.to_string(),
            lock_dir: None,
        }
    }
}

/// `<cache dir>/tagsync/locks`, or under the temp directory when there is no cache dir.
pub fn default_lock_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("tagsync")
        .join("locks")
}

impl UpdaterConfig {
    /// Loads the configuration from `path`, `TAGSYNC_CONFIG_PATH`, or the default location.
    ///
    /// An explicitly named file must exist; a missing default file yields defaults.
    pub async fn load_with_optional(path: Option<PathBuf>) -> Result<Self> {
        let explicit = path.or_else(|| {
            std::env::var(CONFIG_PATH_ENV).ok().filter(|p| !p.is_empty()).map(PathBuf::from)
        });

        if let Some(path) = explicit {
            if !path.exists() {
                bail!("Config file not found: {}", path.display());
            }
            return Self::load_from(&path).await;
        }

        let path = Self::default_path()?;
        if path.exists() {
            Self::load_from(&path).await
        } else {
            tracing::debug!("No config file at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid config in {}", path.display()))?;
        Ok(config)
    }

    /// `~/.tagsync/config.toml`, or `%LOCALAPPDATA%\tagsync\config.toml` on Windows.
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = if cfg!(target_os = "windows") {
            dirs::data_local_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine local data directory"))?
                .join("tagsync")
        } else {
            get_home_dir()?.join(".tagsync")
        };

        Ok(config_dir.join("config.toml"))
    }

    pub fn validate(&self) -> Result<()> {
        if self.remote.trim().is_empty() {
            bail!("`remote` must not be empty");
        }
        if self.registry.base_url.trim().is_empty() {
            bail!("`registry.base_url` must not be empty");
        }
        if self.registry.timeout_secs == 0 {
            bail!("`registry.timeout_secs` must be greater than zero");
        }
        if self.build.program.trim().is_empty() {
            bail!("`build.program` must not be empty");
        }
        if self.markers.switch_changed.is_empty() || self.markers.build_failed.is_empty() {
            bail!("output markers must not be empty");
        }
        if self.sandbox.launcher.trim().is_empty() {
            bail!("`sandbox.launcher` must not be empty");
        }
        Ok(())
    }

    /// The configured source root with `~` and variables expanded.
    pub fn source_root_override(&self) -> Result<Option<PathBuf>> {
        self.source_root.as_deref().map(resolve_path).transpose()
    }

    /// Directory for lock files: configured, else `<cache dir>/tagsync/locks`.
    pub fn lock_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.sandbox.lock_dir {
            return resolve_path(dir);
        }
        Ok(default_lock_dir())
    }

    pub fn markers(&self) -> OutputMarkers {
        OutputMarkers::from(&self.markers)
    }
}
