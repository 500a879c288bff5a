//! Configuration for tagsync.
//!
//! A single optional TOML file (`~/.tagsync/config.toml` by default) tunes the
//! updater: which remote identifies the upstream, how the registry is reached,
//! how the application is rebuilt, and which output markers signal results.
//!
//! Lookup order:
//! 1. `--config <path>`
//! 2. `TAGSYNC_CONFIG_PATH`
//! 3. `~/.tagsync/config.toml` (`%LOCALAPPDATA%\tagsync\config.toml` on Windows)

mod updater;

pub use updater::{
    BuildConfig, MarkerConfig, RegistryConfig, SandboxConfig, UpdaterConfig, default_lock_dir,
};
