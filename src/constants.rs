//! Fixed values shared across the updater.

/// Name of the version-control tool invoked through the runner.
pub const GIT_TOOL: &str = "git";

/// Remote whose URL identifies the upstream repository.
pub const DEFAULT_REMOTE: &str = "origin";

/// Base URL of the release registry API.
pub const DEFAULT_REGISTRY_URL: &str = "https://api.github.com";

/// Seconds before a registry request is abandoned.
pub const DEFAULT_REGISTRY_TIMEOUT_SECS: u64 = 30;

/// Program used to run host tools from inside a Flatpak sandbox.
pub const DEFAULT_SANDBOX_LAUNCHER: &str = "flatpak-spawn";

/// Environment variable Flatpak sets inside every sandboxed process.
pub const SANDBOX_MARKER_VAR: &str = "FLATPAK_ID";

/// Build entry point, relative to the source root.
pub const DEFAULT_BUILD_PROGRAM: &str = "node";
pub const DEFAULT_BUILD_SCRIPT: &str = "scripts/build/build.mjs";
pub const DEFAULT_DEV_FLAG: &str = "--dev";

/// Text the switch prints when the working tree moved to a release commit.
pub const DEFAULT_SWITCH_CHANGED_MARKER: &str = "Updated build";

/// Text the build tool prints to stderr when it failed logically.
pub const DEFAULT_BUILD_FAILED_MARKER: &str = "Build failed";

/// Author and summary reported for a pending release.
pub const PENDING_RELEASE_AUTHOR: &str = "Actions";
pub const PENDING_RELEASE_SUMMARY: &str = "Latest release";

/// Whether this binary was built in development mode; adds the build dev flag.
pub const IS_DEV_BUILD: bool = cfg!(debug_assertions);

/// Environment variable overriding the config file location.
pub const CONFIG_PATH_ENV: &str = "TAGSYNC_CONFIG_PATH";

/// Environment variable that hides progress spinners.
pub const NO_PROGRESS_ENV: &str = "TAGSYNC_NO_PROGRESS";

/// Directory prepended to `PATH` for subprocesses on macOS.
pub const MACOS_EXTRA_PATH: &str = "/usr/local/bin";
