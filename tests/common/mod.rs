//! Common fixtures for tagsync integration tests
//!
//! [`TestCheckout`] builds a real upstream repository with two tagged releases
//! and a clone of it, detached at the older release. The clone's `upstream`
//! remote carries a GitHub-style URL so the locator resolves `acme/app`, while
//! `git fetch` keeps talking to the local `origin`.

// Not every helper is used by every test module
#![allow(dead_code)]

use anyhow::{Context, Result};
use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use tagsync::test_utils::TestGit;
use tempfile::TempDir;

pub const UPSTREAM_URL: &str = "https://github.com/acme/app.git";
pub const LATEST_PATH: &str = "/repos/acme/app/releases/latest";

pub struct TestCheckout {
    _temp_dir: TempDir,
    upstream: TestGit,
    checkout: TestGit,
    lock_dir: PathBuf,
    config_path: PathBuf,
}

impl TestCheckout {
    /// Creates `v1.0.0` and `v2.0.0` upstream and a clone detached at `v1.0.0`.
    ///
    /// The `v2.0.0` commit message is `Updated build`, the text a real switch
    /// to it reports.
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let upstream_path = temp_dir.path().join("upstream");
        let checkout_path = temp_dir.path().join("checkout");
        let lock_dir = temp_dir.path().join("locks");
        let config_path = temp_dir.path().join("config.toml");

        let upstream = TestGit::new(&upstream_path);
        upstream.init()?;
        upstream.config_user()?;
        upstream.commit_file("VERSION", "1.0.0\n", "Initial release")?;
        upstream.tag("v1.0.0")?;
        upstream.commit_file("VERSION", "2.0.0\n", "Updated build")?;
        upstream.tag("v2.0.0")?;

        let checkout = TestGit::clone_from(&upstream_path, &checkout_path)?;
        checkout.remote_add("upstream", UPSTREAM_URL)?;
        checkout.detach_at("v1.0.0")?;

        Ok(Self {
            _temp_dir: temp_dir,
            upstream,
            checkout,
            lock_dir,
            config_path,
        })
    }

    pub fn upstream(&self) -> &TestGit {
        &self.upstream
    }

    pub fn checkout(&self) -> &TestGit {
        &self.checkout
    }

    pub fn path(&self) -> &Path {
        self.checkout.repo_path()
    }

    pub fn lock_dir(&self) -> &Path {
        &self.lock_dir
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Writes a config that targets `registry_url` and runs `build_script` with `sh -c`.
    pub fn write_config(&self, registry_url: &str, build_script: &str) -> Result<()> {
        let content = format!(
            r#"remote = "upstream"

[registry]
base_url = "{registry_url}"
timeout_secs = 5

[build]
program = "sh"
args = ["-c", {script}]

[sandbox]
lock_dir = {lock_dir}
"#,
            script = toml_string(build_script),
            lock_dir = toml_string(&self.lock_dir.display().to_string()),
        );
        fs::write(&self.config_path, content).context("Failed to write test config")
    }

    /// Runs the tagsync binary against this checkout with the written config.
    pub fn run_tagsync(&self, args: &[&str]) -> Result<CommandOutput> {
        let output = Command::cargo_bin("tagsync")?
            .arg("--config")
            .arg(&self.config_path)
            .arg("--source-root")
            .arg(self.path())
            .arg("--no-progress")
            .args(args)
            .env_remove("FLATPAK_ID")
            .env_remove("RUST_LOG")
            .env_remove("TAGSYNC_CONFIG_PATH")
            .env("LC_ALL", "C")
            .output()?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
            code: output.status.code(),
        })
    }
}

fn toml_string(value: &str) -> String {
    toml::Value::String(value.to_string()).to_string()
}

/// Command output helper
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
    pub code: Option<i32>,
}

impl CommandOutput {
    pub fn assert_success(&self) -> &Self {
        assert!(
            self.success,
            "Command failed with code {:?}\nStdout: {}\nStderr: {}",
            self.code, self.stdout, self.stderr
        );
        self
    }

    pub fn assert_failure(&self) -> &Self {
        assert!(
            !self.success,
            "Command unexpectedly succeeded\nStdout: {}",
            self.stdout
        );
        self
    }

    pub fn assert_stdout_contains(&self, text: &str) -> &Self {
        assert!(
            self.stdout.contains(text),
            "Expected stdout to contain '{}'\nActual stdout: {}",
            text,
            self.stdout
        );
        self
    }

    pub fn assert_stderr_contains(&self, text: &str) -> &Self {
        assert!(
            self.stderr.contains(text),
            "Expected stderr to contain '{}'\nActual stderr: {}",
            text,
            self.stderr
        );
        self
    }

    /// Parses stdout as one JSON document.
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.stdout)
            .unwrap_or_else(|e| panic!("stdout is not JSON ({e}): {}", self.stdout))
    }
}
