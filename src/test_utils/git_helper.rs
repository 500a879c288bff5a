//! Git test helper utilities
//!
//! Thin synchronous wrapper around the real `git` binary for building
//! fixture repositories in temporary directories.

use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};
use std::process::Command;

pub struct TestGit {
    repo_path: PathBuf,
}

impl TestGit {
    fn run_git_command(&self, args: &[&str], action: &str) -> Result<std::process::Output> {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.repo_path)
            .output()
            .with_context(|| action.to_string())?;

        if !output.status.success() {
            bail!("{} failed: {}", action, String::from_utf8_lossy(&output.stderr));
        }

        Ok(output)
    }

    pub fn new(repo_path: impl Into<PathBuf>) -> Self {
        Self {
            repo_path: repo_path.into(),
        }
    }

    /// Clones `source` into `target` and returns a helper for the clone.
    pub fn clone_from(source: &Path, target: &Path) -> Result<Self> {
        let output = Command::new("git")
            .args(["clone", "--quiet"])
            .arg(source)
            .arg(target)
            .output()
            .context("Failed to run git clone")?;

        if !output.status.success() {
            bail!("git clone failed: {}", String::from_utf8_lossy(&output.stderr));
        }

        let clone = Self::new(target);
        clone.config_user()?;
        Ok(clone)
    }

    pub fn init(&self) -> Result<()> {
        std::fs::create_dir_all(&self.repo_path).context("Failed to create repository directory")?;
        self.run_git_command(&["init", "--quiet"], "Failed to initialize git repository")?;
        Ok(())
    }

    pub fn config_user(&self) -> Result<()> {
        self.run_git_command(
            &["config", "user.email", "test@tagsync.example"],
            "Failed to configure git user email",
        )?;

        self.run_git_command(
            &["config", "user.name", "Test User"],
            "Failed to configure git user name",
        )?;
        Ok(())
    }

    pub fn add_all(&self) -> Result<()> {
        self.run_git_command(&["add", "."], "Failed to add files to git")?;
        Ok(())
    }

    pub fn commit(&self, message: &str) -> Result<()> {
        self.run_git_command(&["commit", "--quiet", "-m", message], "Failed to create git commit")?;
        Ok(())
    }

    /// Writes `file`, stages everything, and commits with `message`.
    pub fn commit_file(&self, file: &str, content: &str, message: &str) -> Result<()> {
        std::fs::write(self.repo_path.join(file), content)
            .with_context(|| format!("Failed to write {file}"))?;
        self.add_all()?;
        self.commit(message)
    }

    pub fn tag(&self, tag_name: &str) -> Result<()> {
        self.run_git_command(&["tag", tag_name], &format!("Failed to create tag: {}", tag_name))?;
        Ok(())
    }

    pub fn remote_add(&self, name: &str, url: &str) -> Result<()> {
        self.run_git_command(
            &["remote", "add", name, url],
            &format!("Failed to add remote: {}", name),
        )?;
        Ok(())
    }

    /// Detaches HEAD at `reference`.
    pub fn detach_at(&self, reference: &str) -> Result<()> {
        self.run_git_command(
            &["switch", "--quiet", "--detach", reference],
            &format!("Failed to detach at {reference}"),
        )?;
        Ok(())
    }

    pub fn rev_parse(&self, reference: &str) -> Result<String> {
        let output = self.run_git_command(
            &["rev-parse", &format!("{reference}^{{commit}}")],
            &format!("Failed to resolve {reference}"),
        )?;
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    pub fn rev_parse_head(&self) -> Result<String> {
        self.rev_parse("HEAD")
    }

    pub fn status_porcelain(&self) -> Result<String> {
        let output =
            self.run_git_command(&["status", "--porcelain"], "Failed to get git status")?;
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }
}
