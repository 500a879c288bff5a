//! Subprocess execution rooted at the application's source checkout.
//!
//! [`CommandRunner`] is the only component that knows whether the updater runs
//! natively or inside a sandbox. Callers ask for a logical tool (`git`, `node`)
//! and the runner decides how to launch it:
//!
//! ```text
//! Native     git switch v2.0.0 --detach
//! Sandboxed  flatpak-spawn --host git switch v2.0.0 --detach
//! ```
//!
//! Every command runs with its working directory fixed to the source root.
//!
//! # Detached execution
//!
//! The subprocess is awaited inside a spawned task. If the caller stops
//! waiting, the task keeps running until the subprocess exits. Interrupting a
//! checkout switch halfway would leave a corrupted working tree, so nothing is
//! ever killed.
//!
//! # Examples
//!
//! ```rust,no_run
//! use tagsync::runner::CommandRunner;
//! use tagsync::utils::ExecutionEnvironment;
//!
//! # async fn example() -> tagsync::core::UpdateResult<()> {
//! let runner = CommandRunner::new(ExecutionEnvironment::detect(), "/home/me/src/app");
//! let head = runner.run("git", ["rev-parse", "HEAD"]).await?;
//! println!("HEAD is {}", head.stdout.trim());
//! # Ok(())
//! # }
//! ```

use crate::constants::DEFAULT_SANDBOX_LAUNCHER;
use crate::core::{ExitInfo, UpdateResult, UpdaterError};
use crate::utils::platform::{ExecutionEnvironment, host_path_override};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Instant;
use tokio::process::Command;

/// A fully resolved process launch: program, argv, directory, and extra environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub current_dir: PathBuf,
    pub env_vars: Vec<(String, String)>,
}

impl Invocation {
    /// The command line as it would be typed in a shell, for logging.
    #[must_use]
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// What a process produced, regardless of whether it succeeded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code, or `None` when the process was terminated by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Output of a command that exited successfully.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Launches processes.
///
/// [`SystemExecutor`] spawns real processes; tests substitute a scripted host.
pub trait Executor: Send + Sync + 'static {
    fn execute(
        &self,
        invocation: Invocation,
    ) -> impl Future<Output = std::io::Result<ProcessOutput>> + Send;
}

/// Spawns real processes with tokio.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemExecutor;

impl Executor for SystemExecutor {
    async fn execute(&self, invocation: Invocation) -> std::io::Result<ProcessOutput> {
        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args)
            .current_dir(&invocation.current_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        for (key, value) in &invocation.env_vars {
            tracing::trace!(target: "runner", "Setting env var: {}={}", key, value);
            cmd.env(key, value);
        }

        let output = cmd.output().await?;

        Ok(ProcessOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Runs tools in the source root, directly or through the sandbox launcher.
pub struct CommandRunner<E = SystemExecutor> {
    executor: Arc<E>,
    environment: ExecutionEnvironment,
    source_root: PathBuf,
    launcher: String,
    path_override: Option<String>,
}

impl<E> Clone for CommandRunner<E> {
    fn clone(&self) -> Self {
        Self {
            executor: Arc::clone(&self.executor),
            environment: self.environment,
            source_root: self.source_root.clone(),
            launcher: self.launcher.clone(),
            path_override: self.path_override.clone(),
        }
    }
}

impl CommandRunner<SystemExecutor> {
    /// Creates a runner that spawns real processes.
    pub fn new(environment: ExecutionEnvironment, source_root: impl AsRef<Path>) -> Self {
        Self::with_executor(SystemExecutor, environment, source_root)
    }
}

impl<E: Executor> CommandRunner<E> {
    /// Creates a runner backed by a custom [`Executor`].
    pub fn with_executor(
        executor: E,
        environment: ExecutionEnvironment,
        source_root: impl AsRef<Path>,
    ) -> Self {
        Self {
            executor: Arc::new(executor),
            environment,
            source_root: source_root.as_ref().to_path_buf(),
            launcher: DEFAULT_SANDBOX_LAUNCHER.to_string(),
            path_override: host_path_override(),
        }
    }

    /// Sets the program used to escape the sandbox (default `flatpak-spawn`).
    #[must_use]
    pub fn with_launcher(mut self, launcher: impl Into<String>) -> Self {
        self.launcher = launcher.into();
        self
    }

    /// Sets the `PATH` given to every subprocess, or `None` to inherit ours.
    #[must_use]
    pub fn with_path_override(mut self, path: Option<String>) -> Self {
        self.path_override = path;
        self
    }

    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    pub const fn environment(&self) -> ExecutionEnvironment {
        self.environment
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Builds the launch for `tool args...` in the current environment.
    pub fn invocation(&self, tool: &str, args: &[String]) -> Invocation {
        let (program, argv) = match self.environment {
            ExecutionEnvironment::Native => (tool.to_string(), args.to_vec()),
            ExecutionEnvironment::Sandboxed => {
                let mut argv = Vec::with_capacity(args.len() + 2);
                argv.push("--host".to_string());
                argv.push(tool.to_string());
                argv.extend_from_slice(args);
                (self.launcher.clone(), argv)
            }
        };

        let env_vars = self
            .path_override
            .as_ref()
            .map(|path| vec![("PATH".to_string(), path.clone())])
            .unwrap_or_default();

        Invocation {
            program,
            args: argv,
            current_dir: self.source_root.clone(),
            env_vars,
        }
    }

    /// Runs `tool` with `args` and returns its output.
    ///
    /// # Errors
    ///
    /// Returns [`UpdaterError::CommandFailed`] when the process cannot be
    /// spawned or exits non-zero. The error names the logical tool and
    /// arguments, not the launcher. Nothing is retried.
    pub async fn run<I, S>(&self, tool: &str, args: I) -> UpdateResult<CommandOutput>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        let invocation = self.invocation(tool, &args);
        let command_line = invocation.command_line();
        let program = invocation.program.clone();

        tracing::debug!(
            target: "runner",
            "Executing command: {} (in {})",
            command_line,
            self.source_root.display()
        );

        let start = Instant::now();
        let executor = Arc::clone(&self.executor);
        let task = tokio::spawn(async move { executor.execute(invocation).await });

        let spawn_failed = |reason: String| UpdaterError::CommandFailed {
            tool: tool.to_string(),
            args: args.clone(),
            exit_info: ExitInfo::SpawnFailed(reason),
            stderr: String::new(),
        };

        let output = match task.await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                tracing::debug!(target: "runner", "Failed to spawn {}: {}", program, e);
                return Err(spawn_failed(format!("{program}: {e}")));
            }
            Err(e) => return Err(spawn_failed(format!("runner task failed: {e}"))),
        };

        log_duration(&command_line, start);

        if output.code != Some(0) {
            tracing::debug!(
                target: "runner",
                "Command failed with exit code: {:?}",
                output.code
            );
            if !output.stderr.is_empty() {
                tracing::debug!(target: "runner", "Error: {}", output.stderr.trim());
            }

            return Err(UpdaterError::CommandFailed {
                tool: tool.to_string(),
                args,
                exit_info: output.code.map_or(ExitInfo::Signal, ExitInfo::Code),
                stderr: output.stderr,
            });
        }

        if !output.stdout.is_empty() {
            tracing::debug!(target: "runner", "{}", output.stdout.trim());
        }
        if !output.stderr.is_empty() {
            tracing::debug!(target: "runner", "{}", output.stderr.trim());
        }

        Ok(CommandOutput {
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

fn log_duration(command_line: &str, start: Instant) {
    let elapsed = start.elapsed();
    if elapsed.as_secs() > 1 {
        tracing::info!(target: "runner::perf", "{} took {:.2}s", command_line, elapsed.as_secs_f64());
    } else if elapsed.as_millis() > 100 {
        tracing::debug!(target: "runner::perf", "{} took {}ms", command_line, elapsed.as_millis());
    }
}
