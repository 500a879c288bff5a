//! Scripted stand-in for the host's tools.
//!
//! [`FakeHost`] implements [`Executor`] and emulates just enough of `git` for
//! the updater: a configurable remote URL, a HEAD that moves on `switch`, and
//! counters for fetches and submodule syncs. Every other tool is treated as the
//! build tool and answers with a configurable output. Sandboxed invocations
//! (`<launcher> --host <tool> ...`) are unwrapped before being interpreted.
//!
//! ```rust,ignore
//! let host = FakeHost::new().with_remote("origin", "git@github.com:foo/bar.git").with_head("abc123");
//! let runner = CommandRunner::with_executor(host.clone(), ExecutionEnvironment::Native, "/src/app");
//! ```

use crate::runner::{Executor, Invocation, ProcessOutput};
use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug)]
struct HostState {
    remotes: HashMap<String, String>,
    head: String,
    commit_message: String,
    build_output: ProcessOutput,
    failures: VecDeque<(String, ProcessOutput)>,
    missing_tools: Vec<String>,
    delay: Duration,
    invocations: Vec<Invocation>,
    fetch_count: usize,
    submodule_sync_count: usize,
}

/// A scripted, recording [`Executor`] for tests.
#[derive(Debug, Clone)]
pub struct FakeHost {
    state: Arc<Mutex<HostState>>,
    completed: Arc<AtomicUsize>,
}

impl Default for FakeHost {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeHost {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(HostState {
                remotes: HashMap::new(),
                head: "0000000".to_string(),
                commit_message: "Updated build".to_string(),
                build_output: ProcessOutput {
                    code: Some(0),
                    ..ProcessOutput::default()
                },
                failures: VecDeque::new(),
                missing_tools: Vec::new(),
                delay: Duration::ZERO,
                invocations: Vec::new(),
                fetch_count: 0,
                submodule_sync_count: 0,
            })),
            completed: Arc::new(AtomicUsize::new(0)),
        }
    }

    #[must_use]
    pub fn with_remote(self, name: &str, url: &str) -> Self {
        self.state.lock().unwrap().remotes.insert(name.to_string(), url.to_string());
        self
    }

    #[must_use]
    pub fn with_head(self, head: &str) -> Self {
        self.state.lock().unwrap().head = head.to_string();
        self
    }

    /// Message of the commit a release tag points at; printed by `switch`.
    #[must_use]
    pub fn with_commit_message(self, message: &str) -> Self {
        self.state.lock().unwrap().commit_message = message.to_string();
        self
    }

    /// Output the build tool produces on success.
    #[must_use]
    pub fn with_build_output(self, stdout: &str, stderr: &str) -> Self {
        self.state.lock().unwrap().build_output = ProcessOutput {
            code: Some(0),
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
        };
        self
    }

    /// Makes the next invocation of `tool` exit with `code` and `stderr`.
    pub fn fail_next(&self, tool: &str, code: i32, stderr: &str) {
        self.state.lock().unwrap().failures.push_back((
            tool.to_string(),
            ProcessOutput {
                code: Some(code),
                stdout: String::new(),
                stderr: stderr.to_string(),
            },
        ));
    }

    /// Makes every invocation of `tool` fail to spawn.
    pub fn remove_tool(&self, tool: &str) {
        self.state.lock().unwrap().missing_tools.push(tool.to_string());
    }

    /// Delays every invocation, to keep operations in flight.
    pub fn set_delay(&self, delay: Duration) {
        self.state.lock().unwrap().delay = delay;
    }

    pub fn head(&self) -> String {
        self.state.lock().unwrap().head.clone()
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.state.lock().unwrap().invocations.clone()
    }

    /// Logical `tool args...` lines in call order, with any launcher removed.
    pub fn calls(&self) -> Vec<String> {
        self.invocations()
            .iter()
            .map(|inv| {
                let (tool, args) = logical_command(inv);
                std::iter::once(tool).chain(args).collect::<Vec<_>>().join(" ")
            })
            .collect()
    }

    pub fn fetch_count(&self) -> usize {
        self.state.lock().unwrap().fetch_count
    }

    pub fn submodule_sync_count(&self) -> usize {
        self.state.lock().unwrap().submodule_sync_count
    }

    /// Invocations that have run to completion.
    pub fn completed_count(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    fn respond(&self, invocation: &Invocation) -> io::Result<ProcessOutput> {
        let (tool, args) = logical_command(invocation);
        let mut state = self.state.lock().unwrap();

        if state.missing_tools.iter().any(|t| *t == tool) {
            return Err(io::Error::new(io::ErrorKind::NotFound, "No such file or directory"));
        }

        if let Some(pos) = state.failures.iter().position(|(t, _)| *t == tool) {
            if let Some((_, output)) = state.failures.remove(pos) {
                return Ok(output);
            }
        }

        if tool != "git" {
            return Ok(state.build_output.clone());
        }

        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let output = match args.as_slice() {
            ["remote", "get-url", name] => match state.remotes.get(*name) {
                Some(url) => ok(&format!("{url}\n"), ""),
                None => failed(2, &format!("error: No such remote '{name}'\n")),
            },
            ["fetch"] => {
                state.fetch_count += 1;
                ok("", "")
            }
            ["rev-parse", "HEAD"] => ok(&format!("{}\n", state.head), ""),
            ["switch", target, "--detach"] => {
                if state.head == *target {
                    let stderr = format!("HEAD is now at {target} {}\n", state.commit_message);
                    ok("", &stderr)
                } else {
                    let previous = std::mem::replace(&mut state.head, (*target).to_string());
                    let stderr = format!(
                        "Previous HEAD position was {previous}\nHEAD is now at {target} {}\n",
                        state.commit_message
                    );
                    ok("", &stderr)
                }
            }
            ["submodule", "update", "--init", "--recursive"] => {
                state.submodule_sync_count += 1;
                ok("", "")
            }
            other => failed(1, &format!("git: '{}' is not scripted\n", other.join(" "))),
        };
        Ok(output)
    }
}

impl Executor for FakeHost {
    async fn execute(&self, invocation: Invocation) -> io::Result<ProcessOutput> {
        let delay = {
            let mut state = self.state.lock().unwrap();
            state.invocations.push(invocation.clone());
            state.delay
        };

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let result = self.respond(&invocation);
        self.completed.fetch_add(1, Ordering::SeqCst);
        result
    }
}

fn logical_command(invocation: &Invocation) -> (String, Vec<String>) {
    match invocation.args.split_first() {
        Some((flag, rest)) if flag == "--host" && !rest.is_empty() => {
            (rest[0].clone(), rest[1..].to_vec())
        }
        _ => (invocation.program.clone(), invocation.args.clone()),
    }
}

fn ok(stdout: &str, stderr: &str) -> ProcessOutput {
    ProcessOutput {
        code: Some(0),
        stdout: stdout.to_string(),
        stderr: stderr.to_string(),
    }
}

fn failed(code: i32, stderr: &str) -> ProcessOutput {
    ProcessOutput {
        code: Some(code),
        stdout: String::new(),
        stderr: stderr.to_string(),
    }
}
