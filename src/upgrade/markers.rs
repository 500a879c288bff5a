//! Output markers that signal results the exit code does not carry.
//!
//! A zero exit from `git switch` does not say whether the working tree moved,
//! and the build tool can exit zero while reporting a failure. Both facts are
//! read from the tools' human-readable output, and this is the only place that
//! knows the text to look for.

use crate::constants::{DEFAULT_BUILD_FAILED_MARKER, DEFAULT_SWITCH_CHANGED_MARKER};
use crate::runner::CommandOutput;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputMarkers {
    switch_changed: String,
    build_failed: String,
}

impl Default for OutputMarkers {
    fn default() -> Self {
        Self::new(DEFAULT_SWITCH_CHANGED_MARKER, DEFAULT_BUILD_FAILED_MARKER)
    }
}

impl OutputMarkers {
    pub fn new(switch_changed: impl Into<String>, build_failed: impl Into<String>) -> Self {
        Self {
            switch_changed: switch_changed.into(),
            build_failed: build_failed.into(),
        }
    }

    /// Whether a switch moved the working tree.
    ///
    /// git prints `HEAD is now at <sha> <subject>` on stderr even when the
    /// target is already checked out, so the marker only counts when the head
    /// read before the switch differs from the one read after it.
    pub fn working_tree_changed(
        &self,
        head_before: &str,
        head_after: &str,
        switch_output: &CommandOutput,
    ) -> bool {
        head_before != head_after
            && (switch_output.stdout.contains(&self.switch_changed)
                || switch_output.stderr.contains(&self.switch_changed))
    }

    /// Whether the build reported a failure on its error stream.
    pub fn build_failed(&self, build_output: &CommandOutput) -> bool {
        build_output.stderr.contains(&self.build_failed)
    }
}
