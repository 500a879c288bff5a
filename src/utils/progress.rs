//! Spinners for long-running CLI operations.
//!
//! Network fetches, switches, and builds can take a while, so the CLI shows an
//! indeterminate spinner while they run. Spinners are hidden when
//! `TAGSYNC_NO_PROGRESS` is set, when the caller disables them (`--no-progress`,
//! `--json`), and when stderr is not a terminal, which indicatif detects on its own.

use crate::constants::NO_PROGRESS_ENV;
use indicatif::{ProgressBar as IndicatifBar, ProgressStyle as IndicatifStyle};
use std::time::Duration;

fn is_progress_disabled() -> bool {
    std::env::var(NO_PROGRESS_ENV).is_ok()
}

/// An indeterminate spinner with a message.
#[derive(Clone)]
pub struct Spinner {
    inner: IndicatifBar,
}

impl Spinner {
    pub fn new(msg: impl Into<String>) -> Self {
        Self::with_visibility(msg, true)
    }

    /// Creates a spinner that is only drawn when `visible` and not disabled by the environment.
    pub fn with_visibility(msg: impl Into<String>, visible: bool) -> Self {
        let bar = if !visible || is_progress_disabled() {
            IndicatifBar::hidden()
        } else {
            let bar = IndicatifBar::new_spinner();
            bar.set_style(spinner_style());
            bar.enable_steady_tick(Duration::from_millis(100));
            bar
        };
        bar.set_message(msg.into());
        Self { inner: bar }
    }

    pub fn set_message(&self, msg: impl Into<String>) {
        self.inner.set_message(msg.into());
    }

    pub fn finish_and_clear(&self) {
        self.inner.finish_and_clear();
    }

    #[cfg(test)]
    fn is_hidden(&self) -> bool {
        self.inner.is_hidden()
    }
}

fn spinner_style() -> IndicatifStyle {
    IndicatifStyle::default_spinner()
        .template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| IndicatifStyle::default_spinner())
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_spinner_hidden_when_disabled() {
        unsafe {
            std::env::set_var(NO_PROGRESS_ENV, "1");
        }
        let spinner = Spinner::new("Checking for updates...");
        assert!(spinner.is_hidden());
        spinner.set_message("still checking");
        spinner.finish_and_clear();
        unsafe {
            std::env::remove_var(NO_PROGRESS_ENV);
        }
    }

    #[test]
    #[serial]
    fn test_spinner_hidden_on_request() {
        let spinner = Spinner::with_visibility("Building...", false);
        assert!(spinner.is_hidden());
        spinner.finish_and_clear();
    }
}
