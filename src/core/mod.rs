//! Core types shared by every layer of the updater.
//!
//! Currently this is the error taxonomy in [`error`]: the typed [`UpdaterError`]
//! used by the core and the [`ErrorContext`] used when presenting failures.

pub mod error;

pub use error::{ErrorContext, ExitInfo, UpdateResult, UpdaterError, user_friendly_error};
