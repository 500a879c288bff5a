//! Cross-platform utilities.
//!
//! - [`platform`] - execution environment detection, source root discovery, path expansion
//! - [`progress`] - terminal spinners for the CLI

pub mod platform;
pub mod progress;

pub use platform::{ExecutionEnvironment, discover_source_root, resolve_path};
