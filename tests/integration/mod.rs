//! Integration test suite for tagsync
//!
//! End-to-end tests against real git repositories in temporary directories, a
//! mock release registry (mockito), and the compiled `tagsync` binary.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **locator**: remote identification on real repositories
//! - **registry**: release client against a mock registry
//! - **controller**: check, apply and build on a real checkout
//! - **cli**: the `tagsync` binary, human and JSON output

#[path = "../common/mod.rs"]
mod common;

mod cli;
mod controller;
mod locator;
mod registry;
