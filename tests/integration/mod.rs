//! Integration test suite for deps2git
//!
//! These tests drive the compiled binary against scratch directories and
//! local `file://` repositories, so no network access is needed.
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **cli**: flags, exit codes, placeholder conversion and error output
//! - **mirror**: revision resolution through shared mirrors and per-dependency
//!   checkouts
//! - **verify**: reachability checks and the JSON failure report

mod common;

mod cli;
mod mirror;
mod verify;
