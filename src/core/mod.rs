//! Core types for deps2git
//!
//! This module holds the error taxonomy shared by every other module:
//! - [`DepsError`] - enumerated failure modes of a conversion run
//! - [`ErrorContext`] - user-facing wrapper with details and a suggestion
//! - [`user_friendly_error`] - converts any `anyhow::Error` for CLI display

pub mod error;

pub use error::{DepsError, ErrorContext, user_friendly_error};
