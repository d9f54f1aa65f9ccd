//! Cross-platform utilities
//!
//! - [`fs`] - atomic writes and directory helpers
//! - [`platform`] - git executable naming and path expansion
//! - [`progress`] - progress bars for the pre-cache phase

pub mod fs;
pub mod platform;
pub mod progress;

pub use fs::{atomic_write, ensure_dir};
pub use platform::{get_git_command, resolve_path};
pub use progress::ProgressBar;
