//! Autobuild Exec
//!
//! Real implementations of the `autobuild-core` collaborator traits:
//! processes through `tokio::process`, git through the `git` CLI, projects
//! and settings through the filesystem, and notifications on the terminal.

pub mod git;
pub mod notify;
pub mod process;
pub mod project;
pub mod settings;
pub mod task_runner;

pub use git::GitCli;
pub use notify::TerminalNotifier;
pub use process::TokioProcessSpawner;
pub use project::FsProjectModel;
pub use settings::{default_settings_path, write_default_settings, TomlSettingsStore, SETTINGS_FILE};
pub use task_runner::CommandTaskRunner;
