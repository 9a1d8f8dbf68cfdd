pub mod descriptor;
pub mod init;
pub mod inspect;
pub mod report;

pub use descriptor::{descriptor_command, write_descriptors};
pub use init::init_command;
pub use inspect::inspect_command;
pub use report::report_command;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// The given directory, or the current one
pub(crate) fn project_root(cwd: Option<&Path>) -> Result<PathBuf> {
    let root = match cwd {
        Some(cwd) => cwd.to_path_buf(),
        None => std::env::current_dir().context("Failed to get current directory")?,
    };
    root.canonicalize()
        .with_context(|| format!("Failed to canonicalize {}", root.display()))
}
