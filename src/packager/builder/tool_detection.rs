//! Packaging tool discovery.
//!
//! Resolves the `IntuneWinAppUtil` executable from configuration, falling back
//! to a `PATH` lookup when nothing is configured.

use crate::packager::error::{Error, Result};
use std::path::{Path, PathBuf};

/// Executable names tried on `PATH`.
const TOOL_NAMES: [&str; 2] = ["IntuneWinAppUtil.exe", "IntuneWinAppUtil"];

/// Resolves a configured tool path.
///
/// An empty configuration falls back to `PATH`; if that fails too the result
/// is [`Error::Configuration`]. A configured path that does not exist is
/// [`Error::ToolNotFound`].
pub fn resolve_tool(configured: &str) -> Result<PathBuf> {
    if configured.trim().is_empty() {
        return find_on_path().ok_or_else(|| {
            Error::Configuration(
                "IntuneWinAppUtil.exe path is not configured and it is not on PATH".into(),
            )
        });
    }

    let path = PathBuf::from(configured.trim());
    ensure_tool_exists(&path)?;
    Ok(path)
}

/// Fails with [`Error::ToolNotFound`] unless `path` is an existing file.
pub fn ensure_tool_exists(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(Error::ToolNotFound(path.to_path_buf()))
    }
}

fn find_on_path() -> Option<PathBuf> {
    TOOL_NAMES.iter().find_map(|name| match which::which(name) {
        Ok(path) => {
            log::debug!("Found {} at: {}", name, path.display());
            Some(path)
        }
        Err(e) => {
            log::debug!("{} not found in PATH: {}", name, e);
            None
        }
    })
}
