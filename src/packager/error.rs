//! Error types for packaging, upload and test-harness operations.
//!
//! Every stage reports through [`Error`]. Subprocess failures carry the exit
//! code and the captured output, since that is the only diagnostic channel
//! that survives the process boundary.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias for packager operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the packaging pipeline.
#[derive(Error, Debug)]
pub enum Error {
    /// Required configuration is missing (tool path, credentials, ...)
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A script template could not be located or rendered
    #[error("template error: {0}")]
    Template(String),

    /// The packaging tool binary does not exist
    #[error("packaging tool not found at {}", .0.display())]
    ToolNotFound(PathBuf),

    /// A subprocess ran but exited non-zero
    #[error("{command} exited with code {exit_code}")]
    SubprocessFailure {
        /// Program that was run
        command: String,
        /// Process exit code (-1 when terminated by a signal)
        exit_code: i32,
        /// Combined stdout/stderr lines
        output: Vec<String>,
    },

    /// Metadata creation or delegated transfer failed
    #[error("upload failed: {0}")]
    Upload(String),

    /// A subprocess could not be spawned or awaited
    #[error("failed to run {command}: {error}")]
    CommandFailed {
        /// Program that was run
        command: String,
        /// Underlying IO error
        error: std::io::Error,
    },

    /// Filesystem operation failed
    #[error("{context} ({}): {error}", path.display())]
    Fs {
        /// What was being done
        context: &'static str,
        /// Path involved
        path: PathBuf,
        /// Underlying IO error
        error: std::io::Error,
    },

    /// Raw IO error without path context
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// HTTP request to a remote service failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON (de)serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Anything else
    #[error("{0}")]
    GenericError(String),
}

impl Error {
    /// Exit code of the failed subprocess, when the error came from one.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Error::SubprocessFailure { exit_code, .. } => Some(*exit_code),
            _ => None,
        }
    }

    /// Whether this error stops the operation before any work was attempted.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Error::Configuration(_) | Error::ToolNotFound(_))
    }
}

impl From<handlebars::RenderError> for Error {
    fn from(error: handlebars::RenderError) -> Self {
        Error::Template(error.to_string())
    }
}

impl From<handlebars::TemplateError> for Error {
    fn from(error: handlebars::TemplateError) -> Self {
        Error::Template(error.to_string())
    }
}

/// Attach filesystem context to IO results.
pub trait ErrorExt<T> {
    /// Convert the IO error into [`Error::Fs`] with an action and path.
    fn fs_context(self, context: &'static str, path: impl AsRef<Path>) -> Result<T>;
}

impl<T> ErrorExt<T> for std::result::Result<T, std::io::Error> {
    fn fs_context(self, context: &'static str, path: impl AsRef<Path>) -> Result<T> {
        self.map_err(|error| Error::Fs {
            context,
            path: path.as_ref().to_path_buf(),
            error,
        })
    }
}

/// Convert `Option`s into errors with a message.
pub trait Context<T> {
    /// Return [`Error::GenericError`] with `msg` when the value is absent.
    fn context(self, msg: &str) -> Result<T>;
}

impl<T> Context<T> for Option<T> {
    fn context(self, msg: &str) -> Result<T> {
        self.ok_or_else(|| Error::GenericError(msg.to_string()))
    }
}

/// Return early with a formatted [`Error::GenericError`].
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::packager::Error::GenericError(format!($($arg)*)))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fs_context_keeps_path() {
        let err: Result<()> = Err(std::io::Error::from(std::io::ErrorKind::NotFound))
            .fs_context("copying installer", "/tmp/setup.msi");
        let message = err.unwrap_err().to_string();
        assert!(message.contains("copying installer"));
        assert!(message.contains("/tmp/setup.msi"));
    }

    #[test]
    fn subprocess_failure_exposes_exit_code() {
        let err = Error::SubprocessFailure {
            command: "IntuneWinAppUtil".into(),
            exit_code: 2,
            output: vec!["boom".into()],
        };
        assert_eq!(err.exit_code(), Some(2));
        assert!(!err.is_configuration());
        assert!(Error::ToolNotFound(PathBuf::from("x")).is_configuration());
    }
}
