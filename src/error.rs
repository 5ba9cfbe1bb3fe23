//! Top-level error types for the command line tool.

use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, PackagerError>;

/// Main error type returned by CLI commands
#[derive(Error, Debug)]
pub enum PackagerError {
    /// CLI argument errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Pipeline errors
    #[error("{0}")]
    Packager(#[from] crate::packager::Error),

    /// Contextual errors from the commands
    #[error("{0:#}")]
    Anyhow(#[from] anyhow::Error),
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command line arguments
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// Reason for the error
        reason: String,
    },

    /// Setup has not been run yet
    #[error("Not configured: run `setup` first ({reason})")]
    NotConfigured {
        /// What is missing
        reason: String,
    },

    /// Command execution failed
    #[error("Command execution failed: {command} - {reason}")]
    ExecutionFailed {
        /// Command that failed
        command: String,
        /// Reason for the error
        reason: String,
    },
}

impl PackagerError {
    /// Hints printed after the error message.
    pub fn recovery_suggestions(&self) -> Vec<String> {
        use crate::packager::Error;

        match self {
            PackagerError::Cli(CliError::NotConfigured { .. })
            | PackagerError::Packager(Error::Configuration(_)) => vec![
                "Run `kodegen_bundler_intune setup --tenant-id <id> --client-id <id> --tool-path <path>`"
                    .to_string(),
            ],
            PackagerError::Packager(Error::ToolNotFound(_)) => vec![
                "Download IntuneWinAppUtil.exe and point --tool-path at it".to_string(),
            ],
            PackagerError::Packager(Error::SubprocessFailure { output, .. }) => output
                .iter()
                .rev()
                .take(5)
                .rev()
                .map(|line| format!("tool output: {}", line))
                .collect(),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anyhow_errors_print_their_context_chain() {
        let err: PackagerError = anyhow::anyhow!("permission denied")
            .context("reading staging directory out/staging")
            .into();
        let message = err.to_string();
        assert!(message.starts_with("reading staging directory out/staging"));
        assert!(message.contains("permission denied"));
    }

    #[test]
    fn configuration_errors_suggest_setup() {
        let err = PackagerError::from(CliError::NotConfigured {
            reason: "no client secret".into(),
        });
        assert!(err.recovery_suggestions()[0].contains("setup"));

        let err = PackagerError::from(CliError::ExecutionFailed {
            command: "test install.ps1".into(),
            reason: "task panicked".into(),
        });
        assert!(err.to_string().contains("test install.ps1"));
        assert!(err.recovery_suggestions().is_empty());
    }
}
