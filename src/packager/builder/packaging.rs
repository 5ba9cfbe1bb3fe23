//! IntuneWinAppUtil execution.
//!
//! Wraps the staging directory into an `.intunewin` package.

use crate::packager::{
    error::{Error, Result},
    events::EventSink,
    process::{ExternalProcessResult, run_streaming},
};
use std::path::Path;

/// Runs the packaging tool over `staging_dir`.
///
/// Invocation: `<tool> -c <staging_dir> -s <setup_file> -o <output_dir> -q`.
/// Every output line is forwarded to `sink` and the log. A tool that cannot be
/// started because it does not exist is [`Error::ToolNotFound`]; a non-zero
/// exit is returned in the result, not as an error.
pub async fn run_intunewin_util(
    tool: &Path,
    staging_dir: &Path,
    setup_file: &str,
    output_dir: &Path,
    sink: &EventSink,
) -> Result<ExternalProcessResult> {
    log::info!("Running {}...", tool.display());

    let mut command = tokio::process::Command::new(tool);
    command
        .arg("-c")
        .arg(staging_dir)
        .arg("-s")
        .arg(setup_file)
        .arg("-o")
        .arg(output_dir)
        .arg("-q");

    let name = tool.display().to_string();
    let result = run_streaming(command, &name, |line| {
        log::info!("[IntuneWinAppUtil] {}", line);
        sink.log(line);
    })
    .await;

    match result {
        Err(Error::CommandFailed { error, .. }) if error.kind() == std::io::ErrorKind::NotFound => {
            Err(Error::ToolNotFound(tool.to_path_buf()))
        }
        other => other,
    }
}
