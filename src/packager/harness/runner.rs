//! Runner script generation and elevated launch.

use crate::packager::{
    error::Result,
    script::{ps_single_quote, render_template, template::TEST_RUNNER_TEMPLATE},
    utils::fs::write_utf8_bom,
};
use std::collections::BTreeMap;
use std::io;
use std::path::Path;
use tokio::process::{Child, Command};

/// Runner script written into staging.
pub const RUNNER_FILE_NAME: &str = "test_runner.ps1";

/// Transcript produced by the runner.
pub const TRANSCRIPT_FILE_NAME: &str = "test_output.txt";

/// Renders the runner: start transcript, enter staging, run target, stop.
pub fn render_runner(
    script_name: &str,
    target: &Path,
    staging_dir: &Path,
    transcript: &Path,
) -> Result<String> {
    let mut data = BTreeMap::new();
    data.insert("transcriptPath", ps_single_quote(&transcript.display().to_string()));
    data.insert("stagingDir", ps_single_quote(&staging_dir.display().to_string()));
    data.insert("scriptName", ps_single_quote(script_name));
    data.insert("targetPath", ps_single_quote(&target.display().to_string()));

    render_template("test_runner.ps1.hbs", TEST_RUNNER_TEMPLATE, &data)
}

/// Writes the rendered runner to `path`.
pub async fn write_runner(
    path: &Path,
    script_name: &str,
    target: &Path,
    staging_dir: &Path,
    transcript: &Path,
) -> Result<()> {
    let content = render_runner(script_name, target, staging_dir, transcript)?;
    write_utf8_bom(path, &content).await
}

/// Starts the process that executes the runner script.
pub trait Launcher: Send + Sync {
    /// Spawns the runner with `working_dir` as current directory.
    fn launch(&self, runner: &Path, working_dir: &Path) -> io::Result<Child>;
}

/// Launches the runner through `Start-Process -Verb RunAs -Wait`.
///
/// Elevation goes through UAC, so the elevated process's stdout cannot be
/// piped back; the transcript file is the only output channel.
#[derive(Debug, Clone)]
pub struct ElevatedPowerShell {
    /// Shell used for the outer, non-elevated call
    pub shell: String,
}

impl Default for ElevatedPowerShell {
    fn default() -> Self {
        Self {
            shell: "powershell.exe".into(),
        }
    }
}

impl ElevatedPowerShell {
    /// `-Command` text for the outer shell.
    pub fn command_text(&self, runner: &Path) -> String {
        format!(
            "Start-Process powershell -ArgumentList '-NoProfile', '-ExecutionPolicy', 'Bypass', \
             '-File', '\"{}\"' -Verb RunAs -Wait",
            ps_single_quote(&runner.display().to_string())
        )
    }
}

impl Launcher for ElevatedPowerShell {
    fn launch(&self, runner: &Path, working_dir: &Path) -> io::Result<Child> {
        let command_text = self.command_text(runner);
        log::info!("Executing: {}", command_text);

        Command::new(&self.shell)
            .arg("-NoProfile")
            .arg("-Command")
            .arg(command_text)
            .current_dir(working_dir)
            .spawn()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runner_wraps_target_in_transcript() {
        let script = render_runner(
            "install.ps1",
            Path::new("C:/out/staging/install.ps1"),
            Path::new("C:/out/staging"),
            Path::new("C:/out/staging/test_output.txt"),
        )
        .unwrap();

        let start = script.find("Start-Transcript -Path 'C:/out/staging/test_output.txt' -Force").unwrap();
        let cd = script.find("Set-Location 'C:/out/staging'").unwrap();
        let run = script.find("& 'C:/out/staging/install.ps1'").unwrap();
        let stop = script.find("Stop-Transcript").unwrap();
        assert!(start < cd && cd < run && run < stop);
    }

    #[test]
    fn quotes_are_doubled() {
        let script = render_runner(
            "install.ps1",
            Path::new("C:/O'Brien/install.ps1"),
            Path::new("C:/O'Brien"),
            Path::new("C:/O'Brien/test_output.txt"),
        )
        .unwrap();
        assert!(script.contains("Set-Location 'C:/O''Brien'"));
        assert!(
            ElevatedPowerShell::default()
                .command_text(Path::new("C:/O'Brien/test_runner.ps1"))
                .contains("C:/O''Brien/test_runner.ps1")
        );
    }
}
