//! Subprocess execution with combined output streaming.

use crate::packager::error::{Error, Result};
use std::ffi::OsStr;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;

/// Outcome of one subprocess invocation.
///
/// There is no structured error channel across the process boundary; the exit
/// code and the captured lines are all a caller gets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExternalProcessResult {
    /// Exit code, -1 when the process was terminated by a signal.
    pub exit_code: i32,
    /// Interleaved stdout/stderr lines in arrival order.
    pub combined_output: Vec<String>,
}

impl ExternalProcessResult {
    /// True for exit code 0.
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Converts a non-zero exit into [`Error::SubprocessFailure`].
    pub fn into_result(self, command: &str) -> Result<Self> {
        if self.success() {
            Ok(self)
        } else {
            Err(Error::SubprocessFailure {
                command: command.to_string(),
                exit_code: self.exit_code,
                output: self.combined_output,
            })
        }
    }
}

/// Script interpreter used for generated and delegate scripts.
///
/// `leading_args` go before the script path, so the default PowerShell host
/// runs `powershell.exe -NoProfile -ExecutionPolicy Bypass -File <script> ...`.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptHost {
    /// Interpreter executable
    pub program: PathBuf,
    /// Arguments placed before the script path
    pub leading_args: Vec<String>,
}

impl ScriptHost {
    /// Windows PowerShell with execution policy bypassed.
    pub fn powershell() -> Self {
        Self {
            program: PathBuf::from("powershell.exe"),
            leading_args: ["-NoProfile", "-ExecutionPolicy", "Bypass", "-File"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }

    /// Arbitrary interpreter with no leading arguments (e.g. `sh` in tests).
    pub fn custom(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
        }
    }

    /// Command that runs `script` under this host.
    pub fn command(&self, script: impl AsRef<OsStr>) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.leading_args).arg(script);
        command
    }

    /// Display name for error messages.
    pub fn name(&self) -> String {
        self.program.display().to_string()
    }
}

impl Default for ScriptHost {
    fn default() -> Self {
        Self::powershell()
    }
}

/// Runs `command` to completion, handing every output line to `on_line`.
///
/// stdout and stderr are each read on their own task and merged through one
/// channel, so `on_line` sees a single stream and runs on the caller's task.
/// No timeout is applied.
pub async fn run_streaming<F>(
    mut command: Command,
    name: &str,
    mut on_line: F,
) -> Result<ExternalProcessResult>
where
    F: FnMut(&str),
{
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = command.spawn().map_err(|error| Error::CommandFailed {
        command: name.to_string(),
        error,
    })?;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut readers = Vec::new();
    if let Some(stdout) = child.stdout.take() {
        readers.push(tokio::spawn(forward_lines(stdout, tx.clone())));
    }
    if let Some(stderr) = child.stderr.take() {
        readers.push(tokio::spawn(forward_lines(stderr, tx.clone())));
    }
    drop(tx);

    let mut combined_output = Vec::new();
    while let Some(line) = rx.recv().await {
        on_line(&line);
        combined_output.push(line);
    }

    for reader in readers {
        let _ = reader.await;
    }

    let status = child.wait().await.map_err(|error| Error::CommandFailed {
        command: name.to_string(),
        error,
    })?;

    Ok(ExternalProcessResult {
        exit_code: status.code().unwrap_or(-1),
        combined_output,
    })
}

/// Forwards lines until EOF. Invalid UTF-8 is replaced rather than ending the
/// stream, and the pipe keeps draining even once nobody is listening.
async fn forward_lines<R>(reader: R, tx: mpsc::UnboundedSender<String>)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        while matches!(buf.last(), Some(b'\n' | b'\r')) {
            buf.pop();
        }
        let _ = tx.send(String::from_utf8_lossy(&buf).into_owned());
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn collects_stdout_and_stderr() {
        let mut command = Command::new("sh");
        command.args(["-c", "echo out; echo err 1>&2; exit 3"]);

        let mut seen = Vec::new();
        let result = run_streaming(command, "sh", |line| seen.push(line.to_string()))
            .await
            .unwrap();

        assert_eq!(result.exit_code, 3);
        assert_eq!(seen.len(), 2);
        assert!(seen.contains(&"out".to_string()));
        assert!(seen.contains(&"err".to_string()));
        assert_eq!(result.combined_output, seen);

        let err = result.into_result("sh").unwrap_err();
        assert_eq!(err.exit_code(), Some(3));
    }

    #[tokio::test]
    async fn non_utf8_output_does_not_stop_the_stream() {
        let mut command = Command::new("sh");
        command.args([
            "-c",
            "printf 'Copying caf\\351\\r\\n'; i=0; while [ $i -lt 2000 ]; do echo \"line $i\"; i=$((i+1)); done",
        ]);

        let result = run_streaming(command, "sh", |_| {}).await.unwrap();

        assert_eq!(result.exit_code, 0);
        assert_eq!(result.combined_output.len(), 2001);
        assert!(result.combined_output[0].starts_with("Copying caf"));
        assert!(!result.combined_output[0].ends_with('\r'));
        assert_eq!(result.combined_output[2000], "line 1999");
    }

    #[tokio::test]
    async fn missing_program_is_command_failed() {
        let command = Command::new("/definitely/not/here");
        let err = run_streaming(command, "ghost", |_| {}).await.unwrap_err();
        assert!(matches!(err, Error::CommandFailed { .. }));
    }
}
