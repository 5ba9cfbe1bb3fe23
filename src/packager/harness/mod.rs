//! Elevated test harness.
//!
//! Runs one of the staged scripts under elevation and streams its transcript
//! back to an [`EventSink`]. An elevated process cannot inherit our pipes, so
//! the target is wrapped in a generated runner that records a transcript and
//! the transcript file is tailed while the process lives.
//!
//! # Module Organization
//!
//! - `runner` - runner script generation and [`Launcher`]s
//! - `tail` - transcript polling

mod runner;
mod tail;

pub use runner::{
    ElevatedPowerShell, Launcher, RUNNER_FILE_NAME, TRANSCRIPT_FILE_NAME,
    render_runner, write_runner,
};
pub use tail::{
    FINISHED_MARKER, GRACE_POLLS, POLL_INTERVAL, ProcessProbe, TailState, TranscriptReader,
    tail_until_exit,
};

use crate::bail;
use crate::packager::{
    error::{Error, Result},
    events::EventSink,
    utils::fs::remove_file_if_exists,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Runs staged scripts elevated and tails their transcripts.
#[derive(Debug)]
pub struct TestHarness<L = ElevatedPowerShell> {
    launcher: Arc<L>,
    interval: Duration,
    grace: u32,
}

impl Default for TestHarness<ElevatedPowerShell> {
    fn default() -> Self {
        Self::new(ElevatedPowerShell::default())
    }
}

impl<L: Launcher + 'static> TestHarness<L> {
    /// Harness with the default poll interval and grace period.
    pub fn new(launcher: L) -> Self {
        Self {
            launcher: Arc::new(launcher),
            interval: POLL_INTERVAL,
            grace: GRACE_POLLS,
        }
    }

    /// Overrides the poll interval.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Overrides the number of polls after process exit.
    pub fn with_grace(mut self, grace: u32) -> Self {
        self.grace = grace;
        self
    }

    /// Starts `script_name` from `staging_dir` on a background task.
    ///
    /// Returns immediately. Transcript content, then [`FINISHED_MARKER`], arrive
    /// as [`Event::Log`](crate::packager::Event::Log). If the run cannot be
    /// started a single [`Event::Fatal`](crate::packager::Event::Fatal) is sent
    /// instead. The handle only
    /// exists so callers can wait for the task to end.
    pub fn run_script(
        &self,
        script_name: &str,
        staging_dir: &Path,
        sink: EventSink,
    ) -> JoinHandle<()> {
        let launcher = Arc::clone(&self.launcher);
        let script_name = script_name.to_string();
        let staging_dir = staging_dir.to_path_buf();
        let (interval, grace) = (self.interval, self.grace);

        tokio::spawn(async move {
            let run = Run {
                launcher: launcher.as_ref(),
                script_name: &script_name,
                staging_dir: &staging_dir,
                interval,
                grace,
                sink: &sink,
            };
            if let Err(e) = run.execute().await {
                sink.fatal(format!("Test run of {} failed: {}", script_name, e));
            }
        })
    }
}

struct Run<'a, L: ?Sized> {
    launcher: &'a L,
    script_name: &'a str,
    staging_dir: &'a Path,
    interval: Duration,
    grace: u32,
    sink: &'a EventSink,
}

impl<L: Launcher + ?Sized> Run<'_, L> {
    async fn execute(&self) -> Result<()> {
        let target = self.staging_dir.join(self.script_name);
        if !target.is_file() {
            bail!(
                "{} not found in {}",
                self.script_name,
                self.staging_dir.display()
            );
        }

        let transcript: PathBuf = self.staging_dir.join(TRANSCRIPT_FILE_NAME);
        let runner = self.staging_dir.join(RUNNER_FILE_NAME);
        remove_file_if_exists(&transcript).await?;
        remove_file_if_exists(&runner).await?;

        write_runner(
            &runner,
            self.script_name,
            &target,
            self.staging_dir,
            &transcript,
        )
        .await?;

        self.sink
            .log(format!("--- Launching {} elevated ---", self.script_name));
        let mut child = self
            .launcher
            .launch(&runner, self.staging_dir)
            .map_err(|error| Error::CommandFailed {
                command: format!("elevated {}", self.script_name),
                error,
            })?;

        let mut reader = TranscriptReader::new(transcript);
        tail_until_exit(&mut reader, &mut child, self.interval, self.grace, self.sink).await;
        log::debug!(
            "Tailing of {} ended at byte {}",
            reader.path().display(),
            reader.offset()
        );
        Ok(())
    }
}
