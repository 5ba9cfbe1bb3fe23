//! Transcript tailing.
//!
//! The elevated process writes its transcript to disk; this side polls the
//! file and forwards only bytes it has not seen before. The file is opened
//! read-only on every poll and no lock is taken, so a failed read just means
//! "try again next tick".

use crate::packager::events::EventSink;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

/// Default delay between polls.
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Polls performed after the process has exited, to pick up late flushes.
pub const GRACE_POLLS: u32 = 5;

/// Marker sent to the sink when tailing ends.
pub const FINISHED_MARKER: &str = "--- Execution Finished ---";

/// Tail loop state.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TailState {
    /// Process alive, keep polling
    Running,
    /// Process gone, this many polls remain
    Draining(u32),
    /// Stop polling
    Done,
}

impl TailState {
    /// State after a poll, given whether the process was alive afterwards.
    ///
    /// The poll on which the exit is first seen counts toward the grace
    /// period, so exactly `grace` polls happen once the process is gone.
    /// Liveness is ignored once draining has begun.
    pub fn next(self, alive: bool, grace: u32) -> Self {
        match self {
            TailState::Running if alive => TailState::Running,
            TailState::Running => Self::draining(grace.saturating_sub(1)),
            TailState::Draining(remaining) => Self::draining(remaining.saturating_sub(1)),
            TailState::Done => TailState::Done,
        }
    }

    fn draining(remaining: u32) -> Self {
        if remaining == 0 {
            TailState::Done
        } else {
            TailState::Draining(remaining)
        }
    }
}

/// Something whose liveness can be polled without blocking.
pub trait ProcessProbe: Send {
    /// True while the process has not exited.
    fn is_alive(&mut self) -> bool;
}

impl ProcessProbe for tokio::process::Child {
    fn is_alive(&mut self) -> bool {
        matches!(self.try_wait(), Ok(None))
    }
}

/// Incremental reader over a growing file.
///
/// Tracks the byte offset already consumed and holds back an incomplete
/// trailing UTF-8 sequence until the rest of it arrives, so every byte
/// written is delivered once and in order.
#[derive(Debug)]
pub struct TranscriptReader {
    path: PathBuf,
    offset: u64,
    pending: Vec<u8>,
}

impl TranscriptReader {
    /// Reader starting at the beginning of `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            offset: 0,
            pending: Vec::new(),
        }
    }

    /// Path being tailed.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bytes consumed so far.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Reads whatever was appended since the last call.
    ///
    /// Returns `Ok(None)` when the file is absent or has not grown.
    pub async fn read_new(&mut self) -> std::io::Result<Option<String>> {
        let len = match tokio::fs::metadata(&self.path).await {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };

        if len < self.offset {
            log::debug!("{} shrank, restarting from the beginning", self.path.display());
            self.offset = 0;
            self.pending.clear();
        }
        if len == self.offset {
            return Ok(None);
        }

        let mut file = tokio::fs::File::open(&self.path).await?;
        file.seek(SeekFrom::Start(self.offset)).await?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes).await?;
        self.offset += bytes.len() as u64;

        self.pending.extend_from_slice(&bytes);
        Ok(self.take_complete())
    }

    /// Decodes the complete UTF-8 prefix of `pending`.
    fn take_complete(&mut self) -> Option<String> {
        let complete = match std::str::from_utf8(&self.pending) {
            Ok(_) => self.pending.len(),
            // an incomplete sequence at the end waits for more bytes
            Err(e) if e.error_len().is_none() => e.valid_up_to(),
            // invalid bytes are passed on lossily
            Err(_) => self.pending.len(),
        };
        if complete == 0 {
            return None;
        }

        let rest = self.pending.split_off(complete);
        let text = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending = rest;
        Some(text)
    }
}

/// Polls `reader` every `interval` until `probe` reports exit and the grace
/// polls are used up, forwarding new content to `sink`.
///
/// Read errors are logged and retried on the next tick. Ends with
/// [`FINISHED_MARKER`].
pub async fn tail_until_exit<P>(
    reader: &mut TranscriptReader,
    probe: &mut P,
    interval: Duration,
    grace: u32,
    sink: &EventSink,
) where
    P: ProcessProbe + ?Sized,
{
    let mut state = TailState::Running;

    while state != TailState::Done {
        match reader.read_new().await {
            Ok(Some(content)) => sink.log(content),
            Ok(None) => {}
            Err(e) => log::debug!("Transcript {} not readable yet: {}", reader.path().display(), e),
        }

        state = state.next(probe.is_alive(), grace);
        if state != TailState::Done {
            tokio::time::sleep(interval).await;
        }
    }

    sink.log(FINISHED_MARKER);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grace_period_counts_polls_after_exit() {
        let mut state = TailState::Running;
        state = state.next(true, GRACE_POLLS);
        assert_eq!(state, TailState::Running);

        let mut polls_after_exit = 1;
        state = state.next(false, GRACE_POLLS);
        while state != TailState::Done {
            state = state.next(true, GRACE_POLLS);
            polls_after_exit += 1;
        }
        assert_eq!(polls_after_exit, GRACE_POLLS);
    }

    #[test]
    fn zero_grace_stops_immediately() {
        assert_eq!(TailState::Running.next(false, 0), TailState::Done);
        assert_eq!(TailState::Running.next(false, 1), TailState::Done);
        assert_eq!(TailState::Done.next(true, 5), TailState::Done);
    }

    #[tokio::test]
    async fn reads_only_new_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test_output.txt");
        let mut reader = TranscriptReader::new(&path);

        assert_eq!(reader.read_new().await.unwrap(), None);

        std::fs::write(&path, "first\n").unwrap();
        assert_eq!(reader.read_new().await.unwrap().as_deref(), Some("first\n"));
        assert_eq!(reader.read_new().await.unwrap(), None);

        use std::io::Write;
        let mut file = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(b"second\n").unwrap();
        assert_eq!(reader.read_new().await.unwrap().as_deref(), Some("second\n"));
        assert_eq!(reader.offset(), 13);
    }

    #[tokio::test]
    async fn split_utf8_sequence_is_held_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test_output.txt");
        let mut reader = TranscriptReader::new(&path);
        let euro = "€".as_bytes();

        std::fs::write(&path, [&b"a"[..], &euro[..1]].concat()).unwrap();
        assert_eq!(reader.read_new().await.unwrap().as_deref(), Some("a"));

        use std::io::Write;
        let mut file = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(&euro[1..]).unwrap();
        assert_eq!(reader.read_new().await.unwrap().as_deref(), Some("€"));
    }
}
