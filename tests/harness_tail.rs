//! Transcript tailing delivers every written byte exactly once.

use kodegen_bundler_intune::packager::{
    Event, EventSink,
    events::drain,
    harness::{FINISHED_MARKER, ProcessProbe, TranscriptReader, tail_until_exit},
};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

/// Appends one chunk to the transcript every time liveness is checked and
/// reports exit together with the last chunk.
struct WritingProbe {
    path: PathBuf,
    chunks: Vec<Vec<u8>>,
    checks: usize,
}

impl ProcessProbe for WritingProbe {
    fn is_alive(&mut self) -> bool {
        if let Some(chunk) = self.chunks.get(self.checks) {
            let mut file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)
                .unwrap();
            file.write_all(chunk).unwrap();
        }
        self.checks += 1;
        self.checks < self.chunks.len()
    }
}

fn transcript(events: &[Event]) -> String {
    let mut text = String::new();
    for event in events {
        if let Event::Log(line) = event {
            if line != FINISHED_MARKER {
                text.push_str(line);
            }
        }
    }
    text
}

async fn tail(chunks: Vec<Vec<u8>>, grace: u32) -> (Vec<Event>, WritingProbe) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test_output.txt");
    let mut probe = WritingProbe {
        path: path.clone(),
        chunks,
        checks: 0,
    };
    let mut reader = TranscriptReader::new(&path);
    let (sink, mut rx) = EventSink::channel();

    tail_until_exit(&mut reader, &mut probe, Duration::from_millis(5), grace, &sink).await;
    (drain(&mut rx), probe)
}

#[tokio::test]
async fn every_byte_arrives_once() {
    let mut expected = String::new();
    let mut chunks = Vec::new();
    for i in 0..40 {
        let line = format!("line {:02}: {}\r\n", i, "x".repeat(i * 7));
        expected.push_str(&line);
        chunks.push(line.into_bytes());
    }

    let (events, _) = tail(chunks, 5).await;

    assert_eq!(transcript(&events), expected);
    assert!(matches!(events.last(), Some(Event::Log(line)) if line == FINISHED_MARKER));
}

#[tokio::test]
async fn multibyte_text_split_across_writes() {
    let text = "Installing Café… ✓ done\n";
    let bytes = text.as_bytes();
    let chunks: Vec<Vec<u8>> = bytes.chunks(3).map(<[u8]>::to_vec).collect();

    let (events, _) = tail(chunks, 5).await;

    assert_eq!(transcript(&events), text);
}

#[tokio::test]
async fn output_flushed_at_exit_is_caught_by_grace_polls() {
    let chunks = vec![b"started\n".to_vec(), b"flushed late\n".to_vec()];

    let (events, probe) = tail(chunks, 5).await;

    assert_eq!(transcript(&events), "started\nflushed late\n");
    // one check while alive, then the grace polls
    assert_eq!(probe.checks, 1 + 5);
}

#[tokio::test]
async fn absent_transcript_still_finishes() {
    let (events, _) = tail(Vec::new(), 2).await;

    assert_eq!(events, vec![Event::Log(FINISHED_MARKER.into())]);
}
