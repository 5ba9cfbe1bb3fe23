//! One-way status, progress and log channel.
//!
//! Orchestrators never touch the consumer's state directly. They push
//! [`Event`]s into an [`EventSink`] and the owner of the receiving end drains
//! them on its own task, so a sink that is not thread-safe (a terminal writer,
//! a UI) only ever runs where it lives.

use tokio::sync::mpsc;

/// Something a long-running stage wants the caller to know.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Human-readable phase description
    Status(String),
    /// Overall completion in `[0.0, 1.0]`
    Progress(f64),
    /// Raw output line from a subprocess or transcript
    Log(String),
    /// A background run could not start or crashed; no more events follow
    Fatal(String),
}

/// Sending half of the event channel.
///
/// Cheap to clone. Sending never fails: when the receiver has gone away the
/// events are dropped.
#[derive(Clone, Debug)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<Event>,
}

impl EventSink {
    /// Creates a sink and the receiver that drains it.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Event>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Reports a status message (also logged).
    pub fn status(&self, message: impl Into<String>) {
        let message = message.into();
        log::info!("{}", message);
        self.send(Event::Status(message));
    }

    /// Reports overall progress, clamped to `[0.0, 1.0]`.
    pub fn progress(&self, fraction: f64) {
        self.send(Event::Progress(fraction.clamp(0.0, 1.0)));
    }

    /// Forwards a raw log line.
    pub fn log(&self, line: impl Into<String>) {
        self.send(Event::Log(line.into()));
    }

    /// Reports an error that ended a background run (also logged).
    pub fn fatal(&self, message: impl Into<String>) {
        let message = message.into();
        log::error!("{}", message);
        self.send(Event::Fatal(message));
    }

    fn send(&self, event: Event) {
        let _ = self.tx.send(event);
    }
}

/// Drains every event currently buffered in `rx` without waiting.
pub fn drain(rx: &mut mpsc::UnboundedReceiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Progress values in the order they were reported.
pub fn progress_values(events: &[Event]) -> Vec<f64> {
    events
        .iter()
        .filter_map(|event| match event {
            Event::Progress(value) => Some(*value),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_is_clamped() {
        let (sink, mut rx) = EventSink::channel();
        sink.progress(1.7);
        sink.progress(-0.2);
        assert_eq!(progress_values(&drain(&mut rx)), vec![1.0, 0.0]);
    }

    #[test]
    fn dropped_receiver_is_ignored() {
        let (sink, rx) = EventSink::channel();
        drop(rx);
        sink.status("still fine");
        sink.log("line");
    }
}
