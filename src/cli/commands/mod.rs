//! Command execution functions.
//!
//! Each subcommand drives one pipeline stage and prints its events as they
//! arrive. Stages push into an [`EventSink`]; a printer task owns the
//! receiving end and is the only place that writes to the terminal.

mod build;
mod inspect;
mod setup;
mod upload;

pub use build::run_build;
pub use inspect::run_inspect;
pub use setup::run_setup;
pub use test::run_test;
pub use upload::run_upload;

use super::{Args, OutputManager};
use crate::error::Result;
use crate::packager::{Config, Event, EventSink};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;

/// Loads the configuration named by `--config`, or the default one.
pub(crate) fn load_config(args: &Args) -> Result<Config> {
    let path = match &args.config {
        Some(path) => path.clone(),
        None => Config::default_path()?,
    };
    log::debug!("Loading configuration from {}", path.display());
    Ok(Config::load(&path)?)
}

/// Creates a sink and a task printing everything sent to it.
///
/// The task ends once every clone of the sink is dropped and resolves to
/// whether an [`Event::Fatal`] was seen. Raw log lines are printed when
/// `show_logs` is set or in verbose mode.
pub(crate) fn event_printer(output: OutputManager, show_logs: bool) -> (EventSink, JoinHandle<bool>) {
    let (sink, rx) = EventSink::channel();
    let handle = tokio::spawn(print_events(output, show_logs, rx));
    (sink, handle)
}

async fn print_events(output: OutputManager, show_logs: bool, mut rx: UnboundedReceiver<Event>) -> bool {
    let mut fatal = false;

    while let Some(event) = rx.recv().await {
        let printed = match &event {
            Event::Status(message) => output.progress(message),
            Event::Progress(fraction) => output.verbose(&format!("{:>3.0}%", fraction * 100.0)),
            Event::Log(line) if show_logs => output.indent(line.trim_end()),
            Event::Log(line) => output.verbose(line.trim_end()),
            Event::Fatal(message) => {
                fatal = true;
                output.error(&format!("Fatal Error: {}", message))
            }
        };
        if let Err(e) = printed {
            log::debug!("Failed to print event {:?}: {}", event, e);
        }
    }

    fatal
}
