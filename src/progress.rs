//! Progress reporting decoupled from the pipeline.
//!
//! The pipeline only ever calls [`ProgressSink::publish`], which must not
//! block: the console presenter runs on its own thread behind an unbounded
//! channel, and a vanished presenter just means events are dropped.

use std::io::Write as _;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread::JoinHandle;

/// One observation about the run. Purely informational; consuming these is
/// optional.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Rows { completed: usize, total: usize },
    Message(String),
}

/// Best-effort outbound event channel. Implementations must never block the
/// caller and are invoked from many worker threads at once.
pub trait ProgressSink: Sync {
    fn publish(&self, event: ProgressEvent);
}

/// Sink for quiet runs.
pub struct NullSink;

impl ProgressSink for NullSink {
    fn publish(&self, _event: ProgressEvent) {}
}

/// Channel-backed sink feeding the console presenter thread.
pub struct ConsoleSink {
    tx: mpsc::Sender<ProgressEvent>,
}

impl ProgressSink for ConsoleSink {
    fn publish(&self, event: ProgressEvent) {
        // Unbounded send; a closed receiver is not our problem.
        let _ = self.tx.send(event);
    }
}

/// Handle for the presenter thread. Join it after the sink is dropped so the
/// final state reaches the terminal.
pub struct ConsolePresenter {
    handle: JoinHandle<()>,
}

impl ConsolePresenter {
    pub fn finish(self) {
        let _ = self.handle.join();
    }
}

/// Spawn the single-line stderr presenter and return its sink.
pub fn console() -> (ConsoleSink, ConsolePresenter) {
    let (tx, rx) = mpsc::channel();
    let handle = std::thread::spawn(move || {
        let mut drew = false;
        for event in rx {
            let line = match event {
                ProgressEvent::Rows { completed, total } => {
                    let percent = if total == 0 {
                        100.0
                    } else {
                        completed as f64 / total as f64 * 100.0
                    };
                    format!("Enriching rows: {completed}/{total} ({percent:.0}%)")
                }
                ProgressEvent::Message(text) => text,
            };
            let mut stderr = std::io::stderr().lock();
            let _ = write!(stderr, "\r\x1b[2K{line}");
            let _ = stderr.flush();
            drew = true;
        }
        if drew {
            let mut stderr = std::io::stderr().lock();
            let _ = writeln!(stderr);
        }
    });
    (ConsoleSink { tx }, ConsolePresenter { handle })
}

/// Shared completed-row counter bound to a sink for the duration of one run.
pub struct ProgressTracker<'a> {
    completed: AtomicUsize,
    total: usize,
    sink: &'a dyn ProgressSink,
}

impl<'a> ProgressTracker<'a> {
    pub fn new(total: usize, sink: &'a dyn ProgressSink) -> Self {
        Self {
            completed: AtomicUsize::new(0),
            total,
            sink,
        }
    }

    /// Record one finished row and publish the updated count.
    pub fn row_done(&self) {
        let completed = self.completed.fetch_add(1, Ordering::SeqCst) + 1;
        self.sink.publish(ProgressEvent::Rows {
            completed,
            total: self.total,
        });
    }

    #[allow(dead_code)]
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }
}
