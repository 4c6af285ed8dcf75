/*!
 * Observable side of a pipeline run: states, progress events, cancellation.
 *
 * Front ends subscribe to a channel of [`PipelineEvent`]s instead of
 * scraping log output, and stop a run through a shared [`CancellationFlag`].
 */

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Pipeline state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Loading,
    Resuming,
    Translating { batch: usize },
    Writing { batch: usize },
    Checkpointing { batch: usize },
    Finalizing,
    /// Whole document written, checkpoint removed
    Done,
    /// Cancelled between batches, resumable state left on disk
    Stopped,
    /// Aborted by an error, resumable state of earlier batches left on disk
    Failed,
}

/// Cumulative progress after a completed batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchProgress {
    /// Zero-based index of the batch just completed
    pub batch_index: usize,
    pub total_batches: usize,
    /// Characters in all completed batches, including resumed ones
    pub translated_chars: usize,
    pub total_chars: usize,
}

impl BatchProgress {
    pub fn percent(&self) -> f64 {
        if self.total_chars == 0 {
            return 100.0;
        }
        (self.translated_chars as f64 / self.total_chars as f64) * 100.0
    }

    pub fn remaining_chars(&self) -> usize {
        self.total_chars.saturating_sub(self.translated_chars)
    }
}

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every batch is written; `translated_batches` were done in this run
    Completed {
        total_batches: usize,
        translated_batches: usize,
    },
    /// Cancellation observed before `next_batch`
    Stopped {
        next_batch: usize,
        total_batches: usize,
    },
}

/// Notifications emitted during a run
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    Started {
        input: PathBuf,
        output: PathBuf,
        total_records: usize,
        total_chars: usize,
        total_batches: usize,
        start_batch: usize,
    },
    Resumed {
        next_batch: usize,
    },
    Restarted {
        reason: String,
    },
    StateChanged(PipelineState),
    BatchCompleted(BatchProgress),
    RetryScheduled {
        attempt: u32,
        delay: Duration,
        error: String,
    },
    EgressRotated {
        identity: Option<String>,
    },
    Stalled {
        consecutive_failures: u32,
    },
    Finished(RunOutcome),
}

/// Sending half of the event channel; a disabled sink drops everything
#[derive(Debug, Clone, Default)]
pub struct EventSink {
    sender: Option<UnboundedSender<PipelineEvent>>,
}

impl EventSink {
    pub fn new(sender: UnboundedSender<PipelineEvent>) -> Self {
        Self {
            sender: Some(sender),
        }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn emit(&self, event: PipelineEvent) {
        if let Some(sender) = &self.sender {
            // Receiver gone means nobody is watching; the run goes on.
            let _ = sender.send(event);
        }
    }
}

/// Create a connected sink/receiver pair
pub fn event_channel() -> (EventSink, UnboundedReceiver<PipelineEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventSink::new(tx), rx)
}

/// Shared stop request, polled between batches
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
