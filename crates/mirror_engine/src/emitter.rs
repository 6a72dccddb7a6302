use engine_logging::engine_debug;
use tokio::sync::mpsc;

use crate::{OutcomeRecord, RunAbort, SyncReport};

/// Default capacity of the observer channel.
///
/// Sends still wait when the buffer is full, so records are never dropped
/// or reordered; the buffer only absorbs short consumer hiccups.
pub const DEFAULT_OBSERVER_CAPACITY: usize = 64;

pub type OutcomeSender = mpsc::Sender<OutcomeRecord>;
pub type OutcomeReceiver = mpsc::Receiver<OutcomeRecord>;

/// Creates the channel a presentation layer drains for live progress.
pub fn observer_channel(capacity: usize) -> (OutcomeSender, OutcomeReceiver) {
    mpsc::channel(capacity.max(1))
}

/// Append-only record log of a single run.
pub(crate) struct OutcomeLog {
    records: Vec<OutcomeRecord>,
    observer: Option<OutcomeSender>,
}

impl OutcomeLog {
    pub(crate) fn new(observer: Option<OutcomeSender>) -> Self {
        Self {
            records: Vec::new(),
            observer,
        }
    }

    /// Records the outcome and hands it to the observer before returning.
    pub(crate) async fn emit(&mut self, record: OutcomeRecord) {
        if let Some(observer) = &self.observer {
            if observer.send(record.clone()).await.is_err() {
                engine_debug!("Outcome observer went away; continuing without it");
                self.observer = None;
            }
        }
        self.records.push(record);
    }

    pub(crate) fn finish(self, abort: Option<RunAbort>) -> SyncReport {
        SyncReport {
            records: self.records,
            abort,
        }
    }
}
