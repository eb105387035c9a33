//! Bounded queue between the engine core and the sink worker.
//!
//! Uses crossbeam-channel for bounded, backpressure-aware hand-off. Unlike a
//! blocking send, [`SinkQueueSender::send_within`] gives up after a timeout
//! so a stuck sink cannot stall event processing.

use super::*;

/// Why a timed send did not enqueue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueFull {
    /// Still full when the timeout elapsed.
    Timeout,
    /// The worker is gone.
    Closed,
}

/// Sender side of the sink queue.
#[derive(Clone)]
pub struct SinkQueueSender {
    sender: Sender<FinalizedWindow>,
}

impl SinkQueueSender {
    /// Enqueue a row, waiting at most `timeout` for space.
    ///
    /// On failure the row is handed back so the caller can retry.
    pub fn send_within(
        &self,
        row: FinalizedWindow,
        timeout: Duration,
    ) -> Result<(), (FinalizedWindow, QueueFull)> {
        self.sender.send_timeout(row, timeout).map_err(|e| match e {
            SendTimeoutError::Timeout(row) => (row, QueueFull::Timeout),
            SendTimeoutError::Disconnected(row) => (row, QueueFull::Closed),
        })
    }

    pub fn len(&self) -> usize {
        self.sender.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sender.is_empty()
    }
}

/// Receiver side of the sink queue.
pub struct SinkQueueReceiver {
    receiver: Receiver<FinalizedWindow>,
}

impl SinkQueueReceiver {
    /// Block until the next row; `None` once every sender is dropped and the
    /// queue is empty.
    pub fn recv(&self) -> Option<FinalizedWindow> {
        self.receiver.recv().ok()
    }
}

/// Create a bounded sink queue pair.
pub fn sink_queue(capacity: usize) -> (SinkQueueSender, SinkQueueReceiver) {
    let (sender, receiver) = bounded(capacity);
    (SinkQueueSender { sender }, SinkQueueReceiver { receiver })
}
