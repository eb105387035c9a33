//! Result delivery.
//!
//! Finalized windows leave the engine core through a bounded queue drained by
//! a dedicated worker thread that owns the [`Sink`]. The engine never blocks
//! longer than `sink_retry_budget * sink_handoff_timeout` on a slow sink.

use std::io::Write;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, SendTimeoutError, Sender};
use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::metrics::EngineMetrics;
use crate::types::FinalizedWindow;

mod handoff;
mod queue;
mod sinks;

pub use handoff::*;
pub use queue::*;
pub use sinks::*;

#[cfg(test)]
#[path = "tests/sink_tests.rs"]
mod tests;

/// Outcome of a single delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkAck {
    Accepted,
    /// Transient refusal; the worker retries within the budget.
    Rejected(String),
}

/// Destination for finalized windows. Runs on the sink worker thread.
pub trait Sink: Send {
    fn accept(&mut self, row: &FinalizedWindow) -> SinkAck;

    /// Called once after the last row, on shutdown.
    fn close(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}

impl<S: Sink + ?Sized> Sink for Box<S> {
    fn accept(&mut self, row: &FinalizedWindow) -> SinkAck {
        (**self).accept(row)
    }

    fn close(&mut self) -> anyhow::Result<()> {
        (**self).close()
    }
}
