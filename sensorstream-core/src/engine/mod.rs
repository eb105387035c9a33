//! The single-threaded engine core.
//!
//! # Event Loop
//!
//! ```text
//! loop {
//!     raw = source.next()
//!     event = validate(raw)                 // malformed: counted, watermark untouched
//!     buffer.admit(event, watermark)        // late: counted, dropped
//!     advance = tracker.observe(event.ts)
//!     for e in buffer.release(advance.after) {
//!         enricher.enrich(e) -> aggregator.ingest()
//!     }
//!     for row in aggregator.advance(advance.after) {
//!         sink_handoff.offer(row)
//!     }
//! }
//! ```
//!
//! The tracker, buffer, enricher and aggregator are owned by [`Engine`] and
//! touched only from the thread driving it. The dimension store and the sink
//! worker are the only shared parts.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::dimension::DimensionStore;
use crate::enrich::{Enricher, JoinOutcome};
use crate::error::EngineError;
use crate::metrics::{EngineMetrics, MetricsSnapshot};
use crate::ordering::{Admission, OrderingBuffer};
use crate::sink::{Sink, SinkHandoff};
use crate::source::{into_event, EventSource};
use crate::time::WatermarkTracker;
use crate::types::{Event, RawEvent, Watermark};
use crate::window::{TumblingEventTimeWindows, TumblingWindowAggregator};

mod pipeline;
mod shutdown;

pub use pipeline::*;
pub use shutdown::*;

#[cfg(test)]
#[path = "tests/engine_tests.rs"]
mod tests;
