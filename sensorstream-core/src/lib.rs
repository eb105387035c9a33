//! # SensorStream Core
//!
//! Event-time streaming aggregation for keyed sensor readings.
//!
//! An [`Engine`](engine::Engine) ingests possibly out-of-order events, drops
//! those behind a bounded-lateness watermark, enriches the rest from a
//! slowly-changing dimension table and averages a numeric field per tumbling
//! window and group:
//!
//! - [`types`] — [`Event`](types::Event), [`RawEvent`](types::RawEvent),
//!   [`Watermark`](types::Watermark), [`FinalizedWindow`](types::FinalizedWindow).
//! - [`time`] — [`WatermarkTracker`](time::WatermarkTracker).
//! - [`ordering`] — [`OrderingBuffer`](ordering::OrderingBuffer), event-time
//!   release of held events.
//! - [`dimension`] — copy-on-write [`DimensionStore`](dimension::DimensionStore)
//!   and the static table join.
//! - [`enrich`] — [`Enricher`](enrich::Enricher) and join policies.
//! - [`window`] — window assignment, triggers and the
//!   [`TumblingWindowAggregator`](window::TumblingWindowAggregator).
//! - [`sink`] — the [`Sink`](sink::Sink) trait and bounded hand-off worker.
//! - [`source`] — [`EventSource`](source::EventSource) and JSON decoding.
//! - [`engine`] — the serial pipeline wiring all of the above.

pub mod config;
pub mod dimension;
pub mod engine;
pub mod enrich;
pub mod error;
pub mod metrics;
pub mod ordering;
pub mod sink;
pub mod source;
pub mod time;
pub mod types;
pub mod window;

pub use config::EngineConfig;
pub use engine::{Engine, ShutdownHandle};
pub use error::EngineError;
