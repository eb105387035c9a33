//! Error taxonomy for the engine.
//!
//! Per-event errors ([`EngineError`]) are local and never halt the pipeline.
//! Only a failed dimension refresh ([`DimensionError`]) and an invalid
//! configuration ([`ConfigError`]) are hard failures for their caller.

use thiserror::Error;

use crate::types::EventTime;

/// Classified per-event failure.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// Bad or missing key, timestamp, value or mandatory join key.
    #[error("malformed event: {0}")]
    MalformedEvent(String),

    /// Timestamp precedes the current watermark.
    #[error("late event: timestamp {timestamp}ms is behind watermark {watermark}ms")]
    LateEvent {
        timestamp: EventTime,
        watermark: EventTime,
    },

    /// Join key absent from the dimension store. Handled per join policy.
    #[error("no dimension record for join key {key:?}")]
    UnmatchedJoin { key: String },

    /// A finalized window could not be delivered within the retry budget.
    #[error("sink overflow: result dropped after {attempts} attempts")]
    SinkOverflow { attempts: u32 },

    /// The engine is draining and no longer accepts events.
    #[error("engine is shutting down")]
    ShutdownInProgress,
}

impl EngineError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        EngineError::MalformedEvent(reason.into())
    }
}

/// A dimension refresh was refused; the previous snapshot stays in place.
#[derive(Debug, Error)]
pub enum DimensionError {
    #[error("dimension record #{index} has an empty key")]
    EmptyKey { index: usize },

    #[error("duplicate dimension key {0:?}")]
    DuplicateKey(String),

    #[error("unparsable dimension record set: {0}")]
    Parse(String),
}

/// Engine configuration could not be loaded or is inconsistent.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid engine config: {0}")]
    Invalid(String),
}
