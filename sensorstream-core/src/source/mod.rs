//! Event source adapters.
//!
//! Adapters only translate transport payloads into [`RawEvent`]s; validation
//! into an [`Event`] happens once, in [`into_event`], before the engine lets
//! an event touch the watermark.

use chrono::{DateTime, NaiveDateTime};

use crate::error::EngineError;
use crate::types::{Event, EventTime, FieldValue, Fields, RawEvent, RawTimestamp, EVENT_TIME_MIN};

mod decoder;

pub use decoder::*;

#[cfg(test)]
#[path = "tests/source_tests.rs"]
mod tests;

/// Pull-based source of raw events.
///
/// `next` may block until a record is available. `Ok(None)` is end of stream.
pub trait EventSource: Send {
    fn next(&mut self) -> anyhow::Result<Option<RawEvent>>;
}

/// Source backed by any iterator, e.g. a replayed file or a test vector.
pub struct IterSource<I> {
    inner: I,
}

impl<I> IterSource<I>
where
    I: Iterator<Item = RawEvent> + Send,
{
    pub fn new(iter: impl IntoIterator<IntoIter = I>) -> Self {
        Self {
            inner: iter.into_iter(),
        }
    }
}

impl<I> EventSource for IterSource<I>
where
    I: Iterator<Item = RawEvent> + Send,
{
    fn next(&mut self) -> anyhow::Result<Option<RawEvent>> {
        Ok(self.inner.next())
    }
}

impl EventSource for crossbeam_channel::Receiver<RawEvent> {
    /// Blocks until a record arrives; all senders dropped ends the stream.
    fn next(&mut self) -> anyhow::Result<Option<RawEvent>> {
        Ok(self.recv().ok())
    }
}

/// Layout accepted for text timestamps without an offset (interpreted as UTC).
pub const TEXT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parse a raw timestamp into epoch milliseconds.
///
/// Accepts integer milliseconds, `YYYY-MM-DD HH:MM:SS` (UTC) and RFC 3339.
pub fn parse_timestamp(raw: &RawTimestamp) -> Result<EventTime, EngineError> {
    match raw {
        RawTimestamp::Millis(ms) => Ok(*ms),
        RawTimestamp::Text(text) => {
            let text = text.trim();
            if let Ok(naive) = NaiveDateTime::parse_from_str(text, TEXT_TIMESTAMP_FORMAT) {
                return Ok(naive.and_utc().timestamp_millis());
            }
            if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
                return Ok(dt.timestamp_millis());
            }
            if let Ok(ms) = text.parse::<i64>() {
                return Ok(ms);
            }
            Err(EngineError::malformed(format!(
                "unparsable timestamp {text:?}"
            )))
        }
    }
}

/// Validate a raw event: key and timestamp must be present and parsable.
pub fn into_event(raw: RawEvent) -> Result<Event, EngineError> {
    let key = match raw.key {
        Some(key) if !key.trim().is_empty() => key,
        _ => return Err(EngineError::malformed("missing key")),
    };
    let timestamp = raw
        .timestamp
        .as_ref()
        .ok_or_else(|| EngineError::malformed("missing timestamp"))
        .and_then(parse_timestamp)?;
    if timestamp == EVENT_TIME_MIN {
        return Err(EngineError::malformed(
            "timestamp is the reserved minimum event time",
        ));
    }
    Ok(Event {
        key,
        timestamp,
        fields: raw.fields,
    })
}
