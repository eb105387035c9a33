//! Built-in sinks.

use super::*;

/// Collects rows in memory. Clones share the same buffer, so a test or the
/// replay command can keep a handle while the worker owns the sink.
#[derive(Debug, Clone, Default)]
pub struct CollectSink {
    rows: Arc<Mutex<Vec<FinalizedWindow>>>,
}

impl CollectSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything accepted so far.
    pub fn rows(&self) -> Vec<FinalizedWindow> {
        match self.rows.lock() {
            Ok(rows) => rows.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn len(&self) -> usize {
        match self.rows.lock() {
            Ok(rows) => rows.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Sink for CollectSink {
    fn accept(&mut self, row: &FinalizedWindow) -> SinkAck {
        match self.rows.lock() {
            Ok(mut rows) => {
                rows.push(row.clone());
                SinkAck::Accepted
            }
            Err(_) => SinkAck::Rejected("collector lock poisoned".to_string()),
        }
    }
}

/// Logs every row at `info`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl Sink for LogSink {
    fn accept(&mut self, row: &FinalizedWindow) -> SinkAck {
        info!(
            window_start = row.window_start,
            window_end = row.window_end,
            group = %row.group_key,
            mean = row.mean,
            n = row.sample_count,
            "window finalized"
        );
        SinkAck::Accepted
    }
}

/// Writes one JSON object per row to any writer.
pub struct JsonLinesSink<W: Write + Send> {
    writer: W,
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> Sink for JsonLinesSink<W> {
    fn accept(&mut self, row: &FinalizedWindow) -> SinkAck {
        let written = serde_json::to_writer(&mut self.writer, row)
            .map_err(std::io::Error::from)
            .and_then(|()| self.writer.write_all(b"\n"));
        match written {
            Ok(()) => SinkAck::Accepted,
            Err(e) => SinkAck::Rejected(e.to_string()),
        }
    }

    fn close(&mut self) -> anyhow::Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
