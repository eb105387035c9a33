use super::*;

fn row(start: i64, key: &str, mean: f64) -> FinalizedWindow {
    FinalizedWindow {
        window_start: start,
        window_end: start + 3_000,
        group_key: key.to_string(),
        mean,
        sample_count: 1,
    }
}

fn config(capacity: usize, retries: u32, timeout_ms: u64) -> EngineConfig {
    EngineConfig {
        sink_queue_capacity: capacity,
        sink_retry_budget: retries,
        sink_handoff_timeout: Duration::from_millis(timeout_ms),
        ..EngineConfig::default()
    }
}

/// Blocks inside `accept` until the gate is opened.
struct GatedSink {
    entered: Sender<()>,
    gate: Receiver<()>,
    inner: CollectSink,
}

impl Sink for GatedSink {
    fn accept(&mut self, row: &FinalizedWindow) -> SinkAck {
        let _ = self.entered.send(());
        let _ = self.gate.recv();
        self.inner.accept(row)
    }
}

/// Rejects the first `failures` attempts.
struct FlakySink {
    failures: u32,
    inner: CollectSink,
}

impl Sink for FlakySink {
    fn accept(&mut self, row: &FinalizedWindow) -> SinkAck {
        if self.failures > 0 {
            self.failures -= 1;
            return SinkAck::Rejected("busy".to_string());
        }
        self.inner.accept(row)
    }
}

#[test]
fn test_queue_send_within_times_out_when_full() {
    let (tx, rx) = sink_queue(1);
    tx.send_within(row(0, "a", 1.0), Duration::from_millis(5)).unwrap();
    let (back, why) = tx
        .send_within(row(3_000, "a", 2.0), Duration::from_millis(5))
        .unwrap_err();
    assert_eq!(why, QueueFull::Timeout);
    assert_eq!(back.window_start, 3_000);

    assert_eq!(rx.recv().unwrap().window_start, 0);
    drop(rx);
    let (_, why) = tx
        .send_within(row(6_000, "a", 3.0), Duration::from_millis(5))
        .unwrap_err();
    assert_eq!(why, QueueFull::Closed);
}

#[test]
fn test_handoff_delivers_in_order_and_closes() {
    let collect = CollectSink::new();
    let metrics = Arc::new(EngineMetrics::new());
    let handoff = SinkHandoff::spawn(collect.clone(), &config(8, 3, 100), Arc::clone(&metrics)).unwrap();

    for i in 0..5 {
        handoff.offer(row(i * 3_000, "1001", i as f64)).unwrap();
    }
    handoff.close().unwrap();

    let rows = collect.rows();
    assert_eq!(rows.len(), 5);
    assert!(rows.windows(2).all(|w| w[0].window_start < w[1].window_start));
    assert_eq!(metrics.snapshot().windows_emitted, 5);
    assert_eq!(metrics.sink_overflow(), 0);
}

#[test]
fn test_stuck_sink_counts_overflow() {
    let (entered_tx, entered_rx) = crossbeam_channel::unbounded();
    let (gate_tx, gate_rx) = crossbeam_channel::unbounded();
    let collect = CollectSink::new();
    let sink = GatedSink {
        entered: entered_tx,
        gate: gate_rx,
        inner: collect.clone(),
    };
    let metrics = Arc::new(EngineMetrics::new());
    let handoff = SinkHandoff::spawn(sink, &config(1, 2, 5), Arc::clone(&metrics)).unwrap();

    // Worker picks up the first row and blocks inside the sink.
    handoff.offer(row(0, "a", 1.0)).unwrap();
    entered_rx.recv().unwrap();
    // Second row fills the single queue slot.
    handoff.offer(row(3_000, "a", 2.0)).unwrap();
    // Third row cannot be placed within 1 + 2 attempts.
    let err = handoff.offer(row(6_000, "a", 3.0)).unwrap_err();
    assert_eq!(err, EngineError::SinkOverflow { attempts: 3 });
    assert_eq!(metrics.sink_overflow(), 1);

    // Unblock and drain.
    gate_tx.send(()).unwrap();
    gate_tx.send(()).unwrap();
    handoff.close().unwrap();

    let starts: Vec<i64> = collect.rows().iter().map(|r| r.window_start).collect();
    assert_eq!(starts, vec![0, 3_000]);
    assert_eq!(metrics.snapshot().windows_emitted, 2);
}

#[test]
fn test_worker_retries_rejections_within_budget() {
    let collect = CollectSink::new();
    let metrics = Arc::new(EngineMetrics::new());
    let sink = FlakySink {
        failures: 2,
        inner: collect.clone(),
    };
    let handoff = SinkHandoff::spawn(sink, &config(4, 2, 50), Arc::clone(&metrics)).unwrap();
    handoff.offer(row(0, "a", 1.0)).unwrap();
    handoff.close().unwrap();

    assert_eq!(collect.len(), 1);
    assert_eq!(metrics.sink_overflow(), 0);
}

#[test]
fn test_worker_drops_after_exhausting_rejections() {
    let collect = CollectSink::new();
    let metrics = Arc::new(EngineMetrics::new());
    let sink = FlakySink {
        failures: 10,
        inner: collect.clone(),
    };
    let handoff = SinkHandoff::spawn(sink, &config(4, 1, 50), Arc::clone(&metrics)).unwrap();
    handoff.offer(row(0, "a", 1.0)).unwrap();
    handoff.close().unwrap();

    assert!(collect.is_empty());
    assert_eq!(metrics.sink_overflow(), 1);
}

#[test]
fn test_json_lines_sink_writes_one_object_per_row() {
    let mut sink = JsonLinesSink::new(Vec::new());
    assert_eq!(sink.accept(&row(0, "1001", 20.0)), SinkAck::Accepted);
    assert_eq!(sink.accept(&row(3_000, "1002", 25.5)), SinkAck::Accepted);
    sink.close().unwrap();

    let text = String::from_utf8(sink.into_inner()).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(first["group_key"], "1001");
    assert_eq!(first["mean"], 20.0);
    assert_eq!(first["window_end"], 3_000);
}

#[test]
fn test_boxed_sink_is_a_sink() {
    let collect = CollectSink::new();
    let mut boxed: Box<dyn Sink> = Box::new(collect.clone());
    assert_eq!(boxed.accept(&row(0, "a", 1.0)), SinkAck::Accepted);
    assert!(boxed.close().is_ok());
    assert_eq!(collect.len(), 1);
}

#[test]
fn test_log_sink_accepts_every_row_through_handoff() {
    let mut sink = LogSink;
    assert_eq!(sink.accept(&row(0, "1001", 20.0)), SinkAck::Accepted);

    let metrics = Arc::new(EngineMetrics::new());
    let boxed: Box<dyn Sink> = Box::new(LogSink);
    let handoff = SinkHandoff::spawn(boxed, &config(4, 0, 50), Arc::clone(&metrics)).unwrap();
    for i in 0..3 {
        handoff.offer(row(i * 3_000, "1001", i as f64)).unwrap();
    }
    handoff.close().unwrap();

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.windows_emitted, 3);
    assert_eq!(snapshot.sink_overflow, 0);
}
