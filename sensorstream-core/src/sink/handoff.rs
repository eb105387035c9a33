use super::*;

/// Owns the sink worker thread and the sending half of its queue.
///
/// [`SinkHandoff::offer`] is called from the engine core;
/// [`SinkHandoff::close`] drains the queue, joins the worker and closes the
/// sink.
pub struct SinkHandoff {
    sender: Option<SinkQueueSender>,
    worker: Option<JoinHandle<anyhow::Result<()>>>,
    retry_budget: u32,
    handoff_timeout: Duration,
    metrics: Arc<EngineMetrics>,
}

impl SinkHandoff {
    /// Spawn the worker thread that feeds `sink`.
    pub fn spawn<S>(sink: S, config: &EngineConfig, metrics: Arc<EngineMetrics>) -> anyhow::Result<Self>
    where
        S: Sink + 'static,
    {
        let (sender, receiver) = sink_queue(config.sink_queue_capacity);
        let retry_budget = config.sink_retry_budget;
        let worker_metrics = Arc::clone(&metrics);
        let worker = std::thread::Builder::new()
            .name("sink-worker".to_string())
            .spawn(move || run_worker(sink, receiver, retry_budget, &worker_metrics))?;

        Ok(Self {
            sender: Some(sender),
            worker: Some(worker),
            retry_budget,
            handoff_timeout: config.sink_handoff_timeout,
            metrics,
        })
    }

    /// Hand a finalized window to the worker.
    ///
    /// Tries once plus `retry_budget` retries, each bounded by the hand-off
    /// timeout. Exhaustion drops the row and counts a sink overflow.
    pub fn offer(&self, row: FinalizedWindow) -> Result<(), EngineError> {
        let Some(sender) = &self.sender else {
            return Err(EngineError::ShutdownInProgress);
        };

        let attempts = self.retry_budget.saturating_add(1);
        let mut pending = row;
        for attempt in 1..=attempts {
            match sender.send_within(pending, self.handoff_timeout) {
                Ok(()) => {
                    self.metrics.record_windows_emitted(1);
                    return Ok(());
                }
                Err((row, QueueFull::Closed)) => {
                    self.metrics.record_sink_overflow();
                    warn!(window = %row, "sink worker gone, dropping result");
                    return Err(EngineError::SinkOverflow { attempts: attempt });
                }
                Err((row, QueueFull::Timeout)) => pending = row,
            }
        }

        self.metrics.record_sink_overflow();
        warn!(window = %pending, attempts, "sink queue full, dropping result");
        Err(EngineError::SinkOverflow { attempts })
    }

    /// Rows waiting in the queue.
    pub fn queued(&self) -> usize {
        self.sender.as_ref().map_or(0, SinkQueueSender::len)
    }

    /// Close the queue, wait for the worker to deliver what is queued, then
    /// close the sink.
    pub fn close(mut self) -> anyhow::Result<()> {
        self.finish()
    }

    fn finish(&mut self) -> anyhow::Result<()> {
        drop(self.sender.take());
        match self.worker.take() {
            Some(worker) => worker
                .join()
                .map_err(|_| anyhow::anyhow!("sink worker panicked"))?,
            None => Ok(()),
        }
    }
}

impl Drop for SinkHandoff {
    fn drop(&mut self) {
        if let Err(e) = self.finish() {
            warn!(error = %e, "sink hand-off did not shut down cleanly");
        }
    }
}

fn run_worker<S: Sink>(
    mut sink: S,
    receiver: SinkQueueReceiver,
    retry_budget: u32,
    metrics: &EngineMetrics,
) -> anyhow::Result<()> {
    while let Some(row) = receiver.recv() {
        deliver(&mut sink, &row, retry_budget, metrics);
    }
    sink.close()
}

fn deliver<S: Sink>(sink: &mut S, row: &FinalizedWindow, retry_budget: u32, metrics: &EngineMetrics) {
    let attempts = retry_budget.saturating_add(1);
    for attempt in 1..=attempts {
        match sink.accept(row) {
            SinkAck::Accepted => return,
            SinkAck::Rejected(reason) => {
                warn!(window = %row, attempt, %reason, "sink rejected result");
            }
        }
    }
    metrics.record_sink_overflow();
    warn!(window = %row, attempts, "sink kept rejecting, dropping result");
}
