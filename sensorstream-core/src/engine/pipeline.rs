use super::*;

/// One streaming aggregation pipeline.
///
/// Feed it with [`Engine::process`] (or [`Engine::run`] over an
/// [`EventSource`]) and stop it with [`Engine::shutdown`], which drains open
/// state per the configured drain policy and closes the sink.
pub struct Engine {
    config: EngineConfig,
    tracker: WatermarkTracker,
    windows: TumblingEventTimeWindows,
    buffer: OrderingBuffer,
    enricher: Enricher,
    aggregator: TumblingWindowAggregator,
    handoff: SinkHandoff,
    metrics: Arc<EngineMetrics>,
    shutdown: ShutdownHandle,
}

impl Engine {
    /// Validate `config`, wire the stages and start the sink worker.
    pub fn new<S>(config: EngineConfig, store: Arc<DimensionStore>, sink: S) -> anyhow::Result<Self>
    where
        S: Sink + 'static,
    {
        config.validate()?;
        let metrics = Arc::new(EngineMetrics::new());
        let handoff = SinkHandoff::spawn(sink, &config, Arc::clone(&metrics))?;

        info!(
            window_size = ?config.window_size,
            max_lateness = ?config.max_lateness,
            join_policy = ?config.join_policy,
            "engine started"
        );

        Ok(Self {
            tracker: WatermarkTracker::new(config.max_lateness),
            windows: TumblingEventTimeWindows::of(config.window_size),
            buffer: OrderingBuffer::new(TumblingEventTimeWindows::of(config.window_size)),
            enricher: Enricher::new(store, &config),
            aggregator: TumblingWindowAggregator::new(&config),
            handoff,
            metrics,
            shutdown: ShutdownHandle::new(),
            config,
        })
    }

    /// Handle one raw event.
    ///
    /// Errors are per event and already counted; the engine stays usable.
    /// Malformed events never reach the watermark tracker.
    pub fn process(&mut self, raw: RawEvent) -> Result<Admission, EngineError> {
        if self.shutdown.is_shutdown() {
            return Err(EngineError::ShutdownInProgress);
        }
        self.metrics.record_ingested();

        let event = match self.validate(raw) {
            Ok(event) => event,
            Err(e) => {
                self.metrics.record_malformed();
                warn!(error = %e, "dropping malformed event");
                return Err(e);
            }
        };

        let timestamp = event.timestamp;
        let watermark = self.tracker.current();
        if self.buffer.admit(event, watermark) == Admission::DroppedLate {
            self.metrics.record_dropped_late();
            warn!(timestamp, watermark = watermark.timestamp, "dropping late event");
            return Err(EngineError::LateEvent {
                timestamp,
                watermark: watermark.timestamp,
            });
        }

        let advance = self.tracker.observe(timestamp);
        if advance.advanced() {
            self.on_watermark(advance.after);
        }
        Ok(Admission::Held)
    }

    /// Pull from `source` until it ends or shutdown is requested.
    ///
    /// Returns the number of records pulled. Per-event errors are logged by
    /// [`Engine::process`]; only source failures end the run early.
    pub fn run(&mut self, source: &mut dyn EventSource) -> anyhow::Result<u64> {
        let mut pulled = 0u64;
        while !self.shutdown.is_shutdown() {
            let Some(raw) = source.next()? else {
                debug!(pulled, "source exhausted");
                break;
            };
            pulled += 1;
            match self.process(raw) {
                Ok(_) | Err(EngineError::LateEvent { .. }) | Err(EngineError::MalformedEvent(_)) => {}
                Err(EngineError::ShutdownInProgress) => break,
                Err(e) => debug!(error = %e, "event not processed"),
            }
        }
        Ok(pulled)
    }

    /// Stop accepting events, drain open state and close the sink.
    ///
    /// Held events are released through enrichment into the aggregator; open
    /// windows are then flushed or discarded per the drain policy.
    pub fn shutdown(mut self) -> anyhow::Result<MetricsSnapshot> {
        self.shutdown.shutdown();

        let held = self.buffer.drain();
        info!(held = held.len(), policy = ?self.config.drain_policy, "draining engine");
        self.aggregate(held);

        let rows = self.aggregator.drain(self.config.drain_policy);
        for row in rows {
            if let Err(e) = self.handoff.offer(row) {
                debug!(error = %e, "drained window not delivered");
            }
        }

        let Engine {
            handoff, metrics, ..
        } = self;
        handoff.close()?;

        let snapshot = metrics.snapshot();
        info!(?snapshot, "engine stopped");
        Ok(snapshot)
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    pub fn metrics(&self) -> Arc<EngineMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn watermark(&self) -> Watermark {
        self.tracker.current()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Events held by the ordering buffer.
    pub fn held_events(&self) -> usize {
        self.buffer.len()
    }

    /// Windows with live accumulators.
    pub fn open_windows(&self) -> usize {
        self.aggregator.open_window_count()
    }

    fn validate(&self, raw: RawEvent) -> Result<Event, EngineError> {
        let event = into_event(raw)?;
        if self.windows.try_assign(event.timestamp).is_none() {
            let ts = event.timestamp;
            return Err(EngineError::malformed(format!(
                "timestamp {ts}ms has no representable window"
            )));
        }
        self.enricher.validate(&event)?;
        let value_field = &self.config.value_field;
        if event.field(value_field).and_then(|v| v.as_f64()).is_none() {
            return Err(EngineError::malformed(format!(
                "field {value_field:?} missing or not numeric"
            )));
        }
        Ok(event)
    }

    fn on_watermark(&mut self, watermark: Watermark) {
        let released = self.buffer.release(watermark);
        if !released.is_empty() {
            debug!(count = released.len(), %watermark, "released events");
            self.aggregate(released);
        }

        for row in self.aggregator.advance(watermark) {
            info!(window = %row, "window finalized");
            if let Err(e) = self.handoff.offer(row) {
                debug!(error = %e, "finalized window not delivered");
            }
        }
    }

    fn aggregate(&mut self, events: Vec<Event>) {
        self.metrics.record_events_released(events.len() as u64);
        for event in events {
            let enriched = match self.enricher.enrich(event) {
                JoinOutcome::Matched(enriched) => enriched,
                JoinOutcome::Unmatched(enriched) => {
                    self.metrics.record_unmatched_join();
                    enriched
                }
                JoinOutcome::Dropped { key } => {
                    self.metrics.record_unmatched_join();
                    debug!(%key, "inner join dropped event");
                    continue;
                }
            };
            if let Err(e) = self.aggregator.ingest(&enriched) {
                match e {
                    EngineError::LateEvent { .. } => self.metrics.record_dropped_late(),
                    _ => self.metrics.record_malformed(),
                }
                warn!(error = %e, key = %enriched.event.key, "event rejected by aggregator");
            }
        }
    }
}
