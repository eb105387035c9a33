use super::*;

/// Per-window, per-group accumulators. Both levels are ordered so output is
/// deterministic.
type WindowState = BTreeMap<String, MeanAccumulator>;

/// Buckets enriched events into tumbling windows and averages a numeric field
/// per `(window, group_key)`.
///
/// # Processing model
///
/// - **Events**: assigned to one window, grouped by the configured key and
///   folded into a [`MeanAccumulator`].
/// - **Watermarks**: every open window the trigger fires is emitted as one
///   [`FinalizedWindow`] per observed group and then evicted.
/// - **Drain**: the trigger decides per [`DrainPolicy`] whether open windows
///   are flushed or discarded.
///
/// Groups that never received an event have no accumulator and therefore
/// never produce a row.
pub struct TumblingWindowAggregator<TR: Trigger = EventTimeTrigger> {
    assigner: TumblingEventTimeWindows,
    trigger: TR,
    function: Mean,
    group_by: GroupBy,
    missing_group_label: String,
    value_field: String,
    windows: BTreeMap<TimeWindow, WindowState>,
    current_watermark: EventTime,
}

impl TumblingWindowAggregator<EventTimeTrigger> {
    /// Aggregator closing windows at `window.end + config.max_lateness`.
    pub fn new(config: &EngineConfig) -> Self {
        Self::with_trigger(
            config,
            EventTimeTrigger::with_allowed_lateness(config.max_lateness),
        )
    }
}

impl<TR: Trigger> TumblingWindowAggregator<TR> {
    pub fn with_trigger(config: &EngineConfig, trigger: TR) -> Self {
        Self {
            assigner: TumblingEventTimeWindows::of(config.window_size),
            trigger,
            function: Mean,
            group_by: config.group_by.clone(),
            missing_group_label: config.missing_group_label.clone(),
            value_field: config.value_field.clone(),
            windows: BTreeMap::new(),
            current_watermark: EVENT_TIME_MIN,
        }
    }

    /// Fold one enriched event into its window.
    ///
    /// Returns the window the event landed in. Fails with `MalformedEvent`
    /// when the value field is missing or not numeric, and with `LateEvent`
    /// when the window has already been finalized.
    pub fn ingest(&mut self, enriched: &EnrichedEvent) -> Result<TimeWindow, EngineError> {
        let event = &enriched.event;
        let value = event
            .field(&self.value_field)
            .and_then(|v| v.as_f64())
            .ok_or_else(|| {
                EngineError::malformed(format!(
                    "field {:?} missing or not numeric",
                    self.value_field
                ))
            })?;

        let window = self.assigner.assign(event.timestamp);
        if self
            .trigger
            .on_event_time(self.current_watermark, &window)
            .is_purge()
        {
            return Err(EngineError::LateEvent {
                timestamp: event.timestamp,
                watermark: self.current_watermark,
            });
        }

        let group_key = self.group_key(enriched);
        let acc = self
            .windows
            .entry(window)
            .or_default()
            .entry(group_key)
            .or_insert_with(|| self.function.create_accumulator());
        self.function.add(acc, &value);
        Ok(window)
    }

    /// Advance event time and finalize every window the trigger closes.
    pub fn advance(&mut self, watermark: Watermark) -> Vec<FinalizedWindow> {
        self.current_watermark = self.current_watermark.max(watermark.timestamp);

        let mut output = Vec::new();
        while let Some(entry) = self.windows.first_entry() {
            let result = self.trigger.on_event_time(self.current_watermark, entry.key());
            if result == TriggerResult::Continue {
                break;
            }
            let (window, groups) = entry.remove_entry();
            self.apply_trigger_result(window, groups, result, &mut output);
        }
        output
    }

    /// Close every open window according to `policy`.
    pub fn drain(&mut self, policy: DrainPolicy) -> Vec<FinalizedWindow> {
        let mut output = Vec::new();
        for (window, groups) in std::mem::take(&mut self.windows) {
            let result = self.trigger.on_drain(policy, &window);
            self.apply_trigger_result(window, groups, result, &mut output);
        }
        output
    }

    fn apply_trigger_result(
        &mut self,
        window: TimeWindow,
        groups: WindowState,
        trigger_result: TriggerResult,
        output: &mut Vec<FinalizedWindow>,
    ) {
        if trigger_result.is_fire() {
            let before = output.len();
            for (group_key, acc) in groups {
                if let Some(result) = self.function.get_result(acc) {
                    output.push(FinalizedWindow {
                        window_start: window.start,
                        window_end: window.end,
                        group_key,
                        mean: result.mean,
                        sample_count: result.count,
                    });
                }
            }
            tracing::debug!(%window, rows = output.len() - before, "window finalized");
            return;
        }

        if trigger_result.is_purge() {
            tracing::debug!(%window, groups = groups.len(), "window discarded");
            return;
        }

        // Continue on drain keeps the window open.
        self.windows.insert(window, groups);
    }

    fn group_key(&self, enriched: &EnrichedEvent) -> String {
        match &self.group_by {
            GroupBy::Key => enriched.event.key.clone(),
            GroupBy::Field(name) => match enriched.event.field(name) {
                Some(v) if !v.is_null() => v.to_string(),
                _ => self.missing_group_label.clone(),
            },
        }
    }

    /// Return the number of open windows.
    pub fn open_window_count(&self) -> usize {
        self.windows.len()
    }

    /// Return the number of live `(window, group)` accumulators.
    pub fn group_count(&self) -> usize {
        self.windows.values().map(|groups| groups.len()).sum()
    }

    pub fn current_watermark(&self) -> EventTime {
        self.current_watermark
    }
}
