use super::*;

/// The result returned by a [`Trigger`] to control window evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerResult {
    /// Keep accumulating; do not fire the window yet.
    Continue,
    /// Discard window state without emitting any result.
    Purge,
    /// Emit the window result, then discard state.
    FireAndPurge,
}

impl TriggerResult {
    /// Return true if the window result should be emitted.
    pub fn is_fire(self) -> bool {
        matches!(self, TriggerResult::FireAndPurge)
    }

    /// Return true if the window state should be discarded after this result.
    pub fn is_purge(self) -> bool {
        matches!(self, TriggerResult::Purge | TriggerResult::FireAndPurge)
    }
}

/// Determines when a window is finalized.
///
/// Called by [`TumblingWindowAggregator`] on two paths:
/// - when the watermark advances (`on_event_time`)
/// - when the engine shuts down (`on_drain`)
///
/// Windows are visited in start order and visiting stops at the first
/// `Continue`, so a trigger must never fire a later window while an earlier
/// one is still open.
pub trait Trigger: Send {
    /// Called when event time (watermark) advances.
    fn on_event_time(&mut self, event_time: EventTime, window: &TimeWindow) -> TriggerResult;

    /// Called for every open window when the engine drains.
    fn on_drain(&mut self, policy: DrainPolicy, _window: &TimeWindow) -> TriggerResult {
        match policy {
            DrainPolicy::Flush => TriggerResult::FireAndPurge,
            DrainPolicy::Discard => TriggerResult::Purge,
        }
    }
}

/// The default trigger for event-time windowing with allowed lateness.
///
/// Fires (and purges) once the watermark reaches `window.end + allowed_lateness`.
/// Firing is driven only by the watermark, never by wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct EventTimeTrigger {
    allowed_lateness_ms: i64,
}

impl EventTimeTrigger {
    pub fn with_allowed_lateness(allowed_lateness: Duration) -> Self {
        Self {
            allowed_lateness_ms: allowed_lateness.as_millis() as i64,
        }
    }

    /// Watermark at which `window` closes.
    pub fn closes_at(&self, window: &TimeWindow) -> EventTime {
        window.end.saturating_add(self.allowed_lateness_ms)
    }
}

impl Trigger for EventTimeTrigger {
    fn on_event_time(&mut self, event_time: EventTime, window: &TimeWindow) -> TriggerResult {
        if event_time >= self.closes_at(window) {
            TriggerResult::FireAndPurge
        } else {
            TriggerResult::Continue
        }
    }
}
