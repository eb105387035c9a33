use super::*;

/// Watermark movement caused by one observed event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatermarkAdvance {
    pub before: Watermark,
    pub after: Watermark,
}

impl WatermarkAdvance {
    /// Return true if the watermark moved forward.
    pub fn advanced(&self) -> bool {
        self.after > self.before
    }
}

/// Bounded out-of-orderness watermark for a single engine.
///
/// The watermark is `max_seen_timestamp - max_lateness`, which means the
/// engine waits `max_lateness` of event time before treating anything older
/// as late. It only ever moves forward.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use sensorstream_core::time::WatermarkTracker;
///
/// let mut tracker = WatermarkTracker::new(Duration::from_secs(5));
/// let adv = tracker.observe(10_000);
/// assert_eq!(adv.after.timestamp, 5_000);
/// ```
#[derive(Debug, Clone)]
pub struct WatermarkTracker {
    max_lateness_ms: i64,
    max_seen_timestamp: EventTime,
    current: Watermark,
}

impl WatermarkTracker {
    /// Create a tracker allowing up to `max_lateness` of out-of-order arrival.
    pub fn new(max_lateness: Duration) -> Self {
        Self {
            max_lateness_ms: max_lateness.as_millis() as i64,
            max_seen_timestamp: EVENT_TIME_MIN,
            current: Watermark::min(),
        }
    }

    /// Notify the tracker that an event with the given timestamp was accepted.
    pub fn observe(&mut self, timestamp: EventTime) -> WatermarkAdvance {
        let before = self.current;
        if timestamp > self.max_seen_timestamp {
            self.max_seen_timestamp = timestamp;
            let candidate = self.max_seen_timestamp.saturating_sub(self.max_lateness_ms);
            // max_seen only grows, but keep the clamp so the watermark can never regress.
            if candidate > self.current.timestamp {
                self.current = Watermark::new(candidate);
            }
        }
        WatermarkAdvance {
            before,
            after: self.current,
        }
    }

    /// Current watermark; `EVENT_TIME_MIN` until the first event.
    pub fn current(&self) -> Watermark {
        self.current
    }

    /// Largest event time observed so far, or `None` before the first event.
    pub fn max_event_time(&self) -> Option<EventTime> {
        (self.max_seen_timestamp != EVENT_TIME_MIN).then_some(self.max_seen_timestamp)
    }

    /// Return true if `timestamp` is behind the current watermark.
    ///
    /// An event exactly at the watermark is on time.
    pub fn is_late(&self, timestamp: EventTime) -> bool {
        timestamp < self.current.timestamp
    }

    pub fn max_lateness_ms(&self) -> i64 {
        self.max_lateness_ms
    }
}
