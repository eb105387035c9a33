use super::*;

/// A half-open event-time window `[start, end)`.
///
/// Ordered by `start` first, so a `BTreeMap<TimeWindow, _>` iterates windows
/// in time order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub struct TimeWindow {
    pub start: EventTime,
    pub end: EventTime,
}

impl TimeWindow {
    pub fn new(start: EventTime, end: EventTime) -> Self {
        Self { start, end }
    }

    /// The maximum timestamp that belongs to this window.
    pub fn max_timestamp(&self) -> EventTime {
        self.end - 1
    }

    /// Return true if `timestamp` falls inside this window.
    pub fn contains(&self, timestamp: EventTime) -> bool {
        timestamp >= self.start && timestamp < self.end
    }

    pub fn size(&self) -> EventTime {
        self.end - self.start
    }
}

impl std::fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TimeWindow([{}, {}))", self.start, self.end)
    }
}

/// Fixed-size, non-overlapping event-time windows aligned to the epoch.
#[derive(Debug, Clone, Copy)]
pub struct TumblingEventTimeWindows {
    size_ms: i64,
}

impl TumblingEventTimeWindows {
    /// Create tumbling windows of the given `size`. Sizes below 1ms are rounded up.
    pub fn of(size: Duration) -> Self {
        Self {
            size_ms: (size.as_millis() as i64).max(1),
        }
    }

    /// Return the single window containing `timestamp`.
    ///
    /// `start = floor(timestamp / size) * size`, using a Euclidean remainder so
    /// negative timestamps align the same way.
    ///
    /// Timestamps whose window start is below `EVENT_TIME_MIN` are clamped;
    /// use [`try_assign`](Self::try_assign) to reject them instead.
    pub fn assign(&self, timestamp: EventTime) -> TimeWindow {
        self.try_assign(timestamp).unwrap_or_else(|| {
            TimeWindow::new(EVENT_TIME_MIN, EVENT_TIME_MIN.saturating_add(self.size_ms))
        })
    }

    /// Like [`assign`](Self::assign), but `None` when the window start is
    /// not representable.
    pub fn try_assign(&self, timestamp: EventTime) -> Option<TimeWindow> {
        let start = timestamp.checked_sub(timestamp.rem_euclid(self.size_ms))?;
        Some(TimeWindow::new(start, start.saturating_add(self.size_ms)))
    }

    pub fn size_ms(&self) -> i64 {
        self.size_ms
    }
}
