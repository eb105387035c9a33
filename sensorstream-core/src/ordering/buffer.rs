use super::*;

/// Outcome of offering an event to the [`OrderingBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The event is on time and waits for its window to close.
    Held,
    /// The event is behind the watermark and was discarded.
    DroppedLate,
}

/// Heap entry ordered by `(timestamp, arrival_seq)`.
#[derive(Debug)]
struct Pending {
    timestamp: EventTime,
    seq: u64,
    window_end: EventTime,
    event: Event,
}

impl PartialEq for Pending {
    fn eq(&self, other: &Self) -> bool {
        self.timestamp == other.timestamp && self.seq == other.seq
    }
}

impl Eq for Pending {}

impl PartialOrd for Pending {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Pending {
    fn cmp(&self, other: &Self) -> Ordering {
        self.timestamp
            .cmp(&other.timestamp)
            .then(self.seq.cmp(&other.seq))
    }
}

/// Holds on-time events until the watermark closes their window, then
/// releases them in event-time order.
///
/// # Processing model
///
/// - `admit`: events behind the watermark are dropped; everything else is
///   pushed into a min-heap keyed by `(timestamp, arrival_seq)`.
/// - `release`: pops every held event whose tumbling window end is at or
///   below the watermark. Because windows are aligned and non-overlapping,
///   the heap head always has the smallest window end, so popping stops at
///   the first event whose window is still open.
///
/// # Invariant
/// Each admitted event is released at most once, and released events come
/// out in non-decreasing timestamp order with ties in arrival order.
pub struct OrderingBuffer {
    windows: TumblingEventTimeWindows,
    heap: BinaryHeap<Reverse<Pending>>,
    next_seq: u64,
}

impl OrderingBuffer {
    pub fn new(windows: TumblingEventTimeWindows) -> Self {
        Self {
            windows,
            heap: BinaryHeap::new(),
            next_seq: 0,
        }
    }

    /// Offer one event against the current watermark.
    pub fn admit(&mut self, event: Event, watermark: Watermark) -> Admission {
        if event.timestamp < watermark.timestamp {
            return Admission::DroppedLate;
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        let window_end = self.windows.assign(event.timestamp).end;
        self.heap.push(Reverse(Pending {
            timestamp: event.timestamp,
            seq,
            window_end,
            event,
        }));
        Admission::Held
    }

    /// Pop every held event whose window has closed (`watermark >= window.end`).
    pub fn release(&mut self, watermark: Watermark) -> Vec<Event> {
        let mut released = Vec::new();
        while let Some(Reverse(head)) = self.heap.peek() {
            if head.window_end > watermark.timestamp {
                break;
            }
            if let Some(Reverse(pending)) = self.heap.pop() {
                released.push(pending.event);
            }
        }
        released
    }

    /// Pop everything still held, in order. Used when the engine drains.
    pub fn drain(&mut self) -> Vec<Event> {
        let mut released = Vec::with_capacity(self.heap.len());
        while let Some(Reverse(pending)) = self.heap.pop() {
            released.push(pending.event);
        }
        released
    }

    /// Return the number of held events.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Return `true` if nothing is held.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Timestamp of the earliest held event, or `None`.
    pub fn earliest(&self) -> Option<EventTime> {
        self.heap.peek().map(|Reverse(p)| p.timestamp)
    }
}
