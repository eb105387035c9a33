//! Watermark-driven ordering of on-time events.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use crate::types::{Event, EventTime, Watermark};
use crate::window::TumblingEventTimeWindows;

mod buffer;

pub use buffer::*;

#[cfg(test)]
#[path = "tests/ordering_tests.rs"]
mod tests;
