use std::collections::BTreeMap;
use std::time::Duration;

use crate::config::{DrainPolicy, EngineConfig, GroupBy};
use crate::enrich::EnrichedEvent;
use crate::error::EngineError;
use crate::types::{EventTime, FinalizedWindow, Watermark, EVENT_TIME_MIN};

mod aggregator;
mod functions;
mod primitives;
mod triggers;

pub use aggregator::*;
pub use functions::*;
pub use primitives::*;
pub use triggers::*;

#[cfg(test)]
#[path = "tests/window_tests.rs"]
mod tests;
