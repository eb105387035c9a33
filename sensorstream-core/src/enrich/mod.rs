//! Stream-table enrichment against the [`DimensionStore`].

use std::sync::Arc;

use crate::config::{EngineConfig, JoinPolicy};
use crate::dimension::DimensionStore;
use crate::error::EngineError;
use crate::types::{Event, FieldValue};

mod enricher;

pub use enricher::*;

#[cfg(test)]
#[path = "tests/enrich_tests.rs"]
mod tests;
