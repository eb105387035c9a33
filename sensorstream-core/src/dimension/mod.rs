//! Reference data for enrichment.
//!
//! - [`DimensionStore`] — copy-on-write key → record map shared between the
//!   engine (reader) and an external loader (writer).
//! - [`left_join_mean`] — static table-table join that reports a null mean
//!   for dimension rows without matches.

use std::io::Read;
use std::sync::{Arc, Mutex};

use ahash::AHashMap;
use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};

use crate::error::DimensionError;
use crate::types::{FieldValue, Fields};
use crate::window::{AggregateFunction, Mean, MeanAccumulator};

mod store;
mod table_join;

pub use store::*;
pub use table_join::*;

#[cfg(test)]
#[path = "tests/dimension_tests.rs"]
mod tests;
