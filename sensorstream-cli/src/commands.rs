//! Subcommand implementations.

use std::fs::File;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use sensorstream_core::dimension::{left_join_mean, DimensionStore, TableJoinRow};
use sensorstream_core::metrics::MetricsSnapshot;
use sensorstream_core::sink::{CollectSink, JsonLinesSink, LogSink, Sink};
use sensorstream_core::source::{IterSource, JsonEventDecoder};
use sensorstream_core::types::FinalizedWindow;
use sensorstream_core::Engine;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::producer::{produce, PayloadSource, ReadingGenerator};

/// Column used as the dimension key in city seed files.
pub const CITY_KEY_FIELD: &str = "city_id";

/// Where `run` sends finalized windows.
#[derive(clap::ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SinkKind {
    /// One JSON object per row on stdout.
    #[default]
    Json,
    /// One `info` log line per row.
    Log,
}

impl SinkKind {
    pub fn build(self) -> Box<dyn Sink> {
        match self {
            SinkKind::Json => Box::new(JsonLinesSink::new(std::io::stdout())),
            SinkKind::Log => Box::new(LogSink),
        }
    }
}

pub struct RunOptions {
    pub cities: PathBuf,
    pub max_events: Option<u64>,
    pub refresh_interval: Option<Duration>,
    pub sink: SinkKind,
}

/// Load a cities seed file into a fresh store.
pub fn load_cities(path: &Path) -> anyhow::Result<Arc<DimensionStore>> {
    let store = DimensionStore::new();
    let file = File::open(path)
        .with_context(|| format!("failed to open cities file {}", path.display()))?;
    store
        .replace_all_json(BufReader::new(file), CITY_KEY_FIELD)
        .with_context(|| format!("failed to load cities file {}", path.display()))?;
    Ok(Arc::new(store))
}

/// Reload `path` into `store`, returning the new snapshot version. A bad
/// file leaves the current snapshot in place.
pub fn refresh_cities(store: &DimensionStore, path: &Path) -> anyhow::Result<u64> {
    let file = File::open(path)
        .with_context(|| format!("failed to open cities file {}", path.display()))?;
    let version = store
        .replace_all_json(BufReader::new(file), CITY_KEY_FIELD)
        .with_context(|| format!("failed to load cities file {}", path.display()))?;
    info!(version, cities = store.len(), path = %path.display(), "cities refreshed");
    Ok(version)
}

fn city_ids(store: &DimensionStore) -> Vec<i64> {
    store
        .snapshot()
        .sorted_records()
        .iter()
        .filter_map(|record| record.key.parse().ok())
        .collect()
}

/// Live demo: synthetic producer -> engine -> JSON lines on stdout.
pub async fn run(app: AppConfig, opts: RunOptions) -> anyhow::Result<MetricsSnapshot> {
    let store = load_cities(&opts.cities)?;
    let generator = ReadingGenerator::new(app.producer.clone(), city_ids(&store))?;

    let (tx, rx) = mpsc::channel(app.producer.channel_capacity);
    let producer = tokio::spawn(produce(generator, tx));

    let refresher = opts.refresh_interval.map(|every| {
        let store = Arc::clone(&store);
        let path = opts.cities.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if let Err(e) = refresh_cities(&store, &path) {
                    warn!(error = %format!("{e:#}"), "cities refresh rejected, keeping previous snapshot");
                }
            }
        })
    });

    let sink = opts.sink.build();
    let mut engine = Engine::new(app.engine.clone(), Arc::clone(&store), sink)?;
    let shutdown = engine.shutdown_handle();
    let mut source = PayloadSource::new(rx, JsonEventDecoder::default(), opts.max_events);

    info!(cities = store.len(), "streaming started, press Ctrl+C to exit");
    let mut worker = tokio::task::spawn_blocking(move || -> anyhow::Result<MetricsSnapshot> {
        engine.run(&mut source)?;
        engine.shutdown()
    });

    let metrics = tokio::select! {
        joined = &mut worker => joined??,
        signal = tokio::signal::ctrl_c() => {
            signal.context("failed to listen for Ctrl+C")?;
            info!("interrupt received, draining");
            shutdown.shutdown();
            // Dropping the sender side unblocks the engine's receive.
            producer.abort();
            worker.await??
        }
    };

    producer.abort();
    if let Some(refresher) = refresher {
        refresher.abort();
    }
    Ok(metrics)
}

/// Run a JSON-lines event file through a fresh engine.
///
/// Undecodable lines are counted as malformed by the engine.
pub fn replay(
    app: &AppConfig,
    store: Arc<DimensionStore>,
    events: impl Read,
) -> anyhow::Result<(Vec<FinalizedWindow>, MetricsSnapshot)> {
    let decoder = JsonEventDecoder::default();
    let mut raw_events = Vec::new();
    let mut skipped = 0u64;
    for (index, line) in BufReader::new(events).lines().enumerate() {
        let line = line.context("failed to read events")?;
        if line.trim().is_empty() {
            continue;
        }
        match decoder.decode(&line) {
            Ok(raw) => raw_events.push(raw),
            Err(e) => {
                skipped += 1;
                warn!(line = index + 1, error = %e, "skipping undecodable line");
            }
        }
    }

    let sink = CollectSink::new();
    let mut engine = Engine::new(app.engine.clone(), store, sink.clone())?;
    engine.run(&mut IterSource::new(raw_events))?;
    let mut metrics = engine.shutdown()?;
    metrics.malformed += skipped;
    metrics.ingested += skipped;
    Ok((sink.rows(), metrics))
}

/// Parse `city_id,temperature` rows. A non-numeric first line is a header.
pub fn parse_readings(reader: impl Read) -> anyhow::Result<Vec<(String, f64)>> {
    let mut rows = Vec::new();
    for (index, line) in BufReader::new(reader).lines().enumerate() {
        let line = line.context("failed to read readings")?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once(',') else {
            anyhow::bail!("line {}: expected `city_id,temperature`", index + 1);
        };
        let value = match value.trim().parse::<f64>() {
            Ok(value) => value,
            Err(_) if index == 0 => continue,
            Err(e) => anyhow::bail!("line {}: bad temperature {value:?}: {e}", index + 1),
        };
        rows.push((key.trim().to_string(), value));
    }
    Ok(rows)
}

/// Table-table join of cities and readings; unmatched cities report `null`.
pub fn join(store: &DimensionStore, readings: impl Read) -> anyhow::Result<Vec<TableJoinRow>> {
    let rows = parse_readings(readings)?;
    Ok(left_join_mean(&store.snapshot(), &rows))
}

/// Write one JSON document per item.
pub fn write_json_lines<T: serde::Serialize>(
    mut out: impl Write,
    items: impl IntoIterator<Item = T>,
) -> anyhow::Result<()> {
    for item in items {
        serde_json::to_writer(&mut out, &item)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}
