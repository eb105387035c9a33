//! Synthetic temperature readings.
//!
//! One JSON payload per tick, shaped like `{"city_id":1001,"temperature":21,
//! "ts":"2025-06-01 12:00:03"}`, published into a bounded tokio channel that
//! the engine thread drains through [`PayloadSource`].

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use sensorstream_core::source::{EventSource, JsonEventDecoder, TEXT_TIMESTAMP_FORMAT};
use sensorstream_core::types::RawEvent;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::config::ProducerConfig;

pub struct ReadingGenerator {
    cfg: ProducerConfig,
    city_ids: Vec<i64>,
    rng: StdRng,
}

impl ReadingGenerator {
    pub fn new(cfg: ProducerConfig, city_ids: Vec<i64>) -> anyhow::Result<Self> {
        anyhow::ensure!(
            !city_ids.is_empty() || !cfg.unknown_city_ids.is_empty(),
            "no city ids to produce readings for"
        );
        let rng = match cfg.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self { cfg, city_ids, rng })
    }

    /// Build the payload for a reading taken at `now`.
    pub fn next_payload(&mut self, now: DateTime<Utc>) -> String {
        let city_id = self.pick_city();
        let temperature = self
            .rng
            .gen_range(self.cfg.temperature_min..=self.cfg.temperature_max);

        let mut event_time = now;
        let jitter_ms = self.cfg.jitter.as_millis() as i64;
        if jitter_ms > 0 {
            event_time -= chrono::Duration::milliseconds(self.rng.gen_range(0..=jitter_ms));
        }
        if self.cfg.late_ratio > 0.0 && self.rng.gen_bool(self.cfg.late_ratio) {
            event_time -= chrono::Duration::milliseconds(self.cfg.late_by.as_millis() as i64);
        }

        serde_json::json!({
            "city_id": city_id,
            "temperature": temperature,
            "ts": event_time.format(TEXT_TIMESTAMP_FORMAT).to_string(),
        })
        .to_string()
    }

    fn pick_city(&mut self) -> i64 {
        let unknown = self.city_ids.is_empty()
            || (self.cfg.unknown_city_ratio > 0.0 && self.rng.gen_bool(self.cfg.unknown_city_ratio));
        let pool = if unknown && !self.cfg.unknown_city_ids.is_empty() {
            &self.cfg.unknown_city_ids
        } else {
            &self.city_ids
        };
        pool.choose(&mut self.rng).copied().unwrap_or_default()
    }
}

/// Publish one reading per `interval` until the receiver goes away.
pub async fn produce(mut generator: ReadingGenerator, tx: mpsc::Sender<String>) {
    let mut ticker = tokio::time::interval(generator.cfg.interval);
    loop {
        ticker.tick().await;
        let payload = generator.next_payload(Utc::now());
        debug!(%payload, "sent reading");
        if tx.send(payload).await.is_err() {
            debug!("engine stopped, producer exiting");
            return;
        }
    }
}

/// Engine-side end of the producer channel.
///
/// Blocks the engine thread on the next payload; stops after `max_events`
/// records or when the producer is gone.
pub struct PayloadSource {
    rx: mpsc::Receiver<String>,
    decoder: JsonEventDecoder,
    remaining: Option<u64>,
}

impl PayloadSource {
    pub fn new(rx: mpsc::Receiver<String>, decoder: JsonEventDecoder, max_events: Option<u64>) -> Self {
        Self {
            rx,
            decoder,
            remaining: max_events,
        }
    }
}

impl EventSource for PayloadSource {
    fn next(&mut self) -> anyhow::Result<Option<RawEvent>> {
        loop {
            if self.remaining == Some(0) {
                return Ok(None);
            }
            let Some(payload) = self.rx.blocking_recv() else {
                return Ok(None);
            };
            match self.decoder.decode(&payload) {
                Ok(raw) => {
                    if let Some(n) = self.remaining.as_mut() {
                        *n -= 1;
                    }
                    return Ok(Some(raw));
                }
                Err(e) => warn!(error = %e, %payload, "skipping undecodable payload"),
            }
        }
    }
}
