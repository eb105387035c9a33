//! File configuration for the `sensorstream` binary.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;
use sensorstream_core::EngineConfig;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub engine: EngineConfig,
    pub logging: LoggingConfig,
    pub producer: ProducerConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info` or `sensorstream_core=debug`.
    /// `RUST_LOG` wins when set.
    pub level: String,
    pub include_source: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            include_source: false,
        }
    }
}

/// Synthetic reading generator settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProducerConfig {
    /// Wall-clock pause between readings.
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
    /// Share of readings sent for a city that is not in the seed.
    pub unknown_city_ratio: f64,
    pub unknown_city_ids: Vec<i64>,
    /// Maximum backward shift of a reading's event time.
    #[serde(with = "humantime_serde")]
    pub jitter: Duration,
    /// Share of readings pushed `late_by` into the past.
    pub late_ratio: f64,
    #[serde(with = "humantime_serde")]
    pub late_by: Duration,
    pub temperature_min: i64,
    pub temperature_max: i64,
    /// Fixed RNG seed for reproducible runs.
    pub seed: Option<u64>,
    /// Channel capacity between the producer task and the engine.
    pub channel_capacity: usize,
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            unknown_city_ratio: 0.0,
            unknown_city_ids: vec![2001, 2002],
            jitter: Duration::ZERO,
            late_ratio: 0.0,
            late_by: Duration::from_secs(10),
            temperature_min: 10,
            temperature_max: 32,
            seed: None,
            channel_capacity: 1024,
        }
    }
}

impl ProducerConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            (0.0..=1.0).contains(&self.unknown_city_ratio),
            "producer.unknown_city_ratio must be within [0, 1]"
        );
        anyhow::ensure!(
            (0.0..=1.0).contains(&self.late_ratio),
            "producer.late_ratio must be within [0, 1]"
        );
        anyhow::ensure!(
            self.temperature_min <= self.temperature_max,
            "producer.temperature_min exceeds temperature_max"
        );
        anyhow::ensure!(
            self.channel_capacity > 0,
            "producer.channel_capacity must be positive"
        );
        Ok(())
    }
}

impl AppConfig {
    pub fn load_required(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let cfg: AppConfig = serde_yaml::from_str(&raw)
            .with_context(|| format!("failed to parse yaml config {}", path.display()))?;
        Ok(cfg)
    }

    /// Load `path` if given, defaults otherwise.
    pub fn load_optional(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::load_required(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.engine.validate()?;
        self.producer.validate()
    }
}
