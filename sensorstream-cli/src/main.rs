use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use sensorstream_core::config::{DrainPolicy, GroupBy, JoinPolicy};
use sensorstream_core::dimension::DimensionStore;

mod commands;
mod config;
mod logging;
mod producer;

use commands::{RunOptions, SinkKind};
use config::AppConfig;

#[derive(Parser, Debug)]
#[command(name = "sensorstream")]
#[command(about = "Event-time temperature aggregation demo", long_about = None)]
struct Cli {
    /// YAML file with `engine`, `logging` and `producer` sections.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(flatten)]
    engine: EngineOverrides,
    #[command(subcommand)]
    command: Commands,
}

/// Flags that override the `engine` section of the config file.
#[derive(clap::Args, Debug, Default)]
struct EngineOverrides {
    #[arg(long, global = true, value_parser = humantime_serde::re::humantime::parse_duration)]
    window_size: Option<Duration>,
    #[arg(long, global = true, value_parser = humantime_serde::re::humantime::parse_duration)]
    max_lateness: Option<Duration>,
    /// inner, left or right.
    #[arg(long, global = true, value_parser = parse_join_policy)]
    join_policy: Option<JoinPolicy>,
    /// Group by an event or enriched field (e.g. `dim.country`) instead of the key.
    #[arg(long, global = true)]
    group_by: Option<String>,
    /// flush or discard.
    #[arg(long, global = true, value_parser = parse_drain_policy)]
    drain: Option<DrainPolicy>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Stream synthetic readings through the engine until Ctrl+C.
    Run {
        /// Cities seed file, e.g. `sensorstream-cli/data/cities.json`.
        #[arg(long)]
        cities: PathBuf,
        #[arg(long)]
        max_events: Option<u64>,
        /// Reload the cities file on this period. Overwrite it while running,
        /// e.g. with `data/cities-extended.json`, to see unknown cities join.
        #[arg(long, value_parser = humantime_serde::re::humantime::parse_duration)]
        refresh_interval: Option<Duration>,
        /// json (stdout) or log.
        #[arg(long, value_enum, default_value_t = SinkKind::Json)]
        sink: SinkKind,
        #[arg(long, value_parser = humantime_serde::re::humantime::parse_duration)]
        interval: Option<Duration>,
        #[arg(long)]
        unknown_city_ratio: Option<f64>,
        #[arg(long)]
        late_ratio: Option<f64>,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Replay a JSON-lines event file deterministically.
    Replay {
        events: PathBuf,
        #[arg(long)]
        cities: Option<PathBuf>,
    },
    /// Join a cities file with `city_id,temperature` rows.
    Join {
        #[arg(long)]
        cities: PathBuf,
        readings: PathBuf,
    },
}

fn parse_join_policy(s: &str) -> Result<JoinPolicy, String> {
    match s.to_ascii_lowercase().as_str() {
        "inner" => Ok(JoinPolicy::Inner),
        "left" => Ok(JoinPolicy::Left),
        "right" => Ok(JoinPolicy::Right),
        other => Err(format!("unknown join policy {other:?}")),
    }
}

fn parse_drain_policy(s: &str) -> Result<DrainPolicy, String> {
    match s.to_ascii_lowercase().as_str() {
        "flush" => Ok(DrainPolicy::Flush),
        "discard" => Ok(DrainPolicy::Discard),
        other => Err(format!("unknown drain policy {other:?}")),
    }
}

impl EngineOverrides {
    fn apply(&self, app: &mut AppConfig) {
        if let Some(window_size) = self.window_size {
            app.engine.window_size = window_size;
        }
        if let Some(max_lateness) = self.max_lateness {
            app.engine.max_lateness = max_lateness;
        }
        if let Some(policy) = self.join_policy {
            app.engine.join_policy = policy;
        }
        if let Some(field) = &self.group_by {
            app.engine.group_by = GroupBy::Field(field.clone());
        }
        if let Some(drain) = self.drain {
            app.engine.drain_policy = drain;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut app = AppConfig::load_optional(cli.config.as_deref())?;
    cli.engine.apply(&mut app);

    match cli.command {
        Commands::Run {
            cities,
            max_events,
            refresh_interval,
            sink,
            interval,
            unknown_city_ratio,
            late_ratio,
            seed,
        } => {
            if let Some(interval) = interval {
                app.producer.interval = interval;
            }
            if let Some(ratio) = unknown_city_ratio {
                app.producer.unknown_city_ratio = ratio;
            }
            if let Some(ratio) = late_ratio {
                app.producer.late_ratio = ratio;
            }
            if seed.is_some() {
                app.producer.seed = seed;
            }
            app.validate()?;
            logging::init_logging(&app.logging)?;

            let opts = RunOptions {
                cities,
                max_events,
                refresh_interval,
                sink,
            };
            let metrics = commands::run(app, opts).await?;
            eprintln!("{}", serde_json::to_string(&metrics)?);
        }
        Commands::Replay { events, cities } => {
            app.validate()?;
            logging::init_logging(&app.logging)?;

            let store = match cities {
                Some(path) => commands::load_cities(&path)?,
                None => Arc::new(DimensionStore::new()),
            };
            let file = File::open(&events)
                .with_context(|| format!("failed to open events file {}", events.display()))?;
            let (rows, metrics) = commands::replay(&app, store, file)?;
            commands::write_json_lines(std::io::stdout().lock(), &rows)?;
            eprintln!("{}", serde_json::to_string(&metrics)?);
        }
        Commands::Join { cities, readings } => {
            logging::init_logging(&app.logging)?;

            let store = commands::load_cities(&cities)?;
            let file = File::open(&readings)
                .with_context(|| format!("failed to open readings file {}", readings.display()))?;
            let rows = commands::join(&store, file)?;
            commands::write_json_lines(std::io::stdout().lock(), &rows)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_requires_cities_and_parses_sink() {
        let err = Cli::try_parse_from(["sensorstream", "run"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);

        let cli = Cli::try_parse_from([
            "sensorstream",
            "run",
            "--cities",
            "data/cities.json",
            "--sink",
            "log",
        ])
        .unwrap();
        match cli.command {
            Commands::Run { cities, sink, .. } => {
                assert_eq!(cities, PathBuf::from("data/cities.json"));
                assert_eq!(sink, SinkKind::Log);
            }
            other => panic!("unexpected command {other:?}"),
        }

        let cli = Cli::try_parse_from(["sensorstream", "run", "--cities", "c.json"]).unwrap();
        assert!(matches!(cli.command, Commands::Run { sink: SinkKind::Json, .. }));
    }
}
