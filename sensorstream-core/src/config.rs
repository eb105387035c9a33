//! Per-engine configuration.
//!
//! One [`EngineConfig`] is owned by each engine instance; there are no
//! process-wide defaults beyond [`Default`].

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::EventTime;

/// How enrichment treats events whose join key has no dimension record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinPolicy {
    /// Drop unmatched events.
    Inner,
    /// `events LEFT JOIN dimension`: unmatched events pass with no attributes.
    Left,
    /// `dimension RIGHT JOIN events`: same stream-side result as `Left`.
    #[default]
    Right,
}

impl JoinPolicy {
    /// Whether an event without a dimension match continues downstream.
    pub fn keeps_unmatched(self) -> bool {
        !matches!(self, JoinPolicy::Inner)
    }
}

/// Which value a window aggregate is grouped under.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupBy {
    /// The raw event key.
    #[default]
    Key,
    /// A named field, looked up after enrichment (e.g. `dim.country`).
    Field(String),
}

/// What happens to open windows when the engine shuts down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrainPolicy {
    /// Emit every open window as final.
    #[default]
    Flush,
    /// Drop open windows without emitting.
    Discard,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Bounded out-of-orderness: watermark = max event time - max_lateness.
    #[serde(with = "humantime_serde")]
    pub max_lateness: Duration,
    #[serde(with = "humantime_serde")]
    pub window_size: Duration,
    pub join_policy: JoinPolicy,
    /// Field holding the join key. `None` joins on the event key.
    pub join_field: Option<String>,
    /// Reject events whose join field is absent instead of treating them as unmatched.
    pub join_key_required: bool,
    /// Prefix for merged dimension attributes: `"{namespace}.{attr}"`.
    pub attribute_namespace: String,
    pub group_by: GroupBy,
    /// Group label used when `group_by` names a field the event lacks.
    pub missing_group_label: String,
    /// Numeric field averaged per window.
    pub value_field: String,
    pub sink_queue_capacity: usize,
    pub sink_retry_budget: u32,
    #[serde(with = "humantime_serde")]
    pub sink_handoff_timeout: Duration,
    pub drain_policy: DrainPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_lateness: Duration::from_secs(5),
            window_size: Duration::from_secs(3),
            join_policy: JoinPolicy::default(),
            join_field: None,
            join_key_required: false,
            attribute_namespace: "dim".to_string(),
            group_by: GroupBy::default(),
            missing_group_label: "missing".to_string(),
            value_field: "temperature".to_string(),
            sink_queue_capacity: 1024,
            sink_retry_budget: 3,
            sink_handoff_timeout: Duration::from_millis(100),
            drain_policy: DrainPolicy::default(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_size_ms() <= 0 {
            return Err(ConfigError::Invalid(
                "window_size must be at least 1ms".to_string(),
            ));
        }
        if self.sink_queue_capacity == 0 {
            return Err(ConfigError::Invalid(
                "sink_queue_capacity must be positive".to_string(),
            ));
        }
        if self.value_field.trim().is_empty() {
            return Err(ConfigError::Invalid("value_field is empty".to_string()));
        }
        if let GroupBy::Field(name) = &self.group_by {
            if name.trim().is_empty() {
                return Err(ConfigError::Invalid("group_by field is empty".to_string()));
            }
        }
        if self.join_key_required && self.join_field.is_none() {
            return Err(ConfigError::Invalid(
                "join_key_required needs a join_field".to_string(),
            ));
        }
        Ok(())
    }

    pub fn window_size_ms(&self) -> EventTime {
        self.window_size.as_millis() as EventTime
    }

    pub fn max_lateness_ms(&self) -> EventTime {
        self.max_lateness.as_millis() as EventTime
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_demo() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.max_lateness, Duration::from_secs(5));
        assert_eq!(cfg.window_size, Duration::from_secs(3));
        assert_eq!(cfg.join_policy, JoinPolicy::Right);
        assert_eq!(cfg.drain_policy, DrainPolicy::Flush);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_window() {
        let cfg = EngineConfig {
            window_size: Duration::ZERO,
            ..EngineConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_queue() {
        let cfg = EngineConfig {
            sink_queue_capacity: 0,
            ..EngineConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_validate_required_join_key_needs_field() {
        let cfg = EngineConfig {
            join_key_required: true,
            ..EngineConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_deserialize_yaml_with_humantime() {
        let yaml = r#"
max_lateness: 5s
window_size: 15s
join_policy: inner
join_field: city_id
group_by:
  field: dim.country
sink_handoff_timeout: 250ms
drain_policy: discard
"#;
        let cfg: EngineConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.window_size, Duration::from_secs(15));
        assert_eq!(cfg.join_policy, JoinPolicy::Inner);
        assert_eq!(cfg.join_field.as_deref(), Some("city_id"));
        assert_eq!(cfg.group_by, GroupBy::Field("dim.country".to_string()));
        assert_eq!(cfg.sink_handoff_timeout, Duration::from_millis(250));
        assert_eq!(cfg.drain_policy, DrainPolicy::Discard);
        // Unspecified fields fall back to defaults.
        assert_eq!(cfg.value_field, "temperature");
    }
}
