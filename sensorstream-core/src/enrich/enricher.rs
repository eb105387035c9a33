use super::*;

/// An event after the join, with dimension attributes merged in.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedEvent {
    pub event: Event,
    /// Whether a dimension record was found for the join key.
    pub matched: bool,
}

/// Result of joining one event.
#[derive(Debug, Clone, PartialEq)]
pub enum JoinOutcome {
    Matched(EnrichedEvent),
    /// No record; the event continues with no attributes (left/right join).
    Unmatched(EnrichedEvent),
    /// No record and the inner join drops the event.
    Dropped { key: String },
}

impl JoinOutcome {
    /// The event to hand downstream, if any.
    pub fn into_enriched(self) -> Option<EnrichedEvent> {
        match self {
            JoinOutcome::Matched(e) | JoinOutcome::Unmatched(e) => Some(e),
            JoinOutcome::Dropped { .. } => None,
        }
    }

    pub fn is_unmatched(&self) -> bool {
        !matches!(self, JoinOutcome::Matched(_))
    }
}

/// Joins events against the dimension store by key.
///
/// Found attributes are merged under `"{namespace}.{attr}"`; original event
/// fields are never overwritten.
pub struct Enricher {
    store: Arc<DimensionStore>,
    policy: JoinPolicy,
    join_field: Option<String>,
    join_key_required: bool,
    namespace: String,
}

impl Enricher {
    pub fn new(store: Arc<DimensionStore>, config: &EngineConfig) -> Self {
        Self {
            store,
            policy: config.join_policy,
            join_field: config.join_field.clone(),
            join_key_required: config.join_key_required,
            namespace: config.attribute_namespace.clone(),
        }
    }

    pub fn policy(&self) -> JoinPolicy {
        self.policy
    }

    /// Extract the join key, or `None` when the join field is absent.
    pub fn join_key(&self, event: &Event) -> Option<String> {
        match &self.join_field {
            None => Some(event.key.clone()),
            Some(field) => match event.field(field) {
                None | Some(FieldValue::Null) => None,
                Some(value) => Some(value.to_string()),
            },
        }
    }

    /// Reject events that lack a mandatory join key.
    ///
    /// Runs at ingestion, before the event can touch the watermark.
    pub fn validate(&self, event: &Event) -> Result<(), EngineError> {
        if self.join_key_required && self.join_key(event).is_none() {
            let field = self.join_field.as_deref().unwrap_or("key");
            return Err(EngineError::malformed(format!(
                "missing mandatory join key {field:?}"
            )));
        }
        Ok(())
    }

    /// Join one event against the current dimension snapshot.
    pub fn enrich(&self, event: Event) -> JoinOutcome {
        let Some(key) = self.join_key(&event) else {
            return self.unmatched(event, String::new());
        };

        match self.store.get(&key) {
            Some(record) => {
                let mut event = event;
                for (name, value) in &record.attributes {
                    let field = self.namespaced(name);
                    event.fields.entry(field).or_insert_with(|| value.clone());
                }
                JoinOutcome::Matched(EnrichedEvent {
                    event,
                    matched: true,
                })
            }
            None => self.unmatched(event, key),
        }
    }

    fn unmatched(&self, event: Event, key: String) -> JoinOutcome {
        if self.policy.keeps_unmatched() {
            JoinOutcome::Unmatched(EnrichedEvent {
                event,
                matched: false,
            })
        } else {
            JoinOutcome::Dropped { key }
        }
    }

    fn namespaced(&self, attribute: &str) -> String {
        if self.namespace.is_empty() {
            attribute.to_string()
        } else {
            format!("{}.{}", self.namespace, attribute)
        }
    }
}
