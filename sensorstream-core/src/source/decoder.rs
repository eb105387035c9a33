use super::*;

/// Decodes one JSON object per record, as the demo producer publishes them:
///
/// ```json
/// {"city_id": 1001, "temperature": 21, "ts": "2025-06-01 12:00:03"}
/// ```
///
/// `key_field` and `timestamp_field` are lifted out of the payload (the key
/// stays among the fields too, so it can serve as a join field); everything
/// else becomes event fields.
#[derive(Debug, Clone)]
pub struct JsonEventDecoder {
    key_field: String,
    timestamp_field: String,
}

impl Default for JsonEventDecoder {
    fn default() -> Self {
        Self::new("city_id", "ts")
    }
}

impl JsonEventDecoder {
    pub fn new(key_field: impl Into<String>, timestamp_field: impl Into<String>) -> Self {
        Self {
            key_field: key_field.into(),
            timestamp_field: timestamp_field.into(),
        }
    }

    /// Decode a payload. Only non-JSON or non-object input fails here;
    /// missing key or timestamp surface later from [`into_event`].
    pub fn decode(&self, payload: &str) -> Result<RawEvent, EngineError> {
        let value: serde_json::Value = serde_json::from_str(payload)
            .map_err(|e| EngineError::malformed(format!("invalid JSON payload: {e}")))?;
        let serde_json::Value::Object(mut object) = value else {
            return Err(EngineError::malformed("payload is not a JSON object"));
        };

        let timestamp = object
            .remove(&self.timestamp_field)
            .and_then(|ts| match ts {
                serde_json::Value::Number(n) => n.as_i64().map(RawTimestamp::Millis),
                serde_json::Value::String(s) => Some(RawTimestamp::Text(s)),
                _ => None,
            });

        let key = match object.get(&self.key_field) {
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            Some(serde_json::Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };

        let fields: Fields = object
            .into_iter()
            .map(|(name, value)| (name, FieldValue::from(value)))
            .collect();

        Ok(RawEvent {
            key,
            timestamp,
            fields,
        })
    }

    /// Encode an event back into the producer's payload layout.
    pub fn encode(&self, event: &Event) -> String {
        let mut object = serde_json::Map::new();
        for (name, value) in &event.fields {
            object.insert(name.clone(), serde_json::to_value(value).unwrap_or_default());
        }
        object
            .entry(self.key_field.clone())
            .or_insert_with(|| serde_json::Value::String(event.key.clone()));
        object.insert(
            self.timestamp_field.clone(),
            serde_json::Value::from(event.timestamp),
        );
        serde_json::Value::Object(object).to_string()
    }
}
