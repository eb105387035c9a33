use super::*;

/// One row of reference data, e.g. a city keyed by `city_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionRecord {
    pub key: String,
    pub attributes: Fields,
}

impl DimensionRecord {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            attributes: Fields::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }
}

/// An immutable, fully built record set.
#[derive(Debug, Default)]
pub struct DimensionSnapshot {
    version: u64,
    records: AHashMap<String, Arc<DimensionRecord>>,
}

impl DimensionSnapshot {
    pub fn get(&self, key: &str) -> Option<&Arc<DimensionRecord>> {
        self.records.get(key)
    }

    /// Monotonic refresh counter; 0 for the initial empty store.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records sorted by key.
    pub fn sorted_records(&self) -> Vec<&Arc<DimensionRecord>> {
        let mut records: Vec<_> = self.records.values().collect();
        records.sort_by(|a, b| a.key.cmp(&b.key));
        records
    }
}

/// In-memory dimension table with copy-on-write refresh.
///
/// Readers load the current snapshot pointer without locking. A refresh
/// builds a complete new snapshot off to the side and swaps the pointer in
/// one step, so a reader sees either the old record set or the new one,
/// never a mix. A refresh that fails validation leaves the old snapshot in
/// place.
#[derive(Debug)]
pub struct DimensionStore {
    current: ArcSwap<DimensionSnapshot>,
    /// Serializes writers so versions stay strictly increasing.
    refresh_lock: Mutex<()>,
}

impl Default for DimensionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DimensionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(DimensionSnapshot::default()),
            refresh_lock: Mutex::new(()),
        }
    }

    /// Create a store pre-loaded with `records`.
    pub fn with_records(records: Vec<DimensionRecord>) -> Result<Self, DimensionError> {
        let store = Self::new();
        store.replace_all(records)?;
        Ok(store)
    }

    /// Look up one record in the current snapshot.
    pub fn get(&self, key: &str) -> Option<Arc<DimensionRecord>> {
        self.current.load().get(key).cloned()
    }

    /// Pin the current snapshot for a consistent multi-key read.
    pub fn snapshot(&self) -> Arc<DimensionSnapshot> {
        self.current.load_full()
    }

    pub fn version(&self) -> u64 {
        self.current.load().version()
    }

    pub fn len(&self) -> usize {
        self.current.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.load().is_empty()
    }

    /// Atomically replace the whole record set.
    ///
    /// Returns the new snapshot version. Empty or duplicate keys reject the
    /// whole set.
    pub fn replace_all(&self, records: Vec<DimensionRecord>) -> Result<u64, DimensionError> {
        let mut map = AHashMap::with_capacity(records.len());
        for (index, record) in records.into_iter().enumerate() {
            if record.key.trim().is_empty() {
                return Err(DimensionError::EmptyKey { index });
            }
            if map.contains_key(&record.key) {
                return Err(DimensionError::DuplicateKey(record.key));
            }
            map.insert(record.key.clone(), Arc::new(record));
        }

        let _guard = self
            .refresh_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let version = self.current.load().version() + 1;
        let size = map.len();
        self.current.store(Arc::new(DimensionSnapshot {
            version,
            records: map,
        }));
        tracing::info!(version, records = size, "dimension store refreshed");
        Ok(version)
    }

    /// Parse a JSON array of objects and replace the record set with it.
    ///
    /// `key_field` names the attribute used as record key; it is kept among
    /// the attributes as well. Parse failures leave the store untouched.
    pub fn replace_all_json(
        &self,
        reader: impl Read,
        key_field: &str,
    ) -> Result<u64, DimensionError> {
        let records = parse_json_records(reader, key_field)?;
        self.replace_all(records)
    }
}

/// Parse a JSON array of flat objects into dimension records.
pub fn parse_json_records(
    reader: impl Read,
    key_field: &str,
) -> Result<Vec<DimensionRecord>, DimensionError> {
    let rows: Vec<serde_json::Map<String, serde_json::Value>> =
        serde_json::from_reader(reader).map_err(|e| DimensionError::Parse(e.to_string()))?;

    let mut records = Vec::with_capacity(rows.len());
    for (index, row) in rows.into_iter().enumerate() {
        let key = match row.get(key_field) {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(serde_json::Value::Number(n)) => n.to_string(),
            _ => {
                return Err(DimensionError::Parse(format!(
                    "row #{index} has no usable {key_field:?}"
                )))
            }
        };
        let attributes = row
            .into_iter()
            .map(|(name, value)| (name, FieldValue::from(value)))
            .collect();
        records.push(DimensionRecord { key, attributes });
    }
    Ok(records)
}
