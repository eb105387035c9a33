use super::*;

/// One output row of [`left_join_mean`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableJoinRow {
    pub key: String,
    pub attributes: Fields,
    /// `None` when no value row matched this dimension record.
    pub mean: Option<f64>,
    pub sample_count: u64,
}

/// Static `dimension LEFT JOIN values GROUP BY key` with a mean aggregate.
///
/// Unlike the streaming path, every dimension record yields a row; records
/// without matching values report `mean: None`. Value rows whose key is not
/// in the dimension are ignored. Output is sorted by key.
pub fn left_join_mean(snapshot: &DimensionSnapshot, rows: &[(String, f64)]) -> Vec<TableJoinRow> {
    let function = Mean;
    let mut accumulators: AHashMap<&str, MeanAccumulator> = AHashMap::new();
    for (key, value) in rows {
        if snapshot.get(key).is_none() {
            continue;
        }
        let acc = accumulators
            .entry(key.as_str())
            .or_insert_with(|| function.create_accumulator());
        function.add(acc, value);
    }

    snapshot
        .sorted_records()
        .into_iter()
        .map(|record| {
            let result = accumulators
                .remove(record.key.as_str())
                .and_then(|acc| function.get_result(acc));
            TableJoinRow {
                key: record.key.clone(),
                attributes: record.attributes.clone(),
                mean: result.map(|r| r.mean),
                sample_count: result.map_or(0, |r| r.count),
            }
        })
        .collect()
}
