use super::*;

#[test]
fn test_parse_timestamp_millis_passthrough() {
    assert_eq!(parse_timestamp(&RawTimestamp::Millis(3_000)).unwrap(), 3_000);
    assert_eq!(parse_timestamp(&RawTimestamp::Millis(-5)).unwrap(), -5);
}

#[test]
fn test_parse_timestamp_text_is_utc() {
    let ts = RawTimestamp::Text("1970-01-01 00:00:03".to_string());
    assert_eq!(parse_timestamp(&ts).unwrap(), 3_000);

    let ts = RawTimestamp::Text("2025-06-01 12:00:00".to_string());
    assert_eq!(parse_timestamp(&ts).unwrap(), 1_748_779_200_000);
}

#[test]
fn test_parse_timestamp_rfc3339_and_numeric_text() {
    let ts = RawTimestamp::Text("1970-01-01T00:00:05+00:00".to_string());
    assert_eq!(parse_timestamp(&ts).unwrap(), 5_000);

    let ts = RawTimestamp::Text("1970-01-01T01:00:05+01:00".to_string());
    assert_eq!(parse_timestamp(&ts).unwrap(), 5_000);

    let ts = RawTimestamp::Text(" 7000 ".to_string());
    assert_eq!(parse_timestamp(&ts).unwrap(), 7_000);
}

#[test]
fn test_parse_timestamp_garbage_is_malformed() {
    let err = parse_timestamp(&RawTimestamp::Text("yesterday".to_string())).unwrap_err();
    assert!(matches!(err, EngineError::MalformedEvent(_)));
}

#[test]
fn test_into_event_requires_key_and_timestamp() {
    let ok = into_event(RawEvent::new("1001", 1_000).with_field("temperature", 20i64)).unwrap();
    assert_eq!(ok.key, "1001");
    assert_eq!(ok.timestamp, 1_000);
    assert_eq!(ok.field("temperature"), Some(&FieldValue::Int(20)));

    let mut no_key = RawEvent::new("x", 1_000);
    no_key.key = None;
    assert!(matches!(
        into_event(no_key),
        Err(EngineError::MalformedEvent(_))
    ));

    let blank_key = RawEvent::new("  ", 1_000);
    assert!(into_event(blank_key).is_err());

    let mut no_ts = RawEvent::new("1001", 0);
    no_ts.timestamp = None;
    assert!(matches!(
        into_event(no_ts),
        Err(EngineError::MalformedEvent(_))
    ));
}

#[test]
fn test_into_event_rejects_reserved_min_timestamp() {
    let raw = JsonEventDecoder::default()
        .decode(r#"{"city_id": 1001, "temperature": 20, "ts": -9223372036854775808}"#)
        .unwrap();
    assert_eq!(raw.timestamp, Some(RawTimestamp::Millis(i64::MIN)));
    assert!(matches!(
        into_event(raw),
        Err(EngineError::MalformedEvent(_))
    ));

    let next = into_event(RawEvent::new("1001", i64::MIN + 1)).unwrap();
    assert_eq!(next.timestamp, i64::MIN + 1);
}

#[test]
fn test_decoder_lifts_key_and_timestamp() {
    let decoder = JsonEventDecoder::default();
    let raw = decoder
        .decode(r#"{"city_id": 1001, "temperature": 21, "ts": "1970-01-01 00:00:03"}"#)
        .unwrap();

    assert_eq!(raw.key.as_deref(), Some("1001"));
    assert_eq!(
        raw.timestamp,
        Some(RawTimestamp::Text("1970-01-01 00:00:03".to_string()))
    );
    assert_eq!(raw.fields.get("temperature"), Some(&FieldValue::Int(21)));
    // Key stays addressable as a join field; timestamp does not.
    assert_eq!(raw.fields.get("city_id"), Some(&FieldValue::Int(1001)));
    assert!(!raw.fields.contains_key("ts"));

    let event = into_event(raw).unwrap();
    assert_eq!(event.timestamp, 3_000);
}

#[test]
fn test_decoder_custom_fields_and_numeric_timestamp() {
    let decoder = JsonEventDecoder::new("sensor", "event_time");
    let raw = decoder
        .decode(r#"{"sensor": "s-1", "event_time": 4500, "temperature": 19.5}"#)
        .unwrap();
    assert_eq!(raw.key.as_deref(), Some("s-1"));
    assert_eq!(raw.timestamp, Some(RawTimestamp::Millis(4_500)));
}

#[test]
fn test_decoder_missing_parts_fail_validation_not_decode() {
    let decoder = JsonEventDecoder::default();
    let raw = decoder.decode(r#"{"temperature": 21}"#).unwrap();
    assert_eq!(raw.key, None);
    assert_eq!(raw.timestamp, None);
    assert!(into_event(raw).is_err());
}

#[test]
fn test_decoder_rejects_non_objects() {
    let decoder = JsonEventDecoder::default();
    assert!(decoder.decode("not json").is_err());
    assert!(decoder.decode("[1, 2, 3]").is_err());
}

#[test]
fn test_encode_then_decode_keeps_event() {
    let decoder = JsonEventDecoder::default();
    let event = Event::new("1001", 9_000).with_field("temperature", 22i64);
    let raw = decoder.decode(&decoder.encode(&event)).unwrap();
    let back = into_event(raw).unwrap();
    assert_eq!(back.key, "1001");
    assert_eq!(back.timestamp, 9_000);
    assert_eq!(back.field("temperature"), Some(&FieldValue::Int(22)));
}

#[test]
fn test_iter_source_ends_with_none() {
    let mut source = IterSource::new(vec![RawEvent::new("a", 1), RawEvent::new("b", 2)]);
    assert_eq!(source.next().unwrap().unwrap().key.as_deref(), Some("a"));
    assert_eq!(source.next().unwrap().unwrap().key.as_deref(), Some("b"));
    assert!(source.next().unwrap().is_none());
}

#[test]
fn test_channel_source_ends_when_senders_drop() {
    let (tx, mut rx) = crossbeam_channel::unbounded();
    tx.send(RawEvent::new("a", 1)).unwrap();
    drop(tx);
    assert!(EventSource::next(&mut rx).unwrap().is_some());
    assert!(EventSource::next(&mut rx).unwrap().is_none());
}
