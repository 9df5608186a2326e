use serde_json::{Map, Value};

pub(super) const JOB_QUEUE_KEY: &str = "jobQueue";
pub(super) const UNSAVED_JOB_KEY: &str = "unsavedJob";
pub(super) const TIMESTAMP_KEY: &str = "timestamp";
pub(super) const SCHEMA_VERSION_KEY: &str = "schemaVersion";

pub(super) const ENTRY_TAG_KEY: &str = "tag";
pub(super) const ENTRY_DATA_KEY: &str = "data";
pub(super) const ENTRY_HISTORY_KEY: &str = "history";
pub(super) const HISTORY_EVENTS_KEY: &str = "events";

pub(super) const JOB_TITLE_KEY: &str = "title";
pub(super) const JOB_WORKLOG_KEY: &str = "worklog";

/// Reads any stored value as a sequence.
///
/// Document stores encode sparse arrays as objects keyed by index and drop
/// empty ones entirely, so both shapes are accepted. Any other non-sequence
/// value counts as a sequence of one.
pub(super) fn coerce_sequence(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        Value::Object(map) if is_index_keyed(&map) => {
            let mut indexed = map
                .into_iter()
                .filter_map(|(key, value)| key.parse::<usize>().ok().map(|idx| (idx, value)))
                .collect::<Vec<_>>();
            indexed.sort_by_key(|(idx, _)| *idx);
            indexed.into_iter().map(|(_, value)| value).collect()
        }
        other => vec![other],
    }
}

fn is_index_keyed(map: &Map<String, Value>) -> bool {
    map.keys().all(|key| key.parse::<usize>().is_ok())
}

/// A queue entry is tagged when it wraps its job in an object-valued `data`.
pub(super) fn is_tagged_entry(entry: &Value) -> bool {
    entry.get(ENTRY_DATA_KEY).is_some_and(Value::is_object)
}

pub(super) fn text_from_value(value: Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

pub(super) fn timestamp_from_value(value: &Value) -> Option<u64> {
    value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|ms| ms.is_finite() && *ms >= 0.0)
            .map(|ms| ms as u64)
    })
}

pub(super) fn version_from_value(value: &Value) -> Option<u32> {
    value.as_u64().and_then(|v| u32::try_from(v).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn coerce_sequence_accepts_arrays_nulls_and_index_keyed_objects() {
        assert_eq!(coerce_sequence(json!(["a", "b"])), vec![json!("a"), json!("b")]);
        assert_eq!(coerce_sequence(Value::Null), Vec::<Value>::new());
        assert_eq!(
            coerce_sequence(json!({"10": "c", "2": "b", "0": "a"})),
            vec![json!("a"), json!("b"), json!("c")]
        );
        assert_eq!(coerce_sequence(json!({})), Vec::<Value>::new());
    }

    #[test]
    fn coerce_sequence_wraps_other_values() {
        assert_eq!(coerce_sequence(json!("a")), vec![json!("a")]);
        assert_eq!(
            coerce_sequence(json!({"title": "t"})),
            vec![json!({"title": "t"})]
        );
    }

    #[test]
    fn tagged_entries_are_detected_by_shape() {
        assert!(is_tagged_entry(&json!({"tag": "Queued", "data": {"title": "t"}})));
        assert!(is_tagged_entry(&json!({"data": {}})));
        assert!(!is_tagged_entry(&json!({"title": "t"})));
        assert!(!is_tagged_entry(&json!({"data": "not a job"})));
        assert!(!is_tagged_entry(&json!("t")));
    }

    #[test]
    fn timestamps_accept_non_negative_numbers_only() {
        assert_eq!(timestamp_from_value(&json!(100)), Some(100));
        assert_eq!(timestamp_from_value(&json!(1500.9)), Some(1500));
        assert_eq!(timestamp_from_value(&json!(-1)), None);
        assert_eq!(timestamp_from_value(&json!("100")), None);
        assert_eq!(timestamp_from_value(&Value::Null), None);
    }

    #[test]
    fn text_from_value_renders_scalars() {
        assert_eq!(text_from_value(json!("a")), Some("a".to_owned()));
        assert_eq!(text_from_value(json!(3)), Some("3".to_owned()));
        assert_eq!(text_from_value(json!(true)), Some("true".to_owned()));
        assert_eq!(text_from_value(Value::Null), None);
        assert_eq!(text_from_value(json!({"a": 1})), Some("{\"a\":1}".to_owned()));
    }
}
