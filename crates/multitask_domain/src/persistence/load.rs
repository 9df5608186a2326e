use super::shape::{
    ENTRY_DATA_KEY, ENTRY_HISTORY_KEY, ENTRY_TAG_KEY, HISTORY_EVENTS_KEY, JOB_QUEUE_KEY,
    JOB_TITLE_KEY, JOB_WORKLOG_KEY, SCHEMA_VERSION_KEY, TIMESTAMP_KEY, UNSAVED_JOB_KEY,
    coerce_sequence, text_from_value, timestamp_from_value, version_from_value,
};
use crate::{Job, JobEntry, JobHistory, JobTag, PersistedState, RawState};
use serde_json::{Map, Value};

/// Reads an already migrated document into the typed state. Values of the
/// wrong type fall back to defaults instead of failing.
pub(super) fn state_from_document(mut doc: RawState) -> PersistedState {
    let job_queue = doc
        .remove(JOB_QUEUE_KEY)
        .map(coerce_sequence)
        .unwrap_or_default()
        .into_iter()
        .filter_map(entry_from_value)
        .collect();

    let unsaved_job = match doc.remove(UNSAVED_JOB_KEY) {
        Some(Value::Object(job)) => Some(job_from_map(job)),
        _ => None,
    };

    let timestamp = doc
        .remove(TIMESTAMP_KEY)
        .as_ref()
        .and_then(timestamp_from_value);
    let schema_version = doc
        .remove(SCHEMA_VERSION_KEY)
        .as_ref()
        .and_then(version_from_value);

    PersistedState {
        job_queue,
        unsaved_job,
        timestamp,
        schema_version,
        extra: doc,
    }
}

fn entry_from_value(value: Value) -> Option<JobEntry> {
    let Value::Object(mut entry) = value else {
        return None;
    };

    let job = match entry.remove(ENTRY_DATA_KEY) {
        Some(Value::Object(job)) => job,
        Some(other) => {
            entry.insert(ENTRY_DATA_KEY.to_owned(), other);
            return Some(JobEntry::queued(job_from_map(entry)));
        }
        None => return Some(JobEntry::queued(job_from_map(entry))),
    };

    let tag = match entry.remove(ENTRY_TAG_KEY) {
        Some(Value::String(tag)) => JobTag::from(tag),
        _ => JobTag::Queued,
    };
    let history = match entry.remove(ENTRY_HISTORY_KEY) {
        Some(Value::Object(history)) => history_from_map(history),
        _ => JobHistory::default(),
    };

    Some(JobEntry {
        tag,
        data: job_from_map(job),
        history,
        extra: entry,
    })
}

fn history_from_map(mut history: Map<String, Value>) -> JobHistory {
    let events = history
        .remove(HISTORY_EVENTS_KEY)
        .map(coerce_sequence)
        .unwrap_or_default();
    JobHistory {
        events,
        extra: history,
    }
}

fn job_from_map(mut job: Map<String, Value>) -> Job {
    let title = job
        .remove(JOB_TITLE_KEY)
        .and_then(text_from_value)
        .unwrap_or_default();
    let worklog = job
        .remove(JOB_WORKLOG_KEY)
        .map(coerce_sequence)
        .unwrap_or_default()
        .into_iter()
        .filter(|entry| !entry.is_null())
        .collect();
    Job {
        title,
        worklog,
        extra: job,
    }
}
