//! Schema migration for persisted state.
//!
//! Stored blobs come from every schema the application has ever written, and
//! the oldest ones carry no version at all. Each step below inspects the shape
//! of the document and is a no-op when its legacy shape is absent, so the
//! chain can always be replayed from the start. A declared `schemaVersion`
//! only lets the chain skip steps when the document agrees with it.

use super::load::state_from_document;
use super::shape::{
    ENTRY_DATA_KEY, ENTRY_HISTORY_KEY, ENTRY_TAG_KEY, HISTORY_EVENTS_KEY, JOB_QUEUE_KEY,
    JOB_TITLE_KEY, JOB_WORKLOG_KEY, SCHEMA_VERSION_KEY, TIMESTAMP_KEY, UNSAVED_JOB_KEY,
    coerce_sequence, is_tagged_entry, timestamp_from_value, version_from_value,
};
use crate::{CURRENT_SCHEMA_VERSION, JobTag, PersistedState, RawState};
use serde_json::{Map, Value};

const LEGACY_JOB_KEY: &str = "job";
const HOTKEYS_PRESSED_KEY: &str = "hotkeysPressed";
const LEGACY_TITLE_KEY: &str = "threadName";
const LEGACY_JOURNAL_KEY: &str = "journal";

/// Applied in order, so `newThread` reaches `unsavedJob` in a single pass.
const ROOT_RENAMES: &[(&str, &str)] = &[
    ("thread", LEGACY_JOB_KEY),
    ("threadQueue", JOB_QUEUE_KEY),
    ("newThread", "newJob"),
    ("newJob", UNSAVED_JOB_KEY),
];

const LEGACY_ROOT_FIELDS: &[&str] = &[
    "thread",
    "threadQueue",
    "newThread",
    "newJob",
    LEGACY_JOB_KEY,
    HOTKEYS_PRESSED_KEY,
];

const LEGACY_JOB_FIELDS: &[&str] = &[LEGACY_TITLE_KEY, LEGACY_JOURNAL_KEY];

struct Migration {
    version: u32,
    name: &'static str,
    apply: fn(&mut RawState),
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "rename_root_fields",
        apply: rename_root_fields,
    },
    Migration {
        version: 2,
        name: "normalize_job_shapes",
        apply: normalize_job_shapes,
    },
    Migration {
        version: 3,
        name: "fold_singleton_job",
        apply: fold_singleton_job,
    },
    Migration {
        version: 4,
        name: "tag_queue_entries",
        apply: tag_queue_entries,
    },
    Migration {
        version: BACKFILL_VERSION,
        name: BACKFILL_STEP,
        apply: backfill_defaults,
    },
    Migration {
        version: 6,
        name: "drop_deprecated_fields",
        apply: drop_deprecated_fields,
    },
];

const BACKFILL_VERSION: u32 = 5;
const BACKFILL_STEP: &str = "backfill_defaults";

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct MigrationReport {
    /// `schemaVersion` as stored, if any.
    pub declared_version: Option<u32>,
    /// Version the chain started from; 0 when the declared version was missing
    /// or contradicted by the document's shape.
    pub start_version: u32,
    pub applied: Vec<&'static str>,
}

impl MigrationReport {
    pub fn upgraded(&self) -> bool {
        self.start_version < CURRENT_SCHEMA_VERSION
    }
}

pub fn migrate(raw: RawState) -> PersistedState {
    migrate_with_report(raw).0
}

pub fn migrate_with_report(raw: RawState) -> (PersistedState, MigrationReport) {
    let (doc, report) = migrate_document_with_report(raw);
    (state_from_document(doc), report)
}

/// Runs the migration chain without converting to the typed state.
pub fn migrate_document(raw: RawState) -> RawState {
    migrate_document_with_report(raw).0
}

fn migrate_document_with_report(mut doc: RawState) -> (RawState, MigrationReport) {
    let declared_version = doc.get(SCHEMA_VERSION_KEY).and_then(version_from_value);
    let start_version = match declared_version {
        Some(version) if !has_legacy_shape(&doc) => version.min(CURRENT_SCHEMA_VERSION),
        _ => 0,
    };

    let mut applied = Vec::new();
    for migration in MIGRATIONS {
        if migration.version <= start_version {
            continue;
        }
        (migration.apply)(&mut doc);
        applied.push(migration.name);
    }
    // Document stores drop empty sequences no matter which version wrote them.
    if start_version >= BACKFILL_VERSION {
        backfill_defaults(&mut doc);
        applied.push(BACKFILL_STEP);
    }

    let version = declared_version.map_or(CURRENT_SCHEMA_VERSION, |declared| {
        declared.max(CURRENT_SCHEMA_VERSION)
    });
    doc.insert(SCHEMA_VERSION_KEY.to_owned(), Value::from(version));

    (
        doc,
        MigrationReport {
            declared_version,
            start_version,
            applied,
        },
    )
}

fn has_legacy_shape(doc: &RawState) -> bool {
    if LEGACY_ROOT_FIELDS.iter().any(|key| doc.contains_key(*key)) {
        return true;
    }
    if doc.get(UNSAVED_JOB_KEY).is_some_and(has_legacy_job_fields) {
        return true;
    }
    match doc.get(JOB_QUEUE_KEY) {
        None | Some(Value::Null) => false,
        Some(Value::Array(queue)) => queue.iter().any(|entry| {
            (entry.is_object() && !is_tagged_entry(entry))
                || entry
                    .get(ENTRY_DATA_KEY)
                    .is_some_and(has_legacy_job_fields)
        }),
        Some(_) => true,
    }
}

fn has_legacy_job_fields(job: &Value) -> bool {
    LEGACY_JOB_FIELDS.iter().any(|key| job.get(*key).is_some())
}

fn take_job_queue(doc: &mut RawState) -> Vec<Value> {
    doc.remove(JOB_QUEUE_KEY)
        .map(coerce_sequence)
        .unwrap_or_default()
}

fn put_job_queue(doc: &mut RawState, queue: Vec<Value>) {
    doc.insert(JOB_QUEUE_KEY.to_owned(), Value::Array(queue));
}

fn queued_job_mut(entry: &mut Value) -> Option<&mut Map<String, Value>> {
    if is_tagged_entry(entry) {
        entry
            .get_mut(ENTRY_DATA_KEY)
            .and_then(Value::as_object_mut)
    } else {
        entry.as_object_mut()
    }
}

fn rename_root_fields(doc: &mut RawState) {
    for (old, new) in ROOT_RENAMES {
        if let Some(value) = doc.remove(*old) {
            doc.insert((*new).to_owned(), value);
        }
    }
}

fn normalize_job_shapes(doc: &mut RawState) {
    for key in [UNSAVED_JOB_KEY, LEGACY_JOB_KEY] {
        if let Some(Value::Object(job)) = doc.get_mut(key) {
            normalize_job_shape(job);
        }
    }

    let mut queue = take_job_queue(doc);
    for entry in &mut queue {
        if let Some(job) = queued_job_mut(entry) {
            normalize_job_shape(job);
        }
    }
    put_job_queue(doc, queue);
}

fn normalize_job_shape(job: &mut Map<String, Value>) {
    if let Some(title) = job.remove(LEGACY_TITLE_KEY) {
        job.insert(JOB_TITLE_KEY.to_owned(), title);
    }

    // The old scalar worklog held the newest entry and goes in front.
    if let Some(journal) = job.remove(LEGACY_JOURNAL_KEY) {
        let mut worklog = job
            .remove(JOB_WORKLOG_KEY)
            .map(coerce_sequence)
            .unwrap_or_default();
        worklog.extend(coerce_sequence(journal));
        job.insert(JOB_WORKLOG_KEY.to_owned(), Value::Array(worklog));
    }
}

fn fold_singleton_job(doc: &mut RawState) {
    let Some(job) = doc.remove(LEGACY_JOB_KEY) else {
        return;
    };
    if job.is_null() {
        return;
    }

    let mut queue = take_job_queue(doc);
    queue.insert(0, job);
    put_job_queue(doc, queue);
}

fn tag_queue_entries(doc: &mut RawState) {
    // Holes and scalars carry no job; each remaining entry is judged on its own.
    let queue = take_job_queue(doc)
        .into_iter()
        .filter(Value::is_object)
        .map(|entry| {
            if is_tagged_entry(&entry) {
                entry
            } else {
                tag_as_queued(entry)
            }
        })
        .collect();
    put_job_queue(doc, queue);
}

fn tag_as_queued(job: Value) -> Value {
    let mut entry = Map::new();
    entry.insert(ENTRY_TAG_KEY.to_owned(), Value::from(JobTag::QUEUED));
    entry.insert(ENTRY_DATA_KEY.to_owned(), job);
    Value::Object(entry)
}

/// Also brings root scalars back to their typed shape, so the raw document
/// satisfies the same invariants as the typed view.
fn backfill_defaults(doc: &mut RawState) {
    let mut queue = take_job_queue(doc);
    queue.retain(Value::is_object);
    for entry in &mut queue {
        if is_tagged_entry(entry) {
            if let Value::Object(entry) = entry {
                backfill_entry(entry);
            }
        } else if let Value::Object(job) = entry {
            backfill_job(job);
        }
    }
    put_job_queue(doc, queue);

    if doc.get(UNSAVED_JOB_KEY).is_some_and(|job| !job.is_object()) {
        doc.remove(UNSAVED_JOB_KEY);
    }
    if let Some(Value::Object(job)) = doc.get_mut(UNSAVED_JOB_KEY) {
        backfill_job(job);
    }

    if let Some(timestamp) = doc.remove(TIMESTAMP_KEY) {
        if let Some(timestamp) = timestamp_from_value(&timestamp) {
            doc.insert(TIMESTAMP_KEY.to_owned(), Value::from(timestamp));
        }
    }
}

fn backfill_entry(entry: &mut Map<String, Value>) {
    if !entry.get(ENTRY_TAG_KEY).is_some_and(Value::is_string) {
        entry.insert(ENTRY_TAG_KEY.to_owned(), Value::from(JobTag::QUEUED));
    }

    if let Some(Value::Object(job)) = entry.get_mut(ENTRY_DATA_KEY) {
        backfill_job(job);
    }

    let mut history = match entry.remove(ENTRY_HISTORY_KEY) {
        Some(Value::Object(history)) => history,
        _ => Map::new(),
    };
    let events = history
        .remove(HISTORY_EVENTS_KEY)
        .map(coerce_sequence)
        .unwrap_or_default();
    history.insert(HISTORY_EVENTS_KEY.to_owned(), Value::Array(events));
    entry.insert(ENTRY_HISTORY_KEY.to_owned(), Value::Object(history));
}

fn backfill_job(job: &mut Map<String, Value>) {
    let worklog = job
        .remove(JOB_WORKLOG_KEY)
        .map(coerce_sequence)
        .unwrap_or_default();
    job.insert(JOB_WORKLOG_KEY.to_owned(), Value::Array(worklog));
}

fn drop_deprecated_fields(doc: &mut RawState) {
    doc.remove(HOTKEYS_PRESSED_KEY);
}
