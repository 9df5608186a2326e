use super::{Job, JobEntry};
use serde_json::{Map, Value};

/// A persisted blob exactly as read from storage, before migration.
pub type RawState = Map<String, Value>;

pub const CURRENT_SCHEMA_VERSION: u32 = 6;

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    #[serde(default)]
    pub job_queue: Vec<JobEntry>,
    #[serde(default)]
    pub unsaved_job: Option<Job>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<u32>,
    /// Root fields owned by the application.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PersistedState {
    pub fn new() -> Self {
        Self {
            schema_version: Some(CURRENT_SCHEMA_VERSION),
            ..Self::default()
        }
    }

    pub fn jobs(&self) -> impl Iterator<Item = &Job> {
        self.unsaved_job
            .iter()
            .chain(self.job_queue.iter().map(|entry| &entry.data))
    }
}
