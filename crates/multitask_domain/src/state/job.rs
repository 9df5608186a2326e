use serde_json::{Map, Value};

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Job {
    #[serde(default)]
    pub title: String,
    /// Log entries, most recent first. Entries are text as written by the
    /// application; other values are kept as stored.
    #[serde(default)]
    pub worklog: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Job {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            worklog: Vec::new(),
            extra: Map::new(),
        }
    }

    pub fn with_worklog<I, S>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Value>,
    {
        self.worklog = entries.into_iter().map(Into::into).collect();
        self
    }
}

#[derive(Clone, Debug, Default, Eq, Hash, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JobTag {
    #[default]
    Queued,
    Other(String),
}

impl JobTag {
    pub const QUEUED: &'static str = "Queued";

    pub fn as_str(&self) -> &str {
        match self {
            JobTag::Queued => Self::QUEUED,
            JobTag::Other(tag) => tag,
        }
    }
}

impl From<String> for JobTag {
    fn from(value: String) -> Self {
        if value == Self::QUEUED {
            JobTag::Queued
        } else {
            JobTag::Other(value)
        }
    }
}

impl From<JobTag> for String {
    fn from(value: JobTag) -> Self {
        match value {
            JobTag::Queued => JobTag::QUEUED.to_owned(),
            JobTag::Other(tag) => tag,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct JobHistory {
    /// Opaque to this crate; owned by the application.
    #[serde(default)]
    pub events: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct JobEntry {
    pub tag: JobTag,
    pub data: Job,
    #[serde(default)]
    pub history: JobHistory,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl JobEntry {
    pub fn queued(job: Job) -> Self {
        Self {
            tag: JobTag::Queued,
            data: job,
            history: JobHistory::default(),
            extra: Map::new(),
        }
    }

    pub fn is_queued(&self) -> bool {
        self.tag == JobTag::Queued
    }
}
