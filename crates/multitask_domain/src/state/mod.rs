mod job;
mod persisted;

pub use job::{Job, JobEntry, JobHistory, JobTag};
pub use persisted::{CURRENT_SCHEMA_VERSION, PersistedState, RawState};
