use crate::{PersistedState, RawState};

/// Device-local storage of the single state blob.
pub trait LocalStateStore: Send + Sync {
    fn load_local(&self) -> Result<Option<RawState>, String>;

    fn save_local(&self, state: &PersistedState) -> Result<(), String>;
}

/// Per-user document in the cloud store.
pub trait RemoteStateStore: Send + Sync {
    fn load_remote(&self, user_id: &str) -> Result<Option<RawState>, String>;

    fn save_remote(&self, user_id: &str, state: &PersistedState) -> Result<(), String>;
}
