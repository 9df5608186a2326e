use crate::state_json::{read_state_file, write_file_atomically};
use anyhow::Context as _;
use multitask_domain::{LocalStateStore, PersistedState, RawState, paths};
use std::path::{Path, PathBuf};

/// File-backed local storage: one JSON document per storage key under the
/// data root.
#[derive(Clone, Debug)]
pub struct LocalFileStore {
    root: PathBuf,
}

impl LocalFileStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn load_raw(&self) -> anyhow::Result<Option<RawState>> {
        let primary = paths::local_state_path(&self.root);
        if let Some(raw) = read_state_file(&primary)? {
            return Ok(Some(raw));
        }

        let legacy = paths::legacy_local_state_path(&self.root);
        let raw = read_state_file(&legacy)?;
        if raw.is_some() {
            tracing::info!(path = %legacy.display(), "loaded state from legacy storage key");
        }
        Ok(raw)
    }

    pub fn save(&self, state: &PersistedState) -> anyhow::Result<()> {
        let json = serde_json::to_string(state).context("failed to serialize state")?;
        write_file_atomically(&paths::local_state_path(&self.root), &json)
    }
}

impl LocalStateStore for LocalFileStore {
    fn load_local(&self) -> Result<Option<RawState>, String> {
        self.load_raw().map_err(|e| format!("{e:#}"))
    }

    fn save_local(&self, state: &PersistedState) -> Result<(), String> {
        self.save(state).map_err(|e| format!("{e:#}"))
    }
}
