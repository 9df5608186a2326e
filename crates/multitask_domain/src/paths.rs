use std::path::{Path, PathBuf};

pub const MULTITASK_ROOT_ENV: &str = "MULTITASK_ROOT";
pub const MULTITASK_USER_ENV: &str = "MULTITASK_USER";
pub const MULTITASK_TIE_BREAK_ENV: &str = "MULTITASK_TIE_BREAK";

pub const STORAGE_KEY: &str = "MultitaskOS-Model";
pub const LEGACY_STORAGE_KEY: &str = "multitaskOS-state";

pub fn local_storage_path(root: &Path, key: &str) -> PathBuf {
    root.join(format!("{key}.json"))
}

pub fn local_state_path(root: &Path) -> PathBuf {
    local_storage_path(root, STORAGE_KEY)
}

pub fn legacy_local_state_path(root: &Path) -> PathBuf {
    local_storage_path(root, LEGACY_STORAGE_KEY)
}

pub fn remote_db_path(root: &Path) -> PathBuf {
    root.join("remote.db")
}
