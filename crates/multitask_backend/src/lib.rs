mod env;
mod local_store;
mod session;
mod sqlite_store;
mod state_json;
#[cfg(test)]
mod test_support;
mod time;

pub use env::{resolve_multitask_root, tie_break_from_env, user_id_from_env};
pub use local_store::LocalFileStore;
pub use session::{RemoteNotification, RemoteWrite, SaveOutcome, Session, read_state_export};
pub use sqlite_store::SqliteRemoteStore;
pub use state_json::parse_state_json;
