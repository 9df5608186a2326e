use crate::local_store::LocalFileStore;
use crate::sqlite_store::SqliteRemoteStore;
use crate::state_json::parse_state_json;
use crate::time::unix_epoch_millis_now;
use anyhow::{Context as _, anyhow};
use multitask_domain::{
    Decision, LocalStateStore, MigrationReport, PersistedState, RawState, ReconcilePolicy,
    RemoteStateStore, migrate_with_report, paths, reconcile_with_policy, stamp_for_save,
};
use std::path::{Path, PathBuf};
use std::sync::{Arc, mpsc};

/// A remote document change for one user, as delivered by the sync layer.
#[derive(Clone, Debug, PartialEq)]
pub struct RemoteNotification {
    pub user_id: String,
    pub snapshot: Option<RawState>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RemoteWrite {
    Skipped,
    Written,
    Failed(String),
}

impl RemoteWrite {
    pub fn as_str(&self) -> &'static str {
        match self {
            RemoteWrite::Skipped => "skipped",
            RemoteWrite::Written => "written",
            RemoteWrite::Failed(_) => "failed",
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SaveOutcome {
    pub timestamp: u64,
    pub remote: RemoteWrite,
}

/// The application context: the stores, the signed-in user, and the one
/// current state. Every call runs to completion before the next one starts.
pub struct Session {
    local: Arc<dyn LocalStateStore>,
    remote: Option<Arc<dyn RemoteStateStore>>,
    user_id: Option<String>,
    policy: ReconcilePolicy,
    current: Option<PersistedState>,
}

impl Session {
    pub fn new(local: Arc<dyn LocalStateStore>) -> Self {
        Self {
            local,
            remote: None,
            user_id: None,
            policy: ReconcilePolicy::default(),
            current: None,
        }
    }

    /// Local file storage and the SQLite document store under `root`.
    pub fn open(root: PathBuf) -> anyhow::Result<Self> {
        std::fs::create_dir_all(&root)
            .with_context(|| format!("failed to create {}", root.display()))?;

        let remote = SqliteRemoteStore::new(paths::remote_db_path(&root))
            .context("failed to init remote document store")?;
        let local = LocalFileStore::new(root);
        Ok(Self::new(Arc::new(local)).with_remote(Arc::new(remote)))
    }

    pub fn with_remote(mut self, remote: Arc<dyn RemoteStateStore>) -> Self {
        self.remote = Some(remote);
        self
    }

    pub fn with_policy(mut self, policy: ReconcilePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn current(&self) -> Option<&PersistedState> {
        self.current.as_ref()
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn start(&mut self) -> anyhow::Result<Option<&PersistedState>> {
        let raw = self
            .local
            .load_local()
            .map_err(anyhow::Error::msg)
            .context("failed to load local state")?;

        self.current = raw.map(|raw| {
            let (state, report) = migrate_with_report(raw);
            log_migration("local", &report);
            state
        });
        Ok(self.current.as_ref())
    }

    pub fn sign_in(&mut self, user_id: impl Into<String>) {
        let user_id = user_id.into();
        tracing::info!(user_id = %user_id, "signed in");
        self.user_id = Some(user_id);
    }

    pub fn sign_out(&mut self) {
        if let Some(user_id) = self.user_id.take() {
            tracing::info!(user_id = %user_id, "signed out");
        }
    }

    /// Returns whether the remote state was adopted.
    pub fn handle_remote_notification(&mut self, notification: RemoteNotification) -> bool {
        if self.user_id.as_deref() != Some(notification.user_id.as_str()) {
            tracing::debug!(
                user_id = %notification.user_id,
                "ignoring remote notification for a user that is not signed in"
            );
            return false;
        }

        let local_timestamp = self.current.as_ref().and_then(|state| state.timestamp);
        match reconcile_with_policy(self.policy, self.current.as_ref(), notification.snapshot) {
            Decision::KeepLocal => {
                tracing::debug!(
                    user_id = %notification.user_id,
                    local_timestamp = ?local_timestamp,
                    "keeping local state"
                );
                false
            }
            Decision::AdoptRemote(state) => {
                tracing::info!(
                    user_id = %notification.user_id,
                    remote_timestamp = ?state.timestamp,
                    local_timestamp = ?local_timestamp,
                    "remote state is newer than local; adopting"
                );
                self.current = Some(state);
                true
            }
        }
    }

    /// Processes every queued notification in arrival order and returns how
    /// many of them were adopted.
    pub fn drain_notifications(&mut self, rx: &mpsc::Receiver<RemoteNotification>) -> usize {
        let mut adopted = 0;
        while let Ok(notification) = rx.try_recv() {
            if self.handle_remote_notification(notification) {
                adopted += 1;
            }
        }
        adopted
    }

    pub fn sync_from_remote(&mut self) -> anyhow::Result<bool> {
        let user_id = self
            .user_id
            .clone()
            .ok_or_else(|| anyhow!("not signed in"))?;
        let remote = self
            .remote
            .clone()
            .ok_or_else(|| anyhow!("no remote store configured"))?;

        let snapshot = remote
            .load_remote(&user_id)
            .map_err(anyhow::Error::msg)
            .with_context(|| format!("failed to load remote state for user {user_id}"))?;
        Ok(self.handle_remote_notification(RemoteNotification { user_id, snapshot }))
    }

    pub fn save(&mut self, state: PersistedState) -> anyhow::Result<SaveOutcome> {
        self.save_at(state, unix_epoch_millis_now())
    }

    /// Local storage is written first; a failed remote write is logged and
    /// reported but does not fail the save.
    pub fn save_at(
        &mut self,
        state: PersistedState,
        now_unix_ms: u64,
    ) -> anyhow::Result<SaveOutcome> {
        let stamped = stamp_for_save(state, now_unix_ms);
        self.local
            .save_local(&stamped)
            .map_err(anyhow::Error::msg)
            .context("failed to save local state")?;

        let remote = match (&self.remote, &self.user_id) {
            (Some(remote), Some(user_id)) => match remote.save_remote(user_id, &stamped) {
                Ok(()) => RemoteWrite::Written,
                Err(err) => {
                    tracing::warn!(user_id = %user_id, error = %err, "failed to save remote state");
                    RemoteWrite::Failed(err)
                }
            },
            _ => RemoteWrite::Skipped,
        };

        let timestamp = stamped.timestamp.unwrap_or(now_unix_ms);
        self.current = Some(stamped);
        Ok(SaveOutcome { timestamp, remote })
    }

    /// Reads an exported state file and makes it current. Nothing is saved.
    pub fn import_file(&mut self, path: &Path) -> anyhow::Result<&PersistedState> {
        let state = read_state_export(path)?;
        Ok(self.current.insert(state))
    }
}

/// Reads and migrates a JSON state export.
pub fn read_state_export(path: &Path) -> anyhow::Result<PersistedState> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let raw = parse_state_json(&text)
        .with_context(|| format!("invalid state in {}", path.display()))?
        .ok_or_else(|| anyhow!("{} holds no state", path.display()))?;

    let (state, report) = migrate_with_report(raw);
    log_migration("import", &report);
    Ok(state)
}

fn log_migration(source: &str, report: &MigrationReport) {
    if report.upgraded() {
        tracing::info!(
            source,
            declared_version = ?report.declared_version,
            start_version = report.start_version,
            steps = ?report.applied,
            "migrated persisted state"
        );
    } else {
        tracing::debug!(source, steps = ?report.applied, "persisted state is current");
    }
}
