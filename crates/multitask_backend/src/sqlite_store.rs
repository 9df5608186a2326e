use crate::state_json::parse_state_json;
use crate::time::unix_epoch_millis_now;
use anyhow::{Context as _, anyhow};
use multitask_domain::{PersistedState, RawState, RemoteStateStore};
use rusqlite::{Connection, OptionalExtension as _, params};
use std::path::{Path, PathBuf};
use std::sync::mpsc;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum SqliteStoreError {
    EmptyUserId,
}

impl std::fmt::Display for SqliteStoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SqliteStoreError::EmptyUserId => write!(f, "user id is empty"),
        }
    }
}

impl std::error::Error for SqliteStoreError {}

const LATEST_SCHEMA_VERSION: u32 = 1;

const MIGRATIONS: &[(u32, &str)] = &[(
    1,
    include_str!(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/migrations/0001_users_data.sql"
    )),
)];

/// Per-user state documents kept in SQLite, standing in for the cloud
/// document store. All access goes through one worker thread.
#[derive(Clone)]
pub struct SqliteRemoteStore {
    tx: mpsc::Sender<DbCommand>,
}

enum DbCommand {
    LoadDocument {
        user_id: String,
        reply: mpsc::Sender<anyhow::Result<Option<String>>>,
    },
    SaveDocument {
        user_id: String,
        payload_json: String,
        reply: mpsc::Sender<anyhow::Result<()>>,
    },
}

impl SqliteRemoteStore {
    pub fn new(db_path: PathBuf) -> anyhow::Result<Self> {
        let (tx, rx) = mpsc::channel::<DbCommand>();

        std::thread::Builder::new()
            .name("multitask-sqlite".to_owned())
            .spawn(move || {
                let mut db = SqliteDatabase::open(&db_path);
                while let Ok(cmd) = rx.recv() {
                    match (&mut db, cmd) {
                        (Ok(db), DbCommand::LoadDocument { user_id, reply }) => {
                            let _ = reply.send(db.load_document(&user_id));
                        }
                        (
                            Ok(db),
                            DbCommand::SaveDocument {
                                user_id,
                                payload_json,
                                reply,
                            },
                        ) => {
                            let _ = reply.send(db.save_document(&user_id, &payload_json));
                        }
                        (Err(err), cmd) => {
                            respond_db_open_error(err, cmd);
                        }
                    }
                }
            })
            .context("failed to spawn sqlite worker thread")?;

        Ok(Self { tx })
    }

    pub fn load_document(&self, user_id: &str) -> anyhow::Result<Option<RawState>> {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.tx
            .send(DbCommand::LoadDocument {
                user_id: user_id.to_owned(),
                reply: reply_tx,
            })
            .context("sqlite worker is not running")?;
        let payload = reply_rx.recv().context("sqlite worker terminated")??;

        match payload {
            Some(payload) => parse_state_json(&payload)
                .with_context(|| format!("invalid remote state for user {user_id}")),
            None => Ok(None),
        }
    }

    /// Replaces the user's document verbatim.
    pub fn save_document(&self, user_id: &str, document: &serde_json::Value) -> anyhow::Result<()> {
        let payload_json =
            serde_json::to_string(document).context("failed to serialize remote state")?;
        let (reply_tx, reply_rx) = mpsc::channel();
        self.tx
            .send(DbCommand::SaveDocument {
                user_id: user_id.to_owned(),
                payload_json,
                reply: reply_tx,
            })
            .context("sqlite worker is not running")?;
        reply_rx.recv().context("sqlite worker terminated")?
    }
}

impl RemoteStateStore for SqliteRemoteStore {
    fn load_remote(&self, user_id: &str) -> Result<Option<RawState>, String> {
        self.load_document(user_id).map_err(|e| format!("{e:#}"))
    }

    fn save_remote(&self, user_id: &str, state: &PersistedState) -> Result<(), String> {
        let result: anyhow::Result<()> = (|| {
            let document = serde_json::to_value(state).context("failed to serialize state")?;
            self.save_document(user_id, &document)
        })();
        result.map_err(|e| format!("{e:#}"))
    }
}

fn respond_db_open_error(err: &anyhow::Error, cmd: DbCommand) {
    let message = format!("{err:#}");
    match cmd {
        DbCommand::LoadDocument { reply, .. } => {
            let _ = reply.send(Err(anyhow!(message)));
        }
        DbCommand::SaveDocument { reply, .. } => {
            let _ = reply.send(Err(anyhow!(message)));
        }
    }
}

struct SqliteDatabase {
    conn: Connection,
}

impl SqliteDatabase {
    fn open(db_path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let mut conn = Connection::open(db_path)
            .with_context(|| format!("failed to open sqlite db {}", db_path.display()))?;

        configure_connection(&mut conn).context("failed to configure sqlite connection")?;
        apply_migrations(&mut conn).context("failed to apply sqlite migrations")?;

        Ok(Self { conn })
    }

    fn load_document(&mut self, user_id: &str) -> anyhow::Result<Option<String>> {
        let user_id = checked_user_id(user_id)?;
        self.conn
            .query_row(
                "SELECT payload_json FROM users_data WHERE user_id = ?1",
                params![user_id],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .with_context(|| format!("failed to load document for user {user_id}"))
    }

    fn save_document(&mut self, user_id: &str, payload_json: &str) -> anyhow::Result<()> {
        let user_id = checked_user_id(user_id)?;
        self.conn
            .execute(
                "INSERT INTO users_data (user_id, payload_json, updated_at_unix_ms)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(user_id) DO UPDATE SET
                   payload_json = excluded.payload_json,
                   updated_at_unix_ms = excluded.updated_at_unix_ms",
                params![user_id, payload_json, unix_epoch_millis_now() as i64],
            )
            .with_context(|| format!("failed to save document for user {user_id}"))?;
        Ok(())
    }
}

fn checked_user_id(user_id: &str) -> anyhow::Result<&str> {
    let trimmed = user_id.trim();
    if trimmed.is_empty() {
        return Err(SqliteStoreError::EmptyUserId.into());
    }
    Ok(trimmed)
}

fn configure_connection(conn: &mut Connection) -> anyhow::Result<()> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;
         PRAGMA busy_timeout = 5000;",
    )
    .context("failed to apply sqlite PRAGMAs")?;
    Ok(())
}

fn apply_migrations(conn: &mut Connection) -> anyhow::Result<()> {
    let current: u32 = conn
        .query_row("PRAGMA user_version", [], |row| row.get::<_, i64>(0))
        .context("failed to read user_version")? as u32;

    if current > LATEST_SCHEMA_VERSION {
        return Err(anyhow!(
            "sqlite schema version is newer than this build: db={}, app={}",
            current,
            LATEST_SCHEMA_VERSION
        ));
    }

    if current == LATEST_SCHEMA_VERSION {
        return Ok(());
    }

    conn.execute_batch("BEGIN IMMEDIATE;")
        .context("failed to begin migration transaction")?;

    for (version, sql) in MIGRATIONS {
        if *version <= current {
            continue;
        }
        conn.execute_batch(sql)
            .with_context(|| format!("failed to apply migration v{version:04}"))?;
        conn.pragma_update(None, "user_version", *version as i64)
            .context("failed to update user_version")?;
    }

    conn.execute_batch("COMMIT;")
        .context("failed to commit migration transaction")?;
    Ok(())
}
