use crate::config::CliConfig;
use anyhow::{Context as _, anyhow};
use multitask_backend::{LocalFileStore, RemoteWrite, SaveOutcome, Session, read_state_export};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;

pub fn run_migrate(file: &Path) -> anyhow::Result<()> {
    let state = read_state_export(file)?;
    print_json(&serde_json::to_value(&state).context("failed to serialize state")?)
}

pub fn run_show(config: &CliConfig) -> anyhow::Result<()> {
    let mut session = Session::new(Arc::new(LocalFileStore::new(config.root.clone())));
    let value = match session.start()? {
        Some(state) => serde_json::to_value(state).context("failed to serialize state")?,
        None => serde_json::Value::Null,
    };
    print_json(&value)
}

pub fn run_import(config: &CliConfig, file: &Path, user: Option<String>) -> anyhow::Result<()> {
    let mut session = open_session(config)?;
    if let Some(user_id) = config.user_id(user) {
        session.sign_in(user_id);
    }

    let state = session.import_file(file)?.clone();
    let outcome = session.save(state)?;
    print_json(&save_summary(&session, &outcome))
}

pub fn run_sync(config: &CliConfig, user: Option<String>, persist: bool) -> anyhow::Result<()> {
    let user_id = config.require_user_id(user)?;
    let mut session = open_session(config)?;
    session.start()?;
    session.sign_in(user_id);

    let adopted = session.sync_from_remote()?;
    let mut persisted = false;
    if adopted && persist {
        let state = session
            .current()
            .cloned()
            .ok_or_else(|| anyhow!("adopted state is missing"))?;
        session.save(state)?;
        persisted = true;
    }

    print_json(&json!({
        "adopted": adopted,
        "persisted": persisted,
        "timestamp": session.current().and_then(|state| state.timestamp),
    }))
}

pub fn run_push(config: &CliConfig, user: Option<String>) -> anyhow::Result<()> {
    let user_id = config.require_user_id(user)?;
    let mut session = open_session(config)?;
    let state = session
        .start()?
        .cloned()
        .ok_or_else(|| anyhow!("no local state under {}", config.root.display()))?;
    session.sign_in(user_id);

    let outcome = session.save(state)?;
    if let RemoteWrite::Failed(err) = &outcome.remote {
        return Err(anyhow!("remote write failed: {err}"));
    }
    print_json(&save_summary(&session, &outcome))
}

fn open_session(config: &CliConfig) -> anyhow::Result<Session> {
    Ok(Session::open(config.root.clone())?.with_policy(config.policy()))
}

fn save_summary(session: &Session, outcome: &SaveOutcome) -> serde_json::Value {
    json!({
        "jobs": session.current().map_or(0, |state| state.job_queue.len()),
        "timestamp": outcome.timestamp,
        "remote": outcome.remote.as_str(),
    })
}

fn print_json(value: &serde_json::Value) -> anyhow::Result<()> {
    let text = serde_json::to_string_pretty(value).context("failed to format output")?;
    println!("{text}");
    Ok(())
}
