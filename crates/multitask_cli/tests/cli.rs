use serde_json::{Value, json};
use std::path::Path;
use std::process::{Command, Output};

fn multitask(root: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_multitask"))
        .args(args)
        .env("MULTITASK_ROOT", root)
        .env_remove("MULTITASK_USER")
        .env_remove("MULTITASK_TIE_BREAK")
        .env_remove("RUST_LOG")
        .output()
        .expect("run multitask")
}

fn stdout_json(output: &Output) -> Value {
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

fn write_legacy_export(path: &Path) {
    std::fs::write(
        path,
        json!({
            "thread": {"threadName": "Write report", "journal": ["outline"]},
            "threadQueue": [{"threadName": "Email"}],
            "hotkeysPressed": ["a"]
        })
        .to_string(),
    )
    .expect("write export");
}

#[test]
fn migrate_prints_current_shape() {
    let dir = tempfile::tempdir().expect("tempdir");
    let export = dir.path().join("export.json");
    write_legacy_export(&export);

    let out = stdout_json(&multitask(
        &dir.path().join("root"),
        &["migrate", export.to_string_lossy().as_ref()],
    ));

    let queue = out["jobQueue"].as_array().expect("jobQueue array");
    assert_eq!(queue.len(), 2);
    assert_eq!(queue[0]["tag"], json!("Queued"));
    assert_eq!(queue[0]["data"]["title"], json!("Write report"));
    assert_eq!(queue[0]["data"]["worklog"], json!(["outline"]));
    assert_eq!(queue[1]["data"]["title"], json!("Email"));
    assert_eq!(out["unsavedJob"], Value::Null);
    assert!(out.get("hotkeysPressed").is_none());
    assert!(out.get("thread").is_none());
    assert!(!dir.path().join("root").exists());
}

#[test]
fn show_prints_null_for_empty_root() {
    let dir = tempfile::tempdir().expect("tempdir");
    let out = stdout_json(&multitask(dir.path(), &["show"]));
    assert_eq!(out, Value::Null);
}

#[test]
fn import_saves_and_show_reads_back() {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path().join("root");
    let export = dir.path().join("export.json");
    write_legacy_export(&export);

    let imported = stdout_json(&multitask(
        &root,
        &["import", export.to_string_lossy().as_ref()],
    ));
    assert_eq!(imported["jobs"], json!(2));
    assert_eq!(imported["remote"], json!("skipped"));

    let shown = stdout_json(&multitask(&root, &["show"]));
    assert_eq!(shown["timestamp"], imported["timestamp"]);
    assert_eq!(shown["jobQueue"].as_array().map(Vec::len), Some(2));
    assert!(shown["schemaVersion"].as_u64().is_some());
}

#[test]
fn show_reads_legacy_storage_key() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(
        dir.path().join("multitaskOS-state.json"),
        json!({"thread": {"threadName": "Old"}}).to_string(),
    )
    .expect("write legacy state");

    let shown = stdout_json(&multitask(dir.path(), &["show"]));
    assert_eq!(shown["jobQueue"][0]["data"]["title"], json!("Old"));
}

#[test]
fn push_then_sync_restores_lost_local_state() {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path().join("root");
    let export = dir.path().join("export.json");
    write_legacy_export(&export);

    stdout_json(&multitask(
        &root,
        &["import", export.to_string_lossy().as_ref()],
    ));
    let pushed = stdout_json(&multitask(&root, &["push", "--user", "alice"]));
    assert_eq!(pushed["remote"], json!("written"));

    std::fs::remove_file(root.join("MultitaskOS-Model.json")).expect("remove local state");

    let synced = stdout_json(&multitask(
        &root,
        &["sync", "--user", "alice", "--persist"],
    ));
    assert_eq!(synced["adopted"], json!(true));
    assert_eq!(synced["persisted"], json!(true));

    let shown = stdout_json(&multitask(&root, &["show"]));
    assert_eq!(shown["jobQueue"].as_array().map(Vec::len), Some(2));
}

#[test]
fn sync_keeps_local_on_equal_timestamps_unless_configured() {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path().join("root");
    let export = dir.path().join("export.json");
    write_legacy_export(&export);

    stdout_json(&multitask(
        &root,
        &["import", export.to_string_lossy().as_ref(), "--user", "alice"],
    ));

    let kept = stdout_json(&multitask(&root, &["sync", "--user", "alice"]));
    assert_eq!(kept["adopted"], json!(false));

    let adopted = stdout_json(&multitask(
        &root,
        &["sync", "--user", "alice", "--tie-break", "adopt_remote"],
    ));
    assert_eq!(adopted["adopted"], json!(true));
    assert_eq!(adopted["persisted"], json!(false));
}

#[test]
fn sync_without_user_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    let out = multitask(dir.path(), &["sync"]);
    assert!(!out.status.success());
    assert!(
        String::from_utf8_lossy(&out.stderr).contains("MULTITASK_USER"),
        "stderr: {}",
        String::from_utf8_lossy(&out.stderr)
    );
}

#[test]
fn push_without_local_state_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    let out = multitask(dir.path(), &["push", "--user", "alice"]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("no local state"));
}

#[test]
fn invalid_tie_break_env_is_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let out = Command::new(env!("CARGO_BIN_EXE_multitask"))
        .arg("show")
        .env("MULTITASK_ROOT", dir.path())
        .env("MULTITASK_TIE_BREAK", "newest")
        .output()
        .expect("run multitask");
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("invalid MULTITASK_TIE_BREAK"));
}

#[test]
fn migrate_rejects_non_object_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let export = dir.path().join("export.json");
    std::fs::write(&export, "[]").expect("write export");

    let out = multitask(dir.path(), &["migrate", export.to_string_lossy().as_ref()]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("not a JSON object"));
}
