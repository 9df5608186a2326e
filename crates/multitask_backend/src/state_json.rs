use anyhow::{Context as _, anyhow};
use multitask_domain::RawState;
use serde_json::Value;
use std::path::Path;

/// Parses a stored blob. `null` and blank content mean "no data"; anything
/// other than a JSON object is rejected before it reaches the migrator.
pub fn parse_state_json(text: &str) -> anyhow::Result<Option<RawState>> {
    if text.trim().is_empty() {
        return Ok(None);
    }

    let value: Value = serde_json::from_str(text).context("invalid JSON")?;
    match value {
        Value::Object(map) => Ok(Some(map)),
        Value::Null => Ok(None),
        _ => Err(anyhow!("stored state is not a JSON object")),
    }
}

pub(crate) fn read_state_file(path: &Path) -> anyhow::Result<Option<RawState>> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read {}", path.display()));
        }
    };
    parse_state_json(&text).with_context(|| format!("invalid state in {}", path.display()))
}

pub(crate) fn write_file_atomically(path: &Path, contents: &str) -> anyhow::Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| anyhow!("invalid path {}", path.display()))?;
    std::fs::create_dir_all(parent)
        .with_context(|| format!("failed to create directory {}", parent.display()))?;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = Path::new(&tmp);
    std::fs::write(tmp, contents.as_bytes())
        .with_context(|| format!("failed to write {}", tmp.display()))?;
    std::fs::rename(tmp, path)
        .with_context(|| format!("failed to replace {}", path.display()))?;
    Ok(())
}
