use anyhow::anyhow;
use multitask_domain::{TieBreak, parse_tie_break, paths};
use std::path::PathBuf;

pub(crate) fn optional_trimmed_string_from_env(name: &str) -> anyhow::Result<Option<String>> {
    let value = match std::env::var_os(name) {
        Some(value) => value,
        None => return Ok(None),
    };

    let value = value.to_string_lossy();
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("{name} is set but empty"));
    }

    Ok(Some(trimmed.to_owned()))
}

pub(crate) fn optional_trimmed_path_from_env(name: &str) -> anyhow::Result<Option<PathBuf>> {
    Ok(optional_trimmed_string_from_env(name)?.map(PathBuf::from))
}

pub fn resolve_multitask_root() -> anyhow::Result<PathBuf> {
    if let Some(root) = optional_trimmed_path_from_env(paths::MULTITASK_ROOT_ENV)? {
        return Ok(root);
    }

    let home = std::env::var_os("HOME").ok_or_else(|| anyhow!("HOME is not set"))?;
    Ok(PathBuf::from(home).join("multitask"))
}

pub fn user_id_from_env() -> anyhow::Result<Option<String>> {
    optional_trimmed_string_from_env(paths::MULTITASK_USER_ENV)
}

pub fn tie_break_from_env() -> anyhow::Result<Option<TieBreak>> {
    let name = paths::MULTITASK_TIE_BREAK_ENV;
    match optional_trimmed_string_from_env(name)? {
        Some(value) => parse_tie_break(&value)
            .map(Some)
            .ok_or_else(|| anyhow!("invalid {name}: {value} (expected keep_local or adopt_remote)")),
        None => Ok(None),
    }
}
