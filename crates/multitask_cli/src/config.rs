use anyhow::anyhow;
use multitask_backend::{resolve_multitask_root, tie_break_from_env, user_id_from_env};
use multitask_domain::{ReconcilePolicy, TieBreak};
use std::path::PathBuf;

/// Settings resolved from the environment, with command-line values taking
/// precedence.
#[derive(Clone, Debug)]
pub struct CliConfig {
    pub root: PathBuf,
    pub tie_break: TieBreak,
    user_id: Option<String>,
}

impl CliConfig {
    pub fn from_env(root: Option<PathBuf>, tie_break: Option<TieBreak>) -> anyhow::Result<Self> {
        let root = match root {
            Some(root) => root,
            None => resolve_multitask_root()?,
        };
        let tie_break = match tie_break {
            Some(tie_break) => tie_break,
            None => tie_break_from_env()?.unwrap_or_default(),
        };

        Ok(Self {
            root,
            tie_break,
            user_id: user_id_from_env()?,
        })
    }

    pub fn policy(&self) -> ReconcilePolicy {
        ReconcilePolicy {
            tie_break: self.tie_break,
        }
    }

    pub fn user_id(&self, flag: Option<String>) -> Option<String> {
        flag.map(|user| user.trim().to_owned())
            .filter(|user| !user.is_empty())
            .or_else(|| self.user_id.clone())
    }

    pub fn require_user_id(&self, flag: Option<String>) -> anyhow::Result<String> {
        self.user_id(flag)
            .ok_or_else(|| anyhow!("no user id: pass --user or set MULTITASK_USER"))
    }
}
