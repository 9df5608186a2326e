use super::migrate::migrate;
use crate::{PersistedState, RawState};

#[derive(Clone, Debug, PartialEq)]
pub enum Decision {
    KeepLocal,
    AdoptRemote(PersistedState),
}

impl Decision {
    pub fn is_adopt(&self) -> bool {
        matches!(self, Decision::AdoptRemote(_))
    }
}

/// Which side wins when both copies carry the same timestamp.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum TieBreak {
    /// The local copy already reflects the in-session edits.
    #[default]
    KeepLocal,
    AdoptRemote,
}

impl TieBreak {
    pub fn as_str(self) -> &'static str {
        match self {
            TieBreak::KeepLocal => "keep_local",
            TieBreak::AdoptRemote => "adopt_remote",
        }
    }
}

pub fn parse_tie_break(value: &str) -> Option<TieBreak> {
    match value.trim().to_ascii_lowercase().as_str() {
        "keep_local" | "keep-local" | "local" => Some(TieBreak::KeepLocal),
        "adopt_remote" | "adopt-remote" | "remote" => Some(TieBreak::AdoptRemote),
        _ => None,
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ReconcilePolicy {
    pub tie_break: TieBreak,
}

pub fn reconcile(local: Option<&PersistedState>, remote: Option<RawState>) -> Decision {
    reconcile_with_policy(ReconcilePolicy::default(), local, remote)
}

/// The remote copy is always migrated before it is compared, since an older
/// client may have written it. A missing timestamp is older than any present
/// one.
pub fn reconcile_with_policy(
    policy: ReconcilePolicy,
    local: Option<&PersistedState>,
    remote: Option<RawState>,
) -> Decision {
    let Some(remote) = remote else {
        return Decision::KeepLocal;
    };
    let remote = migrate(remote);

    let Some(local) = local else {
        return Decision::AdoptRemote(remote);
    };

    if remote.timestamp > local.timestamp {
        return Decision::AdoptRemote(remote);
    }
    if remote.timestamp == local.timestamp && policy.tie_break == TieBreak::AdoptRemote {
        return Decision::AdoptRemote(remote);
    }
    Decision::KeepLocal
}
