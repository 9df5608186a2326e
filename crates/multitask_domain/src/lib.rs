mod adapters;
pub use adapters::{LocalStateStore, RemoteStateStore};

pub mod paths;

mod persistence;
pub use persistence::{
    Decision, MigrationReport, ReconcilePolicy, TieBreak, migrate, migrate_document,
    migrate_with_report, parse_tie_break, reconcile, reconcile_with_policy, stamp_for_save,
};

mod state;
pub use state::*;
