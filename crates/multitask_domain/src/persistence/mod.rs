mod load;
mod migrate;
mod reconcile;
mod save;
mod shape;

pub use migrate::{MigrationReport, migrate, migrate_document, migrate_with_report};
pub use reconcile::{
    Decision, ReconcilePolicy, TieBreak, parse_tie_break, reconcile, reconcile_with_policy,
};
pub use save::stamp_for_save;
