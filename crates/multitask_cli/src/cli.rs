use clap::{Parser, Subcommand};
use multitask_domain::{TieBreak, parse_tie_break};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "multitask")]
#[command(about = "Inspect, migrate and sync MultitaskOS state")]
pub struct Cli {
    /// Data root; overrides MULTITASK_ROOT.
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Which copy wins on equal timestamps; overrides MULTITASK_TIE_BREAK.
    #[arg(long = "tie-break", global = true, value_parser = tie_break_arg)]
    pub tie_break: Option<TieBreak>,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the migrated form of a state file without touching the data root.
    Migrate { file: PathBuf },
    /// Print the current local state.
    Show,
    /// Migrate a state export and save it as the current state.
    Import {
        file: PathBuf,
        #[arg(long)]
        user: Option<String>,
    },
    /// Reconcile the local state with the user's remote document.
    Sync {
        #[arg(long)]
        user: Option<String>,
        /// Save the adopted remote state locally.
        #[arg(long)]
        persist: bool,
    },
    /// Stamp the local state and write it to both stores.
    Push {
        #[arg(long)]
        user: Option<String>,
    },
}

fn tie_break_arg(value: &str) -> Result<TieBreak, String> {
    parse_tie_break(value).ok_or_else(|| format!("expected keep_local or adopt_remote, got {value}"))
}
