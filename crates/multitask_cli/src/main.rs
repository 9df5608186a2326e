mod cli;
mod commands;
mod config;

use clap::Parser;
use cli::{Cli, Command};
use config::CliConfig;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let Cli {
        root,
        tie_break,
        cmd,
    } = Cli::parse();
    let config = move || load_config(root, tie_break);

    match cmd {
        Command::Migrate { file } => commands::run_migrate(&file),
        Command::Show => commands::run_show(&config()?),
        Command::Import { file, user } => commands::run_import(&config()?, &file, user),
        Command::Sync { user, persist } => commands::run_sync(&config()?, user, persist),
        Command::Push { user } => commands::run_push(&config()?, user),
    }
}

fn load_config(
    root: Option<std::path::PathBuf>,
    tie_break: Option<multitask_domain::TieBreak>,
) -> anyhow::Result<CliConfig> {
    let config = CliConfig::from_env(root, tie_break)?;
    tracing::debug!(
        root = %config.root.display(),
        tie_break = config.tie_break.as_str(),
        "resolved configuration"
    );
    Ok(config)
}
