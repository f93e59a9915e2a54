//! dqg - a local quote library with remote sync, from the command line.

mod cli;
mod commands;
mod error;


use clap::Parser;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands, SyncCommands};
use crate::commands::add::run_add;
use crate::commands::categories::{run_categories, run_category};
use crate::commands::common::{load_config, resolve_config_path, resolve_data_dir};
use crate::commands::completions::run_completions;
use crate::commands::edit::run_edit;
use crate::commands::export::run_export;
use crate::commands::import::run_import;
use crate::commands::list::run_list;
use crate::commands::show::run_show;
use crate::commands::sync::{run_sync, run_sync_conflicts, run_sync_resolve};
use crate::commands::watch::run_watch;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let directive = "dqg=info"
        .parse::<Directive>()
        .map_err(|error| CliError::Config(format!("invalid log directive: {error}")))?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(directive))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let data_dir = resolve_data_dir(cli.data_dir);

    match cli.command {
        None => run_show(None, &data_dir).await?,
        Some(Commands::Show { category }) => run_show(category.as_deref(), &data_dir).await?,
        Some(Commands::Add { text, category }) => {
            run_add(&text, &category, &data_dir).await?;
        }
        Some(Commands::Edit { id, text }) => {
            run_edit(&id, &text, &data_dir).await?;
        }
        Some(Commands::List { category, json }) => {
            run_list(category.as_deref(), json, &data_dir).await?;
        }
        Some(Commands::Categories { json }) => run_categories(json, &data_dir).await?,
        Some(Commands::Category { name }) => run_category(name.as_deref(), &data_dir).await?,
        Some(Commands::Import { path }) => {
            run_import(&path, &data_dir).await?;
        }
        Some(Commands::Export { output, dated }) => {
            run_export(output.as_deref(), dated, &data_dir).await?;
        }
        Some(Commands::Sync { command }) => match command {
            None => {
                let config = load_config(&resolve_config_path(cli.config))?;
                run_sync(&config, &data_dir).await?;
            }
            Some(SyncCommands::Conflicts { json }) => run_sync_conflicts(json, &data_dir).await?,
            Some(SyncCommands::Resolve { id, keep }) => {
                run_sync_resolve(&id, keep, &data_dir).await?;
            }
        },
        Some(Commands::Watch { interval }) => {
            let config = load_config(&resolve_config_path(cli.config))?;
            run_watch(&config, interval, &data_dir).await?;
        }
        Some(Commands::Completions { shell, output }) => {
            run_completions(shell, output.as_deref())?;
        }
    }

    Ok(())
}
