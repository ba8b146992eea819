//! Command implementations for the EAIP importer CLI
//!
//! Each command is implemented in its own module:
//! - `import`: archive import with live progress
//! - `library`: periods, airports, charts and export queries
//! - `reindex`: re-run categorization and indexing on an imported cycle
//! - `inspect`: list an archive without importing it

pub mod import;
pub mod inspect;
pub mod library;
pub mod reindex;
pub mod shared;

use crate::cli::args::{Args, Commands};
use anyhow::Result;

/// Main command runner: sets up logging and dispatches to the subcommand
pub async fn run(args: Args) -> Result<()> {
    shared::setup_logging(&args.global);

    let Args { global, command } = args;
    let Some(command) = command else {
        anyhow::bail!("No command given. Run with --help to see the available commands.");
    };

    match command {
        Commands::Import(import_args) => import::run_import(&global, import_args).await,
        Commands::Periods => library::run_periods(&global),
        Commands::Airports(airports_args) => library::run_airports(&global, airports_args),
        Commands::Charts(charts_args) => library::run_charts(&global, charts_args),
        Commands::Export(export_args) => library::run_export(&global, export_args),
        Commands::Reindex(reindex_args) => reindex::run_reindex(&global, reindex_args).await,
        Commands::Inspect(inspect_args) => inspect::run_inspect(&global, inspect_args),
    }
}
