//! Reindex command: categorize and index an already imported cycle

use super::shared::{create_progress_bar, load_configuration, open_library, require_period};
use crate::cli::args::{GlobalArgs, ReindexArgs};
use crate::constants::{ENROUTE_DIR_NAME, TERMINAL_DIR_NAME};
use crate::pdf::{LopdfEngine, PdfEngine};
use crate::pipeline::progress::fraction_percent;
use crate::processor::{CategoryVocabulary, indexer, organizer};
use anyhow::{Context, Result};
use colored::*;
use std::sync::Arc;
use tokio::task;
use tracing::info;

/// Run the reindex command
pub async fn run_reindex(global: &GlobalArgs, args: ReindexArgs) -> Result<()> {
    let mut config = load_configuration(global)?;
    if let Some(workers) = args.workers {
        config = config.with_workers(workers);
    }
    let library = open_library(&config, args.period.as_deref())?;
    let period = require_period(&library)?;
    let cycle_dir = library
        .cycle_dir()?
        .with_context(|| format!("AIRAC cycle {} not found", period))?;

    let terminal = cycle_dir.join(TERMINAL_DIR_NAME);
    let enroute = cycle_dir.join(ENROUTE_DIR_NAME);
    let vocabulary = Arc::new(CategoryVocabulary::default());
    let engine: Option<Arc<dyn PdfEngine>> = if args.no_merge {
        None
    } else {
        Some(Arc::new(LopdfEngine::new()))
    };
    info!("Reindexing AIRAC {} at {}", period, cycle_dir.display());

    let organize_stats = {
        let terminal = terminal.clone();
        let vocabulary = vocabulary.clone();
        task::spawn_blocking(move || organizer::organize(&terminal, &vocabulary)).await??
    };

    let progress_bar = create_progress_bar(global.show_progress());
    let index_stats = indexer::generate_index(
        &terminal,
        &enroute,
        config.import_workers(),
        vocabulary,
        engine,
        |done, total| {
            if let Some(pb) = &progress_bar {
                pb.set_position(fraction_percent(done, total) as u64);
                pb.set_message(format!("{}/{} airports", done, total));
            }
        },
    )
    .await?;
    if let Some(pb) = &progress_bar {
        pb.finish_and_clear();
    }

    if global.show_progress() {
        println!("{} {}", "Reindexed AIRAC".bright_green().bold(), period.bright_white().bold());
        println!(
            "  {} {}",
            "Charts categorized:".bright_cyan(),
            organize_stats.moved
        );
        println!(
            "  {} {}",
            "Airports:".bright_cyan(),
            index_stats.airports.len()
        );
        println!(
            "  {} {}",
            "Charts indexed:".bright_cyan(),
            index_stats.total_charts()
        );
        if index_stats.merged_documents > 0 {
            println!(
                "  {} {}",
                "Merged documents:".bright_cyan(),
                index_stats.merged_documents
            );
        }
        if index_stats.airports_failed > 0 {
            println!(
                "  {} {}",
                "Airports failed:".bright_red(),
                index_stats.airports_failed.to_string().bright_red().bold()
            );
        }
    }
    Ok(())
}
