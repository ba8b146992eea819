//! Import command: run one archive import with a live progress bar

use super::shared::{create_progress_bar, load_configuration};
use crate::cli::args::{GlobalArgs, ImportArgs};
use crate::models::{ImportEvent, ImportOutcome};
use crate::pdf::LopdfEngine;
use crate::pipeline::{ImportRequest, ImportWorker};
use anyhow::{Context, Result, bail};
use colored::*;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Run the import command
pub async fn run_import(global: &GlobalArgs, args: ImportArgs) -> Result<()> {
    args.validate()?;

    let mut config = load_configuration(global)?;
    if let Some(workers) = args.workers {
        config = config.with_workers(workers);
    }
    if let Some(period) = &args.default_period {
        config = config.with_default_period(period);
    }
    config.validate()?;

    let mut request = ImportRequest::new(&args.archive, &config);
    if let Some(password) = &args.password {
        request = request.with_password(password);
    }
    debug!("Import request: {:?}", request.archive_path);

    let worker = if args.no_merge {
        ImportWorker::new()
    } else {
        ImportWorker::new().with_engine(Arc::new(LopdfEngine::new()))
    };

    if global.show_progress() {
        println!("{}", "Importing EAIP archive".bright_green().bold());
        println!("  {} {}", "Archive:".bright_cyan(), args.archive.display());
        println!("  {} {}", "Data root:".bright_cyan(), config.data_path.display());
        println!(
            "  {} {}",
            "Workers:".bright_cyan(),
            config.import_workers()
        );
        println!();
    }

    let start_time = Instant::now();
    let mut handle = worker
        .start(request)
        .context("Another import is already running")?;
    let progress_bar = create_progress_bar(global.show_progress());

    let mut outcome: Option<ImportOutcome> = None;
    while let Some(event) = handle.recv().await {
        match event {
            ImportEvent::Progress(progress) => {
                if let Some(pb) = &progress_bar {
                    pb.set_position(progress.overall_percent() as u64);
                    pb.set_message(format!(
                        "[{}/{}] {}: {}",
                        progress.step, progress.total_steps, progress.step_name, progress.detail
                    ));
                }
            }
            ImportEvent::Finished(finished) => outcome = Some(finished),
        }
    }

    if let Some(pb) = &progress_bar {
        pb.finish_and_clear();
    }

    let outcome = outcome.context("Import ended without reporting a result")?;
    if !outcome.success {
        bail!("{}", outcome.message);
    }

    info!("Import finished in {:?}", start_time.elapsed());
    if global.show_progress() {
        print_summary(&outcome, start_time, global.verbose > 0);
    }
    Ok(())
}

fn print_summary(outcome: &ImportOutcome, start_time: Instant, detailed: bool) {
    let airport_charts: usize = outcome.airports.iter().map(|a| a.charts).sum();

    println!("{}", "Import Summary".bright_green().bold());
    println!("  {} {}", "Result:".bright_cyan(), outcome.message);
    println!(
        "  {} {}",
        "Airports:".bright_cyan(),
        outcome.airports.len().to_string().bright_white().bold()
    );
    println!(
        "  {} {}",
        "Airport charts:".bright_cyan(),
        airport_charts.to_string().bright_white()
    );
    println!(
        "  {} {}",
        "En-route charts:".bright_cyan(),
        outcome.enroute_count.to_string().bright_white()
    );
    println!(
        "  {} {}",
        "Time elapsed:".bright_cyan(),
        super::shared::format_elapsed(start_time.elapsed())
    );

    let empty: Vec<_> = outcome.airports.iter().filter(|a| a.charts == 0).collect();
    if !empty.is_empty() {
        println!(
            "  {} {}",
            "Airports without charts:".bright_red(),
            empty.len().to_string().bright_red().bold()
        );
    }

    if detailed {
        println!();
        for airport in &outcome.airports {
            println!("    {:<6} {:>4}", airport.icao, airport.charts);
        }
    }
}
