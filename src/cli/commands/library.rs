//! Query commands: periods, airports, charts and export

use super::shared::{load_configuration, open_library, print_chart_table, require_period};
use crate::cli::args::{AirportsArgs, ChartsArgs, ExportArgs, GlobalArgs, OutputFormat};
use crate::query::ChartPayload;
use anyhow::{Context, Result};
use colored::*;
use std::fs;
use std::path::PathBuf;

/// List imported AIRAC periods, marking the latest
pub fn run_periods(global: &GlobalArgs) -> Result<()> {
    let config = load_configuration(global)?;
    let library = open_library(&config, None)?;
    let periods = library.list_airac_periods()?;

    if periods.is_empty() {
        println!(
            "{} {}",
            "No AIRAC cycles imported under".bright_yellow(),
            config.data_path.display()
        );
        return Ok(());
    }

    let latest = periods.last().cloned();
    for period in &periods {
        if Some(period) == latest.as_ref() {
            println!("{} {}", period.bright_white().bold(), "(latest)".bright_green());
        } else {
            println!("{}", period);
        }
    }
    Ok(())
}

/// List the indexed airports of a cycle
pub fn run_airports(global: &GlobalArgs, args: AirportsArgs) -> Result<()> {
    let config = load_configuration(global)?;
    let library = open_library(&config, args.period.as_deref())?;
    let period = require_period(&library)?;
    let airports = library.list_airports()?;

    match args.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&airports)?);
        }
        OutputFormat::Human => {
            println!(
                "{} {} ({} airports)",
                "AIRAC".bright_cyan(),
                period.bright_white().bold(),
                airports.len()
            );
            for airport in &airports {
                println!("  {:<6} {:>4} charts", airport.icao, airport.charts);
            }
        }
    }
    Ok(())
}

/// List the charts of one airport, or the en-route charts
pub fn run_charts(global: &GlobalArgs, args: ChartsArgs) -> Result<()> {
    let config = load_configuration(global)?;
    let library = open_library(&config, args.period.as_deref())?;
    require_period(&library)?;

    let filter = args.filter();
    let charts = if args.is_enroute() {
        library
            .list_enroute_charts()?
            .into_iter()
            .filter(|entry| filter.matches(entry))
            .collect()
    } else {
        library
            .list_charts(&args.icao, &filter)
            .with_context(|| format!("Cannot list charts of {}", args.icao))?
    };

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&charts)?),
        OutputFormat::Human => print_chart_table(&charts),
    }
    Ok(())
}

/// Copy one chart document to a file
pub fn run_export(global: &GlobalArgs, args: ExportArgs) -> Result<()> {
    let config = load_configuration(global)?;
    let library = open_library(&config, args.period.as_deref())?;
    require_period(&library)?;

    let payload = library
        .resolve_chart(&args.icao, &args.chart)
        .with_context(|| format!("Cannot load chart {} of {}", args.chart, args.icao))?;

    let (default_name, bytes) = match payload {
        ChartPayload::Pdf { path, bytes } => (
            path.file_name()
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(format!("{}.pdf", args.chart))),
            bytes,
        ),
        ChartPayload::Image(bytes) => (PathBuf::from(format!("{}.png", args.chart)), bytes),
    };

    let output = args.output.unwrap_or(default_name);
    fs::write(&output, &bytes)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    if global.show_progress() {
        println!(
            "{} {} ({} bytes)",
            "Exported".bright_green(),
            output.display(),
            bytes.len()
        );
    }
    Ok(())
}
