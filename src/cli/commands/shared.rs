//! Shared components for CLI commands
//!
//! Logging setup, configuration loading and output helpers used across
//! command implementations.

use crate::cli::args::GlobalArgs;
use crate::config::{ImporterConfig, default_config_path};
use crate::models::IndexEntry;
use crate::query::ChartLibrary;
use anyhow::{Context, Result};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tracing::{debug, info};

/// Set up structured logging based on CLI arguments
pub fn setup_logging(args: &GlobalArgs) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.get_log_level();

    // Create filter
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("eaip_importer={}", log_level)));

    if args.quiet {
        // Minimal logging for quiet mode
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init();
    } else {
        // Standard logging with timestamps
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .try_init();
    }

    debug!("Logging initialized at level: {}", log_level);
}

/// Load the settings file (explicit, or the platform default) and apply
/// global overrides
pub fn load_configuration(args: &GlobalArgs) -> Result<ImporterConfig> {
    let mut config = match &args.config_file {
        Some(path) => {
            info!("Using config file: {}", path.display());
            ImporterConfig::load(path)
                .with_context(|| format!("Failed to load config file {}", path.display()))?
        }
        None => match default_config_path() {
            Some(path) => ImporterConfig::load_or_create(&path)
                .with_context(|| format!("Failed to load config file {}", path.display()))?,
            None => {
                info!("No config directory available, using defaults");
                ImporterConfig::default()
            }
        },
    };

    if let Some(data_dir) = &args.data_dir {
        config = config.with_data_path(data_dir);
    }
    config.validate()?;

    debug!("Loaded configuration: {:?}", config);
    Ok(config)
}

/// Open the chart library, optionally pinned to one period
pub fn open_library(config: &ImporterConfig, period: Option<&str>) -> Result<ChartLibrary> {
    let library = ChartLibrary::new(&config.data_path);
    match period {
        Some(period) => Ok(library.with_period(period)?),
        None => Ok(library),
    }
}

/// Resolve the period a command works on, failing when nothing is imported
pub fn require_period(library: &ChartLibrary) -> Result<String> {
    library.active_period()?.with_context(|| {
        format!(
            "No AIRAC cycle imported under {}. Run `eaip-importer import <ZIP>` first.",
            library.data_root().display()
        )
    })
}

/// Percentage bar used by the long-running commands
pub fn create_progress_bar(show: bool) -> Option<ProgressBar> {
    if !show {
        return None;
    }

    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>3}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb.enable_steady_tick(Duration::from_millis(120));
    Some(pb)
}

/// Print chart entries as an aligned table
pub fn print_chart_table(entries: &[IndexEntry]) {
    if entries.is_empty() {
        println!("{}", "No charts found".bright_yellow());
        return;
    }

    let sort_width = entries.iter().map(|e| e.sort.len()).max().unwrap_or(4).max(4);
    let code_width = entries.iter().map(|e| e.code.len()).max().unwrap_or(4).max(4);

    println!(
        "{:>4}  {:<sort_width$}  {:<code_width$}  {}",
        "ID".bright_cyan(),
        "SORT".bright_cyan(),
        "CODE".bright_cyan(),
        "NAME".bright_cyan(),
    );
    for entry in entries {
        println!(
            "{:>4}  {:<sort_width$}  {:<code_width$}  {}",
            entry.id, entry.sort, entry.code, entry.name
        );
    }
}

/// Format a duration for summaries
pub fn format_elapsed(elapsed: Duration) -> String {
    indicatif::HumanDuration(elapsed).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_data_dir_override() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("settings.json");
        ImporterConfig::default().save(&config_path).unwrap();

        let args = GlobalArgs {
            data_dir: Some(temp_dir.path().join("charts")),
            config_file: Some(config_path),
            ..Default::default()
        };
        let config = load_configuration(&args).unwrap();
        assert_eq!(config.data_path, temp_dir.path().join("charts"));
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let args = GlobalArgs {
            config_file: Some(temp_dir.path().join("absent.json")),
            ..Default::default()
        };
        assert!(load_configuration(&args).is_err());
    }

    #[test]
    fn test_require_period_without_cycles() {
        let temp_dir = TempDir::new().unwrap();
        let config = ImporterConfig::default().with_data_path(temp_dir.path());
        let library = open_library(&config, None).unwrap();
        assert!(require_period(&library).is_err());
        assert!(open_library(&config, Some("bad")).is_err());
    }
}
