//! Command-line argument definitions for the EAIP importer
//!
//! This module defines the complete CLI interface using the clap derive API.

use crate::error::{EaipError, Result};
use crate::period::is_valid_period;
use crate::query::ChartFilter;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// CLI arguments for the EAIP chart importer
///
/// Imports vendor EAIP chart archives into an indexed per-cycle layout and
/// queries the imported charts.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "eaip-importer",
    version,
    about = "Import EAIP chart archives into an indexed AIRAC cycle layout",
    long_about = "Extracts a vendor EAIP ZIP archive, detects its AIRAC period, renames and \
                  categorizes every chart from the vendor manifests and writes one index.json \
                  per airport. Imported cycles can then be listed and queried by airport, \
                  category, runway or chart code."
)]
pub struct Args {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Options shared by every subcommand
#[derive(Debug, Clone, Default, clap::Args)]
pub struct GlobalArgs {
    /// Root directory holding one folder per AIRAC period
    ///
    /// Overrides `data_path` from the settings file.
    #[arg(long = "data-dir", value_name = "PATH", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Settings file to use instead of the platform default
    #[arg(long = "config", value_name = "FILE", global = true)]
    pub config_file: Option<PathBuf>,

    /// Logging verbosity level
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        global = true,
        help = "Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)"
    )]
    pub verbose: u8,

    /// Only show errors. Overrides verbose settings.
    #[arg(
        short = 'q',
        long = "quiet",
        global = true,
        conflicts_with = "verbose",
        help = "Suppress output except errors"
    )]
    pub quiet: bool,
}

/// Available subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Import a vendor EAIP ZIP archive
    Import(ImportArgs),
    /// List imported AIRAC periods
    Periods,
    /// List indexed airports of a cycle
    Airports(AirportsArgs),
    /// List the charts of an airport
    Charts(ChartsArgs),
    /// Copy one chart document out of the library
    Export(ExportArgs),
    /// Re-run categorization and indexing on an imported cycle
    Reindex(ReindexArgs),
    /// List the contents of an archive without importing it
    Inspect(InspectArgs),
}

/// Arguments for the import command
#[derive(Debug, Clone, Parser)]
pub struct ImportArgs {
    /// Vendor EAIP ZIP archive
    #[arg(value_name = "ZIP")]
    pub archive: PathBuf,

    /// Password of an encrypted archive
    #[arg(long = "password", value_name = "PASSWORD")]
    pub password: Option<String>,

    /// Indexing worker threads (0 = auto)
    #[arg(short = 'w', long = "workers", value_name = "N")]
    pub workers: Option<usize>,

    /// Period to use when the archive folder name carries none
    #[arg(long = "default-period", value_name = "YYMM")]
    pub default_period: Option<String>,

    /// Do not merge multi-document categories
    #[arg(long = "no-merge")]
    pub no_merge: bool,
}

/// Arguments for the airports command
#[derive(Debug, Clone, Parser)]
pub struct AirportsArgs {
    /// AIRAC period to query (default: latest)
    #[arg(long = "period", value_name = "YYMM")]
    pub period: Option<String>,

    /// Output format
    #[arg(long = "format", value_enum, default_value = "human")]
    pub format: OutputFormat,
}

/// Arguments for the charts command
#[derive(Debug, Clone, Parser)]
pub struct ChartsArgs {
    /// Airport ICAO code, or ENROUTE for en-route charts
    #[arg(value_name = "ICAO")]
    pub icao: String,

    /// Only charts of this category, e.g. SID
    #[arg(long = "category", conflicts_with_all = ["code", "search", "keyword"])]
    pub category: Option<String>,

    /// Only charts with this code (case-insensitive)
    #[arg(long = "code", conflicts_with_all = ["search", "keyword"])]
    pub code: Option<String>,

    /// Runway designator (e.g. 36L) or category
    #[arg(long = "search", conflicts_with = "keyword")]
    pub search: Option<String>,

    /// File name keyword (case-insensitive)
    #[arg(long = "keyword")]
    pub keyword: Option<String>,

    /// AIRAC period to query (default: latest)
    #[arg(long = "period", value_name = "YYMM")]
    pub period: Option<String>,

    /// Output format
    #[arg(long = "format", value_enum, default_value = "human")]
    pub format: OutputFormat,
}

/// Arguments for the export command
#[derive(Debug, Clone, Parser)]
pub struct ExportArgs {
    /// Airport ICAO code
    #[arg(value_name = "ICAO")]
    pub icao: String,

    /// Chart id or chart code
    #[arg(value_name = "CHART")]
    pub chart: String,

    /// Destination file (default: chart file name in the current directory)
    #[arg(short = 'o', long = "output", value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// AIRAC period to query (default: latest)
    #[arg(long = "period", value_name = "YYMM")]
    pub period: Option<String>,
}

/// Arguments for the reindex command
#[derive(Debug, Clone, Parser)]
pub struct ReindexArgs {
    /// AIRAC period to reindex (default: latest)
    #[arg(long = "period", value_name = "YYMM")]
    pub period: Option<String>,

    /// Indexing worker threads (0 = auto)
    #[arg(short = 'w', long = "workers", value_name = "N")]
    pub workers: Option<usize>,

    /// Do not merge multi-document categories
    #[arg(long = "no-merge")]
    pub no_merge: bool,
}

/// Arguments for the inspect command
#[derive(Debug, Clone, Parser)]
pub struct InspectArgs {
    /// ZIP archive to list
    #[arg(value_name = "ZIP")]
    pub archive: PathBuf,

    /// Print at most this many entries
    #[arg(long = "limit", value_name = "N", default_value_t = 50)]
    pub limit: usize,
}

/// Output format options for machine-readable results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON format for scripting
    Json,
}

impl GlobalArgs {
    /// Determine the appropriate log level based on verbosity flags
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        }
    }

    /// Check if we should show progress bars (not in quiet mode)
    pub fn show_progress(&self) -> bool {
        !self.quiet
    }
}

impl ImportArgs {
    /// Validate the import command arguments for consistency
    pub fn validate(&self) -> Result<()> {
        if !self.archive.exists() {
            return Err(EaipError::NotFound {
                path: self.archive.clone(),
            });
        }

        if let Some(period) = &self.default_period {
            validate_period(period)?;
        }

        Ok(())
    }
}

impl ChartsArgs {
    /// Build the chart filter from the mutually exclusive filter options
    pub fn filter(&self) -> ChartFilter {
        if let Some(code) = &self.code {
            ChartFilter::Code(code.clone())
        } else if let Some(keyword) = &self.keyword {
            ChartFilter::Keyword(keyword.clone())
        } else if let Some(search) = &self.search {
            ChartFilter::search(search)
        } else if let Some(category) = &self.category {
            ChartFilter::Category(category.clone())
        } else {
            ChartFilter::All
        }
    }

    /// Whether the en-route charts were requested
    pub fn is_enroute(&self) -> bool {
        self.icao.eq_ignore_ascii_case(crate::constants::ENROUTE_DIR_NAME)
    }
}

/// Validate a `--period` value
pub fn validate_period(period: &str) -> Result<()> {
    if is_valid_period(period) {
        Ok(())
    } else {
        Err(EaipError::configuration(format!(
            "AIRAC period must be 4 digits (YYMM), got '{}'",
            period
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_log_level() {
        let mut args = GlobalArgs::default();

        // Default level
        assert_eq!(args.get_log_level(), "warn");

        // Verbose levels
        args.verbose = 1;
        assert_eq!(args.get_log_level(), "info");

        args.verbose = 2;
        assert_eq!(args.get_log_level(), "debug");

        args.verbose = 3;
        assert_eq!(args.get_log_level(), "trace");

        // Quiet mode
        args.quiet = true;
        assert_eq!(args.get_log_level(), "error");
        assert!(!args.show_progress());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = Args::parse_from([
            "eaip-importer",
            "airports",
            "--data-dir",
            "/tmp/charts",
            "-vv",
        ]);
        assert_eq!(args.global.data_dir, Some(PathBuf::from("/tmp/charts")));
        assert_eq!(args.global.verbose, 2);
        assert!(matches!(args.command, Some(Commands::Airports(_))));
    }

    #[test]
    fn test_chart_filter_selection() {
        let args = Args::parse_from(["eaip-importer", "charts", "ZBAA", "--search", "36L"]);
        let Some(Commands::Charts(charts)) = args.command else {
            panic!("expected charts command");
        };
        assert_eq!(charts.filter(), ChartFilter::Runway("36L".to_string()));

        let args = Args::parse_from(["eaip-importer", "charts", "enroute"]);
        let Some(Commands::Charts(charts)) = args.command else {
            panic!("expected charts command");
        };
        assert!(charts.is_enroute());
        assert_eq!(charts.filter(), ChartFilter::All);
    }

    #[test]
    fn test_conflicting_filters_rejected() {
        let result = Args::try_parse_from([
            "eaip-importer",
            "charts",
            "ZBAA",
            "--code",
            "7A",
            "--keyword",
            "rnav",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_period() {
        assert!(validate_period("2511").is_ok());
        assert!(validate_period("25-11").is_err());
    }
}
