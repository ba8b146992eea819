//! Core data structures and types for EAIP importing.
//!
//! Defines the manifest and index record shapes, the per-import context,
//! progress/terminal events and the statistics returned by each stage.

use crate::constants::{
    AIRPORT_MANIFEST_NAME, DATA_DIR_NAME, ENROUTE_DIR_NAME, ENROUTE_MANIFEST_NAME,
    GENERAL_DOC_MARKER, MANIFEST_DIR_NAME, TERMINAL_DIR_NAME, TOTAL_STEPS,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// One chart record of a vendor manifest (`AD.JSON` / `ENR.JSON`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartRecord {
    /// Display name, used to build the normalized file name
    pub name: String,
    /// Archive-relative source path, may start with `/`
    #[serde(rename = "pdfPath", default)]
    pub pdf_path: Option<String>,
}

impl ChartRecord {
    /// Source path with the leading slash removed, `None` when empty
    pub fn source_path(&self) -> Option<&str> {
        self.pdf_path
            .as_deref()
            .map(|p| p.trim_start_matches(['/', '\\']))
            .filter(|p| !p.is_empty())
    }
}

/// One element of an `index.json` file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub id: String,
    pub code: String,
    pub name: String,
    pub path: String,
    pub sort: String,
}

/// Chart count of a single airport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AirportSummary {
    pub icao: String,
    pub charts: usize,
}

/// Stages of one import, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ImportStage {
    Extracting,
    DetectingStructure,
    ProcessingCharts,
    Renaming,
    Indexing,
    Finalizing,
}

impl ImportStage {
    /// All stages in order
    pub const ALL: [ImportStage; TOTAL_STEPS as usize] = [
        ImportStage::Extracting,
        ImportStage::DetectingStructure,
        ImportStage::ProcessingCharts,
        ImportStage::Renaming,
        ImportStage::Indexing,
        ImportStage::Finalizing,
    ];

    /// 1-based step number
    pub fn step(&self) -> u8 {
        match self {
            ImportStage::Extracting => 1,
            ImportStage::DetectingStructure => 2,
            ImportStage::ProcessingCharts => 3,
            ImportStage::Renaming => 4,
            ImportStage::Indexing => 5,
            ImportStage::Finalizing => 6,
        }
    }

    /// Human-readable stage name
    pub fn name(&self) -> &'static str {
        match self {
            ImportStage::Extracting => "Extracting archive",
            ImportStage::DetectingStructure => "Detecting structure",
            ImportStage::ProcessingCharts => "Processing charts",
            ImportStage::Renaming => "Renaming charts",
            ImportStage::Indexing => "Generating indexes",
            ImportStage::Finalizing => "Finalizing",
        }
    }
}

/// Progress of a running import
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportProgress {
    pub step: u8,
    pub total_steps: u8,
    pub percent: u8,
    pub step_name: String,
    pub detail: String,
}

impl ImportProgress {
    pub fn new(stage: ImportStage, percent: u8, detail: impl Into<String>) -> Self {
        Self {
            step: stage.step(),
            total_steps: TOTAL_STEPS,
            percent: percent.min(100),
            step_name: stage.name().to_string(),
            detail: detail.into(),
        }
    }

    /// Overall completion across all stages, each stage weighted equally
    pub fn overall_percent(&self) -> u8 {
        let done = (self.step.saturating_sub(1)) as u32 * 100 + self.percent as u32;
        (done / self.total_steps.max(1) as u32) as u8
    }
}

/// Terminal result of an import, delivered exactly once
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportOutcome {
    pub success: bool,
    pub message: String,
    pub airports: Vec<AirportSummary>,
    pub enroute_count: usize,
}

impl ImportOutcome {
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            airports: Vec::new(),
            enroute_count: 0,
        }
    }
}

/// Item of the import event channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportEvent {
    Progress(ImportProgress),
    Finished(ImportOutcome),
}

/// Immutable description of one import, built once the cycle directory is
/// in place and shared by every later stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportContext {
    pub period: String,
    pub cycle_dir: PathBuf,
    pub vendor_dir_name: String,
}

impl ImportContext {
    pub fn new(
        period: impl Into<String>,
        cycle_dir: impl Into<PathBuf>,
        vendor_dir_name: impl Into<String>,
    ) -> Self {
        Self {
            period: period.into(),
            cycle_dir: cycle_dir.into(),
            vendor_dir_name: vendor_dir_name.into(),
        }
    }

    /// Root that manifest paths are relative to
    pub fn base_dir(&self) -> &Path {
        &self.cycle_dir
    }

    /// `Data/<Vendor>`
    pub fn vendor_dir(&self) -> PathBuf {
        self.cycle_dir
            .join(DATA_DIR_NAME)
            .join(&self.vendor_dir_name)
    }

    pub fn terminal_dir(&self) -> PathBuf {
        self.vendor_dir().join(TERMINAL_DIR_NAME)
    }

    pub fn enroute_dir(&self) -> PathBuf {
        self.vendor_dir().join(ENROUTE_DIR_NAME)
    }

    /// General documents are committed next to the airports, under
    /// `Terminal/GeneralDoc`
    pub fn general_doc_dir(&self) -> PathBuf {
        self.terminal_dir().join(GENERAL_DOC_MARKER)
    }

    pub fn airport_manifest(&self) -> PathBuf {
        self.cycle_dir
            .join(DATA_DIR_NAME)
            .join(MANIFEST_DIR_NAME)
            .join(AIRPORT_MANIFEST_NAME)
    }

    pub fn enroute_manifest(&self) -> PathBuf {
        self.cycle_dir
            .join(DATA_DIR_NAME)
            .join(MANIFEST_DIR_NAME)
            .join(ENROUTE_MANIFEST_NAME)
    }
}

/// Archive extraction statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractStats {
    pub entries: usize,
    pub files_written: usize,
    pub entries_skipped: usize,
    pub bytes_written: u64,
}

/// Classifier/renamer statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenameStats {
    pub renamed: usize,
    pub missing: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl RenameStats {
    pub fn merge(&mut self, other: &RenameStats) {
        self.renamed += other.renamed;
        self.missing += other.missing;
        self.failed += other.failed;
        self.skipped += other.skipped;
    }
}

/// Organizer statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrganizeStats {
    pub airports: usize,
    pub moved: usize,
    pub uncategorized: usize,
    pub failed: usize,
}

/// Index generation statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexStats {
    /// Per-airport chart counts, sorted by ICAO code
    pub airports: Vec<AirportSummary>,
    pub airports_failed: usize,
    pub enroute_charts: usize,
    pub merged_documents: usize,
}

impl IndexStats {
    /// Charts indexed across all airport directories
    pub fn airport_charts(&self) -> usize {
        self.airports.iter().map(|a| a.charts).sum()
    }

    /// Charts indexed across every directory, airports and en-route
    pub fn total_charts(&self) -> usize {
        self.airport_charts() + self.enroute_charts
    }
}

/// Summary of a completed import
#[derive(Debug, Clone, Default)]
pub struct ImportSummary {
    pub period: String,
    pub cycle_dir: PathBuf,
    pub extract: ExtractStats,
    pub rename: RenameStats,
    pub organize: OrganizeStats,
    pub index: IndexStats,
    pub elapsed: Duration,
}

impl ImportSummary {
    pub fn airport_count(&self) -> usize {
        self.index.airports.len()
    }

    pub fn total_charts(&self) -> usize {
        self.index.total_charts()
    }

    /// Success outcome for the terminal event
    pub fn to_outcome(&self) -> ImportOutcome {
        ImportOutcome {
            success: true,
            message: format!(
                "Imported {} airports ({} charts, {} en-route) for AIRAC {}",
                self.airport_count(),
                self.total_charts(),
                self.index.enroute_charts,
                self.period
            ),
            airports: self.index.airports.clone(),
            enroute_count: self.index.enroute_charts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chart_record_source_path() {
        let record: ChartRecord =
            serde_json::from_str(r#"{"name": "ZBAA SID 05", "pdfPath": "/Data/EAIP/a.pdf"}"#)
                .unwrap();
        assert_eq!(record.source_path(), Some("Data/EAIP/a.pdf"));

        let record: ChartRecord = serde_json::from_str(r#"{"name": "x", "pdfPath": ""}"#).unwrap();
        assert_eq!(record.source_path(), None);

        let record: ChartRecord = serde_json::from_str(r#"{"name": "x"}"#).unwrap();
        assert_eq!(record.source_path(), None);
    }

    #[test]
    fn test_stage_steps_are_ordered() {
        let steps: Vec<u8> = ImportStage::ALL.iter().map(|s| s.step()).collect();
        assert_eq!(steps, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_overall_percent() {
        let progress = ImportProgress::new(ImportStage::Extracting, 0, "");
        assert_eq!(progress.overall_percent(), 0);

        let progress = ImportProgress::new(ImportStage::Finalizing, 100, "");
        assert_eq!(progress.overall_percent(), 100);

        let progress = ImportProgress::new(ImportStage::DetectingStructure, 100, "");
        assert_eq!(progress.overall_percent(), 33);
    }

    #[test]
    fn test_context_paths() {
        let ctx = ImportContext::new("2511", "/data/2511", "EAIP2025-11");
        assert_eq!(
            ctx.terminal_dir(),
            PathBuf::from("/data/2511/Data/EAIP2025-11/Terminal")
        );
        assert_eq!(
            ctx.airport_manifest(),
            PathBuf::from("/data/2511/Data/JsonPath/AD.JSON")
        );
    }
}
