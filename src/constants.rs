//! Application constants for the EAIP importer
//!
//! Directory names of the vendor archive layout, the committed on-disk
//! layout, chart category vocabulary and default configuration values.

// =============================================================================
// Vendor Archive Layout
// =============================================================================

/// Directory holding the vendor data inside the extracted root folder
pub const DATA_DIR_NAME: &str = "Data";

/// Directory holding the chart manifests inside `Data/`
pub const MANIFEST_DIR_NAME: &str = "JsonPath";

/// Airport chart manifest file name
pub const AIRPORT_MANIFEST_NAME: &str = "AD.JSON";

/// En-route chart manifest file name
pub const ENROUTE_MANIFEST_NAME: &str = "ENR.JSON";

/// Path segment marker for general documents
pub const GENERAL_DOC_MARKER: &str = "GeneralDoc";

/// Prefix of the vendor directory under `Data/`
pub const DEFAULT_VENDOR_PREFIX: &str = "EAIP";

/// Vendor directory name used when detection fails
pub const DEFAULT_VENDOR_DIR: &str = "EAIP";

/// macOS resource fork folder found in archives zipped on a Mac
pub const MACOS_METADATA_DIR: &str = "__MACOSX";

// =============================================================================
// Committed Layout
// =============================================================================

/// Per-airport chart tree
pub const TERMINAL_DIR_NAME: &str = "Terminal";

/// En-route chart tree
pub const ENROUTE_DIR_NAME: &str = "ENROUTE";

/// Manifest written into every airport and en-route directory
pub const INDEX_FILE_NAME: &str = "index.json";

/// Sort/code tag of uncategorized charts at the airport root
pub const GENERAL_SORT: &str = "general";

/// Sort/code tag of en-route charts
pub const ENROUTE_SORT: &str = "enroute";

/// Extension of chart documents
pub const PDF_EXTENSION: &str = "pdf";

/// Suffix of the combined document produced by the merge step
pub const MERGED_SUFFIX: &str = "-MERGED.pdf";

// =============================================================================
// Chart Categories
// =============================================================================

/// Ordered category vocabulary. The first tag found in a file name wins,
/// so order matters.
pub const CHART_CATEGORIES: &[&str] = &[
    "ADC",
    "APDC",
    "GMC",
    "DGS",
    "AOC",
    "PATC",
    "FDA",
    "ATCMAS",
    "SID",
    "STAR",
    "WAYPOINT LIST",
    "DATABASE CODING TABLE",
    "IAC",
    "ATCSMAC",
];

/// Categories whose documents are merged into one `<TAG>-MERGED.pdf`
pub const MERGED_CATEGORIES: &[&str] = &["WAYPOINT LIST", "GMC", "APDC", "DATABASE CODING TABLE"];

// =============================================================================
// Import Pipeline
// =============================================================================

/// Number of reported pipeline stages
pub const TOTAL_STEPS: u8 = 6;

/// Prefix of the scratch directory created under the data root
pub const SCRATCH_PREFIX: &str = ".import-";

/// Name of the extraction target inside the scratch directory
pub const SCRATCH_EXTRACT_DIR: &str = "extracted";

/// Copy buffer used while streaming archive entries to disk
pub const EXTRACT_BUFFER_SIZE: usize = 64 * 1024;

/// AIRAC period used when the archive folder name carries none
pub const DEFAULT_AIRAC_PERIOD: &str = "2505";

// =============================================================================
// Worker Pool
// =============================================================================

/// Share of CPU threads used when workers are set to "auto"
pub const DEFAULT_AUTO_WORKERS_RATIO: f64 = 0.5;

/// Upper bound on the share of CPU threads the indexing pool may use
pub const MAX_WORKERS_RATIO: f64 = 0.7;

// =============================================================================
// Query Layer
// =============================================================================

/// Documents with at least this many pages are returned as PDF instead of
/// being rendered to an image
pub const PDF_PASSTHROUGH_MIN_PAGES: usize = 3;

// =============================================================================
// Application Paths
// =============================================================================

/// Directory name used under the platform config/data directories
pub const APP_DIR_NAME: &str = "eaip-importer";

/// Configuration file name
pub const CONFIG_FILE_NAME: &str = "settings.json";
