//! Read path over committed AIRAC cycles.
//!
//! Every call re-resolves the cycle directory, so a cycle committed by an
//! import becomes visible without reopening the library.

use crate::constants::{ENROUTE_DIR_NAME, PDF_PASSTHROUGH_MIN_PAGES, TERMINAL_DIR_NAME};
use crate::error::{EaipError, Result};
use crate::models::{AirportSummary, IndexEntry};
use crate::pdf::{LopdfEngine, PageRenderer, PdfEngine};
use crate::period::is_valid_period;
use crate::processor::indexer::read_index;
use crate::processor::{file_name_string, list_subdirs, relative_segments};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};
use tracing::{debug, warn};

/// Runway designator such as `36`, `01L` or `18R`
static RUNWAY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{2}[LRC]?$").expect("valid runway regex"));

/// Chart list filter
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ChartFilter {
    #[default]
    All,
    /// Exact `sort` tag
    Category(String),
    /// Runway designator contained in the file name
    Runway(String),
    /// Chart code, case-insensitive
    Code(String),
    /// File name keyword, case-insensitive
    Keyword(String),
}

impl ChartFilter {
    /// Interpret a free search term: runway designators filter by name,
    /// anything else by category
    pub fn search(term: &str) -> Self {
        if RUNWAY.is_match(term) {
            ChartFilter::Runway(term.to_string())
        } else {
            ChartFilter::Category(term.to_string())
        }
    }

    pub fn matches(&self, entry: &IndexEntry) -> bool {
        match self {
            ChartFilter::All => true,
            ChartFilter::Category(sort) => entry.sort == *sort,
            ChartFilter::Runway(runway) => entry.name.contains(runway.as_str()),
            ChartFilter::Code(code) => entry.code.eq_ignore_ascii_case(code),
            ChartFilter::Keyword(keyword) => entry
                .name
                .to_lowercase()
                .contains(&keyword.to_lowercase()),
        }
    }
}

/// A chart ready for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChartPayload {
    /// The document itself
    Pdf { path: PathBuf, bytes: Vec<u8> },
    /// Rendered image of a short document
    Image(Vec<u8>),
}

/// Query access to the charts under a data root
#[derive(Clone)]
pub struct ChartLibrary {
    data_root: PathBuf,
    period: Option<String>,
    engine: Arc<dyn PdfEngine>,
    renderer: Option<Arc<dyn PageRenderer>>,
}

impl std::fmt::Debug for ChartLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChartLibrary")
            .field("data_root", &self.data_root)
            .field("period", &self.period)
            .field("renderer", &self.renderer.is_some())
            .finish()
    }
}

impl ChartLibrary {
    pub fn new(data_root: impl Into<PathBuf>) -> Self {
        Self {
            data_root: data_root.into(),
            period: None,
            engine: Arc::new(LopdfEngine::new()),
            renderer: None,
        }
    }

    /// Pin queries to one period instead of the latest
    pub fn with_period(mut self, period: impl Into<String>) -> Result<Self> {
        let period = period.into();
        if !is_valid_period(&period) {
            return Err(EaipError::configuration(format!(
                "AIRAC period must be 4 digits (YYMM), got '{}'",
                period
            )));
        }
        self.period = Some(period);
        Ok(self)
    }

    pub fn with_engine(mut self, engine: Arc<dyn PdfEngine>) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn PageRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn data_root(&self) -> &Path {
        &self.data_root
    }

    /// Committed periods, ascending
    pub fn list_airac_periods(&self) -> Result<Vec<String>> {
        if !self.data_root.is_dir() {
            debug!("Data root not found: {}", self.data_root.display());
            return Ok(Vec::new());
        }

        let mut periods: Vec<String> = list_subdirs(&self.data_root)?
            .iter()
            .map(|p| file_name_string(p))
            .filter(|name| is_valid_period(name))
            .collect();
        periods.sort();
        Ok(periods)
    }

    /// Greatest committed period
    pub fn latest_period(&self) -> Result<Option<String>> {
        Ok(self.list_airac_periods()?.pop())
    }

    /// Period queries run against: the pinned one, else the latest
    pub fn active_period(&self) -> Result<Option<String>> {
        match &self.period {
            Some(period) => Ok(Some(period.clone())),
            None => self.latest_period(),
        }
    }

    /// Directory of the active cycle, if it exists
    pub fn cycle_dir(&self) -> Result<Option<PathBuf>> {
        Ok(self
            .active_period()?
            .map(|period| self.data_root.join(period))
            .filter(|dir| dir.is_dir()))
    }

    /// Indexed airports of the active cycle with their chart counts
    pub fn list_airports(&self) -> Result<Vec<AirportSummary>> {
        let Some(cycle_dir) = self.cycle_dir()? else {
            return Ok(Vec::new());
        };
        let terminal = cycle_dir.join(TERMINAL_DIR_NAME);
        if !terminal.is_dir() {
            return Ok(Vec::new());
        }

        let mut airports = Vec::new();
        for airport_dir in list_subdirs(&terminal)? {
            let icao = file_name_string(&airport_dir);
            match read_index(&airport_dir) {
                Ok(entries) => airports.push(AirportSummary {
                    icao,
                    charts: entries.len(),
                }),
                Err(e) => warn!("Skipping airport {} without readable index: {}", icao, e),
            }
        }
        Ok(airports)
    }

    /// Charts of one airport matching `filter`
    pub fn list_charts(&self, icao: &str, filter: &ChartFilter) -> Result<Vec<IndexEntry>> {
        let (_, entries) = self.airport_index(icao)?;
        Ok(entries.into_iter().filter(|e| filter.matches(e)).collect())
    }

    /// En-route charts of the active cycle
    pub fn list_enroute_charts(&self) -> Result<Vec<IndexEntry>> {
        let Some(cycle_dir) = self.cycle_dir()? else {
            return Ok(Vec::new());
        };
        let enroute = cycle_dir.join(ENROUTE_DIR_NAME);
        if !enroute.is_dir() {
            return Ok(Vec::new());
        }
        read_index(&enroute)
    }

    /// Absolute path of a chart, looked up by id first, then by code
    pub fn chart_path(&self, icao: &str, code_or_id: &str) -> Result<PathBuf> {
        let (airport_dir, entries) = self.airport_index(icao)?;

        let entry = entries
            .iter()
            .find(|e| e.id == code_or_id)
            .or_else(|| entries.iter().find(|e| e.code.eq_ignore_ascii_case(code_or_id)))
            .ok_or_else(|| {
                EaipError::chart_not_found(format!("{} chart '{}'", icao, code_or_id))
            })?;

        let segments = relative_segments(&entry.path).ok_or_else(|| {
            EaipError::chart_not_found(format!(
                "{} chart '{}' with path outside the airport: {}",
                icao, code_or_id, entry.path
            ))
        })?;
        let path = segments
            .iter()
            .fold(airport_dir, |path, segment| path.join(segment));
        if !path.is_file() {
            return Err(EaipError::chart_not_found(format!(
                "file {} of {} chart '{}'",
                path.display(),
                icao,
                code_or_id
            )));
        }
        Ok(path)
    }

    /// Load a chart for display.
    ///
    /// Documents with at least three pages, or any document when no renderer
    /// is configured, are returned as PDF bytes; shorter ones are rendered.
    pub fn resolve_chart(&self, icao: &str, code_or_id: &str) -> Result<ChartPayload> {
        let path = self.chart_path(icao, code_or_id)?;

        if let Some(renderer) = &self.renderer {
            let handle = self.engine.open_document(&path)?;
            let pages = self.engine.page_count(&handle);
            if pages < PDF_PASSTHROUGH_MIN_PAGES {
                debug!("Rendering {} ({} pages)", path.display(), pages);
                return Ok(ChartPayload::Image(renderer.render(&path)?));
            }
        }

        let bytes = fs::read(&path)?;
        Ok(ChartPayload::Pdf { path, bytes })
    }

    fn airport_index(&self, icao: &str) -> Result<(PathBuf, Vec<IndexEntry>)> {
        let cycle_dir = self
            .cycle_dir()?
            .ok_or_else(|| EaipError::chart_not_found("no imported AIRAC cycle"))?;

        // a single plain name, never a nested or parent path
        if !relative_segments(icao).is_some_and(|segments| segments.len() == 1) {
            return Err(EaipError::chart_not_found(format!("airport {}", icao)));
        }
        let airport_dir = cycle_dir.join(TERMINAL_DIR_NAME).join(icao);
        if !airport_dir.is_dir() {
            return Err(EaipError::chart_not_found(format!("airport {}", icao)));
        }
        let entries = read_index(&airport_dir).map_err(|e| match e {
            EaipError::Io(_) => EaipError::chart_not_found(format!("index of airport {}", icao)),
            other => other,
        })?;
        Ok((airport_dir, entries))
    }
}
