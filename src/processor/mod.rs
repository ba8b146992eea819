//! Chart processing engine.
//!
//! Turns the extracted vendor tree of one import into the normalized chart
//! layout: manifest-driven renaming ([`renamer`]), category sorting
//! ([`organizer`]) and index generation ([`indexer`]).

pub mod indexer;
pub mod organizer;
pub mod renamer;

#[cfg(test)]
pub mod tests;

pub use self::organizer::CategoryVocabulary;

use crate::constants::PDF_EXTENSION;
use crate::error::{EaipError, Result};
use crate::models::{ImportContext, IndexStats, OrganizeStats, RenameStats};
use crate::pdf::PdfEngine;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Processing steps that can be run on an import
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessAction {
    Rename,
    Organize,
    Index,
}

impl ProcessAction {
    /// All steps in their natural order
    pub const ALL: [ProcessAction; 3] = [
        ProcessAction::Rename,
        ProcessAction::Organize,
        ProcessAction::Index,
    ];
}

/// Aggregated statistics of the steps that ran
#[derive(Debug, Clone, Default)]
pub struct ProcessStats {
    pub rename: RenameStats,
    pub organize: OrganizeStats,
    pub index: IndexStats,
}

/// Runs rename, organize and index steps against one import context
#[derive(Clone)]
pub struct ChartProcessor {
    context: ImportContext,
    vocabulary: Arc<CategoryVocabulary>,
    parallelism: usize,
    engine: Option<Arc<dyn PdfEngine>>,
}

impl std::fmt::Debug for ChartProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChartProcessor")
            .field("context", &self.context)
            .field("vocabulary", &self.vocabulary)
            .field("parallelism", &self.parallelism)
            .field("engine", &self.engine.is_some())
            .finish()
    }
}

impl ChartProcessor {
    /// Create a processor with the default vocabulary, one worker and no PDF engine
    pub fn new(context: ImportContext) -> Self {
        Self {
            context,
            vocabulary: Arc::new(CategoryVocabulary::default()),
            parallelism: 1,
            engine: None,
        }
    }

    /// Use a custom category vocabulary
    pub fn with_vocabulary(mut self, vocabulary: CategoryVocabulary) -> Self {
        self.vocabulary = Arc::new(vocabulary);
        self
    }

    /// Set the indexing pool size (at least 1)
    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism.max(1);
        self
    }

    /// Set the PDF engine used for merging; `None` disables merging
    pub fn with_engine(mut self, engine: Option<Arc<dyn PdfEngine>>) -> Self {
        self.engine = engine;
        self
    }

    pub fn context(&self) -> &ImportContext {
        &self.context
    }

    pub fn vocabulary(&self) -> &CategoryVocabulary {
        &self.vocabulary
    }

    /// Check the cycle directory exists and create missing chart roots
    pub fn validate_paths(&self) -> Result<()> {
        if !self.context.cycle_dir.is_dir() {
            return Err(EaipError::NotFound {
                path: self.context.cycle_dir.clone(),
            });
        }

        for dir in [self.context.terminal_dir(), self.context.enroute_dir()] {
            if !dir.exists() {
                warn!("Chart directory missing, creating {}", dir.display());
                fs::create_dir_all(&dir)?;
            }
        }

        debug!(
            "Validated chart directories under {}",
            self.context.vendor_dir().display()
        );
        Ok(())
    }

    /// Rename and relocate charts listed in the manifests
    pub fn rename(&self) -> Result<RenameStats> {
        renamer::rename_charts(&self.context)
    }

    /// Sort airport charts into category folders
    pub fn organize(&self) -> Result<OrganizeStats> {
        organizer::organize(&self.context.terminal_dir(), &self.vocabulary)
    }

    /// Generate airport and en-route indexes, reporting `(airports_done, airports_total)`
    pub async fn generate_index<F>(&self, on_progress: F) -> Result<IndexStats>
    where
        F: FnMut(usize, usize) + Send,
    {
        indexer::generate_index(
            &self.context.terminal_dir(),
            &self.context.enroute_dir(),
            self.parallelism,
            self.vocabulary.clone(),
            self.engine.clone(),
            on_progress,
        )
        .await
    }

    /// Run the given steps in order; an empty list runs all of them
    pub async fn process(&self, actions: &[ProcessAction]) -> Result<ProcessStats> {
        let actions: &[ProcessAction] = if actions.is_empty() {
            &ProcessAction::ALL
        } else {
            actions
        };
        info!("Processing charts: {:?}", actions);

        self.validate_paths()?;

        let mut stats = ProcessStats::default();
        for action in actions {
            match action {
                ProcessAction::Rename => stats.rename.merge(&self.rename()?),
                ProcessAction::Organize => stats.organize = self.organize()?,
                ProcessAction::Index => stats.index = self.generate_index(|_, _| {}).await?,
            }
        }

        info!("Processing complete: {:?}", actions);
        Ok(stats)
    }
}

/// Root-level `*.pdf` files of a directory, sorted by file name
pub fn list_pdfs(dir: &Path) -> Result<Vec<PathBuf>> {
    let dir_str = dir.to_str().ok_or_else(|| {
        EaipError::configuration(format!("Path is not valid UTF-8: {}", dir.display()))
    })?;
    let pattern = format!("{}/*.{}", glob::Pattern::escape(dir_str), PDF_EXTENSION);

    let entries = glob::glob(&pattern)
        .map_err(|e| EaipError::configuration(format!("Invalid glob pattern: {}", e)))?;

    let mut files = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) if path.is_file() => files.push(path),
            Ok(_) => {}
            Err(e) => warn!("Skipping unreadable entry: {}", e),
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Immediate subdirectories of a directory, sorted by name
pub fn list_subdirs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            dirs.push(entry.path());
        }
    }
    dirs.sort();
    Ok(dirs)
}

/// Split an archive-relative path on either separator.
///
/// Returns `None` for an empty path or when any segment is not a plain name
/// (`.`, `..`, a root or drive prefix), so the joined path always stays
/// below the directory it is joined onto.
pub fn relative_segments(source_path: &str) -> Option<Vec<&str>> {
    let segments: Vec<&str> = source_path
        .split(['/', '\\'])
        .filter(|s| !s.is_empty())
        .collect();

    let contained = segments.iter().all(|segment| {
        let mut components = Path::new(segment).components();
        matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        )
    });
    (contained && !segments.is_empty()).then_some(segments)
}

/// File name of a path as an owned string
pub(crate) fn file_name_string(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
