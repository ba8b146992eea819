//! Import pipeline.
//!
//! [`run_import`] sequences one import from archive to committed cycle
//! directory:
//!
//! ```text
//! 1 Extracting          archive -> <data>/.import-XXXX/extracted
//! 2 DetectingStructure  extracted/<Root> -> <data>/<period>
//! 3 ProcessingCharts    detect Data/<Vendor>, build ImportContext
//! 4 Renaming            manifests, then category folders
//! 5 Indexing            index.json per airport and for ENROUTE
//! 6 Finalizing          <period>/{Terminal,ENROUTE}, everything else removed
//! ```
//!
//! [`ImportWorker`] runs it in the background and owns the event channel.

pub mod progress;
pub mod worker;

pub use self::progress::ProgressSink;
pub use self::worker::{ImportHandle, ImportWorker};

use crate::archive;
use crate::config::ImporterConfig;
use crate::constants::{
    DATA_DIR_NAME, ENROUTE_DIR_NAME, MACOS_METADATA_DIR, PDF_EXTENSION, SCRATCH_EXTRACT_DIR,
    SCRATCH_PREFIX, TERMINAL_DIR_NAME,
};
use crate::error::{EaipError, Result};
use crate::models::{ImportContext, ImportStage, ImportSummary};
use crate::pdf::PdfEngine;
use crate::period::resolve_period;
use crate::processor::{ChartProcessor, list_subdirs};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::task;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Everything one import needs besides its collaborators
#[derive(Debug, Clone)]
pub struct ImportRequest {
    pub archive_path: PathBuf,
    pub password: Option<String>,
    pub data_root: PathBuf,
    pub default_period: String,
    pub default_vendor_dir: String,
    pub vendor_prefix: String,
    pub workers: usize,
}

impl ImportRequest {
    /// Request for `archive_path` using the settings of `config`
    pub fn new(archive_path: impl Into<PathBuf>, config: &ImporterConfig) -> Self {
        Self {
            archive_path: archive_path.into(),
            password: None,
            data_root: config.data_path.clone(),
            default_period: config.default_period.clone(),
            default_vendor_dir: config.default_vendor_dir.clone(),
            vendor_prefix: config.vendor_prefix.clone(),
            workers: config.import_workers(),
        }
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }
}

/// Run one import to completion, reporting stage progress through `sink`.
///
/// The terminal event is not sent here; see [`ImportWorker`]. On failure the
/// scratch directory is removed. A failure before the cycle directory move
/// leaves any existing cycle untouched.
pub async fn run_import(
    request: ImportRequest,
    engine: Option<Arc<dyn PdfEngine>>,
    sink: &ProgressSink,
) -> Result<ImportSummary> {
    let started = Instant::now();
    let mut summary = ImportSummary::default();
    info!("Importing {}", request.archive_path.display());

    // Step 1: extract into scratch space under the data root
    sink.report(ImportStage::Extracting, 0, "Preparing");
    if !request.archive_path.is_file() {
        return Err(EaipError::NotFound {
            path: request.archive_path.clone(),
        });
    }
    fs::create_dir_all(&request.data_root)?;
    let scratch = tempfile::Builder::new()
        .prefix(SCRATCH_PREFIX)
        .tempdir_in(&request.data_root)?;
    let extract_dir = scratch.path().join(SCRATCH_EXTRACT_DIR);

    summary.extract = {
        let archive_path = request.archive_path.clone();
        let password = request.password.clone();
        let extract_dir = extract_dir.clone();
        let sink = sink.clone();
        task::spawn_blocking(move || {
            let mut on_progress = |done: usize, total: usize| {
                sink.report_fraction(
                    ImportStage::Extracting,
                    done,
                    total,
                    format!("{}/{} files", done, total),
                );
            };
            archive::extract(
                &archive_path,
                &extract_dir,
                password.as_deref(),
                Some(&mut on_progress),
            )
        })
        .await
        .map_err(|e| EaipError::TaskFailed {
            reason: e.to_string(),
        })??
    };
    sink.complete(
        ImportStage::Extracting,
        format!("{} files extracted", summary.extract.files_written),
    );

    // Step 2: resolve the period and move the root folder into place
    sink.report(ImportStage::DetectingStructure, 0, "Detecting AIRAC period");
    let root = find_root_folder(&extract_dir)?.ok_or_else(|| EaipError::EmptyArchive {
        path: request.archive_path.clone(),
    })?;
    let root_name = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let period = resolve_period(&root_name).unwrap_or_else(|| {
        warn!(
            "No AIRAC period in folder name '{}', using default {}",
            root_name, request.default_period
        );
        request.default_period.clone()
    });
    sink.report(
        ImportStage::DetectingStructure,
        50,
        format!("AIRAC {}", period),
    );

    let cycle_dir = request.data_root.join(&period);
    replace_dir(&root, &cycle_dir)?;
    if let Err(e) = scratch.close() {
        warn!("Failed to remove scratch directory: {}", e);
    }
    summary.period = period.clone();
    summary.cycle_dir = cycle_dir.clone();
    sink.complete(
        ImportStage::DetectingStructure,
        format!("AIRAC {}", period),
    );

    // Step 3: locate the vendor tree and build the import context
    sink.report(ImportStage::ProcessingCharts, 0, "Locating charts");
    let vendor_dir_name =
        detect_vendor_dir(&cycle_dir.join(DATA_DIR_NAME), &request.vendor_prefix)?
            .unwrap_or_else(|| {
                warn!(
                    "No vendor directory with prefix '{}', using '{}'",
                    request.vendor_prefix, request.default_vendor_dir
                );
                request.default_vendor_dir.clone()
            });
    let ctx = ImportContext::new(period, cycle_dir, vendor_dir_name);
    let processor = ChartProcessor::new(ctx.clone())
        .with_parallelism(request.workers)
        .with_engine(engine);
    processor.validate_paths()?;
    let chart_files = count_pdfs(&ctx.vendor_dir());
    info!(
        "Found {} chart files under {}",
        chart_files,
        ctx.vendor_dir().display()
    );
    sink.complete(
        ImportStage::ProcessingCharts,
        format!("{} chart files", chart_files),
    );

    // Step 4: rename per manifest, then sort into categories
    sink.report(ImportStage::Renaming, 0, "Renaming charts");
    let blocking = processor.clone();
    summary.rename = task::spawn_blocking(move || blocking.rename())
        .await
        .map_err(|e| EaipError::TaskFailed {
            reason: e.to_string(),
        })??;
    sink.report(
        ImportStage::Renaming,
        50,
        format!("{} charts renamed", summary.rename.renamed),
    );
    let blocking = processor.clone();
    summary.organize = task::spawn_blocking(move || blocking.organize())
        .await
        .map_err(|e| EaipError::TaskFailed {
            reason: e.to_string(),
        })??;
    sink.complete(
        ImportStage::Renaming,
        format!("{} charts categorized", summary.organize.moved),
    );

    // Step 5: indexes
    sink.report(ImportStage::Indexing, 0, "Generating indexes");
    summary.index = processor
        .generate_index(|done, total| {
            sink.report_fraction(
                ImportStage::Indexing,
                done,
                total,
                format!("{}/{} airports", done, total),
            );
        })
        .await?;
    sink.complete(
        ImportStage::Indexing,
        format!("{} charts indexed", summary.index.total_charts()),
    );

    // Step 6: flatten into the committed layout
    sink.report(ImportStage::Finalizing, 0, "Cleaning up");
    let finalize_ctx = ctx.clone();
    task::spawn_blocking(move || finalize_layout(&finalize_ctx))
        .await
        .map_err(|e| EaipError::TaskFailed {
            reason: e.to_string(),
        })??;
    summary.elapsed = started.elapsed();
    sink.complete(ImportStage::Finalizing, "Import complete");

    info!(
        "Imported AIRAC {} in {:.1}s: {} airports, {} charts",
        summary.period,
        summary.elapsed.as_secs_f64(),
        summary.airport_count(),
        summary.total_charts()
    );
    Ok(summary)
}

/// The extracted root folder: the first directory in name order.
///
/// Returns `None` when the archive held no directory at all.
pub fn find_root_folder(extract_dir: &Path) -> Result<Option<PathBuf>> {
    let folders: Vec<PathBuf> = list_subdirs(extract_dir)?
        .into_iter()
        .filter(|p| !p.ends_with(MACOS_METADATA_DIR))
        .collect();

    if folders.len() > 1 {
        warn!(
            "Archive has {} top-level folders, using {}",
            folders.len(),
            folders[0].display()
        );
    }
    Ok(folders.into_iter().next())
}

/// First directory under `data_dir`, in name order, starting with `prefix`
pub fn detect_vendor_dir(data_dir: &Path, prefix: &str) -> Result<Option<String>> {
    if !data_dir.is_dir() {
        warn!("Data directory not found: {}", data_dir.display());
        return Ok(None);
    }

    Ok(list_subdirs(data_dir)?
        .iter()
        .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .find(|name| name.starts_with(prefix)))
}

/// Move `vendor/Terminal` and `vendor/ENROUTE` to the cycle root and remove
/// every other top-level entry, `Data/` included
pub fn finalize_layout(ctx: &ImportContext) -> Result<()> {
    for (source, name) in [
        (ctx.terminal_dir(), TERMINAL_DIR_NAME),
        (ctx.enroute_dir(), ENROUTE_DIR_NAME),
    ] {
        let target = ctx.cycle_dir.join(name);
        if source.is_dir() {
            replace_dir(&source, &target)?;
        } else if !target.is_dir() {
            fs::create_dir_all(&target)?;
        }
    }

    for entry in fs::read_dir(&ctx.cycle_dir)? {
        let entry = entry?;
        let name = entry.file_name();
        if name == TERMINAL_DIR_NAME || name == ENROUTE_DIR_NAME {
            continue;
        }

        let path = entry.path();
        debug!("Removing {}", path.display());
        if entry.file_type()?.is_dir() {
            fs::remove_dir_all(&path)?;
        } else {
            fs::remove_file(&path)?;
        }
    }
    Ok(())
}

/// Rename `source` to `target`, replacing anything already at `target`
fn replace_dir(source: &Path, target: &Path) -> Result<()> {
    if target.exists() {
        info!("Replacing existing {}", target.display());
        fs::remove_dir_all(target)?;
    }
    fs::rename(source, target).map_err(|e| EaipError::Move {
        from: source.to_path_buf(),
        to: target.to_path_buf(),
        source: e,
    })
}

/// Number of chart documents anywhere below `dir`
fn count_pdfs(dir: &Path) -> usize {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file()
                && entry
                    .path()
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case(PDF_EXTENSION))
        })
        .count()
}
