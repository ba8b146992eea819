//! Index generation for airport and en-route chart directories.
//!
//! Each airport directory gets one `index.json` listing its charts with
//! dense 1-based ids: root charts first (`general`), then every category
//! folder in name order. Before indexing, documents of the merged
//! categories are concatenated into a single `<TAG>-MERGED.pdf`.

use super::{CategoryVocabulary, file_name_string, list_pdfs, list_subdirs};
use crate::constants::{ENROUTE_SORT, GENERAL_SORT, INDEX_FILE_NAME, MERGED_SUFFIX};
use crate::error::{EaipError, Result};
use crate::models::{AirportSummary, IndexEntry, IndexStats};
use crate::pdf::PdfEngine;
use futures::stream::{self, StreamExt};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;
use tokio::task;
use tracing::{debug, error, info, warn};

/// Result of indexing one airport directory
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AirportIndex {
    pub charts: usize,
    pub merged: usize,
}

/// Index every airport under `terminal_dir` on a pool of `parallelism`
/// blocking tasks, then the en-route directory.
///
/// `on_progress` receives `(airports_done, airports_total)`. A failing
/// airport is logged, counted with zero charts and does not stop the others.
pub async fn generate_index<F>(
    terminal_dir: &Path,
    enroute_dir: &Path,
    parallelism: usize,
    vocabulary: Arc<CategoryVocabulary>,
    engine: Option<Arc<dyn PdfEngine>>,
    mut on_progress: F,
) -> Result<IndexStats>
where
    F: FnMut(usize, usize) + Send,
{
    let mut stats = IndexStats::default();

    let airports = if terminal_dir.is_dir() {
        list_subdirs(terminal_dir)?
    } else {
        warn!("Terminal directory not found: {}", terminal_dir.display());
        Vec::new()
    };
    let total = airports.len();
    let parallelism = parallelism.max(1);
    info!("Indexing {} airports with {} workers", total, parallelism);

    let tasks = stream::iter(airports.into_iter().map(|airport_dir| {
        let vocabulary = vocabulary.clone();
        let engine = engine.clone();
        async move {
            let icao = file_name_string(&airport_dir);
            let result = task::spawn_blocking(move || {
                index_airport(&airport_dir, &vocabulary, engine.as_deref())
            })
            .await;
            (icao, result)
        }
    }))
    .buffer_unordered(parallelism);
    let mut tasks = std::pin::pin!(tasks);

    let mut done = 0;
    while let Some((icao, result)) = tasks.next().await {
        let charts = match result {
            Ok(Ok(index)) => {
                stats.merged_documents += index.merged;
                debug!("Indexed {}: {} charts", icao, index.charts);
                index.charts
            }
            Ok(Err(e)) => {
                error!("Failed to index airport {}: {}", icao, e);
                stats.airports_failed += 1;
                0
            }
            Err(e) => {
                error!("Indexing task for airport {} failed: {}", icao, e);
                stats.airports_failed += 1;
                0
            }
        };
        stats.airports.push(AirportSummary { icao, charts });

        done += 1;
        on_progress(done, total);
    }
    stats.airports.sort_by(|a, b| a.icao.cmp(&b.icao));

    stats.enroute_charts = match index_enroute(enroute_dir) {
        Ok(count) => count,
        Err(e) => {
            error!("Failed to index en-route charts: {}", e);
            0
        }
    };

    info!(
        "Indexed {} airport charts and {} en-route charts",
        stats.airport_charts(),
        stats.enroute_charts
    );
    Ok(stats)
}

/// Merge special categories and write `index.json` for one airport directory
pub fn index_airport(
    airport_dir: &Path,
    vocabulary: &CategoryVocabulary,
    engine: Option<&dyn PdfEngine>,
) -> Result<AirportIndex> {
    let merged = merge_special_categories(airport_dir, vocabulary, engine);
    let entries = build_airport_entries(airport_dir)?;
    write_index(airport_dir, &entries)?;
    Ok(AirportIndex {
        charts: entries.len(),
        merged,
    })
}

/// Index entries of one airport directory, in id order
pub fn build_airport_entries(airport_dir: &Path) -> Result<Vec<IndexEntry>> {
    let icao = file_name_string(airport_dir);
    let mut entries = Vec::new();

    for pdf in list_pdfs(airport_dir)? {
        let name = file_name_string(&pdf);
        entries.push(IndexEntry {
            id: (entries.len() + 1).to_string(),
            code: GENERAL_SORT.to_string(),
            path: name.clone(),
            name,
            sort: GENERAL_SORT.to_string(),
        });
    }

    for folder in list_subdirs(airport_dir)? {
        let category = file_name_string(&folder);
        for pdf in list_pdfs(&folder)? {
            let name = file_name_string(&pdf);
            entries.push(IndexEntry {
                id: (entries.len() + 1).to_string(),
                code: chart_code(&name, &category, &icao),
                path: format!("{}/{}", category, name).replace('\\', "/"),
                name,
                sort: category.clone(),
            });
        }
    }

    Ok(entries)
}

/// Chart code from a file name: the text before the category tag, with any
/// `<ICAO>-` prefix removed
pub fn chart_code(file_name: &str, category: &str, icao: &str) -> String {
    let before_category = match file_name.find(category) {
        Some(pos) if !category.is_empty() => &file_name[..pos],
        _ => file_name,
    };

    let airport_prefix = format!("{}-", icao);
    let code = match before_category.rfind(&airport_prefix) {
        Some(pos) => &before_category[pos + airport_prefix.len()..],
        None => before_category,
    };
    code.trim().to_string()
}

/// Write `index.json` for the en-route directory, returning the chart count
pub fn index_enroute(enroute_dir: &Path) -> Result<usize> {
    if !enroute_dir.is_dir() {
        warn!("En-route directory not found: {}", enroute_dir.display());
        return Ok(0);
    }

    let entries: Vec<IndexEntry> = list_pdfs(enroute_dir)?
        .iter()
        .enumerate()
        .map(|(i, pdf)| {
            let name = file_name_string(pdf);
            IndexEntry {
                id: (i + 1).to_string(),
                code: ENROUTE_SORT.to_string(),
                path: name.replace('\\', "/"),
                name,
                sort: ENROUTE_SORT.to_string(),
            }
        })
        .collect();

    write_index(enroute_dir, &entries)?;
    Ok(entries.len())
}

/// Atomically replace `dir/index.json`
pub fn write_index(dir: &Path, entries: &[IndexEntry]) -> Result<()> {
    let json = serde_json::to_string_pretty(entries)?;
    let mut temp = NamedTempFile::new_in(dir)?;
    temp.write_all(json.as_bytes())?;
    temp.as_file().sync_all()?;
    temp.persist(dir.join(INDEX_FILE_NAME))
        .map_err(|e| EaipError::Io(e.error))?;
    Ok(())
}

/// Read `dir/index.json`
pub fn read_index(dir: &Path) -> Result<Vec<IndexEntry>> {
    let contents = fs::read_to_string(dir.join(INDEX_FILE_NAME))?;
    Ok(serde_json::from_str(&contents)?)
}

/// Merge every merged category folder of an airport; returns the number of
/// merged documents written. Failures are logged and skipped.
pub fn merge_special_categories(
    airport_dir: &Path,
    vocabulary: &CategoryVocabulary,
    engine: Option<&dyn PdfEngine>,
) -> usize {
    let mut merged = 0;
    for tag in vocabulary.merged_tags() {
        let folder = airport_dir.join(tag);
        if !folder.is_dir() {
            continue;
        }
        let Some(engine) = engine else {
            debug!("No PDF engine, not merging {}", folder.display());
            continue;
        };
        match merge_category(&folder, tag, engine) {
            Ok(Some(path)) => {
                debug!("Merged {}", path.display());
                merged += 1;
            }
            Ok(None) => {}
            Err(e) => warn!("Failed to merge {}: {}", folder.display(), e),
        }
    }
    merged
}

/// Concatenate the documents of one category folder into `<TAG>-MERGED.pdf`.
///
/// Returns `None` when the folder holds no documents to merge.
pub fn merge_category(
    folder: &Path,
    tag: &str,
    engine: &dyn PdfEngine,
) -> Result<Option<PathBuf>> {
    let sources: Vec<PathBuf> = list_pdfs(folder)?
        .into_iter()
        .filter(|p| !file_name_string(p).ends_with(MERGED_SUFFIX))
        .collect();

    if sources.is_empty() {
        debug!("No documents to merge in {}", folder.display());
        return Ok(None);
    }

    let handles = sources
        .iter()
        .map(|path| engine.open_document(path))
        .collect::<Result<Vec<_>>>()?;
    let bytes = engine.merge_pages(handles)?;

    let merged_path = folder.join(format!("{}{}", tag, MERGED_SUFFIX));
    let mut temp = NamedTempFile::new_in(folder)?;
    temp.write_all(&bytes)?;
    temp.persist(&merged_path)
        .map_err(|e| EaipError::Io(e.error))?;

    Ok(Some(merged_path))
}
