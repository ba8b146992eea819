//! Manifest-driven chart renaming.
//!
//! The vendor ships charts under opaque file names and lists their display
//! names in `AD.JSON` (airports) and `ENR.JSON` (en-route). Each listed file
//! is renamed to its sanitized display name and moved to the canonical
//! airport, en-route or general-document directory.

use crate::constants::{ENROUTE_DIR_NAME, GENERAL_DOC_MARKER, PDF_EXTENSION, TERMINAL_DIR_NAME};
use crate::error::{EaipError, Result};
use crate::models::{ChartRecord, ImportContext, RenameStats};
use crate::processor::relative_segments;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Where a manifest record belongs, derived from its source path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChartTarget {
    /// General documents, committed under `Terminal/GeneralDoc/`
    GeneralDoc,
    /// Airport charts under `Terminal/<ICAO>/`
    Airport(String),
    /// En-route charts
    Enroute,
}

/// Which manifest is being applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pass {
    Airport,
    Enroute,
}

/// Apply the airport manifest, then the en-route manifest.
///
/// Running twice with the same manifests moves nothing the second time.
/// Only an unreadable manifest fails the call; individual records that
/// cannot be moved are logged and counted.
pub fn rename_charts(ctx: &ImportContext) -> Result<RenameStats> {
    let mut stats = rename_airport_charts(ctx)?;
    stats.merge(&rename_enroute_charts(ctx)?);
    info!(
        "Renamed {} charts ({} missing, {} failed, {} skipped)",
        stats.renamed, stats.missing, stats.failed, stats.skipped
    );
    Ok(stats)
}

/// Apply `AD.JSON` to airport and general-document charts
pub fn rename_airport_charts(ctx: &ImportContext) -> Result<RenameStats> {
    apply_manifest(ctx, &ctx.airport_manifest(), Pass::Airport)
}

/// Apply `ENR.JSON` to en-route charts
pub fn rename_enroute_charts(ctx: &ImportContext) -> Result<RenameStats> {
    apply_manifest(ctx, &ctx.enroute_manifest(), Pass::Enroute)
}

/// Load a manifest. A missing file yields `None`; unparsable content is an
/// [`EaipError::InvalidManifest`].
pub fn load_manifest(path: &Path) -> Result<Option<Vec<ChartRecord>>> {
    if !path.is_file() {
        return Ok(None);
    }

    let contents = fs::read_to_string(path)?;
    let records: Vec<ChartRecord> =
        serde_json::from_str(&contents).map_err(|e| EaipError::InvalidManifest {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    Ok(Some(records))
}

/// Classify an archive-relative source path by its first meaningful segment
pub fn resolve_target(source_path: &str) -> Option<ChartTarget> {
    target_for_segments(&relative_segments(source_path)?)
}

fn target_for_segments(segments: &[&str]) -> Option<ChartTarget> {
    for (i, segment) in segments.iter().enumerate() {
        if segment.contains(GENERAL_DOC_MARKER) {
            return Some(ChartTarget::GeneralDoc);
        }
        if *segment == TERMINAL_DIR_NAME {
            // the airport code must be a directory, not the chart itself
            return if i + 2 < segments.len() {
                Some(ChartTarget::Airport(segments[i + 1].to_string()))
            } else {
                None
            };
        }
        if segment.contains(ENROUTE_DIR_NAME) {
            return Some(ChartTarget::Enroute);
        }
    }
    None
}

/// Normalized file name for a chart display name
pub fn sanitize_chart_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            ':' | '/' | '\\' => '-',
            other => other,
        })
        .collect();
    format!("{}.{}", cleaned, PDF_EXTENSION)
}

fn apply_manifest(ctx: &ImportContext, manifest: &Path, pass: Pass) -> Result<RenameStats> {
    let mut stats = RenameStats::default();

    let Some(records) = load_manifest(manifest)? else {
        warn!("Manifest not found, skipping: {}", manifest.display());
        return Ok(stats);
    };
    debug!("Loaded {} records from {}", records.len(), manifest.display());

    for record in &records {
        let Some(source_path) = record.source_path() else {
            stats.skipped += 1;
            continue;
        };

        let Some(segments) = relative_segments(source_path) else {
            warn!(
                "Skipping '{}': path leaves the archive: {}",
                record.name, source_path
            );
            stats.skipped += 1;
            continue;
        };

        let Some(destination_dir) = destination_for(ctx, &segments, pass) else {
            debug!("Record not handled by this pass: {}", source_path);
            stats.skipped += 1;
            continue;
        };

        let source = segments
            .iter()
            .fold(ctx.base_dir().to_path_buf(), |path, segment| path.join(segment));
        let destination = destination_dir.join(sanitize_chart_name(&record.name));

        if source == destination {
            stats.skipped += 1;
            continue;
        }
        if !source.is_file() {
            debug!("Chart file not found: {}", source.display());
            stats.missing += 1;
            continue;
        }

        match move_chart(&source, &destination) {
            Ok(()) => {
                debug!("Renamed {} -> {}", source.display(), destination.display());
                stats.renamed += 1;
            }
            Err(e) => {
                error!("{}", e);
                stats.failed += 1;
            }
        }
    }

    Ok(stats)
}

fn destination_for(ctx: &ImportContext, segments: &[&str], pass: Pass) -> Option<PathBuf> {
    match (pass, target_for_segments(segments)?) {
        (Pass::Airport, ChartTarget::Airport(icao)) => Some(ctx.terminal_dir().join(icao)),
        (Pass::Airport, ChartTarget::GeneralDoc) => Some(ctx.general_doc_dir()),
        (Pass::Enroute, ChartTarget::Enroute) => Some(ctx.enroute_dir()),
        _ => None,
    }
}

fn move_chart(source: &Path, destination: &Path) -> Result<()> {
    let wrap = |e| EaipError::Move {
        from: source.to_path_buf(),
        to: destination.to_path_buf(),
        source: e,
    };
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent).map_err(wrap)?;
    }
    fs::rename(source, destination).map_err(wrap)
}
