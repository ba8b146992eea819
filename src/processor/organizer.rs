//! Category sorting of airport charts.

use super::{file_name_string, list_pdfs, list_subdirs};
use crate::constants::{CHART_CATEGORIES, MERGED_CATEGORIES};
use crate::error::Result;
use crate::models::OrganizeStats;
use std::fs;
use std::path::Path;
use tracing::{debug, error, info, warn};

/// Ordered chart category tags.
///
/// Classification is a first-match substring search over `tags`, so a tag
/// listed earlier wins over one listed later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryVocabulary {
    tags: Vec<String>,
    merged: Vec<String>,
}

impl Default for CategoryVocabulary {
    fn default() -> Self {
        Self {
            tags: CHART_CATEGORIES.iter().map(|t| t.to_string()).collect(),
            merged: MERGED_CATEGORIES.iter().map(|t| t.to_string()).collect(),
        }
    }
}

impl CategoryVocabulary {
    /// Vocabulary with the given tags in priority order and no merged categories
    pub fn new<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tags: tags.into_iter().map(Into::into).collect(),
            merged: Vec::new(),
        }
    }

    /// Set the categories whose documents get merged during indexing
    pub fn with_merged<I, S>(mut self, merged: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.merged = merged.into_iter().map(Into::into).collect();
        self
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn merged_tags(&self) -> &[String] {
        &self.merged
    }

    /// First tag contained in `file_name`
    pub fn classify(&self, file_name: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|tag| file_name.contains(tag.as_str()))
            .map(String::as_str)
    }

    pub fn is_merged(&self, tag: &str) -> bool {
        self.merged.iter().any(|t| t == tag)
    }
}

/// Move every root-level chart of every airport under `terminal_dir` into
/// its category folder. Unmatched charts stay at the airport root.
pub fn organize(terminal_dir: &Path, vocabulary: &CategoryVocabulary) -> Result<OrganizeStats> {
    let mut stats = OrganizeStats::default();

    if !terminal_dir.is_dir() {
        warn!("Terminal directory not found: {}", terminal_dir.display());
        return Ok(stats);
    }

    let airports = list_subdirs(terminal_dir)?;
    info!("Organizing charts of {} airports", airports.len());

    for airport in &airports {
        stats.airports += 1;
        let charts = list_pdfs(airport)?;
        debug!(
            "Airport {}: {} root charts",
            file_name_string(airport),
            charts.len()
        );

        for chart in charts {
            let file_name = file_name_string(&chart);
            let Some(tag) = vocabulary.classify(&file_name) else {
                stats.uncategorized += 1;
                continue;
            };

            let target_dir = airport.join(tag);
            let target = target_dir.join(&file_name);
            let moved = fs::create_dir_all(&target_dir).and_then(|_| fs::rename(&chart, &target));
            match moved {
                Ok(()) => {
                    debug!("Moved {} -> {}/", file_name, tag);
                    stats.moved += 1;
                }
                Err(e) => {
                    error!("Failed to move {}: {}", chart.display(), e);
                    stats.failed += 1;
                }
            }
        }
    }

    info!(
        "Organized {} charts ({} uncategorized, {} failed)",
        stats.moved, stats.uncategorized, stats.failed
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_first_match_wins() {
        let vocabulary = CategoryVocabulary::default();
        assert_eq!(vocabulary.classify("ZBAA SID 05.pdf"), Some("SID"));
        assert_eq!(vocabulary.classify("ZBAA IAC 01.pdf"), Some("IAC"));
        assert_eq!(vocabulary.classify("ZBAA AD 2.1.pdf"), None);
        // GMC is listed before DGS
        assert_eq!(vocabulary.classify("ZBAA APDC 1.pdf"), Some("APDC"));
        assert_eq!(vocabulary.classify("ZBAA GMC DGS.pdf"), Some("GMC"));
    }

    #[test]
    fn test_custom_vocabulary_order() {
        let vocabulary = CategoryVocabulary::new(["STAR", "SID"]);
        assert_eq!(vocabulary.classify("SID STAR.pdf"), Some("STAR"));
        assert!(!vocabulary.is_merged("STAR"));

        let vocabulary = vocabulary.with_merged(["SID"]);
        assert!(vocabulary.is_merged("SID"));
    }

    #[test]
    fn test_organize_moves_into_category_folders() {
        let temp_dir = TempDir::new().unwrap();
        let terminal = temp_dir.path().join("Terminal");
        let airport = terminal.join("ZBAA");
        fs::create_dir_all(&airport).unwrap();
        for name in ["ZBAA AD 2.1.pdf", "ZBAA SID 05.pdf", "ZBAA IAC 01.pdf", "notes.txt"] {
            fs::write(airport.join(name), b"x").unwrap();
        }

        let stats = organize(&terminal, &CategoryVocabulary::default()).unwrap();

        assert_eq!(stats.airports, 1);
        assert_eq!(stats.moved, 2);
        assert_eq!(stats.uncategorized, 1);
        assert!(airport.join("ZBAA AD 2.1.pdf").exists());
        assert!(airport.join("SID").join("ZBAA SID 05.pdf").exists());
        assert!(airport.join("IAC").join("ZBAA IAC 01.pdf").exists());
        assert!(airport.join("notes.txt").exists());
    }

    #[test]
    fn test_organize_missing_terminal() {
        let temp_dir = TempDir::new().unwrap();
        let stats = organize(
            &temp_dir.path().join("Terminal"),
            &CategoryVocabulary::default(),
        )
        .unwrap();
        assert_eq!(stats, OrganizeStats::default());
    }
}
