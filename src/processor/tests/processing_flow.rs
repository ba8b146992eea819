//! Full rename, organize and index flow through `ChartProcessor`

use super::fixtures::create_cycle;
use crate::pdf::LopdfEngine;
use crate::pdf::test_support::write_blank_pdf;
use crate::processor::indexer::read_index;
use crate::processor::{CategoryVocabulary, ChartProcessor, ProcessAction};
use std::sync::Arc;
use tempfile::TempDir;

#[tokio::test]
async fn test_process_all_actions() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = create_cycle(&temp_dir);

    let processor = ChartProcessor::new(ctx.clone()).with_parallelism(4);
    let stats = processor.process(&[]).await.unwrap();

    assert_eq!(stats.rename.renamed, 5);
    assert_eq!(stats.organize.moved, 2);
    // general documents are indexed like an airport
    let airports: Vec<(&str, usize)> = stats
        .index
        .airports
        .iter()
        .map(|a| (a.icao.as_str(), a.charts))
        .collect();
    assert_eq!(airports, vec![("GeneralDoc", 1), ("ZBAA", 3)]);
    assert_eq!(stats.index.enroute_charts, 1);

    let entries = read_index(&ctx.terminal_dir().join("ZBAA")).unwrap();
    assert_eq!(entries[0].sort, "general");
    assert_eq!(entries[0].name, "ZBAA AD 2.1.pdf");
    let mut categories: Vec<&str> = entries[1..].iter().map(|e| e.sort.as_str()).collect();
    categories.sort();
    assert_eq!(categories, vec!["IAC", "SID"]);
}

#[tokio::test]
async fn test_category_assignment_is_stable_across_runs() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = create_cycle(&temp_dir);
    let processor = ChartProcessor::new(ctx.clone());

    processor.process(&[]).await.unwrap();
    let first = read_index(&ctx.terminal_dir().join("ZBAA")).unwrap();

    processor
        .process(&[ProcessAction::Organize, ProcessAction::Index])
        .await
        .unwrap();
    let second = read_index(&ctx.terminal_dir().join("ZBAA")).unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_custom_vocabulary_and_merge() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = create_cycle(&temp_dir);
    let airport = ctx.terminal_dir().join("ZBAA");
    write_blank_pdf(&airport.join("ZBAA WPT 1.pdf"), 1);
    write_blank_pdf(&airport.join("ZBAA WPT 2.pdf"), 1);

    let vocabulary = CategoryVocabulary::new(["WPT"]).with_merged(["WPT"]);
    let processor = ChartProcessor::new(ctx.clone())
        .with_vocabulary(vocabulary)
        .with_engine(Some(Arc::new(LopdfEngine::new())));

    let stats = processor
        .process(&[ProcessAction::Organize, ProcessAction::Index])
        .await
        .unwrap();

    assert_eq!(stats.organize.moved, 2);
    assert_eq!(stats.index.merged_documents, 1);
    assert!(airport.join("WPT").join("WPT-MERGED.pdf").exists());
    // two originals plus the merged document
    let wpt: Vec<_> = read_index(&airport)
        .unwrap()
        .into_iter()
        .filter(|e| e.sort == "WPT")
        .collect();
    assert_eq!(wpt.len(), 3);
}

#[test]
fn test_validate_paths_creates_chart_roots() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = create_cycle(&temp_dir);
    std::fs::remove_dir_all(ctx.enroute_dir()).unwrap();

    ChartProcessor::new(ctx.clone()).validate_paths().unwrap();
    assert!(ctx.enroute_dir().is_dir());
}
