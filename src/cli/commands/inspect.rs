//! Inspect command: list an archive without importing it

use crate::archive;
use crate::cli::args::{GlobalArgs, InspectArgs};
use crate::constants::MACOS_METADATA_DIR;
use crate::period::resolve_period;
use anyhow::{Context, Result, bail};
use colored::*;
use std::collections::BTreeSet;

/// Run the inspect command
pub fn run_inspect(_global: &GlobalArgs, args: InspectArgs) -> Result<()> {
    if !archive::is_valid_zip(&args.archive) {
        bail!("{} is not a readable ZIP archive", args.archive.display());
    }
    let entries = archive::list_contents(&args.archive)
        .with_context(|| format!("Failed to read {}", args.archive.display()))?;

    let roots = top_level_folders(&entries);
    println!("{} {}", "Archive:".bright_cyan(), args.archive.display());
    println!("{} {}", "Entries:".bright_cyan(), entries.len());
    for root in &roots {
        let period = resolve_period(root).unwrap_or_else(|| "undetected".to_string());
        println!(
            "{} {} (AIRAC {})",
            "Root folder:".bright_cyan(),
            root.bright_white().bold(),
            period
        );
    }

    let pdfs = entries
        .iter()
        .filter(|e| e.to_ascii_lowercase().ends_with(".pdf"))
        .count();
    println!("{} {}", "PDF documents:".bright_cyan(), pdfs);
    println!();

    for entry in entries.iter().take(args.limit) {
        println!("  {}", entry);
    }
    if entries.len() > args.limit {
        println!("  ... {} more", entries.len() - args.limit);
    }
    Ok(())
}

/// Distinct first path segments of entries that are inside a folder
fn top_level_folders(entries: &[String]) -> BTreeSet<String> {
    entries
        .iter()
        .filter_map(|entry| {
            let (root, rest) = entry.split_once('/')?;
            (!rest.is_empty() || entry.ends_with('/')).then(|| root.to_string())
        })
        .filter(|root| !root.is_empty() && root != MACOS_METADATA_DIR)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_level_folders() {
        let entries = vec![
            "EAIP2025-11/".to_string(),
            "EAIP2025-11/Data/a.pdf".to_string(),
            "__MACOSX/EAIP2025-11/._a.pdf".to_string(),
            "readme.txt".to_string(),
        ];
        let roots: Vec<String> = top_level_folders(&entries).into_iter().collect();
        assert_eq!(roots, vec!["EAIP2025-11"]);
    }
}
