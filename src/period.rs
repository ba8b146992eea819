//! AIRAC period detection from archive folder names.
//!
//! Vendor archives name their top-level folder after the publication date,
//! e.g. `EAIP2025-11`. The period code used for storage is `YYMM`.

use regex::Regex;
use std::sync::LazyLock;

/// `YYYY-M` or `YYYY-MM` not followed by another digit
static YEAR_MONTH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{4})-(\d{1,2})(?:\D|$)").expect("valid year-month regex"));

/// A run of exactly four digits
static FOUR_DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\D)(\d{4})(?:\D|$)").expect("valid four-digit regex"));

/// Derive the `YYMM` period code from the extracted root folder name.
///
/// The `YYYY-M(M)` form wins; otherwise a standalone four-digit run is used
/// verbatim. Returns `None` when neither is present.
pub fn resolve_period(folder_name: &str) -> Option<String> {
    for caps in YEAR_MONTH.captures_iter(folder_name) {
        let year = &caps[1];
        let month: u32 = match caps[2].parse() {
            Ok(m) => m,
            Err(_) => continue,
        };
        if (1..=12).contains(&month) {
            return Some(format!("{}{:02}", &year[2..], month));
        }
    }

    FOUR_DIGITS
        .captures(folder_name)
        .map(|caps| caps[1].to_string())
}

/// Check that a string is a 4-digit period code
pub fn is_valid_period(period: &str) -> bool {
    period.len() == 4 && period.bytes().all(|b| b.is_ascii_digit())
}
