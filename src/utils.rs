//! Common utility functions shared across the codebase.

/// Strips a UTF-8 byte order mark from the start of file content.
///
/// Power BI Desktop writes TMDL and report JSON files with a BOM
/// (`utf-8-sig`), which would otherwise leak into the first parsed token.
///
/// # Examples
///
/// ```
/// use pbimine::utils::strip_bom;
///
/// assert_eq!(strip_bom("\u{feff}table Sales"), "table Sales");
/// assert_eq!(strip_bom("table Sales"), "table Sales");
/// ```
pub fn strip_bom(text: &str) -> &str {
    text.strip_prefix('\u{feff}').unwrap_or(text)
}

/// Collapses all runs of whitespace (including newlines) into single spaces.
///
/// Used by the CSV export, where DAX expressions must fit on one row.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
