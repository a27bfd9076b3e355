//! Output writers for a mining run.
//!
//! Two artifacts leave a run: the model document (`model_structure.json`),
//! written atomically as one complete file, and a flattened CSV of measure
//! expressions for the AI enrichment collaborator. The CSV is explicitly
//! lossy (whitespace collapsed, quotes downgraded, long expressions
//! truncated) and is never meant to be re-imported.

use std::{fs, path::Path};

use anyhow::{Context, Result};

use crate::core::model::{Measure, ModelDocument};
use crate::utils::collapse_whitespace;

/// Maximum exported expression length, in characters.
pub const MAX_DAX_EXPORT_LEN: usize = 1000;

/// CSV header of the flattened export.
pub const CSV_HEADER: &str = "global_id,measure_name,dax_code";

/// Serializes and writes the model document as a single atomic write:
/// the content lands in a sibling temp file first and is renamed into
/// place, so a crashed run never leaves a partial document behind.
pub fn write_model_document(document: &ModelDocument, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(document)
        .context("Failed to serialize the model document")?;

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, &json)
        .with_context(|| format!("Failed to write model document: {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("Failed to move model document into place: {}", path.display()))?;
    Ok(())
}

/// Writes the flattened measure export.
pub fn write_measures_csv(measures: &[Measure], path: &Path) -> Result<()> {
    fs::write(path, measures_csv(measures))
        .with_context(|| format!("Failed to write CSV export: {}", path.display()))
}

/// Renders the measure list as CSV rows `global_id,measure_name,dax_code`.
pub fn measures_csv(measures: &[Measure]) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');
    for measure in measures {
        out.push_str(&csv_field(&measure.global_id));
        out.push(',');
        out.push_str(&csv_field(&measure.name));
        out.push(',');
        out.push_str(&csv_field(&flatten_dax(&measure.dax)));
        out.push('\n');
    }
    out
}

/// Flattens a DAX expression onto one line: whitespace runs collapse to
/// single spaces, double quotes become single quotes (they would fight
/// the CSV quoting), and the result is truncated to
/// [`MAX_DAX_EXPORT_LEN`] characters.
pub fn flatten_dax(dax: &str) -> String {
    collapse_whitespace(dax)
        .replace('"', "'")
        .chars()
        .take(MAX_DAX_EXPORT_LEN)
        .collect()
}

/// Quotes a field when it contains a separator, quote or newline.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
