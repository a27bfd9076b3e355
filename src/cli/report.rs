//! Run summary printing.
//!
//! Separate from core logic so the miner can be used as a library.

use std::io::{self, Write};

use colored::Colorize;

use super::commands::{CommandResult, CommandSummary, InitSummary, MineSummary};
use crate::config::CONFIG_FILE_NAME;

/// Success mark for consistent output formatting.
pub const SUCCESS_MARK: &str = "\u{2713}"; // ✓

/// Failure mark for consistent output formatting.
pub const FAILURE_MARK: &str = "\u{2718}"; // ✘

pub fn print(result: &CommandResult, verbose: bool) {
    print_to(result, verbose, &mut io::stdout().lock());
}

fn print_to<W: Write>(result: &CommandResult, verbose: bool, writer: &mut W) {
    match &result.summary {
        CommandSummary::Mine(summary) => print_mine(summary, verbose, writer),
        CommandSummary::Init(summary) => print_init(summary, writer),
    }
}

fn print_mine<W: Write>(summary: &MineSummary, verbose: bool, writer: &mut W) {
    let headline = format!(
        "Mined {} {}, {} {}, {} {}",
        summary.table_count,
        plural(summary.table_count, "table", "tables"),
        summary.relationship_count,
        plural(summary.relationship_count, "relationship", "relationships"),
        summary.measure_count,
        plural(summary.measure_count, "measure", "measures"),
    );
    let _ = writeln!(writer, "{} {}", SUCCESS_MARK.green(), headline.green());
    let _ = writeln!(
        writer,
        "  Report: {} {}, {} {}",
        summary.page_count,
        plural(summary.page_count, "page", "pages"),
        summary.visual_count,
        plural(summary.visual_count, "visual", "visuals"),
    );
    if verbose {
        let _ = writeln!(
            writer,
            "  Sources: {} {}, {} {}",
            summary.connection_count,
            plural(summary.connection_count, "connection", "connections"),
            summary.role_count,
            plural(summary.role_count, "role", "roles"),
        );
    }
    let _ = writeln!(
        writer,
        "  Model document: {}",
        summary.model_output.display()
    );
    let _ = writeln!(writer, "  Measure CSV: {}", summary.csv_output.display());

    if !summary.delete_candidates.is_empty() {
        let _ = writeln!(
            writer,
            "{}",
            format!(
                "Warning: {} {} with no dependents and no visual usage:",
                summary.delete_candidates.len(),
                plural(summary.delete_candidates.len(), "measure", "measures"),
            )
            .yellow()
        );
        for candidate in &summary.delete_candidates {
            let _ = writeln!(writer, "  {}", candidate.yellow());
        }
    }

    if summary.skipped_count > 0 {
        let _ = writeln!(
            writer,
            "{} {}",
            FAILURE_MARK.red(),
            format!(
                "{} {} skipped; the model document may be incomplete",
                summary.skipped_count,
                plural(summary.skipped_count, "path was", "paths were"),
            )
            .red()
        );
    }
}

fn print_init<W: Write>(summary: &InitSummary, writer: &mut W) {
    if summary.created {
        let _ = writeln!(
            writer,
            "{} {}",
            SUCCESS_MARK.green(),
            format!("Created {}", CONFIG_FILE_NAME).green()
        );
    }
}

fn plural<'a>(count: usize, one: &'a str, many: &'a str) -> &'a str {
    if count == 1 { one } else { many }
}

#[cfg(test)]
mod tests {
    use crate::cli::exit_status::ExitStatus;

    use super::*;

    fn summary() -> MineSummary {
        MineSummary {
            table_count: 2,
            relationship_count: 1,
            measure_count: 3,
            connection_count: 1,
            role_count: 0,
            page_count: 1,
            visual_count: 4,
            delete_candidates: vec!["M002 (Old KPI)".to_string()],
            skipped_count: 0,
            model_output: "model_structure.json".into(),
            csv_output: "measures_for_ai.csv".into(),
        }
    }

    #[test]
    fn test_mine_summary_lists_delete_candidates() {
        colored::control::set_override(false);
        let result = CommandResult {
            summary: CommandSummary::Mine(summary()),
            status: ExitStatus::Success,
        };
        let mut out = Vec::new();
        print_to(&result, false, &mut out);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Mined 2 tables, 1 relationship, 3 measures"));
        assert!(text.contains("M002 (Old KPI)"));
        assert!(!text.contains("Sources:"));
    }

    #[test]
    fn test_verbose_adds_source_counts() {
        colored::control::set_override(false);
        let result = CommandResult {
            summary: CommandSummary::Mine(summary()),
            status: ExitStatus::Success,
        };
        let mut out = Vec::new();
        print_to(&result, true, &mut out);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Sources: 1 connection, 0 roles"));
    }

    #[test]
    fn test_skipped_paths_are_reported() {
        colored::control::set_override(false);
        let result = CommandResult {
            summary: CommandSummary::Mine(MineSummary {
                skipped_count: 2,
                delete_candidates: vec![],
                ..summary()
            }),
            status: ExitStatus::Failure,
        };
        let mut out = Vec::new();
        print_to(&result, false, &mut out);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("2 paths were skipped"));
    }
}
