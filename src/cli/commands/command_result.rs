use std::path::PathBuf;

use crate::cli::exit_status::ExitStatus;

/// Outcome of a CLI command, consumed by the reporter and the exit code.
pub struct CommandResult {
    pub summary: CommandSummary,
    pub status: ExitStatus,
}

pub enum CommandSummary {
    Mine(MineSummary),
    Init(InitSummary),
}

/// Counts and artifacts of a completed mine run.
pub struct MineSummary {
    pub table_count: usize,
    pub relationship_count: usize,
    pub measure_count: usize,
    pub connection_count: usize,
    pub role_count: usize,
    pub page_count: usize,
    pub visual_count: usize,
    /// `global_id (name)` of every measure flagged as a delete candidate.
    pub delete_candidates: Vec<String>,
    pub skipped_count: usize,
    pub model_output: PathBuf,
    pub csv_output: PathBuf,
}

pub struct InitSummary {
    pub created: bool,
}
