use std::path::PathBuf;

use anyhow::Result;

use crate::{
    cli::{
        args::MineCommand,
        commands::{CommandResult, CommandSummary, MineSummary},
        exit_status::ExitStatus,
    },
    config::load_config,
    core::{MeasureStatus, MineContext},
    export::{write_measures_csv, write_model_document},
};

/// Runs a full mine: load config, scan and mine the tree, write both
/// artifacts. CLI flags override config file values, which override
/// defaults.
pub fn mine(cmd: MineCommand) -> Result<CommandResult> {
    let args = cmd.args;

    let loaded = load_config(&args.path)?;
    let mut config = loaded.config;
    if args.verbose && loaded.from_file {
        eprintln!("Note: configuration loaded from file");
    }

    if let Some(name) = args.project_name {
        config.project_name = name;
    }
    let model_output = args
        .output
        .unwrap_or_else(|| PathBuf::from(&config.model_output));
    let csv_output = args
        .csv_output
        .unwrap_or_else(|| PathBuf::from(&config.csv_output));

    let ctx = MineContext::new(&args.path, config, args.verbose)?;
    let document = ctx.document();

    write_model_document(document, &model_output)?;
    write_measures_csv(&document.measures, &csv_output)?;

    let status = if ctx.skipped_count > 0 {
        ExitStatus::Failure
    } else {
        ExitStatus::Success
    };

    Ok(CommandResult {
        summary: CommandSummary::Mine(MineSummary {
            table_count: document.tables.len(),
            relationship_count: document.relationships.len(),
            measure_count: document.measures.len(),
            connection_count: document.connections.len(),
            role_count: document.roles.len(),
            page_count: document.report_structure.len(),
            visual_count: document.total_visuals(),
            delete_candidates: document
                .measures
                .iter()
                .filter(|m| m.status == MeasureStatus::DeleteCandidate)
                .map(|m| format!("{} ({})", m.global_id, m.name))
                .collect(),
            skipped_count: ctx.skipped_count,
            model_output,
            csv_output,
        }),
        status,
    })
}
