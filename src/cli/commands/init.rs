use std::{fs, path::Path};

use anyhow::Result;

use crate::{
    cli::{
        commands::{CommandResult, CommandSummary, InitSummary},
        exit_status::ExitStatus,
    },
    config::{CONFIG_FILE_NAME, default_config_json},
};

/// Writes a default `.pbiminerc.json` into the current directory.
pub fn init() -> Result<CommandResult> {
    let config_path = Path::new(CONFIG_FILE_NAME);
    if config_path.exists() {
        anyhow::bail!("{} already exists", CONFIG_FILE_NAME);
    }

    fs::write(config_path, default_config_json()?)?;

    Ok(CommandResult {
        summary: CommandSummary::Init(InitSummary { created: true }),
        status: ExitStatus::Success,
    })
}
