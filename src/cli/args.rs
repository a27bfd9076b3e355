//! CLI argument definitions using clap.
//!
//! ## Commands
//!
//! - `mine`: Mine a Power BI project tree into a model document
//! - `init`: Initialize the configuration file

use std::path::PathBuf;

use clap::{Args, CommandFactory, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Arguments {
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Arguments {
    /// Check if a command was provided, otherwise print help and return None.
    pub fn with_command_or_help(self) -> Option<Self> {
        if self.command.is_none() {
            Self::command().print_help().ok();
            None
        } else {
            Some(self)
        }
    }

    pub fn verbose(&self) -> bool {
        match &self.command {
            Some(Command::Mine(cmd)) => cmd.args.verbose,
            Some(Command::Init) | None => false,
        }
    }
}

#[derive(Debug, Parser)]
pub struct MineArgs {
    /// Power BI project root (the directory holding *.SemanticModel / *.Report)
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Where to write the model document (overrides config file)
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Where to write the flattened measure CSV (overrides config file)
    #[arg(long)]
    pub csv_output: Option<PathBuf>,

    /// Project name forwarded to the publishing step (overrides config file)
    #[arg(long, env = "PBIMINE_PROJECT_NAME")]
    pub project_name: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Args)]
pub struct MineCommand {
    #[command(flatten)]
    pub args: MineArgs,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Mine a Power BI project into model_structure.json and a measure CSV
    Mine(MineCommand),
    /// Initialize a new .pbiminerc.json configuration file
    Init,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mine_defaults() {
        let args = Arguments::parse_from(["pbimine", "mine"]);
        let Some(Command::Mine(cmd)) = args.command else {
            panic!("expected mine command");
        };
        assert_eq!(cmd.args.path, PathBuf::from("."));
        assert!(cmd.args.output.is_none());
        assert!(!cmd.args.verbose);
    }

    #[test]
    fn test_mine_overrides() {
        let args = Arguments::parse_from([
            "pbimine",
            "mine",
            "projects/hub",
            "--output",
            "out.json",
            "--project-name",
            "HUB",
            "-v",
        ]);
        assert!(args.verbose());
        let Some(Command::Mine(cmd)) = args.command else {
            panic!("expected mine command");
        };
        assert_eq!(cmd.args.path, PathBuf::from("projects/hub"));
        assert_eq!(cmd.args.output, Some(PathBuf::from("out.json")));
        assert_eq!(cmd.args.project_name.as_deref(), Some("HUB"));
    }

    #[test]
    fn test_no_command_yields_help() {
        let args = Arguments::parse_from(["pbimine"]);
        assert!(!args.verbose());
        assert!(args.with_command_or_help().is_none());
    }
}
