use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Ok, Result};
use glob::Pattern;
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE_NAME: &str = ".pbiminerc.json";

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Project name forwarded to the publishing collaborator.
    #[serde(default)]
    pub project_name: String,
    /// Whether the publishing step may call an AI enrichment collaborator
    /// to describe measures. The miner itself never uses it.
    #[serde(default)]
    pub use_ai_enrichment: bool,
    /// Paths/globs excluded from the project scan.
    #[serde(default)]
    pub ignores: Vec<String>,
    #[serde(default = "default_model_output")]
    pub model_output: String,
    #[serde(default = "default_csv_output")]
    pub csv_output: String,
}

fn default_model_output() -> String {
    "model_structure.json".to_string()
}

fn default_csv_output() -> String {
    "measures_for_ai.csv".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            project_name: String::new(),
            use_ai_enrichment: false,
            ignores: Vec::new(),
            model_output: default_model_output(),
            csv_output: default_csv_output(),
        }
    }
}

impl Config {
    /// Validate configuration values.
    ///
    /// Returns an error if any glob patterns in `ignores` are invalid.
    /// Patterns without wildcards are literal directory paths and always
    /// pass.
    pub fn validate(&self) -> Result<()> {
        for pattern in &self.ignores {
            if pattern.contains('*') || pattern.contains('?') {
                Pattern::new(pattern).with_context(|| {
                    format!("Invalid glob pattern in 'ignores': \"{}\"", pattern)
                })?;
            }
        }
        Ok(())
    }
}

pub fn default_config_json() -> Result<String> {
    let config = Config::default();
    serde_json::to_string_pretty(&config).context("Failed to generate default config.")
}

pub fn find_config_file(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();

    loop {
        let config_path = current.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            return Some(config_path);
        }
        if current.join(".git").exists() {
            return None;
        }
        if !current.pop() {
            return None;
        }
    }
}

/// Result of loading configuration.
pub struct ConfigLoadResult {
    pub config: Config,
    /// True if config was loaded from a file, false if using defaults.
    pub from_file: bool,
}

pub fn load_config(start_dir: &Path) -> Result<ConfigLoadResult> {
    match find_config_file(start_dir) {
        Some(path) => {
            let content = fs::read_to_string(&path)?;
            let config: Config = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?;
            config.validate()?;
            Ok(ConfigLoadResult {
                config,
                from_file: true,
            })
        }
        None => Ok(ConfigLoadResult {
            config: Config::default(),
            from_file: false,
        }),
    }
}
