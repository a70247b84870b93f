//! Configuration loading and parsing

use anyhow::{bail, Context, Result};
use possession_markov::{ChainConfig, RegistryScope};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main application configuration (loaded from config.toml)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub chain: ChainConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct InputConfig {
    /// Match event files
    #[serde(default)]
    pub files: Vec<PathBuf>,
    /// Directory scanned for `*.json` match files
    pub events_dir: Option<PathBuf>,
    /// Reference team id
    pub team_id: Option<u64>,
    /// Reference team name, resolved against the loaded events
    pub team: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ModelConfig {
    /// States indexing the estimated matrix
    #[serde(default)]
    pub registry: RegistryScope,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
    /// Write the dense smoothed matrix
    #[serde(default = "default_true")]
    pub matrix: bool,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("outputs")
}

fn default_true() -> bool {
    true
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            matrix: true,
        }
    }
}

impl InputConfig {
    /// Explicit files followed by the sorted `*.json` files of `events_dir`
    pub fn collect_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = self.files.clone();

        if let Some(dir) = &self.events_dir {
            let entries = fs::read_dir(dir)
                .with_context(|| format!("Failed to read events directory: {:?}", dir))?;
            let mut found = Vec::new();
            for entry in entries {
                let path = entry
                    .with_context(|| format!("Failed to list events directory: {:?}", dir))?
                    .path();
                let is_json = path
                    .extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case("json"));
                if path.is_file() && is_json {
                    found.push(path);
                }
            }
            found.sort();
            log::debug!("Found {} event files in {:?}", found.len(), dir);
            files.extend(found);
        }

        if files.is_empty() {
            bail!("No event files given (use --events or --events-dir)");
        }
        Ok(files)
    }
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    Ok(config)
}
