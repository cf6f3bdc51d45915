//! Application configuration
//!
//! Settings come from a TOML file (`todo.toml` in the working directory, or the
//! path given with `--config`). Every key is optional; command line flags are
//! applied on top by the binary.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration file looked up in the working directory when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "todo.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// JSON document holding all todos
    pub data_file: PathBuf,
    /// Directory under which each todo gets its own folder
    pub folders_dir: PathBuf,
    /// Number of rotated backups kept next to the data file
    pub backup_count: usize,
    /// Maximum title length in characters (after trimming)
    pub max_title_length: usize,
    /// Hour used when a due date is given without a time (e.g. "tomorrow")
    pub default_due_hour: u32,
    /// Commit the data file to its git repository after each save
    pub sync_git: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from("data").join("todos.json"),
            folders_dir: PathBuf::from("todo_folders"),
            backup_count: 5,
            max_title_length: 100,
            default_due_hour: 18,
            sync_git: false,
        }
    }
}

impl AppConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(content).context("Invalid configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from an explicit file; the file must exist
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to load config file {}", path.display()))
    }

    /// Load `path` if given, otherwise `todo.toml` when present, otherwise defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.is_file() {
                    Self::load(default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    fn validate(&self) -> Result<()> {
        if self.default_due_hour > 23 {
            anyhow::bail!(
                "default_due_hour must be between 0 and 23 (got {})",
                self.default_due_hour
            );
        }
        if self.max_title_length == 0 {
            anyhow::bail!("max_title_length must be at least 1");
        }
        Ok(())
    }
}
