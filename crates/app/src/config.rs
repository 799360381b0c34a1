use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "contabia.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Where the database lives. Defaults to the platform data directory.
    pub data_dir: Option<PathBuf>,
    pub database: String,
    /// `tracing` filter used when `RUST_LOG` is unset.
    pub log_filter: String,
    pub import: ImportConfig,
    pub deadlines: DeadlinesConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            data_dir: None,
            database: "ledger.db".to_string(),
            log_filter: "info".to_string(),
            import: ImportConfig::default(),
            deadlines: DeadlinesConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Single-byte CSV delimiter.
    pub delimiter: char,
    /// Assign each ledger entry to at most one statement row per import.
    pub exclusive_matching: bool,
}

impl Default for ImportConfig {
    fn default() -> Self {
        ImportConfig {
            delimiter: ';',
            exclusive_matching: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeadlinesConfig {
    pub window_days: i64,
}

impl Default for DeadlinesConfig {
    fn default() -> Self {
        DeadlinesConfig {
            window_days: contabia_tax::DEFAULT_WINDOW_DAYS,
        }
    }
}

impl AppConfig {
    /// Reads `path` if it exists; a missing file yields the defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(AppConfig::default());
        }
        let raw = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(raw)?;
        if !config.import.delimiter.is_ascii() {
            anyhow::bail!("import.delimiter must be a single ASCII character");
        }
        Ok(config)
    }

    pub fn data_dir(&self) -> anyhow::Result<PathBuf> {
        if let Some(dir) = &self.data_dir {
            return Ok(dir.clone());
        }
        let dirs = directories::ProjectDirs::from("br", "contabia", "Contabia")
            .context("no home directory to place the data directory in")?;
        Ok(dirs.data_dir().to_path_buf())
    }

    pub fn database_path(&self) -> anyhow::Result<PathBuf> {
        Ok(self.data_dir()?.join(&self.database))
    }

    pub fn delimiter(&self) -> u8 {
        self.import.delimiter as u8
    }
}
