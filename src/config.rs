use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Environment variable overriding [`DataConfig::data_dir`].
pub const DATA_DIR_ENV: &str = "BIKESHARE_DATA_DIR";
/// Environment variable overriding [`DataConfig::format`].
pub const FORMAT_ENV: &str = "BIKESHARE_FORMAT";

/// On-disk format of the per-city trip files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    #[default]
    Csv,
    Parquet,
}

impl SourceFormat {
    /// File extension used by the city naming rule.
    pub fn extension(self) -> &'static str {
        match self {
            SourceFormat::Csv => "csv",
            SourceFormat::Parquet => "parquet",
        }
    }
}

/// Where city datasets live and how they are stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataConfig {
    pub data_dir: PathBuf,
    pub format: SourceFormat,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            format: SourceFormat::Csv,
        }
    }
}

impl DataConfig {
    pub fn new(data_dir: impl Into<PathBuf>, format: SourceFormat) -> Self {
        Self {
            data_dir: data_dir.into(),
            format,
        }
    }

    /// Defaults, overridden by `BIKESHARE_DATA_DIR` / `BIKESHARE_FORMAT` when set.
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Like [`DataConfig::from_env`], reading variables through `lookup`.
    /// An unrecognised format is logged and the default kept.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(dir) = lookup(DATA_DIR_ENV).filter(|dir| !dir.trim().is_empty()) {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(raw) = lookup(FORMAT_ENV) {
            match SourceFormat::from_str(raw.trim(), true) {
                Ok(format) => config.format = format,
                Err(_) => log::warn!("Ignoring {FORMAT_ENV}={raw:?}: expected csv or parquet"),
            }
        }
        config
    }
}
