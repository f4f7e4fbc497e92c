use std::path::{Path, PathBuf};

use crate::config::{DataConfig, SourceFormat};

/// Identifies one city's backing data file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetDescriptor {
    city: String,
    path: PathBuf,
    format: SourceFormat,
}

impl DatasetDescriptor {
    /// City name as the caller typed it (trimmed).
    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> SourceFormat {
        self.format
    }

    /// Whether the backing file exists.
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }
}

/// Map a city name to its data file: lowercase, whitespace runs become `_`,
/// the configured extension is appended inside the data directory.
///
/// No I/O happens here; see [`exists`].
pub fn resolve(city: &str, config: &DataConfig) -> DatasetDescriptor {
    let city = city.trim();
    let stem = file_stem(city);
    let path = config
        .data_dir
        .join(format!("{stem}.{}", config.format.extension()));
    DatasetDescriptor {
        city: city.to_string(),
        path,
        format: config.format,
    }
}

/// Single existence check against the file system.
pub fn exists(descriptor: &DatasetDescriptor) -> bool {
    descriptor.exists()
}

fn file_stem(city: &str) -> String {
    city.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}
