use std::path::{Path, PathBuf};

pub const DEFAULT_EXTENSION: &str = "csv";

/// Where table files live and how bare table names map onto them.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub data_dir: PathBuf,
    pub extension: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            extension: DEFAULT_EXTENSION.to_string(),
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    pub fn with_extension(mut self, extension: &str) -> Self {
        self.extension = extension.trim_start_matches('.').to_string();
        self
    }

    /// Canonical table name: the bare name with the extension appended once.
    pub fn canonical_name(&self, table: &str) -> String {
        let suffix = format!(".{}", self.extension);
        if table.ends_with(&suffix) {
            table.to_string()
        } else {
            format!("{}{}", table, suffix)
        }
    }

    /// Path of the backing file for a canonical table name.
    pub fn table_path(&self, canonical: &str) -> PathBuf {
        let path = Path::new(canonical);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.data_dir.join(path)
        }
    }
}
