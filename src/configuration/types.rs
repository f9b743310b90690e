use clap::ValueEnum;
use serde::Deserialize;

/// Backend holding the key-value data.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// One JSON file per key under `storage_path`.
    #[default]
    File,
    /// Kept in process memory and lost on exit.
    Memory,
}
