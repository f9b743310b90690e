use std::fs::{self, File};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use log::{debug, error, info};

use crate::error_handling::types::StorageError;
use crate::storage::storage_trait::KeyValueStore;

/// Environment variable overriding the directory used by [`FileStorage::new_default`].
pub const STORAGE_DIR_ENV: &str = "CLINIC_STORAGE_DIR";

/// Directory used when neither a path nor [`STORAGE_DIR_ENV`] is given.
pub const DEFAULT_STORAGE_DIR: &str = "./clinic-data";

/// Filesystem backend: every key is kept in `<base_path>/<key>.json`.
///
/// Values are written to a sibling temporary file first and renamed over the
/// old one, so a crash mid-write leaves the previous value in place.
pub struct FileStorage {
    base_path: PathBuf,
    write_lock: Mutex<()>, // serializes temp-file writes and renames
}

impl FileStorage {
    pub fn new<P: AsRef<Path>>(base_path: P) -> Result<Self, StorageError> {
        let base_path = base_path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path).map_err(|e| { error!("Failed to create storage dir {}: {}", base_path.display(), e); StorageError::WriteFailed })?;
        info!("FileStorage initialized at {}", base_path.display());

        Ok(Self {
            base_path,
            write_lock: Mutex::new(()),
        })
    }

    /// Construct FileStorage using env var CLINIC_STORAGE_DIR if set, otherwise `./clinic-data`.
    pub fn new_default() -> Result<Self, StorageError> {
        match std::env::var(STORAGE_DIR_ENV) {
            Ok(dir) if !dir.is_empty() => {
                info!("Using FileStorage from {}: {}", STORAGE_DIR_ENV, dir);
                Self::new(PathBuf::from(dir))
            }
            _ => Self::new(DEFAULT_STORAGE_DIR),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn key_file_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            error!("Rejected storage key {:?}", key);
            return Err(StorageError::WriteFailed);
        }
        Ok(self.base_path.join(format!("{}.json", key)))
    }
}

impl KeyValueStore for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.key_file_path(key)?;
        let mut content = String::new();
        match File::open(&path) {
            Ok(mut f) => {
                f.read_to_string(&mut content).map_err(|e| { error!("Failed to read {}: {}", path.display(), e); StorageError::ReadFailed })?;
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No file for key {} at {}", key, path.display());
                return Ok(None);
            }
            Err(e) => {
                error!("Failed to open {}: {}", path.display(), e);
                return Err(StorageError::ReadFailed);
            }
        }
        debug!("Read {} byte(s) from {}", content.len(), path.display());
        Ok(Some(content))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.key_file_path(key)?;
        let tmp = path.with_extension("json.tmp");
        let _guard = self.write_lock.lock().map_err(|e| { error!("FileStorage lock poisoned: {}", e); StorageError::ConnectionFailed })?;

        let mut f = File::create(&tmp).map_err(|e| { error!("Failed to create {}: {}", tmp.display(), e); StorageError::WriteFailed })?;
        f.write_all(value.as_bytes()).map_err(|e| { error!("Failed to write {}: {}", tmp.display(), e); StorageError::WriteFailed })?;
        f.sync_all().map_err(|e| { error!("Failed to sync {}: {}", tmp.display(), e); StorageError::WriteFailed })?;
        fs::rename(&tmp, &path).map_err(|e| { error!("Failed to move {} over {}: {}", tmp.display(), path.display(), e); StorageError::WriteFailed })?;

        debug!("Wrote {} byte(s) to {}", value.len(), path.display());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let path = self.key_file_path(key)?;
        let _guard = self.write_lock.lock().map_err(|e| { error!("FileStorage lock poisoned: {}", e); StorageError::ConnectionFailed })?;
        match fs::remove_file(&path) {
            Ok(()) => {
                info!("Removed {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => {
                error!("Failed to remove {}: {}", path.display(), e);
                Err(StorageError::WriteFailed)
            }
        }
    }
}
