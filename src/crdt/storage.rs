//! Durable byte storage for CRDT documents.
//!
//! Each document is stored as `<storage_id>.automerge` in the data
//! directory, where the storage id is derived from the scope name. The
//! storage layer only moves bytes; document parsing happens in the manager.

use std::fs;
use std::io;
use std::path::PathBuf;

use super::doc_name::DocName;

/// File extension for persisted documents.
const DOC_EXTENSION: &str = "automerge";

/// Filesystem storage for document bytes, keyed by scope name.
#[derive(Clone, Debug)]
pub struct DocStorage {
    data_dir: PathBuf,
}

impl DocStorage {
    /// Creates a new storage instance with a custom data directory.
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    /// Returns the data directory path.
    pub fn data_dir(&self) -> &PathBuf {
        &self.data_dir
    }

    /// Returns the full path for a document.
    pub fn doc_path(&self, name: &DocName) -> PathBuf {
        self.data_dir
            .join(format!("{}.{}", name.storage_id(), DOC_EXTENSION))
    }

    /// Checks if a document exists on disk.
    pub fn exists(&self, name: &DocName) -> bool {
        self.doc_path(name).exists()
    }

    /// Loads a document's bytes from disk.
    ///
    /// Returns `Ok(None)` if the file doesn't exist.
    pub fn load(&self, name: &DocName) -> Result<Option<Vec<u8>>, StorageError> {
        let path = self.doc_path(name);

        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::IoError(path, e)),
        }
    }

    /// Saves a document's bytes to disk.
    ///
    /// Creates the data directory if it doesn't exist.
    pub fn save(&self, name: &DocName, bytes: &[u8]) -> Result<(), StorageError> {
        fs::create_dir_all(&self.data_dir)
            .map_err(|e| StorageError::IoError(self.data_dir.clone(), e))?;

        let path = self.doc_path(name);
        fs::write(&path, bytes).map_err(|e| StorageError::IoError(path, e))?;

        Ok(())
    }

    /// Deletes a document's durable bytes.
    ///
    /// Returns `Ok(true)` if the file was deleted, `Ok(false)` if it didn't
    /// exist.
    pub fn delete(&self, name: &DocName) -> Result<bool, StorageError> {
        let path = self.doc_path(name);

        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::IoError(path, e)),
        }
    }

    /// Lists the storage ids of every persisted document.
    pub fn list(&self) -> Result<Vec<String>, StorageError> {
        let entries = match fs::read_dir(&self.data_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::IoError(self.data_dir.clone(), e)),
        };

        let mut ids = Vec::new();

        for entry in entries {
            let entry = entry.map_err(|e| StorageError::IoError(self.data_dir.clone(), e))?;
            let path = entry.path();

            if !path.is_file() {
                continue;
            }

            if path.extension().and_then(|s| s.to_str()) != Some(DOC_EXTENSION) {
                continue;
            }

            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                ids.push(stem.to_string());
            }
        }

        Ok(ids)
    }
}

/// Errors that can occur during document storage operations.
#[derive(Debug)]
pub enum StorageError {
    /// I/O error reading or writing a file.
    IoError(PathBuf, io::Error),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::IoError(path, e) => {
                write!(f, "I/O error for {}: {}", path.display(), e)
            }
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::IoError(_, e) => Some(e),
        }
    }
}
