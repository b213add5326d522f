//! Directory-backed implementations of the loader and storage seams.

use log::debug;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::{DataStorage, SalvageLoader};

#[derive(Debug, Error)]
#[error("{action} {}", path.display())]
pub struct StoreError {
    pub action: &'static str,
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

impl StoreError {
    fn new(action: &'static str, path: &Path, source: io::Error) -> Self {
        Self {
            action,
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Reads salvage files from one directory. Missing files are `None`.
#[derive(Debug, Clone)]
pub struct DirectoryLoader {
    root: PathBuf,
}

impl DirectoryLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl SalvageLoader for DirectoryLoader {
    type Error = StoreError;

    fn load_bytes(&self, name: &Path) -> Result<Option<Vec<u8>>, Self::Error> {
        let path = self.root.join(name);
        match fs::read(&path) {
            Ok(bytes) => {
                debug!("read {} bytes from {}", bytes.len(), path.display());
                Ok(Some(bytes))
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(StoreError::new("failed to read", &path, err)),
        }
    }
}

/// Reads and writes binary files relative to a directory. Absolute names
/// bypass the directory.
#[derive(Debug, Clone)]
pub struct DirectoryStorage {
    root: PathBuf,
}

impl DirectoryStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl DataStorage for DirectoryStorage {
    type Error = StoreError;

    fn read(&self, name: &Path) -> Result<Vec<u8>, Self::Error> {
        let path = self.root.join(name);
        fs::read(&path).map_err(|err| StoreError::new("failed to read", &path, err))
    }

    fn write(&self, name: &Path, data: &[u8]) -> Result<(), Self::Error> {
        let path = self.root.join(name);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|err| StoreError::new("failed to create", parent, err))?;
        }
        fs::write(&path, data).map_err(|err| StoreError::new("failed to write", &path, err))?;
        debug!("wrote {} bytes to {}", data.len(), path.display());
        Ok(())
    }
}
