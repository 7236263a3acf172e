//! File layer behind the managers.

use crate::error::StorageError;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

pub trait Storage: Send + Sync {
    fn make_dir(&self, path: &Path) -> Result<(), StorageError>;

    /// Copy `src` into `dir`, keeping its file name; returns the stored path.
    /// A `src` already stored there is left untouched.
    fn copy(&self, src: &Path, dir: &Path) -> Result<PathBuf, StorageError>;

    fn delete(&self, file: &Path) -> Result<(), StorageError>;

    /// Regular files directly inside `dir`
    fn list_files(&self, dir: &Path) -> Result<BTreeSet<PathBuf>, StorageError>;

    fn remove_dir(&self, dir: &Path) -> Result<(), StorageError>;
}

/// Local filesystem storage
#[derive(Debug, Default, Clone)]
pub struct FsStorage;

fn io_err(op: &'static str, path: &Path) -> impl FnOnce(std::io::Error) -> StorageError {
    let path = path.to_path_buf();
    move |source| StorageError::Io { op, path, source }
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

impl Storage for FsStorage {
    fn make_dir(&self, path: &Path) -> Result<(), StorageError> {
        std::fs::create_dir_all(path).map_err(io_err("create", path))
    }

    fn copy(&self, src: &Path, dir: &Path) -> Result<PathBuf, StorageError> {
        let name = src
            .file_name()
            .ok_or_else(|| StorageError::NoFileName(src.to_path_buf()))?;
        let dest = dir.join(name);
        if same_file(src, &dest) {
            return Ok(dest);
        }
        std::fs::copy(src, &dest).map_err(io_err("copy", src))?;
        Ok(dest)
    }

    fn delete(&self, file: &Path) -> Result<(), StorageError> {
        std::fs::remove_file(file).map_err(io_err("delete", file))
    }

    fn list_files(&self, dir: &Path) -> Result<BTreeSet<PathBuf>, StorageError> {
        let entries = std::fs::read_dir(dir).map_err(io_err("list", dir))?;
        Ok(entries
            .flatten()
            .map(|e| e.path())
            .filter(|p| p.is_file())
            .collect())
    }

    fn remove_dir(&self, dir: &Path) -> Result<(), StorageError> {
        match std::fs::remove_dir_all(dir) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            other => other.map_err(io_err("remove", dir)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_list_delete() {
        let src_dir = tempfile::tempdir().unwrap();
        let store = tempfile::tempdir().unwrap();
        let src = src_dir.path().join("lib.jar");
        std::fs::write(&src, b"jar").unwrap();

        let storage = FsStorage;
        let stored = storage.copy(&src, store.path()).unwrap();
        assert_eq!(stored, store.path().join("lib.jar"));
        assert_eq!(storage.list_files(store.path()).unwrap().len(), 1);

        storage.delete(&stored).unwrap();
        assert!(storage.list_files(store.path()).unwrap().is_empty());
        assert!(matches!(
            storage.delete(&stored),
            Err(StorageError::Io { op: "delete", .. })
        ));
    }

    #[test]
    fn test_copy_into_own_directory_keeps_bytes() {
        let store = tempfile::tempdir().unwrap();
        let file = store.path().join("lib.jar");
        std::fs::write(&file, b"jar bytes").unwrap();

        // same file reached through a different spelling
        let via_dot = store.path().join(".").join("lib.jar");
        let stored = FsStorage.copy(&via_dot, store.path()).unwrap();

        assert_eq!(stored, file);
        assert_eq!(std::fs::read(&file).unwrap(), b"jar bytes");
    }

    #[test]
    fn test_delete_missing_is_not_found() {
        let store = tempfile::tempdir().unwrap();
        let err = FsStorage.delete(&store.path().join("gone.jar")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_remove_missing_dir_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        assert!(FsStorage.remove_dir(&dir.path().join("gone")).is_ok());
    }
}
