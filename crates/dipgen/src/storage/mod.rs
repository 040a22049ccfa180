use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::StorageError;

/// Writes output documents below one directory. Each file is written to a
/// hidden sibling first and renamed into place, replacing any earlier copy.
pub struct FileStorage {
    output_directory: PathBuf,
}

impl FileStorage {
    pub fn new<P: AsRef<Path>>(output_directory: P) -> Self {
        Self {
            output_directory: output_directory.as_ref().to_path_buf(),
        }
    }

    pub fn store(&self, filename: &str, content: &[u8]) -> Result<PathBuf, StorageError> {
        ensure_directory(&self.output_directory)?;

        let final_path = self.output_directory.join(filename);
        let partial_path = self.output_directory.join(format!(".{}.partial", filename));

        let write = || -> std::io::Result<()> {
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&partial_path)?;
            file.write_all(content)?;
            file.sync_all()
        };
        write().map_err(|e| StorageError::WriteFile {
            path: partial_path.clone(),
            source: e,
        })?;

        std::fs::rename(&partial_path, &final_path).map_err(|e| StorageError::WriteFile {
            path: final_path.clone(),
            source: e,
        })?;

        Ok(final_path)
    }
}

pub fn ensure_directory(path: &Path) -> Result<(), StorageError> {
    if !path.exists() {
        std::fs::create_dir_all(path).map_err(|e| StorageError::CreateDirectory {
            path: path.to_path_buf(),
            source: e,
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_store_file() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path().join("metadata"));

        let path = storage.store("METS.xml", b"<mets/>").unwrap();

        assert_eq!(path, temp_dir.path().join("metadata/METS.xml"));
        assert_eq!(std::fs::read(&path).unwrap(), b"<mets/>");
    }

    #[test]
    fn test_store_replaces_previous_copy() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path());

        storage.store("ms1.xml", b"first run, much longer content").unwrap();
        let path = storage.store("ms1.xml", b"second").unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"second");
        assert!(!temp_dir.path().join(".ms1.xml.partial").exists());
    }

    #[test]
    fn test_create_nested_directories() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("data/ms1/Box_1/Folder_2");

        ensure_directory(&nested).unwrap();
        ensure_directory(&nested).unwrap();
        assert!(nested.is_dir());
    }
}
