//! Interfaces to the collaborators that inspect source files: listing a
//! directory with MIME types, and counting PDF pages.

use std::path::{Path, PathBuf};

use log::{debug, warn};
use walkdir::WalkDir;

use crate::config::canonical_mime;
use crate::error::DiscoveryError;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct DiscoveredFile {
    pub path: PathBuf,
    /// Canonical MIME type, `None` when it cannot be determined.
    pub mime_type: Option<String>,
}

impl DiscoveredFile {
    pub fn new(path: impl Into<PathBuf>, mime_type: Option<&str>) -> Self {
        Self {
            path: path.into(),
            mime_type: mime_type.map(canonical_mime),
        }
    }

    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|n| n.to_str())
    }
}

/// Lists the files directly inside a directory.
pub trait FileDiscovery {
    /// Files sorted by path. A missing directory yields an empty listing.
    fn list(&self, directory: &Path) -> Result<Vec<DiscoveredFile>, DiscoveryError>;
}

/// Filesystem listing with MIME types guessed from file extensions.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectoryDiscovery;

impl FileDiscovery for DirectoryDiscovery {
    fn list(&self, directory: &Path) -> Result<Vec<DiscoveredFile>, DiscoveryError> {
        if !directory.is_dir() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(directory)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| DiscoveryError::ScanFailed {
                path: directory.to_path_buf(),
                source: e,
            })?;
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.into_path();
            let mime = mime_guess::from_path(&path).first().map(|m| m.to_string());
            debug!("Found {} ({})", path.display(), mime.as_deref().unwrap_or("unknown"));
            files.push(DiscoveredFile::new(path, mime.as_deref()));
        }

        files.sort();
        Ok(files)
    }
}

/// Counts the pages of a PDF.
pub trait PageCounter {
    fn page_count(&self, path: &Path) -> Option<u32>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfPageCounter;

impl PageCounter for LopdfPageCounter {
    fn page_count(&self, path: &Path) -> Option<u32> {
        match lopdf::Document::load(path) {
            Ok(document) => u32::try_from(document.get_pages().len()).ok(),
            Err(e) => {
                warn!("Cannot count pages of {}: {}", path.display(), e);
                None
            }
        }
    }
}

/// Page counter for runs that do not need page counts.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPageCount;

impl PageCounter for NoPageCount {
    fn page_count(&self, _path: &Path) -> Option<u32> {
        None
    }
}
