//! Image collection provider: a folder or an explicit file list, fixed for
//! the lifetime of a session.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};

use crate::error::LibraryError;
use crate::format::format_file_size;

const SUPPORTED_EXTS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "bmp", "tif", "tiff"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageEntry {
    pub path: PathBuf,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageCollection {
    name: String,
    /// Folder the collection was scanned from; `None` for file lists.
    folder: Option<PathBuf>,
    entries: Vec<ImageEntry>,
}

/// What the settings screen shows about the current selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderSummary {
    pub name: String,
    pub items: usize,
    pub total_size: u64,
}

impl fmt::Display for FolderSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} items, {})",
            self.name,
            self.items,
            format_file_size(self.total_size)
        )
    }
}

/// Return `true` if `path` has a supported image extension.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| {
            let ext = ext.to_ascii_lowercase();
            SUPPORTED_EXTS.iter().any(|e| *e == ext)
        })
}

impl ImageCollection {
    /// Images directly inside `dir`, sorted by path. Subfolders and hidden
    /// files are not included.
    ///
    /// # Errors
    /// [`LibraryError::BadDir`] if `dir` is missing or not a directory,
    /// [`LibraryError::NoImages`] if nothing qualifies.
    pub fn from_folder(dir: &Path) -> Result<Self, LibraryError> {
        if !dir.is_dir() {
            return Err(LibraryError::BadDir(dir.display().to_string()));
        }

        let mut entries = Vec::new();
        for entry in WalkDir::new(dir)
            .max_depth(1)
            .into_iter()
            .filter_entry(|e| !is_hidden(e))
        {
            let entry = entry.map_err(|err| match err.into_io_error() {
                Some(io) => LibraryError::Io(io),
                None => LibraryError::BadDir(dir.display().to_string()),
            })?;
            let path = entry.path();
            if entry.file_type().is_file() && is_supported_image(path) {
                let size_bytes = entry.metadata().map(|m| m.len()).unwrap_or(0);
                entries.push(ImageEntry {
                    path: path.to_path_buf(),
                    size_bytes,
                });
            } else if entry.depth() > 0 {
                debug!(path = %path.display(), "skipping non-image entry");
            }
        }
        entries.sort_by(|a, b| a.path.cmp(&b.path));

        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| dir.display().to_string());
        if entries.is_empty() {
            return Err(LibraryError::NoImages(name));
        }
        info!(folder = %dir.display(), images = entries.len(), "scanned image folder");
        Ok(Self {
            name,
            folder: Some(dir.to_path_buf()),
            entries,
        })
    }

    /// An explicit selection of files. Anything that is not an existing image
    /// file is dropped; order is preserved.
    pub fn from_files<I>(name: impl Into<String>, paths: I) -> Result<Self, LibraryError>
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let name = name.into();
        let mut entries = Vec::new();
        for path in paths {
            if !is_supported_image(&path) {
                debug!(path = %path.display(), "skipping non-image file");
                continue;
            }
            match std::fs::metadata(&path) {
                Ok(meta) if meta.is_file() => entries.push(ImageEntry {
                    path,
                    size_bytes: meta.len(),
                }),
                _ => debug!(path = %path.display(), "skipping missing file"),
            }
        }
        if entries.is_empty() {
            return Err(LibraryError::NoImages(name));
        }
        Ok(Self {
            name,
            folder: None,
            entries,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn folder(&self) -> Option<&Path> {
        self.folder.as_deref()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ImageEntry> {
        self.entries.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ImageEntry> {
        self.entries.iter()
    }

    pub fn summary(&self) -> FolderSummary {
        FolderSummary {
            name: self.name.clone(),
            items: self.entries.len(),
            total_size: self.entries.iter().map(|e| e.size_bytes).sum(),
        }
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    // Never skip the root; tempfile roots can be dot-dirs.
    if entry.depth() == 0 {
        return false;
    }
    entry
        .file_name()
        .to_str()
        .is_some_and(|n| n.starts_with('.'))
}
