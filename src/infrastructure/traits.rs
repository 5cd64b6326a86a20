//! I/O boundary traits for testability
//!
//! These traits abstract the collaborators the structure tree depends on:
//! reading the project from disk and turning source text into entries.
//! Services take them as trait objects so tests can substitute fakes.

use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::domain::Entry;

/// Filesystem abstraction for testability.
pub trait FileSystem: Send + Sync {
    /// Read file contents to string.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Check if path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Check if path is a file.
    fn is_file(&self, path: &Path) -> bool;

    /// Check if path is a directory.
    fn is_dir(&self, path: &Path) -> bool;

    /// Immediate children of a directory, sorted by file name.
    fn list_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>>;
}

/// Parser collaborator: turns the contents of one source file into an entry.
///
/// Returns `None` when the contents cannot be understood; callers drop the
/// triggering event in that case.
pub trait SourceParser: Send + Sync {
    /// Parse `contents` of the file called `file_name` into a source file entry.
    fn parse(&self, file_name: &str, contents: &str) -> Option<Entry>;
}

// ============================================================
// REAL IMPLEMENTATIONS
// ============================================================

/// Real filesystem implementation.
#[derive(Debug, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn list_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let mut children = Vec::new();
        for entry in WalkDir::new(path)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(io::Error::from)?;
            children.push(entry.into_path());
        }
        Ok(children)
    }
}
