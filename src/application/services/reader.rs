//! Structure reader service
//!
//! Turns a path on disk into an [`Entry`]: directories become packages,
//! supported source files go through the parser, everything else is skipped.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::application::{ApplicationResult, IoResultExt};
use crate::config::Settings;
use crate::domain::{Entry, EntryKind};
use crate::infrastructure::traits::{FileSystem, SourceParser};
use crate::util::path::PathExt;

/// Service reading project structure through the filesystem and parser seams.
pub struct StructureReader {
    fs: Arc<dyn FileSystem>,
    parser: Arc<dyn SourceParser>,
    supported_extensions: Vec<String>,
    excluded_dirs: Vec<String>,
}

impl StructureReader {
    pub fn new(fs: Arc<dyn FileSystem>, parser: Arc<dyn SourceParser>, settings: &Settings) -> Self {
        Self {
            fs,
            parser,
            supported_extensions: settings.supported_extensions.clone(),
            excluded_dirs: settings.excluded_dirs.clone(),
        }
    }

    /// Whether `path` names a file the parser understands.
    pub fn is_supported(&self, path: &Path) -> bool {
        path.has_supported_extension(&self.supported_extensions)
    }

    /// Entry for `path`, or `None` when it is an excluded directory or
    /// neither a directory nor a readable, parseable source file.
    #[instrument(level = "debug", skip(self, path), fields(path = %path.display()))]
    pub fn read(&self, path: &Path) -> Option<Entry> {
        if self.is_excluded(path) {
            return None;
        }
        if self.fs.is_dir(path) {
            return match self.read_children(path) {
                Ok(nested) => Some(Entry::aggregate(
                    EntryKind::Package,
                    path.file_name_lossy(),
                    nested,
                )),
                Err(e) => {
                    warn!("skipping directory: {}", e);
                    None
                }
            };
        }

        if !self.fs.is_file(path) {
            debug!("no such file");
            return None;
        }
        if !self.is_supported(path) {
            debug!("unsupported file kind");
            return None;
        }

        let contents = match self.fs.read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                debug!("unreadable source: {}", e);
                return None;
            }
        };
        let entry = self.parser.parse(&path.file_name_lossy(), &contents);
        if entry.is_none() {
            debug!("parser rejected contents");
        }
        entry
    }

    /// Entries of the readable children of `dir`, sorted by file name,
    /// excluded directories skipped.
    pub fn read_children(&self, dir: &Path) -> ApplicationResult<Vec<Entry>> {
        let children = self
            .fs
            .list_dir(dir)
            .with_path_context("list directory", dir)?;

        Ok(children.iter().filter_map(|child| self.read(child)).collect())
    }

    fn is_excluded(&self, path: &Path) -> bool {
        let name = path.file_name_lossy();
        let excluded = self.fs.is_dir(path) && self.excluded_dirs.iter().any(|d| *d == name);
        if excluded {
            debug!("excluded directory {}", path.display());
        }
        excluded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Count;
    use crate::infrastructure::parser::JavaLikeParser;
    use crate::infrastructure::traits::RealFileSystem;
    use std::fs;
    use tempfile::TempDir;

    fn reader() -> StructureReader {
        StructureReader::new(
            Arc::new(RealFileSystem),
            Arc::new(JavaLikeParser::new()),
            &Settings::default(),
        )
    }

    #[test]
    fn given_directory_when_reading_then_builds_sorted_package() {
        let tmp = TempDir::new().unwrap();
        let pkg = tmp.path().join("pkg");
        fs::create_dir_all(pkg.join("target")).unwrap();
        fs::write(pkg.join("target/Gen.java"), "class Gen { void g() {} }").unwrap();
        fs::write(pkg.join("B.java"), "class B { void x() {} void y() {} }").unwrap();
        fs::write(pkg.join("A.java"), "class A { void z() {} }").unwrap();
        fs::write(pkg.join("notes.txt"), "class Nope {}").unwrap();

        let entry = reader().read(&pkg).unwrap();

        assert_eq!(entry.kind, EntryKind::Package);
        assert_eq!(entry.name, "pkg");
        let names: Vec<&str> = entry.nested.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["A.java", "B.java"]);
        assert_eq!(entry.count(), Count::new(2, 3));
    }

    #[test]
    fn given_excluded_directory_when_reading_it_directly_then_none() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("target");
        fs::create_dir_all(&target).unwrap();
        fs::write(target.join("Gen.java"), "class Gen { void g() {} }").unwrap();

        assert!(reader().read(&target).is_none());
    }

    #[test]
    fn given_unsupported_or_missing_file_when_reading_then_none() {
        let tmp = TempDir::new().unwrap();
        let txt = tmp.path().join("notes.txt");
        fs::write(&txt, "hello").unwrap();

        assert!(reader().read(&txt).is_none());
        assert!(reader().read(&tmp.path().join("Gone.java")).is_none());
    }

    #[test]
    fn given_non_utf8_source_when_reading_then_none() {
        let tmp = TempDir::new().unwrap();
        let bad = tmp.path().join("Bad.java");
        fs::write(&bad, [0xff, 0xfe, 0x00, 0x63]).unwrap();

        assert!(reader().read(&bad).is_none());
    }
}
