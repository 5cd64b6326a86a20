//! Project scanner service
//!
//! Builds the base entry for a whole project: a module named after the
//! project directory holding one module per configured module directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::application::services::StructureReader;
use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{Entry, EntryKind};
use crate::infrastructure::traits::FileSystem;
use crate::util::path::PathExt;

pub struct ProjectScanner {
    fs: Arc<dyn FileSystem>,
    reader: Arc<StructureReader>,
    modules: Vec<String>,
}

impl ProjectScanner {
    pub fn new(fs: Arc<dyn FileSystem>, reader: Arc<StructureReader>, modules: Vec<String>) -> Self {
        Self { fs, reader, modules }
    }

    /// Scan `project_dir` into a root module entry.
    ///
    /// Without configured modules the project directory's own children are
    /// nested directly below the root. Configured modules that do not exist
    /// are skipped with a warning.
    #[instrument(level = "debug", skip(self, project_dir), fields(project = %project_dir.display()))]
    pub fn scan(&self, project_dir: &Path) -> ApplicationResult<Entry> {
        if !self.fs.exists(project_dir) {
            return Err(ApplicationError::ProjectNotFound(project_dir.to_path_buf()));
        }
        if !self.fs.is_dir(project_dir) {
            return Err(ApplicationError::NotADirectory(project_dir.to_path_buf()));
        }

        let nested = if self.modules.is_empty() {
            self.reader.read_children(project_dir)?
        } else {
            self.module_dirs(project_dir)
                .iter()
                .filter_map(|dir| self.read_module(dir))
                .collect()
        };

        let root = Entry::aggregate(EntryKind::Module, Self::project_name(project_dir), nested);
        info!(
            "scanned {}: {} classes, {} methods",
            root.name, root.class_count, root.function_count
        );
        Ok(root)
    }

    fn module_dirs(&self, project_dir: &Path) -> Vec<PathBuf> {
        self.modules.iter().map(|m| project_dir.join(m)).collect()
    }

    fn read_module(&self, dir: &Path) -> Option<Entry> {
        if !self.fs.is_dir(dir) {
            warn!("module directory not found: {}", dir.display());
            return None;
        }
        self.reader
            .read(dir)
            .map(|entry| entry.with_kind(EntryKind::Module))
    }

    fn project_name(project_dir: &Path) -> String {
        let name = project_dir.file_name_lossy();
        if name.is_empty() {
            project_dir.display().to_string()
        } else {
            name
        }
    }
}
