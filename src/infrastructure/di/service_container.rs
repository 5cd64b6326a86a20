//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::path::Path;
use std::sync::Arc;

use crate::application::services::{ProjectScanner, Session, StructureReader};
use crate::application::ApplicationResult;
use crate::config::Settings;
use crate::infrastructure::parser::JavaLikeParser;
use crate::infrastructure::traits::{FileSystem, RealFileSystem, SourceParser};

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,

    /// Source parser
    pub parser: Arc<dyn SourceParser>,

    reader: Arc<StructureReader>,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings) -> Self {
        Self::with_deps(
            settings,
            Arc::new(RealFileSystem),
            Arc::new(JavaLikeParser::new()),
        )
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(
        settings: Settings,
        fs: Arc<dyn FileSystem>,
        parser: Arc<dyn SourceParser>,
    ) -> Self {
        let settings = Arc::new(settings);
        let reader = Arc::new(StructureReader::new(fs.clone(), parser.clone(), &settings));

        Self {
            settings,
            fs,
            parser,
            reader,
        }
    }

    pub fn reader(&self) -> Arc<StructureReader> {
        self.reader.clone()
    }

    pub fn scanner(&self) -> ProjectScanner {
        ProjectScanner::new(
            self.fs.clone(),
            self.reader.clone(),
            self.settings.modules.clone(),
        )
    }

    /// Scan `project_dir` and open a session on it.
    pub fn open_session(&self, project_dir: &Path) -> ApplicationResult<Session> {
        Session::open(project_dir, self.scanner(), self.reader())
    }
}
