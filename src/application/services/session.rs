//! Project session: scanner, dispatcher and the live tree for one project.

use std::path::{Path, PathBuf};
use std::sync::mpsc::Receiver;
use std::sync::Arc;

use tracing::{info, instrument};

use crate::application::services::{EventDispatcher, ProjectScanner, StructureReader};
use crate::application::{ApplicationResult, FsEvent};
use crate::domain::{StructureTree, TreeChange};

pub struct Session {
    project_dir: PathBuf,
    scanner: ProjectScanner,
    reader: Arc<StructureReader>,
    dispatcher: EventDispatcher,
}

impl Session {
    /// Scan `project_dir` and build the initial tree.
    #[instrument(level = "debug", skip(scanner, reader))]
    pub fn open(
        project_dir: &Path,
        scanner: ProjectScanner,
        reader: Arc<StructureReader>,
    ) -> ApplicationResult<Self> {
        let base = scanner.scan(project_dir)?;
        let tree = StructureTree::new(&base)?;
        let dispatcher = EventDispatcher::new(tree, reader.clone());
        Ok(Self {
            project_dir: project_dir.to_path_buf(),
            scanner,
            reader,
            dispatcher,
        })
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    pub fn tree(&self) -> &StructureTree {
        self.dispatcher.tree()
    }

    pub fn subscribe(&mut self) -> Receiver<TreeChange> {
        self.dispatcher.subscribe()
    }

    pub fn dispatch(&mut self, event: &FsEvent) -> ApplicationResult<()> {
        self.dispatcher.dispatch(event)
    }

    pub fn run(&mut self, events: Receiver<FsEvent>) -> ApplicationResult<usize> {
        self.dispatcher.run(events)
    }

    /// Throw the live tree away and rebuild it from a fresh scan.
    ///
    /// Observers of the old tree see their channel disconnect and have to
    /// subscribe again.
    #[instrument(level = "debug", skip(self))]
    pub fn refresh(&mut self) -> ApplicationResult<()> {
        let base = self.scanner.scan(&self.project_dir)?;
        let tree = StructureTree::new(&base)?;
        self.dispatcher = EventDispatcher::new(tree, self.reader.clone());
        info!("refreshed {}", self.project_dir.display());
        Ok(())
    }
}
