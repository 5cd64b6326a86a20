//! Event dispatcher service
//!
//! Maps file-system notifications onto structure tree mutations. Every event
//! names its target only by the immediate parent directory and the file
//! name, so a directory move (create dir, copy each file, delete old dir)
//! can attach children to a different directory that happens to share the
//! name.
//!
//! The same lookup can resolve a parent directory to a method leaf, e.g. a
//! `src/test` directory when a class earlier in pre-order declares `test()`.
//! That is a contract violation: `dispatch` returns it and `run` stops the
//! whole stream there, leaving later events unapplied.

use std::path::Path;
use std::sync::mpsc::Receiver;
use std::sync::Arc;

use tracing::{debug, error, info, instrument};

use crate::application::services::StructureReader;
use crate::application::{ApplicationError, ApplicationResult, FileProperty, FsEvent};
use crate::domain::{DomainResult, StructureTree, TreeChange};
use crate::util::path::PathExt;

/// Owns the structure tree and applies events to it, one at a time.
pub struct EventDispatcher {
    tree: StructureTree,
    reader: Arc<StructureReader>,
}

impl EventDispatcher {
    pub fn new(tree: StructureTree, reader: Arc<StructureReader>) -> Self {
        Self { tree, reader }
    }

    pub fn tree(&self) -> &StructureTree {
        &self.tree
    }

    pub fn subscribe(&mut self) -> Receiver<TreeChange> {
        self.tree.subscribe()
    }

    /// Apply one event. Events the tree cannot take (unsupported kind,
    /// unreadable file, unknown parent) are dropped; only contract
    /// violations are returned as errors.
    #[instrument(level = "debug", skip(self, event), fields(event = %event))]
    pub fn dispatch(&mut self, event: &FsEvent) -> ApplicationResult<()> {
        let result = match event {
            FsEvent::Created { path } => self.create(path),
            FsEvent::Copied { source, new_path } => {
                if self.reader.is_supported(source) {
                    self.create(new_path)
                } else {
                    debug!("dropped: copy source has unsupported kind");
                    Ok(())
                }
            }
            FsEvent::Deleted { path } => self.delete(path),
            FsEvent::Moved { old_path, new_path } => {
                self.delete(old_path).and_then(|()| self.create(new_path))
            }
            FsEvent::ContentChanged { path } => {
                if self.reader.is_supported(path) {
                    self.update(path)
                } else {
                    debug!("dropped: unsupported kind");
                    Ok(())
                }
            }
            FsEvent::PropertyChanged {
                path,
                property: FileProperty::Name { old, new },
            } => match path.parent_name() {
                Some(parent) => self.tree.rename_node(&parent, old, new),
                None => Ok(()),
            },
            FsEvent::PropertyChanged { .. } => {
                debug!("ignored property change");
                Ok(())
            }
        };

        result.map_err(|e| {
            error!("event {} violates tree contract: {}", event, e);
            ApplicationError::from(e)
        })
    }

    /// Drain `events` on the calling thread until every sender is dropped.
    ///
    /// Stops at the first contract violation. Returns the number of events
    /// dispatched.
    #[instrument(level = "debug", skip_all)]
    pub fn run(&mut self, events: Receiver<FsEvent>) -> ApplicationResult<usize> {
        let mut dispatched = 0;
        for event in events.iter() {
            self.dispatch(&event)?;
            dispatched += 1;
        }
        info!(
            "dispatched {} events, tree has {} nodes",
            dispatched,
            self.tree.len()
        );
        Ok(dispatched)
    }

    fn create(&mut self, path: &Path) -> DomainResult<()> {
        let Some(parent) = path.parent_name() else {
            debug!("dropped: {} has no parent directory", path.display());
            return Ok(());
        };
        match self.reader.read(path) {
            Some(entry) => self.tree.create_child_node(&parent, &entry),
            None => {
                debug!("dropped: nothing to read at {}", path.display());
                Ok(())
            }
        }
    }

    fn update(&mut self, path: &Path) -> DomainResult<()> {
        let Some(parent) = path.parent_name() else {
            return Ok(());
        };
        match self.reader.read(path) {
            Some(entry) => self
                .tree
                .update_existing_file_node_by_contents(&parent, &entry),
            None => {
                debug!("dropped: nothing to read at {}", path.display());
                Ok(())
            }
        }
    }

    fn delete(&mut self, path: &Path) -> DomainResult<()> {
        let Some(parent) = path.parent_name() else {
            return Ok(());
        };
        self.tree.delete_child_node(&parent, &path.file_name_lossy())
    }
}
