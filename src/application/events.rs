//! File-system change notifications consumed by the dispatcher.

use std::fmt;
use std::path::PathBuf;

/// Property reported by a property-changed notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileProperty {
    /// The file or directory was renamed in place.
    Name { old: String, new: String },
    /// Any other property (permissions, timestamps, ...); ignored.
    Other(String),
}

/// One file-system change, as delivered by a watcher or an event script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FsEvent {
    Created { path: PathBuf },
    Copied { source: PathBuf, new_path: PathBuf },
    Deleted { path: PathBuf },
    Moved { old_path: PathBuf, new_path: PathBuf },
    ContentChanged { path: PathBuf },
    PropertyChanged { path: PathBuf, property: FileProperty },
}

impl FsEvent {
    /// Short lowercase name of the event kind.
    pub fn kind(&self) -> &'static str {
        match self {
            FsEvent::Created { .. } => "create",
            FsEvent::Copied { .. } => "copy",
            FsEvent::Deleted { .. } => "delete",
            FsEvent::Moved { .. } => "move",
            FsEvent::ContentChanged { .. } => "content",
            FsEvent::PropertyChanged { .. } => "property",
        }
    }
}

impl fmt::Display for FsEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FsEvent::Created { path } | FsEvent::Deleted { path } | FsEvent::ContentChanged { path } => {
                write!(f, "{} {}", self.kind(), path.display())
            }
            FsEvent::Copied { source, new_path } => {
                write!(f, "copy {} -> {}", source.display(), new_path.display())
            }
            FsEvent::Moved { old_path, new_path } => {
                write!(f, "move {} -> {}", old_path.display(), new_path.display())
            }
            FsEvent::PropertyChanged {
                path,
                property: FileProperty::Name { old, new },
            } => write!(f, "rename {} ({} -> {})", path.display(), old, new),
            FsEvent::PropertyChanged {
                path,
                property: FileProperty::Other(name),
            } => write!(f, "property {} ({})", path.display(), name),
        }
    }
}
