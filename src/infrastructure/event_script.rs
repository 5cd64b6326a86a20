//! TOML event scripts.
//!
//! A script is a list of `[[event]]` tables replayed in order:
//!
//! ```toml
//! [[event]]
//! kind = "create"
//! path = "src/pkg/B.java"
//!
//! [[event]]
//! kind = "rename"
//! path = "src/pkg/C.java"
//! old = "B.java"
//! new = "C.java"
//! ```
//!
//! Paths are relative to the project directory.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, instrument};

use crate::application::{FileProperty, FsEvent};
use crate::infrastructure::{InfraError, InfraResult};

#[derive(Debug, Deserialize)]
struct RawScript {
    #[serde(default)]
    event: Vec<RawEvent>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum RawEvent {
    Create { path: PathBuf },
    Copy { source: PathBuf, new_path: PathBuf },
    Delete { path: PathBuf },
    Move { old_path: PathBuf, new_path: PathBuf },
    Content { path: PathBuf },
    Rename { path: PathBuf, old: String, new: String },
    Property { path: PathBuf, property: String },
}

/// Load the event script at `script`, resolving paths against `project_dir`.
#[instrument(level = "debug")]
pub fn load_event_script(script: &Path, project_dir: &Path) -> InfraResult<Vec<FsEvent>> {
    let content = std::fs::read_to_string(script)
        .map_err(|e| InfraError::io(format!("read event script {}", script.display()), e))?;
    parse_event_script(&content, script, project_dir)
}

/// Parse script text; `origin` only names the script in errors.
pub fn parse_event_script(
    content: &str,
    origin: &Path,
    project_dir: &Path,
) -> InfraResult<Vec<FsEvent>> {
    let raw: RawScript =
        toml::from_str(content).map_err(|e| InfraError::event_script(origin, e.to_string()))?;

    let events = raw
        .event
        .into_iter()
        .enumerate()
        .map(|(i, ev)| {
            resolve(ev, project_dir)
                .map_err(|msg| InfraError::event_script(origin, format!("event {}: {}", i + 1, msg)))
        })
        .collect::<InfraResult<Vec<_>>>()?;
    debug!("loaded {} events from {}", events.len(), origin.display());
    Ok(events)
}

fn resolve(raw: RawEvent, project_dir: &Path) -> Result<FsEvent, String> {
    let at = |p: PathBuf| -> Result<PathBuf, String> {
        if p.as_os_str().is_empty() {
            Err("empty path".to_string())
        } else {
            Ok(project_dir.join(p))
        }
    };

    let event = match raw {
        RawEvent::Create { path } => FsEvent::Created { path: at(path)? },
        RawEvent::Copy { source, new_path } => FsEvent::Copied {
            source: at(source)?,
            new_path: at(new_path)?,
        },
        RawEvent::Delete { path } => FsEvent::Deleted { path: at(path)? },
        RawEvent::Move { old_path, new_path } => FsEvent::Moved {
            old_path: at(old_path)?,
            new_path: at(new_path)?,
        },
        RawEvent::Content { path } => FsEvent::ContentChanged { path: at(path)? },
        RawEvent::Rename { path, old, new } => {
            if old.is_empty() || new.is_empty() {
                return Err("rename needs non-empty 'old' and 'new'".to_string());
            }
            FsEvent::PropertyChanged {
                path: at(path)?,
                property: FileProperty::Name { old, new },
            }
        }
        RawEvent::Property { path, property } => FsEvent::PropertyChanged {
            path: at(path)?,
            property: FileProperty::Other(property),
        },
    };
    Ok(event)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> InfraResult<Vec<FsEvent>> {
        parse_event_script(content, Path::new("events.toml"), Path::new("/proj"))
    }

    #[test]
    fn given_all_kinds_when_parsing_then_maps_in_order() {
        let events = parse(
            r#"
[[event]]
kind = "create"
path = "src/pkg/B.java"

[[event]]
kind = "copy"
source = "src/a/A.java"
new_path = "src/b/A.java"

[[event]]
kind = "move"
old_path = "src/a/X.java"
new_path = "src/b/X.java"

[[event]]
kind = "content"
path = "src/b/A.java"

[[event]]
kind = "rename"
path = "src/b/Y.java"
old = "X.java"
new = "Y.java"

[[event]]
kind = "property"
path = "src/b/Y.java"
property = "readonly"

[[event]]
kind = "delete"
path = "src/a"
"#,
        )
        .unwrap();

        assert_eq!(events.len(), 7);
        assert_eq!(
            events[0],
            FsEvent::Created {
                path: PathBuf::from("/proj/src/pkg/B.java")
            }
        );
        assert_eq!(
            events[4],
            FsEvent::PropertyChanged {
                path: PathBuf::from("/proj/src/b/Y.java"),
                property: FileProperty::Name {
                    old: "X.java".into(),
                    new: "Y.java".into()
                }
            }
        );
        assert_eq!(events[6].kind(), "delete");
    }

    #[test]
    fn given_empty_script_when_parsing_then_no_events() {
        assert!(parse("").unwrap().is_empty());
    }

    #[test]
    fn given_unknown_kind_when_parsing_then_errors() {
        let err = parse("[[event]]\nkind = \"explode\"\npath = \"x\"\n").unwrap_err();
        assert!(matches!(err, InfraError::EventScript { .. }));
    }

    #[test]
    fn given_missing_field_when_parsing_then_errors() {
        let err = parse("[[event]]\nkind = \"copy\"\nsource = \"x\"\n").unwrap_err();
        assert!(matches!(err, InfraError::EventScript { .. }));
    }

    #[test]
    fn given_empty_path_when_parsing_then_names_the_event() {
        let err = parse("[[event]]\nkind = \"create\"\npath = \"a\"\n[[event]]\nkind = \"delete\"\npath = \"\"\n")
            .unwrap_err();
        assert!(err.to_string().contains("event 2: empty path"));
    }
}
