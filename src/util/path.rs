//! Path helpers shared by the reader, the dispatcher and the config loader.

use std::path::Path;

pub trait PathExt {
    /// File name as a string, lossily converted; empty for `..` or `/`.
    fn file_name_lossy(&self) -> String;
    /// Name of the directory containing this path, if any.
    fn parent_name(&self) -> Option<String>;
    /// Whether the extension is one of `extensions` (case-insensitive, without dot).
    fn has_supported_extension(&self, extensions: &[String]) -> bool;
}

impl PathExt for Path {
    fn file_name_lossy(&self) -> String {
        self.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    fn parent_name(&self) -> Option<String> {
        self.parent()
            .and_then(Path::file_name)
            .map(|n| n.to_string_lossy().into_owned())
    }

    fn has_supported_extension(&self, extensions: &[String]) -> bool {
        self.extension()
            .map(|ext| ext.to_string_lossy())
            .is_some_and(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext)))
    }
}

/// Expand `~`, `$VAR` and `${VAR}`; leaves the input unchanged on failure.
pub fn expand_env_vars(path: &str) -> String {
    shellexpand::full(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string())
}
