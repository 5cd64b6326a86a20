//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/strucount/strucount.toml`
//! 3. Project config: `<project_dir>/.strucount.toml`
//! 4. Environment variables: `STRUCOUNT_*` prefix

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::util::path::expand_env_vars;

/// Tree rendering options.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RenderConfig {
    /// Show function leaves below classes
    pub show_functions: bool,
    /// Append class/method counters to branch labels
    pub show_counts: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            show_functions: true,
            show_counts: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Default)]
#[serde(default)]
pub struct RawRenderConfig {
    pub show_functions: Option<bool>,
    pub show_counts: Option<bool>,
}

impl RenderConfig {
    fn overlay(&self, raw: &RawRenderConfig) -> Self {
        Self {
            show_functions: raw.show_functions.unwrap_or(self.show_functions),
            show_counts: raw.show_counts.unwrap_or(self.show_counts),
        }
    }
}

/// Raw settings for intermediate parsing (arrays are Option to detect "not specified").
///
/// - `None` → field not specified, inherit from base
/// - `Some([])` → explicit empty array
/// - `Some([...])` → explicit values to merge
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub supported_extensions: Option<Vec<String>>,
    pub excluded_dirs: Option<Vec<String>>,
    pub modules: Option<Vec<String>>,
    pub render: RawRenderConfig,
}

/// Unified configuration for strucount.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// File extensions handed to the source parser (without dot)
    pub supported_extensions: Vec<String>,
    /// Directory names skipped while scanning
    pub excluded_dirs: Vec<String>,
    /// Module directories relative to the project; empty: the project is the module
    pub modules: Vec<String>,
    pub render: RenderConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            supported_extensions: vec!["java".into()],
            excluded_dirs: vec![
                ".git".into(),
                ".idea".into(),
                "build".into(),
                "out".into(),
                "target".into(),
            ],
            modules: vec![],
            render: RenderConfig::default(),
        }
    }
}

/// Get the XDG config directory for strucount.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "strucount").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("strucount.toml"))
}

/// Get the path to the local config file of a project.
pub fn project_config_path(project_dir: &Path) -> PathBuf {
    project_dir.join(".strucount.toml")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Merge arrays with union semantics and negation support.
    ///
    /// - Items from overlay are added to base
    /// - Items prefixed with `!` remove the corresponding item from the result
    /// - Duplicates are de-duplicated
    ///
    /// # Examples
    /// ```ignore
    /// merge_array(&["a", "b"], &["c"])       // → ["a", "b", "c"]
    /// merge_array(&["a", "b"], &["!a", "c"]) // → ["b", "c"]
    /// ```
    pub fn merge_array(base: &[String], overlay: &[String]) -> Vec<String> {
        let mut result: HashSet<String> = base.iter().cloned().collect();

        for pattern in overlay {
            if let Some(negated) = pattern.strip_prefix('!') {
                result.remove(negated);
            } else {
                result.insert(pattern.clone());
            }
        }

        // Convert to sorted Vec for deterministic output
        let mut vec: Vec<String> = result.into_iter().collect();
        vec.sort();
        vec
    }

    /// Expand shell variables and tilde in module paths.
    fn expand_paths(&mut self) {
        self.modules = self.modules.iter().map(|m| expand_env_vars(m)).collect();
    }

    /// Project config onto self: UNION for arrays, overlay wins for scalars.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        let merge = |base: &Vec<String>, over: &Option<Vec<String>>| {
            over.as_ref()
                .map(|o| Self::merge_array(base, o))
                .unwrap_or_else(|| base.clone())
        };
        Self {
            supported_extensions: merge(&self.supported_extensions, &overlay.supported_extensions),
            excluded_dirs: merge(&self.excluded_dirs, &overlay.excluded_dirs),
            modules: merge(&self.modules, &overlay.modules),
            render: self.render.overlay(&overlay.render),
        }
    }

    /// Global config onto defaults: arrays are REPLACED when specified.
    ///
    /// Defaults are just examples; the global file defines the real baseline.
    fn apply_global(&self, global: &RawSettings) -> Self {
        let replace = |base: &Vec<String>, over: &Option<Vec<String>>| {
            over.clone().unwrap_or_else(|| base.clone())
        };
        Self {
            supported_extensions: replace(&self.supported_extensions, &global.supported_extensions),
            excluded_dirs: replace(&self.excluded_dirs, &global.excluded_dirs),
            modules: replace(&self.modules, &global.modules),
            render: self.render.overlay(&global.render),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Array Merge Semantics
    /// - Defaults → Global: REPLACE (global defines the real baseline)
    /// - Global → Project: UNION with negation support
    /// - Any → Env vars: REPLACE (explicit user override)
    pub fn load(project_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        Self::load_from(global_config_path().as_deref(), project_dir)
    }

    /// Same as [`Settings::load`] with an explicit global config file.
    pub fn load_from(
        global_path: Option<&Path>,
        project_dir: Option<&Path>,
    ) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_path {
            if global_path.exists() {
                let raw = load_raw_settings(global_path)?;
                current = current.apply_global(&raw);
            }
        }

        if let Some(project) = project_dir {
            let local_path = project_config_path(project);
            if local_path.exists() {
                let raw = load_raw_settings(&local_path)?;
                current = current.merge_with(&raw);
            }
        }

        current = Self::apply_env_overrides(current)?;
        current.expand_paths();

        Ok(current)
    }

    /// Apply STRUCOUNT_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("STRUCOUNT")
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("supported_extensions")
                    .with_list_parse_key("excluded_dirs")
                    .with_list_parse_key("modules")
                    .try_parsing(true),
            )
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get::<Vec<String>>("supported_extensions") {
            settings.supported_extensions = val;
        }
        if let Ok(val) = config.get::<Vec<String>>("excluded_dirs") {
            settings.excluded_dirs = val;
        }
        if let Ok(val) = config.get::<Vec<String>>("modules") {
            settings.modules = val;
        }
        if let Ok(val) = config.get_bool("render.show_functions") {
            settings.render.show_functions = val;
        }
        if let Ok(val) = config.get_bool("render.show_counts") {
            settings.render.show_counts = val;
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
