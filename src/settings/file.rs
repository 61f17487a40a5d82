//! Optional `dl-tasks.toml` overrides.

use super::Remote;
use crate::error::{FsContext, Result};
use serde::Deserialize;
use std::path::Path;

/// Name of the per-project configuration file.
pub const TASKS_FILE_NAME: &str = "dl-tasks.toml";

/// Contents of `dl-tasks.toml`. Every field is optional; unset fields keep
/// the built-in defaults.
///
/// ```toml
/// artifactory = "http://artifactory.example.com/artifactory"
/// stable_branch_pattern = "release/.*"
///
/// [[remotes]]
/// name = "conan-local"
/// url = "http://artifactory.example.com/artifactory/api/conan/conan-local"
/// ```
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TasksFile {
    /// Artifactory base URL
    pub artifactory: Option<String>,
    /// Remotes in priority order; replaces the standard registry
    pub remotes: Option<Vec<Remote>>,
    /// Remote that packages are uploaded to
    pub upload_remote: Option<String>,
    /// Remote that promoted dependencies are uploaded to
    pub upload_dependencies_remote: Option<String>,
    /// Remote holding redirect aliases
    pub redirect_remote: Option<String>,
    /// Stable branch regular expression
    pub stable_branch_pattern: Option<String>,
    /// Stable identity
    pub stable_username: Option<String>,
    /// Profile for Linux installs and packaging
    pub linux_profile: Option<String>,
    /// References pre-installed for every packaging configuration
    pub extra_references: Option<Vec<String>>,
}

impl TasksFile {
    /// Parses a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).fs_context("reading", path)?;
        let file = toml::from_str(&text)?;
        log::debug!("Loaded task configuration from {}", path.display());
        Ok(file)
    }

    /// Parses `dl-tasks.toml` in the project directory, if present.
    pub fn discover(project_dir: &Path) -> Result<Option<Self>> {
        let path = project_dir.join(TASKS_FILE_NAME);
        if path.is_file() {
            Self::load(&path).map(Some)
        } else {
            Ok(None)
        }
    }
}
